use log::{debug, warn};
use std::collections::HashMap;
use std::marker::PhantomData;

use super::screen::Screen;
use crate::error::{NavError, NavResult};
use crate::screens::{AlertDialog, PleaseWaitDialog};

/// Builds a fresh, default screen body so a saved stack can be rebuilt
pub trait ScreenFactory {
    fn create(&self) -> Box<dyn Screen>;
}

/// Blanket implementation for any default-constructible screen type
impl<S: Screen + Default> ScreenFactory for PhantomData<S> {
    fn create(&self) -> Box<dyn Screen> {
        Box::new(S::default())
    }
}

/// Factory backed by a closure, for screens without a sensible `Default`
pub struct FnFactory<F>(pub F);

impl<F: Fn() -> Box<dyn Screen>> ScreenFactory for FnFactory<F> {
    fn create(&self) -> Box<dyn Screen> {
        (self.0)()
    }
}

/// Maps screen kind names to factories
#[derive(Default)]
pub struct ScreenRegistry {
    factories: HashMap<String, Box<dyn ScreenFactory>>,
}

impl ScreenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in dialogs
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register::<AlertDialog>().register::<PleaseWaitDialog>();
        registry
    }

    /// Register a screen type under the kind its default instance reports
    pub fn register<S: Screen + Default>(&mut self) -> &mut Self {
        let kind = S::default().kind();
        self.insert(kind, Box::new(PhantomData::<S>))
    }

    pub fn register_fn(
        &mut self,
        kind: &str,
        factory: impl Fn() -> Box<dyn Screen> + 'static,
    ) -> &mut Self {
        self.insert(kind, Box::new(FnFactory(factory)))
    }

    fn insert(&mut self, kind: &str, factory: Box<dyn ScreenFactory>) -> &mut Self {
        if self.factories.insert(kind.to_string(), factory).is_some() {
            warn!("Screen kind '{}' registered twice, keeping the latest", kind);
        } else {
            debug!("Registered screen kind '{}'", kind);
        }
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn create(&self, kind: &str) -> NavResult<Box<dyn Screen>> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| NavError::UnknownScreenKind(kind.to_string()))?;
        let screen = factory.create();
        if screen.kind() != kind {
            warn!("Factory for '{}' built a screen reporting kind '{}'", kind, screen.kind());
        }
        Ok(screen)
    }
}
