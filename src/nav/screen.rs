use log::{debug, error, warn};
use std::any::{Any, type_name};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::dispatch::NavEnv;
use super::navigator::{Navigator, NavigatorCore};
use super::{AnimPair, AnimToken, BackPress, ContainerId, ScreenId, ScreenLifecycle, TeardownReason};
use crate::error::{NavError, NavResult};
use crate::scope::{ClientId, ScopeId, ScopeKind, Topic, TopicNotice};
use crate::state::{PersistedState, SavedScreen};

/// An opaque unit of UI managed by a [`Navigator`].
///
/// Every hook has a no-op default, so a screen implements only the
/// capabilities it has: a child container to host nested screens, a
/// back-press policy, persistent fields, lifecycle reactions.
///
/// Callbacks receive a [`ScreenContext`]. Commits issued through it while a
/// callback runs are queued and applied after the current dispatch.
pub trait Screen: Any {
    /// Stable name used to rebuild the screen from saved state
    fn kind(&self) -> &'static str;

    /// Container for the lazily created child navigator, if this screen hosts one
    fn container_id(&self) -> Option<ContainerId> {
        None
    }

    fn on_attach(&mut self, _cx: &ScreenContext) {}

    fn on_detach(&mut self, _cx: &ScreenContext) {}

    /// Called right before detach when a transaction removes the screen
    fn on_dismiss(&mut self, _cx: &ScreenContext) {}

    fn on_destroy(&mut self, _cx: &ScreenContext, _reason: TeardownReason) {}

    /// Asked after any child navigator declined the back-press
    fn on_back_pressed(&mut self, _cx: &ScreenContext) -> BackPress {
        BackPress::Close
    }

    /// A topic this screen joined was destroyed by its scope ending
    fn on_topic_gone(&mut self, _cx: &ScreenContext, _notice: &TopicNotice) {}

    /// Capture persistent fields right before destruction
    fn save_state(&self, _out: &mut PersistedState) {}

    /// Replay persistent fields right after recreation, before attach
    fn restore_state(&mut self, _state: &PersistedState) {}
}

pub(crate) struct ScreenNode {
    id: ScreenId,
    kind: &'static str,
    container: Option<ContainerId>,
    client: ClientId,
    body: RefCell<Box<dyn Screen>>,
    pub(crate) lifecycle: Cell<ScreenLifecycle>,
    parent: RefCell<Weak<NavigatorCore>>,
    pub(crate) child: RefCell<Option<Navigator>>,
}

impl ScreenNode {
    pub(crate) fn parent_core(&self) -> Option<Rc<NavigatorCore>> {
        self.parent.borrow().upgrade()
    }

    pub(crate) fn env(&self) -> Option<Rc<NavEnv>> {
        self.parent_core().map(|core| Rc::clone(&core.env))
    }

    pub(crate) fn bind(&self, core: &Rc<NavigatorCore>) {
        *self.parent.borrow_mut() = Rc::downgrade(core);
        self.lifecycle.set(ScreenLifecycle::Attached);
    }

    pub(crate) fn unbind(&self) {
        *self.parent.borrow_mut() = Weak::new();
    }
}

/// Shared handle to a screen. Cloning is cheap; clones refer to the same screen.
#[derive(Clone)]
pub struct ScreenHandle {
    pub(crate) node: Rc<ScreenNode>,
}

impl fmt::Debug for ScreenHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenHandle")
            .field("id", &self.node.id)
            .field("kind", &self.node.kind)
            .field("lifecycle", &self.node.lifecycle.get())
            .finish()
    }
}

impl ScreenHandle {
    pub fn new<S: Screen>(screen: S) -> Self {
        Self::with_id(ScreenId::new(), screen)
    }

    pub fn with_id<S: Screen>(id: ScreenId, screen: S) -> Self {
        Self::from_boxed(id, Box::new(screen))
    }

    pub(crate) fn from_boxed(id: ScreenId, body: Box<dyn Screen>) -> Self {
        let kind = body.kind();
        let container = body.container_id();
        Self {
            node: Rc::new(ScreenNode {
                id,
                kind,
                container,
                client: ClientId::new(),
                body: RefCell::new(body),
                lifecycle: Cell::new(ScreenLifecycle::Created),
                parent: RefCell::new(Weak::new()),
                child: RefCell::new(None),
            }),
        }
    }

    pub fn id(&self) -> ScreenId {
        self.node.id
    }

    pub fn kind(&self) -> &'static str {
        self.node.kind
    }

    /// Identity used when this screen joins topics
    pub fn client_id(&self) -> ClientId {
        self.node.client
    }

    pub fn container_id(&self) -> Option<ContainerId> {
        self.node.container
    }

    pub fn lifecycle(&self) -> ScreenLifecycle {
        self.node.lifecycle.get()
    }

    pub fn ptr_eq(&self, other: &ScreenHandle) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Navigator currently holding this screen
    pub fn parent_navigator(&self) -> Option<Navigator> {
        self.node.parent_core().map(Navigator::from_core)
    }

    /// Child navigator, only if it has already been created
    pub fn child_navigator(&self) -> Option<Navigator> {
        self.node.child.borrow().clone()
    }

    pub fn context(&self) -> ScreenContext {
        ScreenContext::new(self.clone(), None)
    }

    /// Run `f` on the concrete screen. Returns `None` if the screen is not an
    /// `S` or is already borrowed. Commits issued inside `f` are applied once
    /// it returns.
    pub fn with<S: Screen, R>(&self, f: impl FnOnce(&mut S, &ScreenContext) -> R) -> Option<R> {
        let env = self.node.env();
        if let Some(env) = &env {
            env.enter();
        }

        let result = {
            let cx = self.context();
            match self.node.body.try_borrow_mut() {
                Ok(mut body) => {
                    let screen: &mut dyn Any = &mut **body;
                    screen.downcast_mut::<S>().map(|s| f(s, &cx))
                }
                Err(_) => {
                    warn!(
                        "Screen {} ({}) is busy, cannot access it as {}",
                        self.id(),
                        self.kind(),
                        type_name::<S>()
                    );
                    None
                }
            }
        };

        if let Some(env) = env {
            env.exit();
            env.flush();
        }
        result
    }

    /// Read-only access to the concrete screen
    pub fn peek<S: Screen, R>(&self, f: impl FnOnce(&S) -> R) -> Option<R> {
        let body = self.node.body.try_borrow().ok()?;
        let screen: &dyn Any = &**body;
        screen.downcast_ref::<S>().map(f)
    }

    /// Push this screen onto `navigator`
    pub fn open(&self, navigator: &Navigator) -> bool {
        navigator.begin_transaction().add(self).commit()
    }

    pub fn open_with_anims(
        &self,
        navigator: &Navigator,
        enter: AnimToken,
        exit: AnimToken,
    ) -> bool {
        navigator
            .begin_transaction()
            .set_anims(enter, exit)
            .add(self)
            .commit()
    }

    /// Ask the parent navigator to remove this screen
    pub fn close(&self) -> bool {
        self.context().close()
    }

    /// Invoke a callback on the screen body. Skipped, with an error log, if
    /// the body is already borrowed further up the stack.
    pub(crate) fn notify<R>(
        &self,
        anim: Option<AnimToken>,
        f: impl FnOnce(&mut dyn Screen, &ScreenContext) -> R,
    ) -> Option<R> {
        let cx = ScreenContext::new(self.clone(), anim);
        match self.node.body.try_borrow_mut() {
            Ok(mut body) => Some(f(&mut **body, &cx)),
            Err(_) => {
                error!("Screen {} ({}) is busy, skipping callback", self.id(), self.kind());
                None
            }
        }
    }

    pub(crate) fn save(&self) -> SavedScreen {
        let mut state = PersistedState::new();
        match self.node.body.try_borrow() {
            Ok(body) => body.save_state(&mut state),
            Err(_) => warn!(
                "Screen {} ({}) is busy, saving it without state",
                self.id(),
                self.kind()
            ),
        }

        let child = self
            .child_navigator()
            .filter(|child| child.child_count() > 0)
            .map(|child| child.store_instance_state());

        SavedScreen::new(self.id(), self.kind(), state).with_child(child)
    }
}

pub(crate) fn retained_prefix(id: ScreenId) -> String {
    format!("retained/{}/", id)
}

/// What a screen can reach while handling a callback: its navigators, its
/// scopes and the topics under them.
pub struct ScreenContext {
    handle: ScreenHandle,
    anim: Option<AnimToken>,
}

impl ScreenContext {
    pub(crate) fn new(handle: ScreenHandle, anim: Option<AnimToken>) -> Self {
        Self { handle, anim }
    }

    pub fn id(&self) -> ScreenId {
        self.handle.id()
    }

    pub fn client_id(&self) -> ClientId {
        self.handle.client_id()
    }

    pub fn handle(&self) -> &ScreenHandle {
        &self.handle
    }

    /// Animation token of the transaction driving this callback, if any
    pub fn anim(&self) -> Option<AnimToken> {
        self.anim
    }

    /// Animations of the last transaction committed to the parent navigator
    pub fn parent_anims(&self) -> Option<AnimPair> {
        self.handle.parent_navigator().and_then(|nav| nav.last_anims())
    }

    pub fn try_parent_navigator(&self) -> NavResult<Navigator> {
        self.handle
            .parent_navigator()
            .ok_or(NavError::NoParentNavigator(self.id()))
    }

    /// # Panics
    ///
    /// When no navigator owns this screen. That is a wiring mistake, not a
    /// runtime condition.
    pub fn parent_navigator(&self) -> Navigator {
        match self.try_parent_navigator() {
            Ok(navigator) => navigator,
            Err(e) => panic!("{} ({}): {}", self.handle.kind(), self.id(), e),
        }
    }

    /// The child navigator, created on first use
    pub fn try_child_navigator(&self) -> NavResult<Navigator> {
        let node = &self.handle.node;
        let existing = node.child.borrow().clone();
        if let Some(child) = existing {
            return Ok(child);
        }

        if node.lifecycle.get() == ScreenLifecycle::Destroyed {
            return Err(NavError::ScreenDestroyed(self.id()));
        }
        let container = node.container.ok_or(NavError::MissingContainer(self.id()))?;
        let parent = node.parent_core().ok_or(NavError::NotAttached(self.id()))?;
        if parent.container == container {
            return Err(NavError::ContainerConflict(container));
        }

        let child = Navigator::create(
            Rc::clone(&parent.env),
            container,
            ScopeId::Screen(self.id()),
        );
        *node.child.borrow_mut() = Some(child.clone());
        debug!("Created child navigator {} for screen {} ({})", container, self.id(), node.kind);
        Ok(child)
    }

    /// # Panics
    ///
    /// When the screen declares no container, or its container clashes with
    /// the enclosing navigator.
    pub fn child_navigator(&self) -> Navigator {
        match self.try_child_navigator() {
            Ok(navigator) => navigator,
            Err(e) if e.is_configuration() => {
                panic!("{} ({}): {}", self.handle.kind(), self.id(), e)
            }
            Err(e) => panic!(
                "{} ({}) has no child navigator: {}",
                self.handle.kind(),
                self.id(),
                e
            ),
        }
    }

    /// Resolve a scope kind to a concrete owner, relative to this screen
    pub fn resolve_scope(&self, kind: ScopeKind) -> NavResult<ScopeId> {
        match kind {
            ScopeKind::Own => Ok(ScopeId::Screen(self.id())),
            ScopeKind::Host => self
                .handle
                .node
                .parent_core()
                .map(|core| core.owner)
                .ok_or(NavError::NotAttached(self.id())),
            ScopeKind::App => Ok(ScopeId::App),
        }
    }

    fn env(&self) -> NavResult<Rc<NavEnv>> {
        self.handle.node.env().ok_or(NavError::NotAttached(self.id()))
    }

    /// Join (creating on first use) the topic `id` in the scope `kind` resolves to
    pub fn topic<T: Default + 'static>(&self, id: &str, kind: ScopeKind) -> NavResult<Topic<T>> {
        self.topic_with(id, kind, T::default)
    }

    pub fn topic_with<T: 'static>(
        &self,
        id: &str,
        kind: ScopeKind,
        init: impl FnOnce() -> T,
    ) -> NavResult<Topic<T>> {
        let scope = self.resolve_scope(kind)?;
        let env = self.env()?;
        let topic = env.registry.open_with(scope, id, self.client_id(), init)?;
        env.registry.claim(self.client_id(), env.host);
        Ok(topic)
    }

    pub fn leave<T>(&self, topic: &Topic<T>) -> bool {
        match self.env() {
            Ok(env) => env.registry.leave(self.client_id(), topic),
            Err(_) => false,
        }
    }

    /// Per-screen side-registry for state that must survive recreation but
    /// cannot be serialized (callbacks, handles). Lives in the host scope,
    /// keyed by this screen's id and `T`; discarded once the screen is
    /// removed for good.
    pub fn retained<T: Default + 'static>(&self) -> NavResult<Topic<T>> {
        let id = format!("{}{}", retained_prefix(self.id()), type_name::<T>());
        self.topic(&id, ScopeKind::Host)
    }

    /// Remove this screen through its parent navigator. Logs and returns false
    /// when there is nothing to remove it from.
    pub fn close(&self) -> bool {
        match self.try_parent_navigator() {
            Ok(navigator) => navigator.begin_transaction().remove(&self.handle).commit(),
            Err(e) => {
                error!("Cannot close {} ({}): {}", self.handle.kind(), self.id(), e);
                false
            }
        }
    }
}
