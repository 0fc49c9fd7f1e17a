use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::Rc;

use super::dispatch::NavEnv;
use super::factory::ScreenRegistry;
use super::navigator::Navigator;
use super::screen::retained_prefix;
use super::{HostId, TeardownReason};
use crate::config::NavConfig;
use crate::error::{NavError, NavResult};
use crate::scope::{ClientId, ScopeId, ScopeKind, Topic, TopicRegistry};
use crate::state::{PersistedState, RestoreReport};

/// Top-level owner of a root navigator and the host scope.
///
/// Models the lifetime of one window: `recreate` rebuilds the whole tree
/// (as after a configuration change), `finish` ends it for good.
pub struct NavHost {
    env: Rc<NavEnv>,
    client: ClientId,
    root: RefCell<Option<Navigator>>,
}

impl NavHost {
    pub fn new(registry: TopicRegistry, config: NavConfig) -> Self {
        let host = HostId::new();
        registry.begin_scope(ScopeId::Host(host));
        info!("Host {} started, root container {}", host, config.root_container);
        Self {
            env: NavEnv::new(host, registry, config),
            client: ClientId::new(),
            root: RefCell::new(None),
        }
    }

    pub fn id(&self) -> HostId {
        self.env.host
    }

    pub fn scope(&self) -> ScopeId {
        self.env.host_scope()
    }

    pub fn registry(&self) -> &TopicRegistry {
        &self.env.registry
    }

    pub fn config(&self) -> &NavConfig {
        &self.env.config
    }

    /// Root navigator, created on first use
    pub fn navigator(&self) -> Navigator {
        if let Some(root) = self.root.borrow().as_ref() {
            return root.clone();
        }
        let root = Navigator::create(
            Rc::clone(&self.env),
            self.env.config.root_container,
            self.scope(),
        );
        *self.root.borrow_mut() = Some(root.clone());
        root
    }

    pub fn is_finished(&self) -> bool {
        !self.env.is_alive()
    }

    /// Join a topic as the host itself. `Own` and `Host` both resolve to the host scope.
    pub fn topic<T: Default + 'static>(&self, id: &str, kind: ScopeKind) -> NavResult<Topic<T>> {
        let scope = match kind {
            ScopeKind::Own | ScopeKind::Host => self.scope(),
            ScopeKind::App => ScopeId::App,
        };
        let topic = self.env.registry.open(scope, id, self.client)?;
        self.env.registry.claim(self.client, self.id());
        Ok(topic)
    }

    pub fn handle_back_pressed(&self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.navigator().handle_on_back_pressed()
    }

    /// Bag holding the whole navigator tree, for process-death round trips
    pub fn save_state(&self) -> NavResult<PersistedState> {
        let mut bag = PersistedState::new();
        self.navigator().save_into(&mut bag)?;
        Ok(bag)
    }

    pub fn restore_state(
        &self,
        bag: &PersistedState,
        screens: &ScreenRegistry,
    ) -> NavResult<RestoreReport> {
        self.navigator().restore_from(bag, screens)
    }

    /// Save, tear down and rebuild the tree with the same screen ids. Scopes
    /// and retained state survive; screens join their topics again on attach.
    ///
    /// Fails with [`NavError::Dispatching`] when called from inside a screen
    /// callback: the calling screen is borrowed and could neither save its
    /// state nor receive its teardown.
    pub fn recreate(&self, screens: &ScreenRegistry) -> NavResult<RestoreReport> {
        if self.is_finished() {
            return Err(NavError::TornDown(self.env.config.root_container));
        }
        if self.env.is_dispatching() {
            warn!("Host {} cannot recreate from inside a screen callback", self.id());
            return Err(NavError::Dispatching);
        }

        let old = self.navigator();
        let saved = old.store_instance_state();
        info!("Recreating host {} with {} screen(s)", self.id(), saved.total_screens());
        old.tear_down(TeardownReason::Recreate);

        let fresh = Navigator::create(
            Rc::clone(&self.env),
            self.env.config.root_container,
            self.scope(),
        );
        *self.root.borrow_mut() = Some(fresh.clone());
        let report = fresh.restore_instance_state(&saved, screens)?;

        // Screens that did not come back will never end their scopes otherwise
        for skipped in &report.skipped {
            self.env.registry.end_scope(ScopeId::Screen(skipped.id));
            self.env.registry.discard_prefix(self.scope(), &retained_prefix(skipped.id));
        }

        self.env.flush();
        Ok(report)
    }

    /// Tear everything down and end the host scope. Later commits fail.
    pub fn finish(&self) {
        if self.is_finished() {
            return;
        }
        let root = self.root.borrow().clone();
        if let Some(root) = root {
            root.tear_down(TeardownReason::Finish);
        }

        self.env.registry.leave_all(self.client);
        self.env.registry.end_scope(self.scope());
        self.env.shut_down();
        info!("Host {} finished", self.id());
    }

    /// Apply queued commits, then deliver topic notices to the screens that
    /// joined the destroyed topics. Returns how many notices were delivered.
    ///
    /// Notices for clients of another live host sharing the registry are put
    /// back for that host. Any other notice without a recipient is dropped.
    pub fn process_side_effects(&self) -> usize {
        self.env.flush();

        let notices = self.env.registry.take_notices();
        if notices.is_empty() {
            return 0;
        }

        let root = self.root.borrow().clone();
        let mut delivered = 0;
        let mut foreign = Vec::new();

        for notice in notices {
            if self.env.registry.owner_of(notice.client).is_some_and(|owner| owner != self.id()) {
                foreign.push(notice);
                continue;
            }

            let target = root.as_ref().and_then(|r| r.find_by_client(notice.client));
            match target {
                Some(handle) => {
                    self.env.enter();
                    handle.notify(None, |screen, cx| screen.on_topic_gone(cx, &notice));
                    self.env.exit();
                    delivered += 1;
                }
                None if notice.client == self.client => {
                    debug!(
                        "Host {} lost topic '{}' in scope {}",
                        self.id(),
                        notice.topic,
                        notice.scope
                    );
                    delivered += 1;
                }
                None => debug!(
                    "Dropping notice for {}: topic '{}' in scope {} has no recipient",
                    notice.client, notice.topic, notice.scope
                ),
            }
        }

        if !foreign.is_empty() {
            debug!("{} topic notice(s) belong to other hosts", foreign.len());
            self.env.registry.requeue_notices(foreign);
        }

        self.env.flush();
        delivered
    }
}

impl Drop for NavHost {
    fn drop(&mut self) {
        self.finish();
    }
}
