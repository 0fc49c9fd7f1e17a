use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::dispatch::{Deferred, NavEnv};
use super::factory::ScreenRegistry;
use super::screen::{ScreenHandle, retained_prefix};
use super::transaction::{Op, Transaction};
use super::{AnimPair, BackPress, ContainerId, ScreenId, ScreenLifecycle, TeardownReason};
use crate::error::{NavError, NavResult};
use crate::scope::{ClientId, ScopeId};
use crate::state::{NavigatorState, PersistedState, RestoreReport};

pub(crate) struct NavigatorCore {
    pub(crate) container: ContainerId,
    /// Scope that structurally hosts this navigator's screens
    pub(crate) owner: ScopeId,
    pub(crate) env: Rc<NavEnv>,
    /// Active stack, bottom first
    entries: RefCell<Vec<ScreenHandle>>,
    torn_down: Cell<bool>,
    last_anims: Cell<Option<AnimPair>>,
}

/// Ordered stack of screens for one container.
///
/// Cloning yields another handle to the same navigator. A navigator owns
/// its screens; each screen in turn owns its (lazily created) child
/// navigator.
#[derive(Clone)]
pub struct Navigator {
    pub(crate) core: Rc<NavigatorCore>,
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("container", &self.core.container)
            .field("owner", &self.core.owner)
            .field("screens", &self.child_count())
            .field("torn_down", &self.core.torn_down.get())
            .finish()
    }
}

impl Navigator {
    pub(crate) fn create(env: Rc<NavEnv>, container: ContainerId, owner: ScopeId) -> Self {
        Self {
            core: Rc::new(NavigatorCore {
                container,
                owner,
                env,
                entries: RefCell::new(Vec::new()),
                torn_down: Cell::new(false),
                last_anims: Cell::new(None),
            }),
        }
    }

    pub(crate) fn from_core(core: Rc<NavigatorCore>) -> Self {
        Self { core }
    }

    pub fn container(&self) -> ContainerId {
        self.core.container
    }

    /// Scope that `ScopeKind::Host` resolves to for screens in this navigator
    pub fn owner_scope(&self) -> ScopeId {
        self.core.owner
    }

    pub fn begin_transaction(&self) -> Transaction {
        Transaction::new(self.clone())
    }

    pub fn child_count(&self) -> usize {
        self.core.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.entries.borrow().is_empty()
    }

    pub fn top(&self) -> Option<ScreenHandle> {
        self.core.entries.borrow().last().cloned()
    }

    /// Active screens, bottom first
    pub fn screens(&self) -> Vec<ScreenHandle> {
        self.core.entries.borrow().clone()
    }

    pub fn find(&self, id: ScreenId) -> Option<ScreenHandle> {
        self.core.entries.borrow().iter().find(|h| h.id() == id).cloned()
    }

    /// Search this navigator and every nested child navigator
    pub fn find_in_tree(&self, id: ScreenId) -> Option<ScreenHandle> {
        let mut found = None;
        self.visit(&mut |handle| {
            if found.is_none() && handle.id() == id {
                found = Some(handle.clone());
            }
        });
        found
    }

    pub(crate) fn find_by_client(&self, client: ClientId) -> Option<ScreenHandle> {
        let mut found = None;
        self.visit(&mut |handle| {
            if found.is_none() && handle.client_id() == client {
                found = Some(handle.clone());
            }
        });
        found
    }

    /// Depth-first walk, each screen before its children
    pub(crate) fn visit(&self, f: &mut dyn FnMut(&ScreenHandle)) {
        for handle in self.screens() {
            f(&handle);
            if let Some(child) = handle.child_navigator() {
                child.visit(f);
            }
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.core.torn_down.get() || !self.core.env.is_alive()
    }

    /// Animations of the last applied transaction
    pub fn last_anims(&self) -> Option<AnimPair> {
        self.core.last_anims.get()
    }

    /// Commits queued under this navigator's host, waiting for the current dispatch to end
    pub fn pending_commits(&self) -> usize {
        self.core.env.pending_commits()
    }

    pub fn ptr_eq(&self, other: &Navigator) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }

    fn ensure_alive(&self) -> NavResult<()> {
        if self.is_torn_down() {
            return Err(NavError::TornDown(self.core.container));
        }
        Ok(())
    }

    /// Entry point for a committed transaction. Applied at once, or queued
    /// when screen callbacks are on the stack.
    pub(crate) fn submit(&self, ops: Vec<Op>, anims: Option<AnimPair>) -> NavResult<()> {
        self.ensure_alive()?;
        if ops.is_empty() {
            return Ok(());
        }

        let env = Rc::clone(&self.core.env);
        if env.is_dispatching() {
            debug!("Queueing commit of {} op(s) on container {}", ops.len(), self.core.container);
            env.defer(Deferred {
                navigator: self.clone(),
                ops,
                anims,
            });
            return Ok(());
        }

        let result = self.apply(ops, anims);
        env.flush();
        result
    }

    fn check_addable(
        &self,
        handle: &ScreenHandle,
        staged: &[ScreenHandle],
        before: &[ScreenHandle],
    ) -> NavResult<()> {
        let id = handle.id();
        if handle.lifecycle() == ScreenLifecycle::Destroyed {
            return Err(NavError::ScreenDestroyed(id));
        }
        if staged.iter().any(|h| h.id() == id) {
            return Err(NavError::DuplicateScreen(id, self.core.container));
        }
        if before.iter().any(|h| h.id() == id && !h.ptr_eq(handle)) {
            return Err(NavError::DuplicateScreen(id, self.core.container));
        }
        let owned_here = before.iter().any(|h| h.ptr_eq(handle));
        if !owned_here && handle.lifecycle() != ScreenLifecycle::Created {
            return Err(NavError::AlreadyAttached(id));
        }
        Ok(())
    }

    /// Validate and apply a batch atomically, then dispatch notifications:
    /// removed screens dismiss and detach top-most first, added screens
    /// attach in add order, removed screens are destroyed last.
    pub(crate) fn apply(&self, ops: Vec<Op>, anims: Option<AnimPair>) -> NavResult<()> {
        self.ensure_alive()?;
        let container = self.core.container;
        let before = self.screens();
        let mut staged = before.clone();
        let mut added: Vec<ScreenHandle> = Vec::new();

        for op in ops {
            match op {
                Op::Add(handle) => {
                    self.check_addable(&handle, &staged, &before)?;
                    staged.push(handle.clone());
                    added.push(handle);
                }
                Op::Remove(id) => {
                    let pos = staged
                        .iter()
                        .position(|h| h.id() == id)
                        .ok_or(NavError::ScreenNotFound(id, container))?;
                    staged.remove(pos);
                }
                Op::Replace(handle) => {
                    staged.clear();
                    self.check_addable(&handle, &staged, &before)?;
                    staged.push(handle.clone());
                    added.push(handle);
                }
            }
        }

        let removed: Vec<ScreenHandle> = before
            .iter()
            .rev()
            .filter(|h| !staged.iter().any(|s| s.ptr_eq(h)))
            .cloned()
            .collect();
        let attached: Vec<ScreenHandle> = added
            .into_iter()
            .filter(|h| staged.iter().any(|s| s.ptr_eq(h)) && !before.iter().any(|b| b.ptr_eq(h)))
            .collect();

        let anims = anims.or(self.core.env.config.default_anims);
        *self.core.entries.borrow_mut() = staged;
        self.core.last_anims.set(anims);

        let summary = format!(
            "Container {}: +{} -{} -> {} screen(s)",
            container,
            attached.len(),
            removed.len(),
            self.child_count()
        );
        if self.core.env.config.log_transactions {
            info!("{}", summary);
        } else {
            debug!("{}", summary);
        }

        for handle in &attached {
            handle.node.bind(&self.core);
            self.core.env.registry.begin_scope(ScopeId::Screen(handle.id()));
        }

        let env = Rc::clone(&self.core.env);
        env.enter();
        let exit = anims.map(|a| a.exit);
        for handle in &removed {
            handle.node.lifecycle.set(ScreenLifecycle::Detached);
            handle.notify(exit, |screen, cx| {
                screen.on_dismiss(cx);
                screen.on_detach(cx);
            });
        }
        let enter = anims.map(|a| a.enter);
        for handle in &attached {
            handle.notify(enter, |screen, cx| screen.on_attach(cx));
        }
        for handle in &removed {
            self.destroy(handle, TeardownReason::Removed);
        }
        env.exit();

        Ok(())
    }

    fn destroy(&self, handle: &ScreenHandle, reason: TeardownReason) {
        let child = handle.node.child.borrow_mut().take();
        if let Some(child) = child {
            child.tear_down(reason);
        }

        handle.notify(None, |screen, cx| screen.on_destroy(cx, reason));

        let registry = &self.core.env.registry;
        registry.leave_all(handle.client_id());
        if reason.ends_scopes() {
            registry.end_scope(ScopeId::Screen(handle.id()));
            registry.discard_prefix(self.core.owner, &retained_prefix(handle.id()));
        }

        handle.node.lifecycle.set(ScreenLifecycle::Destroyed);
        handle.node.unbind();
        debug!(
            "Destroyed screen {} ({}) in container {}: {:?}",
            handle.id(),
            handle.kind(),
            self.core.container,
            reason
        );
    }

    /// Detach and destroy every screen, recursively. Later commits fail.
    pub(crate) fn tear_down(&self, reason: TeardownReason) {
        if self.core.torn_down.replace(true) {
            return;
        }
        let entries = std::mem::take(&mut *self.core.entries.borrow_mut());

        let env = Rc::clone(&self.core.env);
        env.enter();
        for handle in entries.iter().rev() {
            handle.node.lifecycle.set(ScreenLifecycle::Detached);
            handle.notify(None, |screen, cx| screen.on_detach(cx));
        }
        for handle in entries.iter().rev() {
            self.destroy(handle, reason);
        }
        env.exit();

        debug!(
            "Navigator {} torn down ({} screen(s)): {:?}",
            self.core.container,
            entries.len(),
            reason
        );
    }

    /// Route a back-press, deepest child navigator first. Returns false only
    /// when there is nothing to close.
    pub fn handle_on_back_pressed(&self) -> bool {
        if self.is_torn_down() {
            return false;
        }
        let Some(top) = self.top() else {
            return false;
        };

        if let Some(child) = top.child_navigator().filter(|c| c.child_count() > 0) {
            if child.handle_on_back_pressed() {
                return true;
            }
        }

        let env = Rc::clone(&self.core.env);
        env.enter();
        let answer = top.notify(None, |screen, cx| screen.on_back_pressed(cx));
        env.exit();
        env.flush();

        match answer {
            Some(BackPress::Consume) => true,
            Some(BackPress::Close) => {
                let still_here = self.find(top.id()).is_some_and(|h| h.ptr_eq(&top));
                if !still_here {
                    // The hook closed it already
                    return true;
                }
                self.begin_transaction().remove(&top).commit()
            }
            None => false,
        }
    }

    /// Snapshot the stack: ids, kinds, per-screen state and nested child stacks
    pub fn store_instance_state(&self) -> NavigatorState {
        NavigatorState {
            container: self.core.container,
            screens: self.screens().iter().map(ScreenHandle::save).collect(),
        }
    }

    /// Rebuild a saved stack into this (empty) navigator. Entries whose kind
    /// is unknown or whose bag is damaged are skipped together with their
    /// child stacks; the rest of the stack is restored in order.
    pub fn restore_instance_state(
        &self,
        state: &NavigatorState,
        screens: &ScreenRegistry,
    ) -> NavResult<RestoreReport> {
        self.ensure_alive()?;
        let container = self.core.container;
        if state.container != container {
            return Err(NavError::MalformedState(format!(
                "stack saved for container {} cannot restore into {}",
                state.container, container
            )));
        }
        if !self.is_empty() {
            return Err(NavError::RestoreIntoNonEmpty(container));
        }

        let mut report = RestoreReport::default();
        let mut restored: Vec<(ScreenHandle, Option<&NavigatorState>)> = Vec::new();

        for saved in &state.screens {
            if restored.iter().any(|(h, _)| h.id() == saved.id) {
                let reason = NavError::DuplicateScreen(saved.id, container);
                if let Some(child) = &saved.child {
                    report.skip_stack(child, &reason);
                }
                report.skip(saved, reason);
                continue;
            }

            if let Some(damage) = &saved.state_error {
                let reason = NavError::MalformedState(damage.clone());
                warn!("Skipping saved screen {} in container {}: {}", saved.id, container, reason);
                if let Some(child) = &saved.child {
                    report.skip_stack(child, &reason);
                }
                report.skip(saved, reason);
                continue;
            }

            match screens.create(&saved.kind) {
                Ok(mut body) => {
                    body.restore_state(&saved.state);
                    restored.push((ScreenHandle::from_boxed(saved.id, body), saved.child.as_ref()));
                }
                Err(e) => {
                    warn!("Skipping saved screen {} in container {}: {}", saved.id, container, e);
                    if let Some(child) = &saved.child {
                        report.skip_stack(child, &e);
                    }
                    report.skip(saved, e);
                }
            }
        }

        *self.core.entries.borrow_mut() = restored.iter().map(|(h, _)| h.clone()).collect();
        for (handle, _) in &restored {
            handle.node.bind(&self.core);
            self.core.env.registry.begin_scope(ScopeId::Screen(handle.id()));
        }
        report.restored += restored.len();

        let env = Rc::clone(&self.core.env);
        env.enter();
        for (handle, child_state) in &restored {
            let Some(child_state) = child_state else {
                continue;
            };
            let child_report = handle
                .context()
                .try_child_navigator()
                .and_then(|child| child.restore_instance_state(child_state, screens));
            match child_report {
                Ok(child_report) => report.merge(child_report),
                Err(e) => {
                    warn!("Dropping child stack of screen {}: {}", handle.id(), e);
                    report.skip_stack(child_state, &e);
                }
            }
        }
        for (handle, _) in &restored {
            handle.notify(None, |screen, cx| screen.on_attach(cx));
        }
        env.exit();
        env.flush();

        info!(
            "Restored {} screen(s) into container {}, skipped {}",
            restored.len(),
            container,
            report.skipped.len()
        );
        Ok(report)
    }

    /// Write the stack into a host bag under `<prefix>.<container>`
    pub fn save_into(&self, bag: &mut PersistedState) -> NavResult<()> {
        let key = self.core.env.config.state_key(self.core.container);
        let json = self.store_instance_state().to_json()?;
        bag.put_text(key, json);
        Ok(())
    }

    /// Counterpart of [`Navigator::save_into`]. A bag without this
    /// navigator's key restores nothing.
    pub fn restore_from(
        &self,
        bag: &PersistedState,
        screens: &ScreenRegistry,
    ) -> NavResult<RestoreReport> {
        let key = self.core.env.config.state_key(self.core.container);
        match bag.get_text(&key) {
            Some(json) => {
                let state = NavigatorState::from_json(json)?;
                self.restore_instance_state(&state, screens)
            }
            None => {
                debug!("No saved stack under '{}'", key);
                Ok(RestoreReport::default())
            }
        }
    }
}
