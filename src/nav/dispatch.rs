use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::navigator::Navigator;
use super::transaction::Op;
use super::{AnimPair, HostId};
use crate::config::NavConfig;
use crate::scope::{ScopeId, TopicRegistry};

/// A commit issued while screen callbacks were running
pub(crate) struct Deferred {
    pub(crate) navigator: Navigator,
    pub(crate) ops: Vec<Op>,
    pub(crate) anims: Option<AnimPair>,
}

/// State shared by every navigator under one host.
///
/// Tracks whether screen callbacks are on the stack. While they are, commits
/// are queued and applied FIFO once the outermost callback returns, so the
/// sequence being iterated is never mutated underneath it.
pub(crate) struct NavEnv {
    pub(crate) host: HostId,
    pub(crate) registry: TopicRegistry,
    pub(crate) config: NavConfig,
    alive: Cell<bool>,
    depth: Cell<u32>,
    flushing: Cell<bool>,
    deferred: RefCell<VecDeque<Deferred>>,
}

impl NavEnv {
    pub(crate) fn new(host: HostId, registry: TopicRegistry, config: NavConfig) -> Rc<Self> {
        Rc::new(Self {
            host,
            registry,
            config,
            alive: Cell::new(true),
            depth: Cell::new(0),
            flushing: Cell::new(false),
            deferred: RefCell::new(VecDeque::new()),
        })
    }

    pub(crate) fn host_scope(&self) -> ScopeId {
        ScopeId::Host(self.host)
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// Mark the host gone; queued commits are dropped
    pub(crate) fn shut_down(&self) {
        self.alive.set(false);
        let dropped = std::mem::take(&mut *self.deferred.borrow_mut());
        if !dropped.is_empty() {
            warn!(
                "Host {} shut down with {} queued commit(s), dropping them",
                self.host,
                dropped.len()
            );
        }
    }

    pub(crate) fn is_dispatching(&self) -> bool {
        self.depth.get() > 0
    }

    pub(crate) fn enter(&self) {
        self.depth.set(self.depth.get() + 1);
    }

    pub(crate) fn exit(&self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }

    pub(crate) fn defer(&self, commit: Deferred) {
        self.deferred.borrow_mut().push_back(commit);
    }

    pub(crate) fn pending_commits(&self) -> usize {
        self.deferred.borrow().len()
    }

    /// Apply queued commits in submission order. No-op while callbacks are
    /// still running or a flush is already in progress further up the stack.
    pub(crate) fn flush(&self) {
        if self.is_dispatching() || self.flushing.get() {
            return;
        }
        self.flushing.set(true);
        loop {
            let next = self.deferred.borrow_mut().pop_front();
            let Some(commit) = next else {
                break;
            };
            debug!("Applying deferred commit on container {}", commit.navigator.container());
            if let Err(e) = commit.navigator.apply(commit.ops, commit.anims) {
                warn!(
                    "Deferred commit on container {} failed: {}",
                    commit.navigator.container(),
                    e
                );
            }
        }
        self.flushing.set(false);
    }
}
