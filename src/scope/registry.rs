use log::{debug, info, warn};
use std::any::{Any, type_name};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use super::topic::{Topic, TopicCell};
use super::{ClientId, ScopeId};
use crate::error::{NavError, NavResult};
use crate::nav::HostId;

/// Notice queued for a client whose topic was destroyed by its scope ending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicNotice {
    pub client: ClientId,
    pub scope: ScopeId,
    pub topic: String,
}

struct TopicEntry {
    type_name: &'static str,
    payload: Rc<dyn Any>,
    /// Join order
    clients: Vec<ClientId>,
}

#[derive(Default)]
struct RegistryInner {
    live: HashSet<ScopeId>,
    topics: HashMap<ScopeId, BTreeMap<String, TopicEntry>>,
    notices: Vec<TopicNotice>,
    /// Host each client joined through, for routing notices
    owners: HashMap<ClientId, HostId>,
}

/// Keyed store of shared topics, one per (scope, id).
///
/// The handle is cheap to clone; clones share the same store. The app scope
/// is live from construction, host and screen scopes are begun and ended by
/// the navigator machinery.
#[derive(Clone)]
pub struct TopicRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicRegistry {
    pub fn new() -> Self {
        let mut inner = RegistryInner::default();
        inner.live.insert(ScopeId::App);
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// Start observing a scope. Returns false if it was already live.
    pub fn begin_scope(&self, scope: ScopeId) -> bool {
        let began = self.inner.borrow_mut().live.insert(scope);
        if began {
            debug!("Scope {} began", scope);
        }
        began
    }

    pub fn is_live(&self, scope: ScopeId) -> bool {
        self.inner.borrow().live.contains(&scope)
    }

    /// End a scope: every topic keyed under it is destroyed and each client
    /// still registered gets a [`TopicNotice`]. Returns the number of topics
    /// destroyed; ending an already ended scope destroys nothing.
    pub fn end_scope(&self, scope: ScopeId) -> usize {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            if !inner.live.remove(&scope) {
                return 0;
            }
            let removed = inner.topics.remove(&scope).unwrap_or_default();
            for (id, entry) in &removed {
                for client in &entry.clients {
                    inner.notices.push(TopicNotice {
                        client: *client,
                        scope,
                        topic: id.clone(),
                    });
                }
            }
            removed
        };

        let count = removed.len();
        if count > 0 {
            info!("Scope {} ended, destroyed {} topic(s)", scope, count);
        } else {
            debug!("Scope {} ended", scope);
        }
        // Payloads drop here, outside the borrow, in case their Drop touches the registry
        drop(removed);
        count
    }

    /// Open (and lazily create with `T::default()`) the topic `id` in `scope`
    /// and register `client` on it.
    pub fn open<T: Default + 'static>(
        &self,
        scope: ScopeId,
        id: &str,
        client: ClientId,
    ) -> NavResult<Topic<T>> {
        self.open_with(scope, id, client, T::default)
    }

    /// Like [`TopicRegistry::open`] with an explicit initializer, only called
    /// when the topic does not exist yet.
    pub fn open_with<T: 'static>(
        &self,
        scope: ScopeId,
        id: &str,
        client: ClientId,
        init: impl FnOnce() -> T,
    ) -> NavResult<Topic<T>> {
        let exists = {
            let inner = self.inner.borrow();
            if !inner.live.contains(&scope) {
                return Err(NavError::ScopeEnded(scope));
            }
            inner.topics.get(&scope).is_some_and(|t| t.contains_key(id))
        };

        // Build outside the borrow so the initializer may use the registry
        let fresh = if exists { None } else { Some(init()) };

        let mut inner = self.inner.borrow_mut();
        if !inner.live.contains(&scope) {
            return Err(NavError::ScopeEnded(scope));
        }
        let topics = inner.topics.entry(scope).or_default();
        let entry = match (topics.contains_key(id), fresh) {
            (false, Some(value)) => {
                debug!("Creating topic '{}' in scope {}", id, scope);
                topics.entry(id.to_string()).or_insert(TopicEntry {
                    type_name: type_name::<T>(),
                    payload: Rc::new(TopicCell::new(value)) as Rc<dyn Any>,
                    clients: Vec::new(),
                })
            }
            (false, None) => {
                // Existed at first look but vanished meanwhile; nothing to build from
                return Err(NavError::TopicGone(id.to_string()));
            }
            (true, _) => topics.get_mut(id).ok_or_else(|| NavError::TopicGone(id.to_string()))?,
        };

        let cell = Rc::clone(&entry.payload)
            .downcast::<TopicCell<T>>()
            .map_err(|_| {
                warn!(
                    "Topic '{}' in scope {} holds {}, requested as {}",
                    id,
                    scope,
                    entry.type_name,
                    type_name::<T>()
                );
                NavError::TopicTypeMismatch {
                    scope,
                    id: id.to_string(),
                }
            })?;

        if !entry.clients.contains(&client) {
            entry.clients.push(client);
        }

        Ok(Topic::from_cell(&cell, scope, id))
    }

    /// Deregister a client. The topic itself is left alone.
    pub fn leave<T>(&self, client: ClientId, topic: &Topic<T>) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(entry) = inner
            .topics
            .get_mut(&topic.scope())
            .and_then(|topics| topics.get_mut(topic.id()))
        else {
            return false;
        };
        let before = entry.clients.len();
        entry.clients.retain(|c| *c != client);
        entry.clients.len() != before
    }

    /// Deregister a client from every topic it joined, returns how many it left
    pub fn leave_all(&self, client: ClientId) -> usize {
        let mut inner = self.inner.borrow_mut();
        inner.owners.remove(&client);
        let mut left = 0;
        for topics in inner.topics.values_mut() {
            for entry in topics.values_mut() {
                let before = entry.clients.len();
                entry.clients.retain(|c| *c != client);
                left += before - entry.clients.len();
            }
        }
        left
    }

    /// Destroy topics in `scope` whose id starts with `prefix`, without
    /// notices. Used for per-screen retained state whose owner is gone for good.
    pub(crate) fn discard_prefix(&self, scope: ScopeId, prefix: &str) -> usize {
        let removed: Vec<TopicEntry> = {
            let mut inner = self.inner.borrow_mut();
            let Some(topics) = inner.topics.get_mut(&scope) else {
                return 0;
            };
            let keys: Vec<String> = topics
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect();
            keys.iter().filter_map(|k| topics.remove(k)).collect()
        };
        if !removed.is_empty() {
            debug!("Discarded {} topic(s) '{}*' in scope {}", removed.len(), prefix, scope);
        }
        removed.len()
    }

    pub fn contains(&self, scope: ScopeId, id: &str) -> bool {
        self.inner
            .borrow()
            .topics
            .get(&scope)
            .is_some_and(|t| t.contains_key(id))
    }

    pub fn topic_count(&self, scope: ScopeId) -> usize {
        self.inner.borrow().topics.get(&scope).map_or(0, BTreeMap::len)
    }

    /// Clients registered on a topic, in join order
    pub fn clients(&self, scope: ScopeId, id: &str) -> Vec<ClientId> {
        self.inner
            .borrow()
            .topics
            .get(&scope)
            .and_then(|t| t.get(id))
            .map(|e| e.clients.clone())
            .unwrap_or_default()
    }

    /// Drain pending destruction notices
    pub fn take_notices(&self) -> Vec<TopicNotice> {
        std::mem::take(&mut self.inner.borrow_mut().notices)
    }

    /// Record that `client` joins topics on behalf of `host`
    pub(crate) fn claim(&self, client: ClientId, host: HostId) {
        self.inner.borrow_mut().owners.insert(client, host);
    }

    /// Host a client joined through, if it is still registered
    pub fn owner_of(&self, client: ClientId) -> Option<HostId> {
        self.inner.borrow().owners.get(&client).copied()
    }

    /// Put back notices addressed to another host, ahead of newer ones
    pub(crate) fn requeue_notices(&self, mut notices: Vec<TopicNotice>) {
        let mut inner = self.inner.borrow_mut();
        notices.append(&mut inner.notices);
        inner.notices = notices;
    }
}
