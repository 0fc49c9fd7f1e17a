//! Scope registry: shared topics bound to a scope owner's lifecycle
//!
//! Any unit can open a topic by id and [`ScopeKind`]. Every caller that
//! resolves to the same [`ScopeId`] gets the same payload until that scope
//! ends. Ending the scope destroys its topics even when clients are still
//! registered; clients leaving never destroys anything. Binding destruction
//! to the scope keeps state alive through the short zero-client window of a
//! recreation.

pub mod registry;
pub mod topic;

pub use registry::{TopicNotice, TopicRegistry};
pub use topic::Topic;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::nav::{HostId, ScreenId};

/// Which owner a topic request should be bound to, relative to the requester
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// The requesting unit itself
    Own,
    /// The structural host: parent screen, or the root host for top-level screens
    Host,
    /// Process-wide singleton
    App,
}

/// A resolved lifecycle owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScopeId {
    App,
    Host(HostId),
    Screen(ScreenId),
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeId::App => write!(f, "app"),
            ScopeId::Host(id) => write!(f, "host:{}", id),
            ScopeId::Screen(id) => write!(f, "screen:{}", id),
        }
    }
}

/// Identity of a topic client. A recreated screen is a new client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client:{}", self.0)
    }
}
