//! Error taxonomy shared by the navigator and the topic registry
//!
//! Three families of failure exist:
//! - configuration errors (`MissingContainer`, `NoParentNavigator`,
//!   `ContainerConflict`): wiring mistakes. The non-`try_` accessors panic on them.
//! - stale operations (`TornDown`, `ScopeEnded`, `NotAttached`, ...): the
//!   operation becomes a no-op and the caller gets a failure status.
//! - state resolution (`UnknownScreenKind`, `MalformedState`): the offending
//!   entry is skipped during restore and the rest of the stack continues.

use crate::nav::{ContainerId, ScreenId};
use crate::scope::ScopeId;

pub type NavResult<T> = Result<T, NavError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    #[error("screen {0} does not declare a child container")]
    MissingContainer(ScreenId),

    #[error("screen {0} has no reachable parent navigator")]
    NoParentNavigator(ScreenId),

    #[error("container {0} is already used by the enclosing navigator")]
    ContainerConflict(ContainerId),

    #[error("navigator for container {0} has been torn down")]
    TornDown(ContainerId),

    #[error("scope {0} has ended")]
    ScopeEnded(ScopeId),

    #[error("screen {0} is not attached to a navigator")]
    NotAttached(ScreenId),

    #[error("screen {0} is already attached to a navigator")]
    AlreadyAttached(ScreenId),

    #[error("screen {0} has been destroyed")]
    ScreenDestroyed(ScreenId),

    #[error("screen {0} is not in container {1}")]
    ScreenNotFound(ScreenId, ContainerId),

    #[error("screen {0} is already in container {1}")]
    DuplicateScreen(ScreenId, ContainerId),

    #[error("topic '{id}' in scope {scope} holds a different payload type")]
    TopicTypeMismatch { scope: ScopeId, id: String },

    #[error("topic '{0}' has been destroyed")]
    TopicGone(String),

    #[error("unknown screen kind '{0}'")]
    UnknownScreenKind(String),

    #[error("malformed navigator state: {0}")]
    MalformedState(String),

    #[error("cannot restore into container {0}: it already holds screens")]
    RestoreIntoNonEmpty(ContainerId),

    #[error("cannot rebuild the host while screen callbacks are running")]
    Dispatching,
}

impl NavError {
    /// Wiring mistakes that should never be handled at runtime
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            NavError::MissingContainer(_)
                | NavError::NoParentNavigator(_)
                | NavError::ContainerConflict(_)
        )
    }

    /// Operations issued against something that no longer exists
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            NavError::TornDown(_)
                | NavError::ScopeEnded(_)
                | NavError::NotAttached(_)
                | NavError::ScreenDestroyed(_)
                | NavError::TopicGone(_)
        )
    }
}
