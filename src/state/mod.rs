//! Instance-state persistence protocol
//!
//! Screens write primitive fields into a [`PersistedState`] before they are
//! destroyed and read them back after recreation. Navigators serialize their
//! stack as a [`NavigatorState`]. Non-serializable state (callbacks) does not
//! belong here; it lives in the retained side-registry, see
//! [`crate::nav::ScreenContext::retained`].

pub mod persisted;
pub mod snapshot;

pub use persisted::{PersistedState, StateValue};
pub use snapshot::{NavigatorState, RestoreReport, SavedScreen, SkippedScreen};
