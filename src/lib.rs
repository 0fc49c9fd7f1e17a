//! Hierarchical screen navigation with lifecycle-scoped shared state.
//!
//! - [`nav`]: navigators, transactions, back-press routing and the host
//!   that owns the root stack.
//! - [`scope`]: topics keyed by scope owner, destroyed when the scope ends.
//! - [`state`]: the instance-state bag and serialized navigator stacks.
//! - [`screens`]: built-in dialogs.

pub mod cli;
pub mod config;
pub mod error;
pub mod nav;
pub mod scope;
pub mod screens;
pub mod state;

pub use config::NavConfig;
pub use error::{NavError, NavResult};
pub use nav::{NavHost, Navigator, Screen, ScreenContext, ScreenHandle, ScreenRegistry, Transaction};
pub use scope::{ScopeId, ScopeKind, Topic, TopicRegistry};
pub use state::PersistedState;
