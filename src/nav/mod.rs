//! Hierarchical navigator
//!
//! A [`Navigator`] keeps an ordered stack of [`Screen`]s for one container.
//! Screens that declare a container get a child navigator on first use, so
//! stacks nest. Mutations go through [`Transaction`]s that apply atomically;
//! back-presses travel depth-first, the deepest non-empty child navigator
//! getting first refusal. A [`NavHost`] owns the root navigator and models
//! the window lifetime (recreate, finish).

mod dispatch;
pub mod factory;
pub mod host;
pub mod ids;
pub mod lifecycle;
pub mod navigator;
pub mod screen;
pub mod transaction;

pub use factory::{FnFactory, ScreenFactory, ScreenRegistry};
pub use host::NavHost;
pub use ids::{AnimPair, AnimToken, ContainerId, HostId, ScreenId};
pub use lifecycle::{BackPress, ScreenLifecycle, TeardownReason};
pub use navigator::Navigator;
pub use screen::{Screen, ScreenContext, ScreenHandle};
pub use transaction::Transaction;
