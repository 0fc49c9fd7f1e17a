/// Lifecycle state of a screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenLifecycle {
    /// Wrapped but never added to a navigator
    #[default]
    Created,

    /// In a navigator's active stack
    Attached,

    /// Taken off the stack, teardown in progress
    Detached,

    /// Gone for good; the handle can no longer be added anywhere
    Destroyed,
}

/// Why a screen is being destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    /// A transaction removed it
    Removed,

    /// Host is being recreated; scopes and retained state survive
    Recreate,

    /// Host is finishing; everything scoped to the screen ends
    Finish,
}

impl TeardownReason {
    /// Whether scopes owned by the destroyed screen end with it
    pub fn ends_scopes(self) -> bool {
        !matches!(self, TeardownReason::Recreate)
    }
}

/// Answer of a screen's back-press hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackPress {
    /// Let the navigator close the screen (default)
    #[default]
    Close,

    /// Event handled, keep the screen (e.g. a non-cancelable dialog)
    Consume,
}
