use serde::{Deserialize, Serialize};

use super::PersistedState;
use crate::error::{NavError, NavResult};
use crate::nav::{ContainerId, ScreenId};

/// Serialized form of one navigator: its container and the active stack,
/// bottom first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigatorState {
    pub container: ContainerId,
    #[serde(default)]
    pub screens: Vec<SavedScreen>,
}

/// One stack entry inside a [`NavigatorState`]
///
/// The per-screen bag is read leniently: a bag that does not parse leaves
/// `state` empty and records why in `state_error`, so one damaged entry
/// never fails the whole stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSavedScreen")]
pub struct SavedScreen {
    pub id: ScreenId,
    pub kind: String,
    pub state: PersistedState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<NavigatorState>,
    #[serde(skip)]
    pub state_error: Option<String>,
}

#[derive(Deserialize)]
struct RawSavedScreen {
    id: ScreenId,
    kind: String,
    #[serde(default)]
    state: Option<serde_json::Value>,
    #[serde(default)]
    child: Option<NavigatorState>,
}

impl From<RawSavedScreen> for SavedScreen {
    fn from(raw: RawSavedScreen) -> Self {
        let (state, state_error) = match raw.state.map(serde_json::from_value::<PersistedState>) {
            None => (PersistedState::new(), None),
            Some(Ok(state)) => (state, None),
            Some(Err(e)) => (PersistedState::new(), Some(e.to_string())),
        };
        Self {
            id: raw.id,
            kind: raw.kind,
            state,
            child: raw.child,
            state_error,
        }
    }
}

impl SavedScreen {
    pub fn new(id: ScreenId, kind: impl Into<String>, state: PersistedState) -> Self {
        Self {
            id,
            kind: kind.into(),
            state,
            child: None,
            state_error: None,
        }
    }

    pub fn with_child(mut self, child: Option<NavigatorState>) -> Self {
        self.child = child;
        self
    }
}

impl NavigatorState {
    pub fn empty(container: ContainerId) -> Self {
        Self {
            container,
            screens: Vec::new(),
        }
    }

    /// Total number of screens including nested child stacks
    pub fn total_screens(&self) -> usize {
        self.screens
            .iter()
            .map(|s| 1 + s.child.as_ref().map_or(0, NavigatorState::total_screens))
            .sum()
    }

    pub fn to_json(&self) -> NavResult<String> {
        serde_json::to_string(self).map_err(|e| NavError::MalformedState(e.to_string()))
    }

    pub fn from_json(json: &str) -> NavResult<Self> {
        serde_json::from_str(json).map_err(|e| NavError::MalformedState(e.to_string()))
    }
}

/// A saved screen that could not be brought back
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedScreen {
    pub id: ScreenId,
    pub kind: String,
    pub reason: NavError,
}

/// Outcome of a restore: how many screens came back and which were dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreReport {
    pub restored: usize,
    pub skipped: Vec<SkippedScreen>,
}

impl RestoreReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn merge(&mut self, other: RestoreReport) {
        self.restored += other.restored;
        self.skipped.extend(other.skipped);
    }

    pub(crate) fn skip(&mut self, saved: &SavedScreen, reason: NavError) {
        self.skipped.push(SkippedScreen {
            id: saved.id,
            kind: saved.kind.clone(),
            reason,
        });
    }

    /// Record every screen of an unrestorable child stack
    pub(crate) fn skip_stack(&mut self, state: &NavigatorState, reason: &NavError) {
        for saved in &state.screens {
            self.skip(saved, reason.clone());
            if let Some(child) = &saved.child {
                self.skip_stack(child, reason);
            }
        }
    }
}
