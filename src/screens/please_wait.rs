use crate::nav::{BackPress, Screen, ScreenContext};
use crate::state::PersistedState;

/// Progress overlay shown while work is in flight. Not cancelable unless asked.
#[derive(Debug, Clone, PartialEq)]
pub struct PleaseWaitDialog {
    pub message: Option<String>,
    pub cancelable: bool,
    /// ARGB tint applied to the progress indicator
    pub filter_color: u32,
}

impl Default for PleaseWaitDialog {
    fn default() -> Self {
        Self {
            message: None,
            cancelable: false,
            filter_color: 0xFFFFFFFF,
        }
    }
}

impl PleaseWaitDialog {
    pub const KIND: &'static str = "PleaseWaitDialog";

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    pub fn with_filter_color(mut self, color: u32) -> Self {
        self.filter_color = color;
        self
    }
}

impl Screen for PleaseWaitDialog {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn on_back_pressed(&mut self, _cx: &ScreenContext) -> BackPress {
        if self.cancelable {
            BackPress::Close
        } else {
            BackPress::Consume
        }
    }

    fn save_state(&self, out: &mut PersistedState) {
        out.put_bool("PleaseWaitDialog.cancelable", self.cancelable);
        out.put_opt_text("PleaseWaitDialog.message", self.message.as_deref());
        out.put_int("PleaseWaitDialog.filterColor", i64::from(self.filter_color));
    }

    fn restore_state(&mut self, state: &PersistedState) {
        self.cancelable = state.get_bool("PleaseWaitDialog.cancelable", false);
        self.message = state.get_text("PleaseWaitDialog.message").map(str::to_string);
        self.filter_color = u32::try_from(state.get_int("PleaseWaitDialog.filterColor", 0xFFFFFFFF))
            .unwrap_or(0xFFFFFFFF);
    }
}
