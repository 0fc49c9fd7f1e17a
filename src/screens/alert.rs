use log::{debug, warn};
use std::fmt;
use std::rc::Rc;

use crate::nav::{BackPress, Screen, ScreenContext};
use crate::state::PersistedState;

pub type DialogCallback = Rc<dyn Fn()>;

/// Button callbacks of an [`AlertDialog`]. They cannot be serialized, so
/// they travel through the retained side-registry across recreation.
#[derive(Clone, Default)]
pub struct AlertCallbacks {
    pub on_ok: Option<DialogCallback>,
    pub on_cancel: Option<DialogCallback>,
    pub on_reset: Option<DialogCallback>,
}

impl AlertCallbacks {
    pub fn is_empty(&self) -> bool {
        self.on_ok.is_none() && self.on_cancel.is_none() && self.on_reset.is_none()
    }
}

impl fmt::Debug for AlertCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertCallbacks")
            .field("on_ok", &self.on_ok.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .field("on_reset", &self.on_reset.is_some())
            .finish()
    }
}

/// Which button a click helper fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertButton {
    Ok,
    Cancel,
    Reset,
}

/// Modal dialog with a title, a message and up to three buttons
#[derive(Debug, Clone)]
pub struct AlertDialog {
    /// Back-press and the cancel action may dismiss the dialog
    pub cancelable: bool,
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub message: Option<String>,
    pub ok_text: Option<String>,
    pub cancel_text: Option<String>,
    pub reset_text: Option<String>,
    /// Fraction of the display, 0 leaves the dimension to the renderer
    pub width_percent: f64,
    pub height_percent: f64,
    pub background_color: Option<u32>,
    pub dismiss_on_click_button: bool,
    pub dismiss_on_touch_outside: bool,
    pub full_screen: bool,
    callbacks: AlertCallbacks,
}

impl Default for AlertDialog {
    fn default() -> Self {
        Self {
            cancelable: true,
            title: None,
            sub_title: None,
            message: None,
            ok_text: None,
            cancel_text: None,
            reset_text: None,
            width_percent: 0.85,
            height_percent: 0.0,
            background_color: None,
            dismiss_on_click_button: true,
            dismiss_on_touch_outside: true,
            full_screen: false,
            callbacks: AlertCallbacks::default(),
        }
    }
}

impl AlertDialog {
    pub const KIND: &'static str = "AlertDialog";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_sub_title(mut self, sub_title: impl Into<String>) -> Self {
        self.sub_title = Some(sub_title.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    pub fn with_ok_button(mut self, text: impl Into<String>, on_ok: impl Fn() + 'static) -> Self {
        self.ok_text = Some(text.into());
        self.callbacks.on_ok = Some(Rc::new(on_ok));
        self
    }

    pub fn with_cancel_button(
        mut self,
        text: impl Into<String>,
        on_cancel: impl Fn() + 'static,
    ) -> Self {
        self.cancel_text = Some(text.into());
        self.callbacks.on_cancel = Some(Rc::new(on_cancel));
        self
    }

    pub fn with_reset_button(
        mut self,
        text: impl Into<String>,
        on_reset: impl Fn() + 'static,
    ) -> Self {
        self.reset_text = Some(text.into());
        self.callbacks.on_reset = Some(Rc::new(on_reset));
        self
    }

    /// Width and height as fractions of the display
    pub fn with_dimension_percent(mut self, width: f64, height: f64) -> Self {
        self.width_percent = width;
        self.height_percent = height;
        self
    }

    pub fn with_background_color(mut self, color: u32) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn with_dismiss_on_click_button(mut self, dismiss: bool) -> Self {
        self.dismiss_on_click_button = dismiss;
        self
    }

    pub fn with_dismiss_on_touch_outside(mut self, dismiss: bool) -> Self {
        self.dismiss_on_touch_outside = dismiss;
        self
    }

    pub fn with_full_screen(mut self, full_screen: bool) -> Self {
        self.full_screen = full_screen;
        self
    }

    pub fn callbacks(&self) -> &AlertCallbacks {
        &self.callbacks
    }

    pub fn has_callbacks(&self) -> bool {
        !self.callbacks.is_empty()
    }

    /// Run the button's callback, then close if `dismiss_on_click_button`
    pub fn click(&mut self, cx: &ScreenContext, button: AlertButton) {
        let callback = match button {
            AlertButton::Ok => self.callbacks.on_ok.clone(),
            AlertButton::Cancel => self.callbacks.on_cancel.clone(),
            AlertButton::Reset => self.callbacks.on_reset.clone(),
        };
        debug!("{:?} clicked on dialog {}", button, cx.id());
        if let Some(callback) = callback {
            callback();
        }
        if self.dismiss_on_click_button {
            cx.close();
        }
    }

    pub fn click_ok(&mut self, cx: &ScreenContext) {
        self.click(cx, AlertButton::Ok);
    }

    pub fn click_cancel(&mut self, cx: &ScreenContext) {
        self.click(cx, AlertButton::Cancel);
    }

    pub fn click_reset(&mut self, cx: &ScreenContext) {
        self.click(cx, AlertButton::Reset);
    }

    /// Touch outside the dialog content. Returns whether it closes.
    pub fn touch_outside(&mut self, cx: &ScreenContext) -> bool {
        if self.dismiss_on_touch_outside {
            cx.close()
        } else {
            false
        }
    }

    /// Keep callbacks in step with the retained store: a recreated dialog
    /// adopts the stored ones, a fresh one publishes its own.
    fn sync_callbacks(&mut self, cx: &ScreenContext) {
        let retained = match cx.retained::<AlertCallbacks>() {
            Ok(retained) => retained,
            Err(e) => {
                warn!("Dialog {} cannot reach its retained callbacks: {}", cx.id(), e);
                return;
            }
        };

        if self.callbacks.is_empty() {
            if let Ok(stored) = retained.get() {
                self.callbacks = stored;
            }
        } else if let Err(e) = retained.set(self.callbacks.clone()) {
            warn!("Dialog {} failed to retain its callbacks: {}", cx.id(), e);
        }
    }
}

impl Screen for AlertDialog {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn on_attach(&mut self, cx: &ScreenContext) {
        self.sync_callbacks(cx);
    }

    fn on_back_pressed(&mut self, _cx: &ScreenContext) -> BackPress {
        if !self.cancelable {
            return BackPress::Consume;
        }
        if let Some(on_cancel) = self.callbacks.on_cancel.clone() {
            on_cancel();
        }
        BackPress::Close
    }

    fn save_state(&self, out: &mut PersistedState) {
        out.put_bool("AlertDialog.cancelable", self.cancelable);
        out.put_opt_text("AlertDialog.title", self.title.as_deref());
        out.put_opt_text("AlertDialog.subTitle", self.sub_title.as_deref());
        out.put_opt_text("AlertDialog.message", self.message.as_deref());
        out.put_opt_text("AlertDialog.okText", self.ok_text.as_deref());
        out.put_opt_text("AlertDialog.cancelText", self.cancel_text.as_deref());
        out.put_opt_text("AlertDialog.resetText", self.reset_text.as_deref());
        if self.width_percent > 0.0 {
            out.put_float("AlertDialog.widthPercent", self.width_percent);
        }
        if self.height_percent > 0.0 {
            out.put_float("AlertDialog.heightPercent", self.height_percent);
        }
        if let Some(color) = self.background_color {
            out.put_int("AlertDialog.backgroundColor", i64::from(color));
        }
        out.put_bool("AlertDialog.dismissOnClickButton", self.dismiss_on_click_button);
        out.put_bool("AlertDialog.dismissOnTouchOutside", self.dismiss_on_touch_outside);
        out.put_bool("AlertDialog.fullScreen", self.full_screen);
    }

    fn restore_state(&mut self, state: &PersistedState) {
        let defaults = Self::default();
        self.cancelable = state.get_bool("AlertDialog.cancelable", defaults.cancelable);
        self.title = state.get_text("AlertDialog.title").map(str::to_string);
        self.sub_title = state.get_text("AlertDialog.subTitle").map(str::to_string);
        self.message = state.get_text("AlertDialog.message").map(str::to_string);
        self.ok_text = state.get_text("AlertDialog.okText").map(str::to_string);
        self.cancel_text = state.get_text("AlertDialog.cancelText").map(str::to_string);
        self.reset_text = state.get_text("AlertDialog.resetText").map(str::to_string);
        self.width_percent = state.get_float("AlertDialog.widthPercent", 0.0);
        self.height_percent = state.get_float("AlertDialog.heightPercent", 0.0);
        self.background_color = state
            .contains("AlertDialog.backgroundColor")
            .then(|| state.get_int("AlertDialog.backgroundColor", 0))
            .and_then(|color| u32::try_from(color).ok());
        self.dismiss_on_click_button =
            state.get_bool("AlertDialog.dismissOnClickButton", defaults.dismiss_on_click_button);
        self.dismiss_on_touch_outside =
            state.get_bool("AlertDialog.dismissOnTouchOutside", defaults.dismiss_on_touch_outside);
        self.full_screen = state.get_bool("AlertDialog.fullScreen", defaults.full_screen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        let dialog = AlertDialog::new()
            .with_title("Delete")
            .with_message("Delete 3 files?")
            .with_cancelable(false)
            .with_dimension_percent(0.5, 0.4)
            .with_background_color(0xFF00FF00)
            .with_full_screen(true);

        let mut bag = PersistedState::new();
        dialog.save_state(&mut bag);

        let mut restored = AlertDialog::default();
        restored.restore_state(&bag);

        assert!(!restored.cancelable);
        assert_eq!(restored.title.as_deref(), Some("Delete"));
        assert_eq!(restored.message.as_deref(), Some("Delete 3 files?"));
        assert_eq!(restored.sub_title, None);
        assert_eq!(restored.width_percent, 0.5);
        assert_eq!(restored.height_percent, 0.4);
        assert_eq!(restored.background_color, Some(0xFF00FF00));
        assert!(restored.full_screen);
        assert!(restored.dismiss_on_click_button);
    }

    #[test]
    fn test_callbacks_are_not_persisted() {
        let dialog = AlertDialog::new().with_ok_button("OK", || {});
        let mut bag = PersistedState::new();
        dialog.save_state(&mut bag);

        let mut restored = AlertDialog::default();
        restored.restore_state(&bag);

        assert_eq!(restored.ok_text.as_deref(), Some("OK"));
        assert!(!restored.has_callbacks());
    }

    #[test]
    fn test_empty_bag_keeps_defaults() {
        let mut dialog = AlertDialog::default();
        dialog.restore_state(&PersistedState::new());

        assert!(dialog.cancelable);
        assert!(dialog.dismiss_on_touch_outside);
        assert_eq!(dialog.background_color, None);
    }
}
