//! Built-in dialog screens

pub mod alert;
pub mod please_wait;

pub use alert::{AlertButton, AlertCallbacks, AlertDialog, DialogCallback};
pub use please_wait::PleaseWaitDialog;
