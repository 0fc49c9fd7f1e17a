//! Integration tests for instance-state save/restore and host recreation

mod common;

use common::{drain, event_log, host, name_of, nested, recorder, screen_registry};
use navscope::nav::{ContainerId, Screen, ScreenHandle, ScreenId, ScreenLifecycle};
use navscope::scope::TopicRegistry;
use navscope::screens::{AlertDialog, PleaseWaitDialog};
use navscope::state::NavigatorState;
use navscope::{NavConfig, NavError, NavHost, PersistedState};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Default)]
struct Ghost;

impl Screen for Ghost {
    fn kind(&self) -> &'static str {
        "Ghost"
    }
}

/// Test that a nested tree survives a process-death round trip through JSON
#[test]
fn test_save_restore_round_trip_preserves_tree() {
    let log = event_log();
    let first = host();
    let root = first.navigator();

    let home = nested("home", 2, &log);
    let top = recorder("top", &log);
    assert!(root.begin_transaction().add(&home).add(&top).commit());
    let child = home.context().child_navigator();
    let detail = recorder("detail", &log);
    let edit = recorder("edit", &log);
    assert!(child.begin_transaction().add(&detail).add(&edit).commit());

    let bag = first.save_state().unwrap();
    let json = bag.to_json().unwrap();
    first.finish();

    let second = host();
    let restored = PersistedState::from_json(&json).unwrap();
    let report = second.restore_state(&restored, &screen_registry(&log)).unwrap();
    assert_eq!(report.restored, 4);
    assert!(report.is_complete());

    let root = second.navigator();
    let ids: Vec<_> = root.screens().iter().map(|h| h.id()).collect();
    assert_eq!(ids, vec![home.id(), top.id()]);

    let home_again = root.find(home.id()).unwrap();
    assert_eq!(name_of(&home_again), "home");
    assert_eq!(home_again.container_id(), Some(ContainerId(2)));
    let child_again = home_again.child_navigator().unwrap();
    let names: Vec<String> = child_again.screens().iter().map(name_of).collect();
    assert_eq!(names, vec!["detail", "edit"]);
    assert_eq!(child_again.top().unwrap().lifecycle(), ScreenLifecycle::Attached);
}

/// Test that children attach before their parent when a tree is restored
#[test]
fn test_restore_attach_order() {
    let log = event_log();
    let first = host();
    let home = nested("home", 2, &log);
    home.open(&first.navigator());
    recorder("detail", &log).open(&home.context().child_navigator());
    let bag = first.save_state().unwrap();

    let second = host();
    drain(&log);
    second.restore_state(&bag, &screen_registry(&log)).unwrap();

    assert_eq!(drain(&log), vec!["attach:detail", "attach:home"]);
}

/// Test that an unknown kind is skipped without corrupting the rest of the stack
#[test]
fn test_unknown_kind_is_skipped() {
    let log = event_log();
    let first = host();
    let a = recorder("A", &log);
    let ghost = ScreenHandle::new(Ghost);
    let c = recorder("C", &log);
    assert!(first.navigator().begin_transaction().add(&a).add(&ghost).add(&c).commit());
    let bag = first.save_state().unwrap();

    let second = host();
    let report = second.restore_state(&bag, &screen_registry(&log)).unwrap();

    assert_eq!(report.restored, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].id, ghost.id());
    assert_eq!(report.skipped[0].reason, NavError::UnknownScreenKind("Ghost".into()));
    let ids: Vec<_> = second.navigator().screens().iter().map(|h| h.id()).collect();
    assert_eq!(ids, vec![a.id(), c.id()]);
}

/// Test that non-finite floats survive a process-death round trip
#[test]
fn test_non_finite_floats_round_trip() {
    let log = event_log();
    let first = host();
    let a = recorder("A", &log);
    let dialog =
        ScreenHandle::new(AlertDialog::new().with_dimension_percent(f64::INFINITY, f64::NAN));
    let c = recorder("C", &log);
    assert!(first.navigator().begin_transaction().add(&a).add(&dialog).add(&c).commit());

    let json = first.save_state().unwrap().to_json().unwrap();
    let bag = PersistedState::from_json(&json).unwrap();
    let second = host();
    let report = second.restore_state(&bag, &screen_registry(&log)).unwrap();

    assert_eq!(report.restored, 3);
    let again = second.navigator().find(dialog.id()).unwrap();
    let (width, height) = again
        .peek::<AlertDialog, _>(|d| (d.width_percent, d.height_percent))
        .unwrap();
    assert_eq!(width, f64::INFINITY);
    assert!(height.is_nan());
}

/// Test that one damaged bag only costs its own screen
#[test]
fn test_damaged_entry_keeps_siblings() {
    let (a, b, c) = (ScreenId::new(), ScreenId::new(), ScreenId::new());
    let stack = format!(
        r#"{{"container": 1, "screens": [
            {{"id": "{}", "kind": "PleaseWaitDialog",
              "state": {{"PleaseWaitDialog.message": {{"type": "text", "value": "one"}}}}}},
            {{"id": "{}", "kind": "PleaseWaitDialog",
              "state": {{"PleaseWaitDialog.message": {{"type": "float", "value": null}}}}}},
            {{"id": "{}", "kind": "PleaseWaitDialog"}}
        ]}}"#,
        a, b, c
    );
    let mut bag = PersistedState::new();
    bag.put_text("navigator.1", stack);

    let host = host();
    let report = host.restore_state(&bag, &navscope::ScreenRegistry::with_builtin()).unwrap();

    assert_eq!(report.restored, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].id, b);
    assert!(matches!(report.skipped[0].reason, NavError::MalformedState(_)));
    let ids: Vec<_> = host.navigator().screens().iter().map(|h| h.id()).collect();
    assert_eq!(ids, vec![a, c]);
    let first = host.navigator().find(a).unwrap();
    assert_eq!(
        first.peek::<PleaseWaitDialog, _>(|d| d.message.clone()),
        Some(Some("one".to_string()))
    );
}

/// Test that recreating from inside a screen callback is refused
#[test]
fn test_recreate_inside_callback_is_refused() {
    let log = event_log();
    let host = Rc::new(host());
    let weak = Rc::downgrade(&host);
    let outcome = Rc::new(RefCell::new(None));
    let seen = Rc::clone(&outcome);
    let screens = screen_registry(&log);
    let hook_log = Rc::clone(&log);

    let eager = ScreenHandle::new(common::Recorder::new("eager", &log).with_on_attach(move |_| {
        if let Some(host) = weak.upgrade() {
            let result = host.recreate(&screen_registry(&hook_log));
            *seen.borrow_mut() = Some(result.err());
        }
    }));
    assert!(eager.open(&host.navigator()));

    assert_eq!(*outcome.borrow(), Some(Some(NavError::Dispatching)));
    assert_eq!(eager.lifecycle(), ScreenLifecycle::Attached);

    // Outside callbacks the same call goes through
    let report = host.recreate(&screens).unwrap();
    assert_eq!(report.restored, 1);
}

/// Test restore preconditions
#[test]
fn test_restore_rejects_bad_targets() {
    let log = event_log();
    let host = host();
    let nav = host.navigator();
    let screens = screen_registry(&log);

    let foreign = NavigatorState::empty(ContainerId(9));
    assert!(matches!(
        nav.restore_instance_state(&foreign, &screens),
        Err(NavError::MalformedState(_))
    ));

    recorder("A", &log).open(&nav);
    let mine = nav.store_instance_state();
    assert_eq!(
        nav.restore_instance_state(&mine, &screens).err(),
        Some(NavError::RestoreIntoNonEmpty(ContainerId(1)))
    );

    assert!(nav.restore_from(&PersistedState::new(), &screens).unwrap().restored == 0);
}

/// Test that the host bag key follows the configured prefix
#[test]
fn test_state_key_prefix() {
    let log = event_log();
    let host = NavHost::new(
        TopicRegistry::new(),
        NavConfig::default().with_state_key_prefix("stack").with_root_container(ContainerId(4)),
    );
    recorder("A", &log).open(&host.navigator());

    let bag = host.save_state().unwrap();
    assert!(bag.contains("stack.4"));
    assert_eq!(bag.len(), 1);
}

/// Test recreation keeps ids and replays teardown with the recreate reason
#[test]
fn test_recreate_keeps_ids() {
    let log = event_log();
    let host = host();
    let home = nested("home", 2, &log);
    home.open(&host.navigator());
    let kid = recorder("kid", &log);
    kid.open(&home.context().child_navigator());
    drain(&log);

    let report = host.recreate(&screen_registry(&log)).unwrap();
    assert_eq!(report.restored, 2);

    let events = drain(&log);
    assert!(events.contains(&"destroy-Recreate:kid".to_string()));
    assert!(events.contains(&"destroy-Recreate:home".to_string()));
    assert_eq!(home.lifecycle(), ScreenLifecycle::Destroyed);

    let kid_again = host.navigator().find_in_tree(kid.id()).unwrap();
    assert!(!kid_again.ptr_eq(&kid));
    assert_eq!(name_of(&kid_again), "kid");
}

/// Test that alert callbacks come back after recreation and go away on finish
#[test]
fn test_alert_callbacks_survive_recreate() {
    let host = host();
    let clicks = Rc::new(Cell::new(0));
    let counter = Rc::clone(&clicks);
    let dialog = ScreenHandle::new(
        AlertDialog::new()
            .with_message("Discard changes?")
            .with_ok_button("Discard", move || counter.set(counter.get() + 1)),
    );
    assert!(dialog.open(&host.navigator()));
    assert_eq!(host.registry().topic_count(host.scope()), 1);

    host.recreate(&navscope::ScreenRegistry::with_builtin()).unwrap();

    let again = host.navigator().find(dialog.id()).unwrap();
    let adopted = again.peek::<AlertDialog, _>(|d| d.has_callbacks());
    assert_eq!(adopted, Some(true));
    assert_eq!(
        again.peek::<AlertDialog, _>(|d| d.message.clone()),
        Some(Some("Discard changes?".to_string()))
    );

    again.with::<AlertDialog, _>(|d, cx| d.click_ok(cx));
    assert_eq!(clicks.get(), 1);
    assert!(host.navigator().is_empty());
    // Removed for good, so its retained callbacks are discarded
    assert_eq!(host.registry().topic_count(host.scope()), 0);
}

/// Test back-press policy of the built-in dialogs
#[test]
fn test_dialog_back_press_policy() {
    let host = host();
    let nav = host.navigator();

    let cancelled = Rc::new(Cell::new(false));
    let flag = Rc::clone(&cancelled);
    let cancelable =
        ScreenHandle::new(AlertDialog::new().with_cancel_button("Cancel", move || flag.set(true)));
    let blocking = ScreenHandle::new(AlertDialog::new().with_cancelable(false));
    let waiting = ScreenHandle::new(PleaseWaitDialog::new("Saving"));

    assert!(cancelable.open(&nav));
    assert!(host.handle_back_pressed());
    assert!(cancelled.get());
    assert!(nav.is_empty());

    assert!(blocking.open(&nav));
    assert!(host.handle_back_pressed());
    assert_eq!(nav.child_count(), 1);

    assert!(waiting.open(&nav));
    assert!(host.handle_back_pressed());
    assert_eq!(nav.child_count(), 2);
}

/// Test that button clicks honor dismiss_on_click_button
#[test]
fn test_alert_click_without_dismiss() {
    let host = host();
    let nav = host.navigator();
    let dialog = ScreenHandle::new(
        AlertDialog::new()
            .with_dismiss_on_click_button(false)
            .with_dismiss_on_touch_outside(false),
    );
    dialog.open(&nav);

    dialog.with::<AlertDialog, _>(|d, cx| d.click_cancel(cx));
    assert_eq!(nav.child_count(), 1);

    let closed = dialog.with::<AlertDialog, _>(|d, cx| d.touch_outside(cx));
    assert_eq!(closed, Some(false));
    assert!(dialog.with::<PleaseWaitDialog, _>(|_, _| ()).is_none());
}
