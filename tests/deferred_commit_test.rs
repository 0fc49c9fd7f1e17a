//! Commits issued from inside screen callbacks are queued and applied in order

mod common;

use common::{Recorder, drain, event_log, host, name_of, recorder};
use navscope::nav::ScreenHandle;
use std::cell::Cell;
use std::rc::Rc;

/// Test that commits from an attach callback are deferred, then applied FIFO
#[test]
fn test_commits_from_attach_are_fifo() {
    let log = event_log();
    let host = host();
    let nav = host.navigator();

    let pending_seen = Rc::new(Cell::new(0));
    let pending_in_hook = Rc::clone(&pending_seen);
    let hook_log = Rc::clone(&log);
    let launcher = Recorder::new("launcher", &log).with_on_attach(move |cx| {
        let parent = cx.parent_navigator();
        assert!(recorder("first", &hook_log).open(&parent));
        assert!(recorder("second", &hook_log).open(&parent));
        // Nothing applied yet, both commits wait for the dispatch to end
        assert_eq!(parent.child_count(), 1);
        pending_in_hook.set(parent.pending_commits());
    });

    assert!(ScreenHandle::new(launcher).open(&nav));

    assert_eq!(pending_seen.get(), 2);
    assert_eq!(nav.pending_commits(), 0);
    assert_eq!(drain(&log), vec!["attach:launcher", "attach:first", "attach:second"]);
    let names: Vec<String> = nav.screens().iter().map(name_of).collect();
    assert_eq!(names, vec!["launcher", "first", "second"]);
}

/// Test that a screen closing itself from its attach callback is applied after the dispatch
#[test]
fn test_self_close_during_attach() {
    let log = event_log();
    let host = host();
    let nav = host.navigator();

    let flash = ScreenHandle::new(Recorder::new("flash", &log).with_on_attach(|cx| {
        assert!(cx.close());
    }));
    assert!(flash.open(&nav));

    assert!(nav.is_empty());
    assert_eq!(
        drain(&log),
        vec!["attach:flash", "dismiss:flash", "detach:flash", "destroy-Removed:flash"]
    );
}

/// Test that a queued commit whose target is gone by flush time is dropped
#[test]
fn test_queued_commit_on_torn_down_navigator_is_dropped() {
    let log = event_log();
    let host = host();
    let root = host.navigator();

    let parent = ScreenHandle::new(Recorder::new("parent", &log).with_container(2));
    parent.open(&root);
    let child_nav = parent.context().child_navigator();

    // While `parent` is handled, close it, then queue a push into its child stack
    let late = recorder("late", &log);
    let pushed = parent.with::<Recorder, _>(|_, cx| {
        cx.close();
        late.open(&child_nav)
    });

    assert_eq!(pushed, Some(true));
    assert!(root.is_empty());
    assert!(child_nav.is_torn_down());
    assert!(child_nav.is_empty());
    assert_eq!(late.lifecycle(), navscope::nav::ScreenLifecycle::Created);
}
