//! Shared fixtures for the integration tests
#![allow(dead_code)]

use navscope::nav::{
    BackPress, ContainerId, NavHost, Screen, ScreenContext, ScreenHandle, ScreenRegistry,
    TeardownReason,
};
use navscope::scope::{TopicNotice, TopicRegistry};
use navscope::{NavConfig, PersistedState};
use std::cell::RefCell;
use std::rc::Rc;

pub type EventLog = Rc<RefCell<Vec<String>>>;

pub type AttachHook = Rc<dyn Fn(&ScreenContext)>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn drain(log: &EventLog) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

/// Screen that records every callback it receives as `"<event>:<name>"`
pub struct Recorder {
    pub name: String,
    pub container: Option<ContainerId>,
    pub back: BackPress,
    pub on_attach: Option<AttachHook>,
    log: EventLog,
}

impl Recorder {
    pub fn new(name: &str, log: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            container: None,
            back: BackPress::Close,
            on_attach: None,
            log: Rc::clone(log),
        }
    }

    pub fn with_container(mut self, container: u32) -> Self {
        self.container = Some(ContainerId(container));
        self
    }

    pub fn with_back(mut self, back: BackPress) -> Self {
        self.back = back;
        self
    }

    pub fn with_on_attach(mut self, hook: impl Fn(&ScreenContext) + 'static) -> Self {
        self.on_attach = Some(Rc::new(hook));
        self
    }

    fn record(&self, event: &str) {
        self.log.borrow_mut().push(format!("{}:{}", event, self.name));
    }
}

impl Screen for Recorder {
    fn kind(&self) -> &'static str {
        "Recorder"
    }

    fn container_id(&self) -> Option<ContainerId> {
        self.container
    }

    fn on_attach(&mut self, cx: &ScreenContext) {
        self.record("attach");
        if let Some(hook) = self.on_attach.clone() {
            hook(cx);
        }
    }

    fn on_detach(&mut self, _cx: &ScreenContext) {
        self.record("detach");
    }

    fn on_dismiss(&mut self, _cx: &ScreenContext) {
        self.record("dismiss");
    }

    fn on_destroy(&mut self, _cx: &ScreenContext, reason: TeardownReason) {
        self.record(&format!("destroy-{:?}", reason));
    }

    fn on_back_pressed(&mut self, _cx: &ScreenContext) -> BackPress {
        self.record("back");
        self.back
    }

    fn on_topic_gone(&mut self, _cx: &ScreenContext, notice: &TopicNotice) {
        self.record(&format!("gone-{}", notice.topic));
    }

    fn save_state(&self, out: &mut PersistedState) {
        out.put_text("Recorder.name", self.name.as_str());
        if let Some(container) = self.container {
            out.put_int("Recorder.container", i64::from(container.0));
        }
    }

    fn restore_state(&mut self, state: &PersistedState) {
        self.name = state.get_text("Recorder.name").unwrap_or_default().to_string();
        if state.contains("Recorder.container") {
            self.container = Some(ContainerId(state.get_int("Recorder.container", 0) as u32));
        }
    }
}

pub fn recorder(name: &str, log: &EventLog) -> ScreenHandle {
    ScreenHandle::new(Recorder::new(name, log))
}

/// Recorder hosting a child navigator on `container`
pub fn nested(name: &str, container: u32, log: &EventLog) -> ScreenHandle {
    ScreenHandle::new(Recorder::new(name, log).with_container(container))
}

/// Registry that rebuilds recorders writing into `log`
pub fn screen_registry(log: &EventLog) -> ScreenRegistry {
    let mut screens = ScreenRegistry::with_builtin();
    let log = Rc::clone(log);
    screens.register_fn("Recorder", move || Box::new(Recorder::new("", &log)));
    screens
}

pub fn host() -> NavHost {
    NavHost::new(TopicRegistry::new(), NavConfig::default())
}

/// Name a recorder reports, via its handle
pub fn name_of(handle: &ScreenHandle) -> String {
    handle.peek::<Recorder, _>(|r| r.name.clone()).unwrap_or_default()
}
