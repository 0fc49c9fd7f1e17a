//! Scripted navigator sessions
//!
//! A scenario is a TOML file with a list of `[[steps]]`, each tagged by
//! `action`. Screens are generic [`Page`]s addressed by a label chosen in
//! the script; labels map to screen ids, which survive recreation and
//! restore.

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::NavConfig;
use crate::nav::{ContainerId, NavHost, Navigator, Screen, ScreenHandle, ScreenId, ScreenRegistry};
use crate::scope::TopicRegistry;
use crate::screens::{AlertDialog, PleaseWaitDialog};
use crate::state::PersistedState;

/// Plain titled screen, optionally hosting a child container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub title: String,
    pub container: Option<ContainerId>,
}

impl Page {
    pub const KIND: &'static str = "Page";

    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            container: None,
        }
    }

    pub fn with_container(mut self, container: ContainerId) -> Self {
        self.container = Some(container);
        self
    }
}

impl Screen for Page {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn container_id(&self) -> Option<ContainerId> {
        self.container
    }

    fn save_state(&self, out: &mut PersistedState) {
        out.put_text("Page.title", self.title.as_str());
        if let Some(container) = self.container {
            out.put_int("Page.container", i64::from(container.0));
        }
    }

    fn restore_state(&mut self, state: &PersistedState) {
        self.title = state.get_text("Page.title").unwrap_or_default().to_string();
        self.container = state
            .contains("Page.container")
            .then(|| state.get_int("Page.container", 0))
            .and_then(|id| u32::try_from(id).ok())
            .map(ContainerId);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Push a page onto the root navigator
    Push {
        id: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        container: Option<u32>,
    },
    /// Push a page into the child navigator of `parent`
    PushInto {
        parent: String,
        id: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        container: Option<u32>,
    },
    /// Open an alert dialog on the root navigator
    Alert {
        id: String,
        #[serde(default)]
        message: Option<String>,
        #[serde(default = "default_true")]
        cancelable: bool,
    },
    /// Open a please-wait dialog on the root navigator
    Wait {
        id: String,
        #[serde(default)]
        message: Option<String>,
    },
    /// Replace the whole root stack with one page
    Replace {
        id: String,
        #[serde(default)]
        title: Option<String>,
    },
    /// Close a screen through its parent navigator
    Close { id: String },
    Back,
    Recreate,
    /// Keep the host state bag for a later `restore`
    Save,
    /// Simulate process death: finish the host and rebuild from the last `save`
    Restore,
    Finish,
    Dump,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse scenario")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("Invalid scenario file: {:?}", path))
    }
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub action: String,
    pub ok: bool,
    pub lines: Vec<String>,
}

impl StepReport {
    fn new(action: impl Into<String>, ok: bool) -> Self {
        Self {
            action: action.into(),
            ok,
            lines: Vec::new(),
        }
    }

    fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }
}

/// Drives a [`NavHost`] through scenario steps
pub struct ScenarioRunner {
    config: NavConfig,
    registry: TopicRegistry,
    host: NavHost,
    screens: ScreenRegistry,
    labels: HashMap<String, ScreenId>,
    saved: Option<PersistedState>,
}

impl ScenarioRunner {
    pub fn new(config: NavConfig) -> Self {
        let registry = TopicRegistry::new();
        let host = NavHost::new(registry.clone(), config.clone());
        let mut screens = ScreenRegistry::with_builtin();
        screens.register::<Page>();
        Self {
            config,
            registry,
            host,
            screens,
            labels: HashMap::new(),
            saved: None,
        }
    }

    pub fn host(&self) -> &NavHost {
        &self.host
    }

    pub fn run_all(&mut self, scenario: &Scenario) -> Result<Vec<StepReport>> {
        scenario.steps.iter().map(|step| self.run(step)).collect()
    }

    /// Execute one step. Navigator refusals are reported, not raised; errors
    /// are reserved for broken scripts (unknown labels, restore without save).
    pub fn run(&mut self, step: &Step) -> Result<StepReport> {
        debug!("Running step {:?}", step);
        let report = match step {
            Step::Push { id, title, container } => {
                let handle = self.page(id, title.as_deref(), *container)?;
                let ok = handle.open(&self.host.navigator());
                StepReport::new(format!("push {}", id), ok)
            }
            Step::PushInto {
                parent,
                id,
                title,
                container,
            } => {
                let parent_handle = self.lookup(parent)?;
                let child = parent_handle
                    .context()
                    .try_child_navigator()
                    .with_context(|| format!("'{}' cannot host screens", parent))?;
                let handle = self.page(id, title.as_deref(), *container)?;
                let ok = handle.open(&child);
                StepReport::new(format!("push {} into {}", id, parent), ok)
            }
            Step::Alert { id, message, cancelable } => {
                let mut dialog = AlertDialog::new().with_cancelable(*cancelable);
                dialog.message = message.clone();
                let handle = self.label(id, dialog)?;
                let ok = handle.open(&self.host.navigator());
                StepReport::new(format!("alert {}", id), ok)
            }
            Step::Wait { id, message } => {
                let dialog = PleaseWaitDialog {
                    message: message.clone(),
                    ..PleaseWaitDialog::default()
                };
                let handle = self.label(id, dialog)?;
                let ok = handle.open(&self.host.navigator());
                StepReport::new(format!("wait {}", id), ok)
            }
            Step::Replace { id, title } => {
                let handle = self.page(id, title.as_deref(), None)?;
                let ok = self.host.navigator().begin_transaction().replace(&handle).commit();
                StepReport::new(format!("replace with {}", id), ok)
            }
            Step::Close { id } => {
                let ok = self.lookup(id)?.close();
                StepReport::new(format!("close {}", id), ok)
            }
            Step::Back => {
                let ok = self.host.handle_back_pressed();
                StepReport::new("back", ok)
            }
            Step::Recreate => {
                let restored = self.host.recreate(&self.screens)?;
                StepReport::new("recreate", restored.is_complete())
                    .line(format!("restored {} screen(s)", restored.restored))
            }
            Step::Save => {
                let bag = self.host.save_state()?;
                let report = StepReport::new("save", true).line(bag.to_json()?);
                self.saved = Some(bag);
                report
            }
            Step::Restore => {
                let bag = self
                    .saved
                    .clone()
                    .ok_or_else(|| anyhow!("'restore' needs an earlier 'save'"))?;
                self.host.finish();
                self.registry = TopicRegistry::new();
                self.host = NavHost::new(self.registry.clone(), self.config.clone());
                let restored = self.host.restore_state(&bag, &self.screens)?;
                let mut report = StepReport::new("restore", restored.is_complete())
                    .line(format!("restored {} screen(s)", restored.restored));
                for skipped in &restored.skipped {
                    report = report.line(format!(
                        "skipped {} ({}): {}",
                        skipped.id, skipped.kind, skipped.reason
                    ));
                }
                report
            }
            Step::Finish => {
                self.host.finish();
                StepReport::new("finish", true)
            }
            Step::Dump => {
                let mut report = StepReport::new("dump", true);
                report.lines = render_tree(&self.host.navigator(), &self.labels);
                report
            }
        };

        self.host.process_side_effects();
        info!("Step '{}' -> {}", report.action, if report.ok { "ok" } else { "refused" });
        Ok(report)
    }

    fn page(
        &mut self,
        label: &str,
        title: Option<&str>,
        container: Option<u32>,
    ) -> Result<ScreenHandle> {
        let mut page = Page::new(title.unwrap_or(label));
        if let Some(container) = container {
            page = page.with_container(ContainerId(container));
        }
        self.label(label, page)
    }

    fn label<S: Screen>(&mut self, label: &str, screen: S) -> Result<ScreenHandle> {
        if self.labels.contains_key(label) {
            bail!("Label '{}' is already in use", label);
        }
        let handle = ScreenHandle::new(screen);
        self.labels.insert(label.to_string(), handle.id());
        Ok(handle)
    }

    fn lookup(&self, label: &str) -> Result<ScreenHandle> {
        let id = self
            .labels
            .get(label)
            .ok_or_else(|| anyhow!("Unknown label '{}'", label))?;
        self.host
            .navigator()
            .find_in_tree(*id)
            .ok_or_else(|| anyhow!("'{}' is not on any stack", label))
    }
}

/// One line per screen, children indented under their parent, bottom first
pub fn render_tree(navigator: &Navigator, labels: &HashMap<String, ScreenId>) -> Vec<String> {
    let names: HashMap<ScreenId, &str> = labels
        .iter()
        .map(|(label, id)| (*id, label.as_str()))
        .collect();
    let mut lines = vec![format!("container {}", navigator.container())];
    render_level(navigator, &names, 1, &mut lines);
    lines
}

fn render_level(
    navigator: &Navigator,
    names: &HashMap<ScreenId, &str>,
    depth: usize,
    lines: &mut Vec<String>,
) {
    let indent = "  ".repeat(depth);
    for handle in navigator.screens() {
        let name = names.get(&handle.id()).copied().unwrap_or("?");
        lines.push(format!("{}{} ({})", indent, name, handle.kind()));
        if let Some(child) = handle.child_navigator().filter(|c| !c.is_empty()) {
            lines.push(format!("{}  container {}", indent, child.container()));
            render_level(&child, names, depth + 2, lines);
        }
    }
}
