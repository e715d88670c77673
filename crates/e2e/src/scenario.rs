//! Declarative test scenarios
//!
//! A scenario is an ordered list of steps, either built in code by page
//! objects or parsed from a YAML file under a project's specs directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use toolshop_common::Role;

use crate::error::{E2eError, E2eResult};

/// A named, re-resolvable query for a UI element. Stateless; re-evaluated
/// on each use by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// By test-identifier attribute (the configured one, e.g. `data-test`)
    TestId(String),
    /// Raw CSS selector
    Css(String),
    /// By ARIA role and accessible name
    Role { role: String, name: String },
    /// By form label text
    Label(String),
    /// By image alt text
    AltText(String),
}

impl Locator {
    pub fn test_id(id: impl Into<String>) -> Self {
        Locator::TestId(id.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    /// Short human-readable form used in step names and error messages
    pub fn describe(&self) -> String {
        match self {
            Locator::TestId(id) => format!("test-id:{}", id),
            Locator::Css(sel) => format!("css:{}", sel),
            Locator::Role { role, name } => format!("role:{}[{}]", role, name),
            Locator::Label(label) => format!("label:{}", label),
            Locator::AltText(alt) => format!("alt:{}", alt),
        }
    }
}

/// A complete scenario, parsed from YAML or built by page objects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,

    /// Run with an authenticated fixture for this role
    #[serde(default)]
    pub role: Option<Role>,

    /// Steps to execute in order
    #[serde(default)]
    pub steps: Vec<TestStep>,

    /// Compare screenshots taken by this scenario against baselines
    #[serde(default)]
    pub visual_regression: bool,

    /// Per-scenario override of the allowed pixel-difference ratio
    #[serde(default)]
    pub max_diff_pixel_ratio: Option<f64>,
}

/// A single step in a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (relative to the base origin)
    Navigate {
        url: String,
        #[serde(default)]
        wait_for: Option<Locator>,
    },

    /// Click an element
    Click {
        target: Locator,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Fill an input field
    Fill { target: Locator, value: String },

    /// Select an option from a dropdown by its label
    Select { target: Locator, value: String },

    /// Wait for an element to reach a state
    WaitFor {
        target: Locator,
        #[serde(default)]
        state: WaitState,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
    },

    /// Wait until the page URL matches a glob pattern. Ordered before any
    /// content assertion so checks never run against a stale pre-navigation
    /// DOM.
    WaitForUrl {
        pattern: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
    },

    /// Assert something about an element
    Expect {
        target: Locator,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        count: Option<usize>,
        #[serde(default)]
        disabled: Option<bool>,
    },

    /// Assert the document title
    ExpectTitle { title: String },

    /// Take a screenshot, hiding masked elements first
    Screenshot {
        name: String,
        #[serde(default)]
        full_page: bool,
        #[serde(default)]
        mask: Vec<Locator>,
    },

    /// Persist the context's session state (cookies + storage) to a file
    SaveState { path: PathBuf },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep { ms: u64 },
}

fn default_wait_timeout() -> u64 {
    5000
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl TestStep {
    /// Short name for a step, used in logs and step results
    pub fn name(&self) -> String {
        match self {
            TestStep::Navigate { url, .. } => format!("navigate:{}", url),
            TestStep::Click { target, .. } => format!("click:{}", target.describe()),
            TestStep::Fill { target, .. } => format!("fill:{}", target.describe()),
            TestStep::Select { target, .. } => format!("select:{}", target.describe()),
            TestStep::WaitFor { target, .. } => format!("wait:{}", target.describe()),
            TestStep::WaitForUrl { pattern, .. } => format!("wait_url:{}", pattern),
            TestStep::Expect { target, .. } => format!("expect:{}", target.describe()),
            TestStep::ExpectTitle { .. } => "expect_title".to_string(),
            TestStep::Screenshot { name, .. } => format!("screenshot:{}", name),
            TestStep::SaveState { path } => format!("save_state:{}", path.display()),
            TestStep::Sleep { ms } => format!("sleep:{}ms", ms),
        }
    }
}

impl Scenario {
    /// Start an empty scenario
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            role: None,
            steps: Vec::new(),
            visual_regression: false,
            max_diff_pixel_ratio: None,
        }
    }

    /// Append a step
    pub fn push(&mut self, step: TestStep) {
        self.steps.push(step);
    }

    /// Names of screenshots this scenario takes, in order
    pub fn screenshot_names(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                TestStep::Screenshot { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| {
            E2eError::ScenarioParse(format!("{}: {}", path.display(), e))
        })
    }

    /// Load all scenarios from a directory, sorted by file name so discovery
    /// order is stable across machines
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect();
        paths.sort();

        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios
            .iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect()
    }
}
