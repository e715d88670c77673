//! Run configuration
//!
//! Declarative surface only: which suites run, in what grouping and order,
//! against which origins, and under what timeout/retry/capture policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Environment variable overriding the UI origin
pub const ENV_UI_URL: &str = "TOOLSHOP_UI_URL";
/// Environment variable overriding the API origin
pub const ENV_API_URL: &str = "TOOLSHOP_API_URL";

/// Top-level run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Base origin for UI suites
    pub ui_base_url: String,

    /// Base origin for API suites
    pub api_base_url: String,

    /// Default headers sent with every API request
    pub api_headers: BTreeMap<String, String>,

    /// Attribute used by test-id locators
    pub test_id_attribute: String,

    /// Browser viewport
    pub viewport: ViewportConfig,

    /// Browser engine (chromium, firefox, webkit)
    pub browser: String,

    /// Run browsers headless
    pub headless: bool,

    /// Per-action timeout in milliseconds
    pub action_timeout_ms: u64,

    /// Per-scenario timeout in milliseconds
    pub scenario_timeout_ms: u64,

    /// Whole-run timeout in milliseconds
    pub global_timeout_ms: u64,

    /// Times a failed scenario is re-run from scratch
    pub retries: u32,

    /// Concurrent scenario workers within a project (1 = serial)
    pub workers: usize,

    /// Directory holding per-role session-state files
    pub auth_dir: PathBuf,

    /// Directory for run artifacts (results, screenshots, diffs)
    pub artifacts_dir: PathBuf,

    /// Artifact capture policy
    pub capture: CaptureConfig,

    /// Execution groups, ordered by their dependency edges
    pub projects: Vec<ProjectConfig>,
}

/// Browser viewport dimensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

/// Artifact capture policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Capture a full-page screenshot when a scenario fails
    pub screenshot_on_failure: bool,

    /// Record a Playwright trace for each scenario
    pub trace: bool,

    /// Fraction of pixels allowed to differ in visual comparisons
    pub max_diff_pixel_ratio: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            screenshot_on_failure: true,
            trace: false,
            max_diff_pixel_ratio: 0.02,
        }
    }
}

/// What a project executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    /// Logs every role in and persists session state
    Setup,
    /// Browser scenarios discovered from a specs directory
    Ui,
    /// HTTP assertions against the store API
    Api,
}

/// One execution group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Unique project name
    pub name: String,

    /// Execution mode
    pub kind: ProjectKind,

    /// Scenario discovery root (UI projects only)
    #[serde(default)]
    pub specs_dir: Option<PathBuf>,

    /// Projects that must pass before this one starts
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Per-project base origin override
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        let mut api_headers = BTreeMap::new();
        api_headers.insert("Accept".to_string(), "application/json".to_string());
        api_headers.insert("Content-Type".to_string(), "application/json".to_string());

        Self {
            ui_base_url: "https://practicesoftwaretesting.com".to_string(),
            api_base_url: "https://api.practicesoftwaretesting.com".to_string(),
            api_headers,
            test_id_attribute: "data-test".to_string(),
            viewport: ViewportConfig::default(),
            browser: "chromium".to_string(),
            headless: true,
            action_timeout_ms: 5_000,
            scenario_timeout_ms: 30_000,
            global_timeout_ms: 10 * 60 * 1000,
            retries: 1,
            workers: 4,
            auth_dir: PathBuf::from(".auth"),
            artifacts_dir: PathBuf::from("test-results"),
            capture: CaptureConfig::default(),
            projects: vec![
                ProjectConfig {
                    name: "setup".to_string(),
                    kind: ProjectKind::Setup,
                    specs_dir: None,
                    depends_on: vec![],
                    base_url: None,
                },
                ProjectConfig {
                    name: "ui".to_string(),
                    kind: ProjectKind::Ui,
                    specs_dir: Some(PathBuf::from("crates/e2e/specs")),
                    depends_on: vec!["setup".to_string()],
                    base_url: None,
                },
                ProjectConfig {
                    name: "api".to_string(),
                    kind: ProjectKind::Api,
                    specs_dir: None,
                    depends_on: vec![],
                    base_url: None,
                },
            ],
        }
    }
}

impl RunConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment overrides for the target origins
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_UI_URL) {
            self.ui_base_url = url;
        }
        if let Ok(url) = std::env::var(ENV_API_URL) {
            self.api_base_url = url;
        }
    }

    /// Look up a project by name
    pub fn project(&self, name: &str) -> Option<&ProjectConfig> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Session-state file path for a role id
    pub fn session_file(&self, role_id: &str) -> PathBuf {
        self.auth_dir.join(format!("{}.json", role_id))
    }

    /// Screenshot output directory
    pub fn screenshots_dir(&self) -> PathBuf {
        self.artifacts_dir.join("screenshots")
    }

    /// Visual baseline directory
    pub fn baselines_dir(&self) -> PathBuf {
        self.artifacts_dir.join("baselines")
    }

    /// Visual diff output directory
    pub fn diffs_dir(&self) -> PathBuf {
        self.artifacts_dir.join("diffs")
    }

    /// Results report path
    pub fn results_path(&self) -> PathBuf {
        self.artifacts_dir.join("test-results.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_projects_encode_setup_dependency() {
        let config = RunConfig::default();
        let ui = config.project("ui").unwrap();
        assert_eq!(ui.depends_on, vec!["setup".to_string()]);
        assert!(config.project("setup").unwrap().depends_on.is_empty());
    }

    #[test]
    fn roundtrips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");

        let mut config = RunConfig::default();
        config.retries = 2;
        config.workers = 1;
        config.save(&path).unwrap();

        let loaded = RunConfig::load(&path).unwrap();
        assert_eq!(loaded.retries, 2);
        assert_eq!(loaded.workers, 1);
        assert_eq!(loaded.ui_base_url, config.ui_base_url);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = RunConfig::load(Path::new("/nonexistent/run.toml")).unwrap();
        assert_eq!(config.test_id_attribute, "data-test");
        assert_eq!(config.viewport.width, 1280);
    }

    #[test]
    fn session_file_is_keyed_by_role_id() {
        let config = RunConfig::default();
        assert_eq!(
            config.session_file("customer2"),
            PathBuf::from(".auth/customer2.json")
        );
    }
}
