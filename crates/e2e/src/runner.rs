//! Suite runner
//!
//! Orchestrates projects in dependency order (session provisioning strictly
//! before UI suites), runs scenario files under a bounded worker pool,
//! re-runs failures from scratch up to the configured retry count, and
//! aggregates everything into a JSON report.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use toolshop_common::{Credentials, ProjectConfig, ProjectKind, Role, RoleProfile, RunConfig};

use crate::api::ApiClient;
use crate::auth;
use crate::browser::{Browser, PlaywrightConfig, PlaywrightHandle, RunReport, StepOutcome};
use crate::error::{E2eError, E2eResult};
use crate::fixture::AuthenticatedFixture;
use crate::scenario::Scenario;
use crate::visual::{SnapshotComparator, SnapshotConfig};

/// Result of one scenario (or one API check)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub name: String,
    pub project: String,
    pub success: bool,
    /// How many times the scenario ran (0 = failed before its body)
    pub attempts: u32,
    pub duration_ms: u64,
    pub steps: Vec<StepOutcome>,
    pub visual: Vec<SnapshotRecord>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub name: String,
    pub matches: bool,
    pub diff_ratio: f64,
    pub diff_image_path: Option<String>,
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioRecord>,
}

/// Main suite runner
pub struct TestRunner {
    config: Arc<RunConfig>,
}

impl TestRunner {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Run every project in dependency order
    pub async fn run_all(&self) -> E2eResult<SuiteReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        let order = project_order(&self.config.projects)?;
        let mut results: Vec<ScenarioRecord> = Vec::new();
        let mut project_passed: HashMap<String, bool> = HashMap::new();

        for idx in order {
            let project = self.config.projects[idx].clone();

            // A failed dependency means this project's scenarios must not
            // run at all; they are reported failed, not silently skipped.
            if let Some(dep) = project
                .depends_on
                .iter()
                .find(|d| !project_passed.get(d.as_str()).copied().unwrap_or(false))
            {
                let reason = E2eError::DependencyFailed {
                    project: project.name.clone(),
                    dependency: dep.clone(),
                };
                error!("{}", reason);
                results.push(ScenarioRecord {
                    name: format!("{} (not run)", project.name),
                    project: project.name.clone(),
                    success: false,
                    attempts: 0,
                    duration_ms: 0,
                    steps: vec![],
                    visual: vec![],
                    error: Some(reason.to_string()),
                });
                project_passed.insert(project.name.clone(), false);
                continue;
            }

            info!("project {} starting", project.name);
            let records = match project.kind {
                ProjectKind::Setup => self.run_setup_project(&project).await?,
                ProjectKind::Ui => self.run_ui_project(&project).await?,
                ProjectKind::Api => self.run_api_project(&project).await?,
            };

            for record in &records {
                if record.success {
                    info!("✓ {} ({} ms)", record.name, record.duration_ms);
                } else {
                    error!(
                        "✗ {} - {}",
                        record.name,
                        record.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }

            let passed = records.iter().all(|r| r.success);
            project_passed.insert(project.name.clone(), passed);
            results.extend(records);
        }

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(SuiteReport {
            started_at,
            total: results.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    /// Provision a session for every role, sequentially
    async fn run_setup_project(&self, project: &ProjectConfig) -> E2eResult<Vec<ScenarioRecord>> {
        let profiles = match RoleProfile::load_all() {
            Ok(profiles) => profiles,
            Err(e) => {
                // Credentials are a precondition of the whole setup group
                return Ok(vec![ScenarioRecord {
                    name: "load-role-credentials".to_string(),
                    project: project.name.clone(),
                    success: false,
                    attempts: 0,
                    duration_ms: 0,
                    steps: vec![],
                    visual: vec![],
                    error: Some(e.to_string()),
                }]);
            }
        };

        let mut records = Vec::new();
        for profile in &profiles {
            records.push(self.provision_with_retries(project, profile).await);
        }
        Ok(records)
    }

    async fn provision_with_retries(
        &self,
        project: &ProjectConfig,
        profile: &RoleProfile,
    ) -> ScenarioRecord {
        let name = format!("provision-{}", profile.role.id());
        let start = Instant::now();
        let mut attempts = 0;
        let mut steps: Vec<StepOutcome> = vec![];
        let mut last_error: Option<String> = None;
        let mut success = false;

        while attempts <= self.config.retries {
            attempts += 1;
            match self.provision_once(project, profile, &name).await {
                Ok(report) if report.success => {
                    steps = report.steps;
                    last_error = None;
                    success = true;
                    break;
                }
                Ok(report) => {
                    steps = report.steps;
                    last_error = report.error;
                }
                Err(e) => {
                    last_error = Some(e.to_string());
                }
            }
            if attempts <= self.config.retries {
                warn!("retrying {} (attempt {})", name, attempts + 1);
            }
        }

        ScenarioRecord {
            name,
            project: project.name.clone(),
            success,
            attempts,
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            visual: vec![],
            error: last_error,
        }
    }

    async fn provision_once(
        &self,
        project: &ProjectConfig,
        profile: &RoleProfile,
        name: &str,
    ) -> E2eResult<RunReport> {
        let handle = PlaywrightHandle::new(browser_config(&self.config, project, name))?;
        let session_path = self.config.session_file(profile.role.id());
        let timeout = Duration::from_millis(self.config.scenario_timeout_ms);

        tokio::time::timeout(timeout, auth::provision(&handle, profile, &session_path))
            .await
            .map_err(|_| {
                E2eError::Timeout(format!(
                    "{} exceeded {} ms",
                    name, self.config.scenario_timeout_ms
                ))
            })?
    }

    /// Run every scenario file of a UI project under the worker pool
    async fn run_ui_project(&self, project: &ProjectConfig) -> E2eResult<Vec<ScenarioRecord>> {
        let specs_dir = project.specs_dir.as_ref().ok_or_else(|| {
            toolshop_common::Error::InvalidConfig(format!(
                "ui project {} has no specs_dir",
                project.name
            ))
        })?;

        let scenarios = Scenario::load_all(specs_dir)?;
        if scenarios.is_empty() {
            warn!(
                "no scenarios found under {} for project {}",
                specs_dir.display(),
                project.name
            );
            return Ok(vec![]);
        }

        info!(
            "running {} scenario(s) in project {} with {} worker(s)",
            scenarios.len(),
            project.name,
            self.config.workers.max(1)
        );

        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut tasks = JoinSet::new();
        for scenario in scenarios {
            let semaphore = Arc::clone(&semaphore);
            let config = Arc::clone(&self.config);
            let project = project.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                run_scenario_task(config, project, scenario).await
            });
        }

        let mut records = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(record) => records.push(record),
                Err(e) => records.push(ScenarioRecord {
                    name: format!("{} (worker)", project.name),
                    project: project.name.clone(),
                    success: false,
                    attempts: 0,
                    duration_ms: 0,
                    steps: vec![],
                    visual: vec![],
                    error: Some(format!("scenario task panicked: {}", e)),
                }),
            }
        }
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    /// Run the built-in API checks
    async fn run_api_project(&self, project: &ProjectConfig) -> E2eResult<Vec<ScenarioRecord>> {
        let mut api_config = (*self.config).clone();
        if let Some(base) = &project.base_url {
            api_config.api_base_url = base.clone();
        }
        let client = ApiClient::new(&api_config)?;

        let mut records = Vec::new();

        let start = Instant::now();
        let result = client.check_products_first_page().await;
        records.push(api_record(project, "products-first-page", result, start));

        let start = Instant::now();
        let result = match Credentials::from_env(Role::Customer1) {
            Ok(creds) => client.check_login_token(&creds).await,
            Err(e) => Err(e.into()),
        };
        records.push(api_record(project, "login-returns-token", result, start));

        let start = Instant::now();
        let result = client.check_thor_hammer_detail().await;
        records.push(api_record(project, "thor-hammer-detail", result, start));

        Ok(records)
    }

    /// Adopt all current screenshots as visual baselines
    pub fn update_baselines(&self) -> E2eResult<()> {
        let comparator = SnapshotComparator::new(snapshot_config(&self.config, true))?;
        comparator.update_all_baselines()
    }

    /// Write the run report as JSON
    pub fn write_report(&self, report: &SuiteReport) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.artifacts_dir)?;
        let path = self.config.results_path();
        std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
        info!("results written to {}", path.display());
        Ok(path)
    }
}

/// One record per API check, named like a scenario
fn api_record(
    project: &ProjectConfig,
    name: &str,
    result: E2eResult<()>,
    start: Instant,
) -> ScenarioRecord {
    let (success, error) = match result {
        Ok(()) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };
    ScenarioRecord {
        name: name.to_string(),
        project: project.name.clone(),
        success,
        attempts: 1,
        duration_ms: start.elapsed().as_millis() as u64,
        steps: vec![],
        visual: vec![],
        error,
    }
}

/// Execute one scenario with fixture acquisition, retries and visual checks
async fn run_scenario_task(
    config: Arc<RunConfig>,
    project: ProjectConfig,
    mut scenario: Scenario,
) -> ScenarioRecord {
    let start = Instant::now();

    // Fixture validation happens before any browser starts; its failure is
    // the scenario's failure, with attempts = 0 ("body never ran").
    let fixture = match scenario.role {
        Some(role) => match AuthenticatedFixture::acquire(&config, role) {
            Ok(fixture) => {
                fixture.prepare(&mut scenario);
                Some(fixture)
            }
            Err(e) => {
                return ScenarioRecord {
                    name: scenario.name.clone(),
                    project: project.name.clone(),
                    success: false,
                    attempts: 0,
                    duration_ms: start.elapsed().as_millis() as u64,
                    steps: vec![],
                    visual: vec![],
                    error: Some(e.to_string()),
                }
            }
        },
        None => None,
    };

    let mut attempts = 0;
    let mut steps: Vec<StepOutcome> = vec![];
    let mut last_error: Option<String> = None;
    let mut success = false;

    while attempts <= config.retries {
        attempts += 1;
        match run_scenario_once(&config, &project, &scenario, fixture.as_ref()).await {
            Ok(report) if report.success => {
                steps = report.steps;
                last_error = None;
                success = true;
                break;
            }
            Ok(report) => {
                steps = report.steps;
                last_error = report.error;
            }
            Err(e) => {
                last_error = Some(e.to_string());
            }
        }
        if attempts <= config.retries {
            warn!("retrying {} (attempt {})", scenario.name, attempts + 1);
        }
    }

    let mut visual = vec![];
    if success && scenario.visual_regression {
        let (records, visual_error) = compare_snapshots(&config, &scenario);
        visual = records;
        if let Some(e) = visual_error {
            success = false;
            last_error = Some(e);
        }
    }

    ScenarioRecord {
        name: scenario.name.clone(),
        project: project.name.clone(),
        success,
        attempts,
        duration_ms: start.elapsed().as_millis() as u64,
        steps,
        visual,
        error: last_error,
    }
}

async fn run_scenario_once(
    config: &RunConfig,
    project: &ProjectConfig,
    scenario: &Scenario,
    fixture: Option<&AuthenticatedFixture>,
) -> E2eResult<RunReport> {
    let mut pw = browser_config(config, project, &scenario.name);
    if let Some(fixture) = fixture {
        pw = fixture.apply(pw);
    }
    let handle = PlaywrightHandle::new(pw)?;
    let timeout = Duration::from_millis(config.scenario_timeout_ms);

    tokio::time::timeout(timeout, handle.run(scenario))
        .await
        .map_err(|_| {
            E2eError::Timeout(format!(
                "{} exceeded {} ms",
                scenario.name, config.scenario_timeout_ms
            ))
        })?
}

fn browser_config(config: &RunConfig, project: &ProjectConfig, scenario_name: &str) -> PlaywrightConfig {
    PlaywrightConfig {
        base_url: project
            .base_url
            .clone()
            .unwrap_or_else(|| config.ui_base_url.clone()),
        test_id_attribute: config.test_id_attribute.clone(),
        screenshot_dir: config.screenshots_dir(),
        viewport_width: config.viewport.width,
        viewport_height: config.viewport.height,
        browser: Browser::parse(&config.browser),
        headless: config.headless,
        action_timeout_ms: config.action_timeout_ms,
        storage_state: None,
        trace_path: config
            .capture
            .trace
            .then(|| config.artifacts_dir.join("traces").join(format!("{}.zip", scenario_name))),
        failure_screenshot: config
            .capture
            .screenshot_on_failure
            .then(|| config.screenshots_dir().join(format!("{}-failure.png", scenario_name))),
    }
}

fn snapshot_config(config: &RunConfig, auto_update: bool) -> SnapshotConfig {
    SnapshotConfig {
        baseline_dir: config.baselines_dir(),
        actual_dir: config.screenshots_dir(),
        diff_dir: config.diffs_dir(),
        max_diff_pixel_ratio: config.capture.max_diff_pixel_ratio,
        auto_update,
    }
}

/// Compare every screenshot a scenario took against its baseline
fn compare_snapshots(
    config: &RunConfig,
    scenario: &Scenario,
) -> (Vec<SnapshotRecord>, Option<String>) {
    let comparator = match SnapshotComparator::new(snapshot_config(config, false)) {
        Ok(c) => c,
        Err(e) => return (vec![], Some(e.to_string())),
    };

    let mut records = vec![];
    let mut error = None;
    for name in scenario.screenshot_names() {
        match comparator.compare(&name, scenario.max_diff_pixel_ratio) {
            Ok(diff) => {
                if !diff.matches {
                    error = Some(
                        E2eError::SnapshotMismatch {
                            name: name.clone(),
                            diff_ratio: diff.diff_ratio,
                            threshold: scenario
                                .max_diff_pixel_ratio
                                .unwrap_or(config.capture.max_diff_pixel_ratio),
                        }
                        .to_string(),
                    );
                }
                records.push(SnapshotRecord {
                    name,
                    matches: diff.matches,
                    diff_ratio: diff.diff_ratio,
                    diff_image_path: diff
                        .diff_image_path
                        .map(|p| p.to_string_lossy().to_string()),
                });
            }
            Err(E2eError::BaselineNotFound(_)) => {
                // First run; adopt with --update-baselines
                info!("no baseline for '{}' yet", name);
            }
            Err(e) => {
                error = Some(e.to_string());
            }
        }
    }
    (records, error)
}

/// Resolve a dependency-respecting execution order over the project table
fn project_order(projects: &[ProjectConfig]) -> E2eResult<Vec<usize>> {
    let index_by_name: HashMap<&str, usize> = projects
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.as_str(), i))
        .collect();

    for project in projects {
        for dep in &project.depends_on {
            if !index_by_name.contains_key(dep.as_str()) {
                return Err(toolshop_common::Error::InvalidConfig(format!(
                    "project {} depends on unknown project {}",
                    project.name, dep
                ))
                .into());
            }
        }
    }

    let mut order = Vec::with_capacity(projects.len());
    let mut placed = vec![false; projects.len()];

    while order.len() < projects.len() {
        let mut progressed = false;
        for (i, project) in projects.iter().enumerate() {
            if placed[i] {
                continue;
            }
            let ready = project
                .depends_on
                .iter()
                .all(|d| placed[index_by_name[d.as_str()]]);
            if ready {
                placed[i] = true;
                order.push(i);
                progressed = true;
            }
        }
        if !progressed {
            return Err(toolshop_common::Error::InvalidConfig(
                "project dependency cycle".to_string(),
            )
            .into());
        }
    }

    Ok(order)
}
