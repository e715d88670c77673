//! Playwright browser automation
//!
//! Scenarios are compiled to a single Playwright script and executed in one
//! `node` process, so a session established early in the scenario (login,
//! storage-state seeding) is visible to every later step. The browser is
//! closed in the script's `finally` block on every exit path.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::{debug, warn};

use crate::error::{E2eError, E2eResult};
use crate::scenario::{Locator, Scenario, TestStep, WaitState};

/// Browser engine to drive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }

    /// Parse a browser name, defaulting to chromium
    pub fn parse(s: &str) -> Self {
        match s {
            "firefox" => Browser::Firefox,
            "webkit" => Browser::Webkit,
            _ => Browser::Chromium,
        }
    }
}

/// Configuration for one browser run
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    /// Base origin navigations are resolved against
    pub base_url: String,

    /// Attribute used by test-id locators
    pub test_id_attribute: String,

    /// Directory screenshots land in
    pub screenshot_dir: PathBuf,

    /// Viewport dimensions
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Browser engine
    pub browser: Browser,

    /// Run headless
    pub headless: bool,

    /// Default per-action timeout in milliseconds
    pub action_timeout_ms: u64,

    /// Seed the context with this persisted session-state file
    pub storage_state: Option<PathBuf>,

    /// Record a trace and save it here when set
    pub trace_path: Option<PathBuf>,

    /// Capture a full-page screenshot here when the scenario fails
    pub failure_screenshot: Option<PathBuf>,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "https://practicesoftwaretesting.com".to_string(),
            test_id_attribute: "data-test".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            viewport_width: 1280,
            viewport_height: 720,
            browser: Browser::Chromium,
            headless: true,
            action_timeout_ms: 5_000,
            storage_state: None,
            trace_path: None,
            failure_screenshot: None,
        }
    }
}

/// Result of executing one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub index: usize,
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of executing a whole scenario script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub success: bool,
    pub steps: Vec<StepOutcome>,
    pub error: Option<String>,
}

/// Playwright browser handle
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

/// Quote a string as a JavaScript literal
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Resolve a path against the current working directory. Generated scripts
/// run inside a temp dir, so relative artifact paths must be pinned first.
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

impl PlaywrightHandle {
    /// Create a handle. The node toolchain is only checked when a scenario
    /// actually runs, so script generation works without it.
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        std::fs::create_dir_all(&config.screenshot_dir)?;
        Ok(Self { config })
    }

    fn check_node_installed() -> E2eResult<()> {
        let output = Command::new("node")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::NodeNotFound),
        }
    }

    /// Execute a scenario's steps in one browser session
    pub async fn run(&self, scenario: &Scenario) -> E2eResult<RunReport> {
        Self::check_node_installed()?;
        let script = self.build_script(&scenario.steps);
        let raw = self.run_script(&script).await?;
        Ok(self.parse_report(&scenario.steps, &raw))
    }

    /// Build the Playwright script for a list of steps
    pub fn build_script(&self, steps: &[TestStep]) -> String {
        let mut script = String::new();

        let storage_state = self
            .config
            .storage_state
            .as_ref()
            .map(|p| format!(", storageState: {}", js_string(&absolute(p).to_string_lossy())))
            .unwrap_or_default();

        script.push_str(&format!(
            r#"const {{ {browser}, selectors }} = require('playwright');

function sleep(ms) {{ return new Promise((resolve) => setTimeout(resolve, ms)); }}

async function pollFor(check, describe, timeoutMs) {{
  const deadline = Date.now() + timeoutMs;
  for (;;) {{
    const result = await check();
    if (result.ok) return;
    if (Date.now() >= deadline) throw new Error(describe + ': ' + result.detail);
    await sleep(100);
  }}
}}

(async () => {{
  selectors.setTestIdAttribute({test_id_attr});
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}{storage_state}
  }});
"#,
            browser = self.config.browser.as_str(),
            test_id_attr = js_string(&self.config.test_id_attribute),
            headless = self.config.headless,
            width = self.config.viewport_width,
            height = self.config.viewport_height,
            storage_state = storage_state,
        ));

        if self.config.trace_path.is_some() {
            script.push_str(
                "  await context.tracing.start({ screenshots: true, snapshots: true });\n",
            );
        }

        script.push_str(&format!(
            r#"  const page = await context.newPage();
  page.setDefaultTimeout({timeout});
  const baseUrl = {base_url};
  let currentStep = -1;
  try {{
"#,
            timeout = self.config.action_timeout_ms,
            base_url = js_string(&self.config.base_url),
        ));

        for (i, step) in steps.iter().enumerate() {
            script.push_str(&format!(
                "\n    // Step {}: {}\n    currentStep = {};\n    {{\n      const stepStart = Date.now();\n",
                i + 1,
                step.name(),
                i,
            ));
            for line in self.step_to_js(step).lines() {
                script.push_str("      ");
                script.push_str(line);
                script.push('\n');
            }
            script.push_str(&format!(
                "      console.log(JSON.stringify({{ stepDone: {}, ms: Date.now() - stepStart }}));\n    }}\n",
                i,
            ));
        }

        script.push_str("\n    console.log(JSON.stringify({ success: true }));\n");
        script.push_str("  } catch (error) {\n");

        if let Some(path) = &self.config.failure_screenshot {
            script.push_str(&format!(
                "    try {{ await page.screenshot({{ path: {}, fullPage: true }}); }} catch (e) {{}}\n",
                js_string(&absolute(path).to_string_lossy()),
            ));
        }

        script.push_str(
            r#"    console.log(JSON.stringify({
      success: false,
      step: currentStep,
      error: String((error && error.message) || error),
    }));
    process.exitCode = 1;
  } finally {
"#,
        );

        if let Some(path) = &self.config.trace_path {
            script.push_str(&format!(
                "    try {{ await context.tracing.stop({{ path: {} }}); }} catch (e) {{}}\n",
                js_string(&absolute(path).to_string_lossy()),
            ));
        }

        script.push_str("    await browser.close();\n  }\n})();\n");
        script
    }

    /// Translate a locator to a Playwright locator expression
    fn locator_js(&self, locator: &Locator) -> String {
        match locator {
            Locator::TestId(id) => format!("page.getByTestId({})", js_string(id)),
            Locator::Css(sel) => format!("page.locator({})", js_string(sel)),
            Locator::Role { role, name } => format!(
                "page.getByRole({}, {{ name: {} }})",
                js_string(role),
                js_string(name)
            ),
            Locator::Label(label) => format!("page.getByLabel({})", js_string(label)),
            Locator::AltText(alt) => format!("page.getByAltText({})", js_string(alt)),
        }
    }

    /// Convert a step to JavaScript code
    fn step_to_js(&self, step: &TestStep) -> String {
        let timeout = self.config.action_timeout_ms;
        match step {
            TestStep::Navigate { url, wait_for } => {
                let wait = wait_for
                    .as_ref()
                    .map(|loc| {
                        format!(
                            "\nawait {}.waitFor({{ state: 'visible' }});",
                            self.locator_js(loc)
                        )
                    })
                    .unwrap_or_default();
                format!("await page.goto(baseUrl + {});{}", js_string(url), wait)
            }
            TestStep::Click { target, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(timeout);
                format!(
                    "await {}.click({{ timeout: {} }});",
                    self.locator_js(target),
                    timeout
                )
            }
            TestStep::Fill { target, value } => {
                format!(
                    "await {}.fill({});",
                    self.locator_js(target),
                    js_string(value)
                )
            }
            TestStep::Select { target, value } => {
                format!(
                    "await {}.selectOption({{ label: {} }});",
                    self.locator_js(target),
                    js_string(value)
                )
            }
            TestStep::WaitFor {
                target,
                state,
                timeout_ms,
            } => {
                let state_str = match state {
                    WaitState::Visible => "visible",
                    WaitState::Hidden => "hidden",
                    WaitState::Attached => "attached",
                    WaitState::Detached => "detached",
                };
                format!(
                    "await {}.waitFor({{ state: '{}', timeout: {} }});",
                    self.locator_js(target),
                    state_str,
                    timeout_ms
                )
            }
            TestStep::WaitForUrl { pattern, timeout_ms } => {
                format!(
                    "await page.waitForURL({}, {{ timeout: {} }});",
                    js_string(pattern),
                    timeout_ms
                )
            }
            TestStep::Expect {
                target,
                visible,
                text,
                text_contains,
                count,
                disabled,
            } => {
                let loc = self.locator_js(target);
                let describe = js_string(&target.describe());
                let mut assertions = Vec::new();

                if let Some(vis) = visible {
                    let state = if *vis { "visible" } else { "hidden" };
                    assertions.push(format!(
                        "await {}.waitFor({{ state: '{}', timeout: {} }});",
                        loc, state, timeout
                    ));
                }

                if let Some(expected) = text {
                    assertions.push(format!(
                        "await pollFor(async () => {{\n  const actual = ((await {loc}.textContent()) || '').trim();\n  return {{ ok: actual === {expected}, detail: 'expected text ' + {expected} + ', got \"' + actual + '\"' }};\n}}, 'text mismatch on ' + {describe}, {timeout});",
                        loc = loc,
                        expected = js_string(expected),
                        describe = describe,
                        timeout = timeout,
                    ));
                }

                if let Some(fragment) = text_contains {
                    assertions.push(format!(
                        "await pollFor(async () => {{\n  const actual = (await {loc}.textContent()) || '';\n  return {{ ok: actual.includes({fragment}), detail: 'expected to contain ' + {fragment} + ', got \"' + actual.trim() + '\"' }};\n}}, 'text mismatch on ' + {describe}, {timeout});",
                        loc = loc,
                        fragment = js_string(fragment),
                        describe = describe,
                        timeout = timeout,
                    ));
                }

                if let Some(expected) = count {
                    assertions.push(format!(
                        "await pollFor(async () => {{\n  const n = await {loc}.count();\n  return {{ ok: n === {expected}, detail: 'expected count {expected}, got ' + n }};\n}}, 'count mismatch on ' + {describe}, {timeout});",
                        loc = loc,
                        expected = expected,
                        describe = describe,
                        timeout = timeout,
                    ));
                }

                if let Some(expected) = disabled {
                    assertions.push(format!(
                        "await pollFor(async () => {{\n  const d = await {loc}.isDisabled();\n  return {{ ok: d === {expected}, detail: 'expected disabled={expected}, got ' + d }};\n}}, 'disabled mismatch on ' + {describe}, {timeout});",
                        loc = loc,
                        expected = expected,
                        describe = describe,
                        timeout = timeout,
                    ));
                }

                assertions.join("\n")
            }
            TestStep::ExpectTitle { title } => {
                format!(
                    "await pollFor(async () => {{\n  const actual = await page.title();\n  return {{ ok: actual === {title}, detail: 'expected title ' + {title} + ', got \"' + actual + '\"' }};\n}}, 'title mismatch', {timeout});",
                    title = js_string(title),
                    timeout = timeout,
                )
            }
            TestStep::Screenshot {
                name,
                full_page,
                mask,
            } => {
                let path = absolute(&self.config.screenshot_dir).join(format!("{}.png", name));
                let mut code = String::new();
                for masked in mask {
                    code.push_str(&format!(
                        "await {}.evaluateAll((els) => els.forEach((el) => {{ el.style.visibility = 'hidden'; }}));\n",
                        self.locator_js(masked)
                    ));
                }
                code.push_str(&format!(
                    "await page.screenshot({{ path: {}, fullPage: {} }});",
                    js_string(&path.to_string_lossy()),
                    full_page
                ));
                code
            }
            TestStep::SaveState { path } => {
                format!(
                    "await context.storageState({{ path: {} }});",
                    js_string(&absolute(path).to_string_lossy())
                )
            }
            TestStep::Sleep { ms } => format!("await sleep({});", ms),
        }
    }

    /// Execute the script via node, returning raw stdout/stderr
    async fn run_script(&self, script: &str) -> E2eResult<String> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("scenario.js");
        std::fs::write(&script_path, script)?;

        debug!("running Playwright script: {}", script_path.display());

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);

        // A non-zero exit with no parseable result line means the script
        // itself broke (missing playwright install, syntax error), not a
        // step failure.
        if !output.status.success() && !stdout.contains("\"success\"") {
            return Err(E2eError::Script(format!(
                "stdout: {}\nstderr: {}",
                stdout.trim(),
                stderr.trim()
            )));
        }

        Ok(stdout)
    }

    /// Parse the script's JSON event lines into a step-by-step report
    fn parse_report(&self, steps: &[TestStep], stdout: &str) -> RunReport {
        #[derive(Deserialize)]
        struct Event {
            #[serde(default)]
            step_done: Option<usize>,
            #[serde(default)]
            ms: Option<u64>,
            #[serde(default)]
            success: Option<bool>,
            #[serde(default)]
            step: Option<i64>,
            #[serde(default)]
            error: Option<String>,
        }

        // Only whole-line JSON objects are harness events; the page may log
        // arbitrary text to the console.
        let json_line = Regex::new(r"^\{.*\}$").ok();
        let mut durations = vec![0u64; steps.len()];
        let mut completed = 0usize;
        let mut success = false;
        let mut failed_step: Option<usize> = None;
        let mut error: Option<String> = None;

        for line in stdout.lines() {
            let line = line.trim();
            let is_json = json_line
                .as_ref()
                .map(|re| re.is_match(line))
                .unwrap_or(false);
            if !is_json {
                continue;
            }
            let Ok(event) = serde_json::from_str::<Event>(&line.replace("stepDone", "step_done"))
            else {
                continue;
            };

            if let (Some(index), Some(ms)) = (event.step_done, event.ms) {
                if index < durations.len() {
                    durations[index] = ms;
                    completed = completed.max(index + 1);
                }
            }
            if let Some(ok) = event.success {
                success = ok;
                if !ok {
                    failed_step = event.step.and_then(|s| usize::try_from(s).ok());
                    error = event.error;
                }
            }
        }

        let mut outcomes = Vec::new();
        for (i, step) in steps.iter().enumerate() {
            if i < completed {
                outcomes.push(StepOutcome {
                    index: i,
                    name: step.name(),
                    success: true,
                    duration_ms: durations[i],
                    error: None,
                });
            } else if Some(i) == failed_step {
                outcomes.push(StepOutcome {
                    index: i,
                    name: step.name(),
                    success: false,
                    duration_ms: 0,
                    error: error.clone(),
                });
                break;
            } else {
                // Steps after a failure never ran
                break;
            }
        }

        if !success && error.is_none() {
            warn!("scenario script produced no failure detail");
            error = Some("script exited without reporting a result".to_string());
        }

        RunReport {
            success,
            steps: outcomes,
            error: if success { None } else { error },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("chromium", Browser::Chromium)]
    #[test_case("firefox", Browser::Firefox)]
    #[test_case("webkit", Browser::Webkit)]
    #[test_case("edge", Browser::Chromium; "unknown names fall back to chromium")]
    fn browser_names_parse(name: &str, expected: Browser) {
        assert_eq!(Browser::parse(name), expected);
    }

    fn handle() -> PlaywrightHandle {
        // Bypass the node check; codegen needs no toolchain.
        PlaywrightHandle {
            config: PlaywrightConfig {
                screenshot_dir: std::env::temp_dir(),
                ..PlaywrightConfig::default()
            },
        }
    }

    #[test]
    fn script_sets_test_id_attribute_and_base_url() {
        let h = handle();
        let script = h.build_script(&[TestStep::Navigate {
            url: "/".to_string(),
            wait_for: None,
        }]);
        assert!(script.contains(r#"selectors.setTestIdAttribute("data-test")"#));
        assert!(script.contains(r#"const baseUrl = "https://practicesoftwaretesting.com""#));
        assert!(script.contains("await page.goto(baseUrl + \"/\");"));
        assert!(script.contains("await browser.close();"));
    }

    #[test]
    fn storage_state_seeds_the_context() {
        let mut config = PlaywrightConfig::default();
        config.screenshot_dir = std::env::temp_dir();
        config.storage_state = Some(PathBuf::from("/tmp/auth/customer2.json"));
        let h = PlaywrightHandle { config };
        let script = h.build_script(&[]);
        assert!(script.contains(r#"storageState: "/tmp/auth/customer2.json""#));
    }

    #[test]
    fn expect_text_polls_instead_of_reading_once() {
        let h = handle();
        let script = h.build_script(&[TestStep::Expect {
            target: Locator::test_id("nav-menu"),
            visible: None,
            text: None,
            text_contains: Some("Jack Howe".to_string()),
            count: None,
            disabled: None,
        }]);
        assert!(script.contains("pollFor"));
        assert!(script.contains(r#"page.getByTestId("nav-menu")"#));
        assert!(script.contains("Jack Howe"));
    }

    #[test]
    fn role_and_alt_locators_render_playwright_queries() {
        let h = handle();
        let script = h.build_script(&[
            TestStep::Click {
                target: Locator::Role {
                    role: "link".to_string(),
                    name: "Claw Hammer with Shock Reduction Grip".to_string(),
                },
                timeout_ms: None,
            },
            TestStep::Expect {
                target: Locator::AltText("Thor Hammer".to_string()),
                visible: Some(true),
                text: None,
                text_contains: None,
                count: None,
                disabled: None,
            },
        ]);
        assert!(script
            .contains(r#"page.getByRole("link", { name: "Claw Hammer with Shock Reduction Grip" })"#));
        assert!(script.contains(r#"page.getByAltText("Thor Hammer")"#));
    }

    #[test]
    fn masked_screenshot_hides_elements_first() {
        let h = handle();
        let script = h.build_script(&[TestStep::Screenshot {
            name: "home".to_string(),
            full_page: true,
            mask: vec![Locator::css("[title='banner']")],
        }]);
        let hide_at = script.find("visibility = 'hidden'").unwrap();
        let shot_at = script.find("page.screenshot").unwrap();
        assert!(hide_at < shot_at);
    }

    #[test]
    fn save_state_uses_context_storage_state() {
        let h = handle();
        let script = h.build_script(&[TestStep::SaveState {
            path: PathBuf::from("/tmp/auth/admin.json"),
        }]);
        assert!(script.contains(r#"await context.storageState({ path: "/tmp/auth/admin.json" });"#));
    }

    #[test]
    fn parse_report_success_collects_durations() {
        let h = handle();
        let steps = vec![
            TestStep::Navigate {
                url: "/".to_string(),
                wait_for: None,
            },
            TestStep::ExpectTitle {
                title: "Toolshop".to_string(),
            },
        ];
        let stdout = "{\"stepDone\": 0, \"ms\": 120}\n{\"stepDone\": 1, \"ms\": 30}\n{\"success\": true}\n";
        let report = h.parse_report(&steps, stdout);
        assert!(report.success);
        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.steps[0].duration_ms, 120);
        assert!(report.steps.iter().all(|s| s.success));
    }

    #[test]
    fn parse_report_failure_stops_at_failing_step() {
        let h = handle();
        let steps = vec![
            TestStep::Navigate {
                url: "/".to_string(),
                wait_for: None,
            },
            TestStep::Click {
                target: Locator::test_id("login-submit"),
                timeout_ms: None,
            },
            TestStep::ExpectTitle {
                title: "never checked".to_string(),
            },
        ];
        let stdout = "{\"stepDone\": 0, \"ms\": 100}\nsome page console noise\n{\"success\": false, \"step\": 1, \"error\": \"timeout\"}\n";
        let report = h.parse_report(&steps, stdout);
        assert!(!report.success);
        assert_eq!(report.steps.len(), 2);
        assert!(report.steps[0].success);
        assert!(!report.steps[1].success);
        assert_eq!(report.steps[1].error.as_deref(), Some("timeout"));
        assert_eq!(report.error.as_deref(), Some("timeout"));
    }
}
