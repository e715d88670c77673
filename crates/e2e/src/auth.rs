//! Session provisioning
//!
//! One parameterized login-and-persist procedure, iterated over the role
//! table. Each role gets exactly one session-state file per run; re-running
//! overwrites the prior file.

use std::path::Path;
use tracing::info;

use toolshop_common::{RoleProfile, SessionState};

use crate::browser::{PlaywrightHandle, RunReport};
use crate::error::E2eResult;
use crate::pages::LoginPage;
use crate::scenario::{Locator, Scenario, TestStep};

/// Build the login-and-persist scenario for one role.
///
/// Step order is load-bearing: the URL wait comes strictly before the
/// marker assertion so the check never runs against the stale
/// pre-navigation DOM, and the marker text is role-specific so the check
/// confirms the correct account rather than just some login.
pub fn setup_scenario(profile: &RoleProfile, session_path: &Path) -> Scenario {
    let mut scenario = Scenario::new(format!("provision-{}", profile.role.id()));
    scenario.description = format!("log in as {} and persist session state", profile.role.id());

    let mut login = LoginPage::new(&mut scenario);
    login.goto();
    login.login(&profile.credentials.email, &profile.credentials.password);

    scenario.push(TestStep::WaitForUrl {
        pattern: format!("**{}", profile.expected_url_suffix),
        timeout_ms: 10_000,
    });
    scenario.push(TestStep::Expect {
        target: Locator::test_id("page-title"),
        visible: Some(true),
        text: None,
        text_contains: Some(profile.expected_marker_text.clone()),
        count: None,
        disabled: None,
    });
    scenario.push(TestStep::SaveState {
        path: session_path.to_path_buf(),
    });

    scenario
}

/// Log one role in and persist its session state.
///
/// On success the written file is re-read and validated, so a setup that
/// "passed" in the browser but produced an empty snapshot still fails here
/// rather than poisoning every dependent scenario.
pub async fn provision(
    handle: &PlaywrightHandle,
    profile: &RoleProfile,
    session_path: &Path,
) -> E2eResult<RunReport> {
    info!(role = profile.role.id(), "provisioning session");
    let scenario = setup_scenario(profile, session_path);
    let report = handle.run(&scenario).await?;

    if report.success {
        SessionState::load(session_path, profile.role)?;
        info!(
            role = profile.role.id(),
            path = %session_path.display(),
            "session state persisted"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use toolshop_common::{Credentials, Role};

    fn profile(role: Role) -> RoleProfile {
        RoleProfile {
            role,
            credentials: Credentials {
                email: format!("{}@example.test", role.id()),
                password: "welcome01".to_string(),
            },
            expected_url_suffix: role.post_login_url_suffix().to_string(),
            expected_marker_text: role.login_marker_text().to_string(),
        }
    }

    #[test]
    fn url_wait_comes_before_marker_assertion() {
        let scenario = setup_scenario(&profile(Role::Customer2), Path::new(".auth/customer2.json"));
        let url_wait = scenario
            .steps
            .iter()
            .position(|s| matches!(s, TestStep::WaitForUrl { .. }))
            .unwrap();
        let marker = scenario
            .steps
            .iter()
            .position(|s| matches!(s, TestStep::Expect { .. }))
            .unwrap();
        assert!(url_wait < marker);
    }

    #[test]
    fn save_state_is_the_final_step() {
        let scenario = setup_scenario(&profile(Role::Admin), Path::new(".auth/admin.json"));
        assert_eq!(
            scenario.steps.last().unwrap(),
            &TestStep::SaveState {
                path: PathBuf::from(".auth/admin.json"),
            }
        );
    }

    #[test]
    fn admin_waits_for_its_dashboard() {
        let scenario = setup_scenario(&profile(Role::Admin), Path::new(".auth/admin.json"));
        assert!(scenario.steps.iter().any(|s| matches!(
            s,
            TestStep::WaitForUrl { pattern, .. } if pattern == "**/admin/dashboard"
        )));
        assert!(scenario.steps.iter().any(|s| matches!(
            s,
            TestStep::Expect { text_contains: Some(t), .. } if t == "Sales over the years"
        )));
    }

    #[test]
    fn credentials_flow_through_the_login_page() {
        let scenario = setup_scenario(
            &profile(Role::Customer3),
            Path::new(".auth/customer3.json"),
        );
        assert!(scenario.steps.iter().any(|s| matches!(
            s,
            TestStep::Fill { value, .. } if value == "customer3@example.test"
        )));
    }
}
