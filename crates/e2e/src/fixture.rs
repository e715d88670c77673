//! Authenticated fixtures
//!
//! A fixture binds one scenario run to one role's persisted session state.
//! Validation happens before any browser starts, so a missing or corrupt
//! session file fails the dependent scenario loudly instead of letting it
//! run unauthenticated. Teardown is guaranteed by the generated script: the
//! browser is closed in its `finally` block on every exit path, and each
//! scenario gets its own context, never shared across concurrent runs.

use std::path::{Path, PathBuf};
use tracing::debug;

use toolshop_common::{Role, RunConfig, SessionState};

use crate::browser::PlaywrightConfig;
use crate::error::E2eResult;
use crate::scenario::{Scenario, TestStep};

/// A validated handle to one role's persisted session state
#[derive(Debug, Clone)]
pub struct AuthenticatedFixture {
    role: Role,
    session_path: PathBuf,
}

impl AuthenticatedFixture {
    /// Validate and bind the role's session state.
    ///
    /// Fails with distinct errors for a missing file ("setup never ran"),
    /// an unparseable file, and an empty snapshot ("setup ran but produced
    /// wrong state").
    pub fn acquire(config: &RunConfig, role: Role) -> E2eResult<Self> {
        let session_path = config.session_file(role.id());
        SessionState::load(&session_path, role)?;
        debug!(role = role.id(), path = %session_path.display(), "fixture acquired");
        Ok(Self { role, session_path })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    /// Seed a browser configuration with this fixture's session state
    pub fn apply(&self, mut config: PlaywrightConfig) -> PlaywrightConfig {
        config.storage_state = Some(self.session_path.clone());
        config
    }

    /// Bring a freshly seeded context to the default origin when the
    /// scenario does not navigate on its own
    pub fn prepare(&self, scenario: &mut Scenario) {
        let navigates_first = matches!(scenario.steps.first(), Some(TestStep::Navigate { .. }));
        if !navigates_first {
            scenario.steps.insert(
                0,
                TestStep::Navigate {
                    url: "/".to_string(),
                    wait_for: None,
                },
            );
        }
    }
}
