//! Error types for the E2E harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("node not found on PATH. Install Node.js and `npm install playwright`")]
    NodeNotFound,

    #[error("Playwright script failed: {0}")]
    Script(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Target not ready: {target} after {attempts} attempts")]
    TargetNotReady { target: String, attempts: usize },

    #[error("{endpoint} returned unexpected status {status}")]
    UnexpectedStatus { endpoint: String, status: u16 },

    #[error("Project {project} skipped: dependency {dependency} failed")]
    DependencyFailed { project: String, dependency: String },

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Screenshot mismatch: {name} differs by {diff_ratio:.4} (threshold: {threshold:.4})")]
    SnapshotMismatch {
        name: String,
        diff_ratio: f64,
        threshold: f64,
    },

    #[error("Baseline not found: {0}")]
    BaselineNotFound(String),

    #[error(transparent)]
    Common(#[from] toolshop_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type E2eResult<T> = Result<T, E2eError>;
