//! Toolshop Common Library
//!
//! Shared types for the Toolshop E2E harness: run configuration, role and
//! credential descriptors, the persisted session-state model, and the typed
//! shapes of the store API.

pub mod catalog;
pub mod config;
pub mod error;
pub mod roles;
pub mod session;

// Re-export commonly used types
pub use catalog::{LoginRequest, Product, ProductPage, SearchPage, TokenResponse};
pub use config::{CaptureConfig, ProjectConfig, ProjectKind, RunConfig, ViewportConfig};
pub use error::{Error, Result};
pub use roles::{Credentials, Role, RoleProfile};
pub use session::SessionState;

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
