//! Persisted session state
//!
//! The on-disk format is Playwright's storage-state snapshot (cookies plus
//! per-origin local storage). The harness owns only the path convention
//! (one file per role under the auth dir) and the write-once-then-read-many
//! access pattern; setup writes, fixtures read.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::roles::Role;

/// A serialized browser session snapshot for one role
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub cookies: Vec<Cookie>,

    #[serde(default)]
    pub origins: Vec<OriginState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
    pub origin: String,
    #[serde(default)]
    pub local_storage: Vec<StorageEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEntry {
    pub name: String,
    pub value: String,
}

impl SessionState {
    /// True when the snapshot carries no authentication material at all
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.origins.iter().all(|o| o.local_storage.is_empty())
    }

    /// Load and validate a role's session state.
    ///
    /// A missing file, an unparseable file, and an empty snapshot are three
    /// distinct hard failures so a dependent scenario can tell "setup never
    /// ran" apart from "setup ran but produced wrong state".
    pub fn load(path: &Path, role: Role) -> Result<Self> {
        if !path.exists() {
            return Err(Error::SessionStateNotFound {
                role: role.id().to_string(),
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let state: SessionState =
            serde_json::from_str(&content).map_err(|e| Error::SessionStateUnreadable {
                role: role.id().to_string(),
                reason: e.to_string(),
            })?;

        if state.is_empty() {
            return Err(Error::SessionStateEmpty {
                role: role.id().to_string(),
            });
        }

        debug!(
            role = role.id(),
            cookies = state.cookies.len(),
            origins = state.origins.len(),
            "loaded session state"
        );
        Ok(state)
    }

    /// Persist a snapshot, overwriting any prior file for the role
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
