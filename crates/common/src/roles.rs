//! Role and credential descriptors
//!
//! Credentials are sourced from the process environment per role
//! (`TOOLSHOP_<ROLE>_EMAIL` / `TOOLSHOP_<ROLE>_PASSWORD`) and are never
//! hard-coded in fixture logic.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Seeded store accounts the suites run as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Customer1,
    Customer2,
    Customer3,
}

impl Role {
    /// All roles the setup task provisions
    pub fn all() -> [Role; 4] {
        [Role::Admin, Role::Customer1, Role::Customer2, Role::Customer3]
    }

    /// Stable identifier, used for session file names and env var prefixes
    pub fn id(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer1 => "customer1",
            Role::Customer2 => "customer2",
            Role::Customer3 => "customer3",
        }
    }

    /// Parse a role id
    pub fn parse(s: &str) -> Result<Role> {
        match s {
            "admin" => Ok(Role::Admin),
            "customer1" => Ok(Role::Customer1),
            "customer2" => Ok(Role::Customer2),
            "customer3" => Ok(Role::Customer3),
            other => Err(Error::UnknownRole(other.to_string())),
        }
    }

    /// Name shown in the nav menu once this role is signed in
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "John Doe",
            Role::Customer1 => "Jane Doe",
            Role::Customer2 => "Jack Howe",
            Role::Customer3 => "Bob Smith",
        }
    }

    /// URL suffix the login redirect lands on
    pub fn post_login_url_suffix(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            _ => "/account",
        }
    }

    /// Text the page-title marker must contain after a successful login.
    /// Role-specific so the check confirms the *correct* account, not just
    /// some authenticated session.
    pub fn login_marker_text(&self) -> &'static str {
        match self {
            Role::Admin => "Sales over the years",
            _ => "My account",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// A credential pair for one role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Read this role's credentials from the environment
    pub fn from_env(role: Role) -> Result<Self> {
        let prefix = role.id().to_uppercase();
        let email_var = format!("TOOLSHOP_{}_EMAIL", prefix);
        let password_var = format!("TOOLSHOP_{}_PASSWORD", prefix);

        let email =
            std::env::var(&email_var).map_err(|_| Error::MissingEnv(email_var.clone()))?;
        let password =
            std::env::var(&password_var).map_err(|_| Error::MissingEnv(password_var.clone()))?;

        Ok(Self { email, password })
    }
}

/// Everything the auth setup task needs to provision one role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleProfile {
    pub role: Role,
    pub credentials: Credentials,
    /// URL suffix to wait for after submitting the login form
    pub expected_url_suffix: String,
    /// Text the page-title element must contain on the landing page
    pub expected_marker_text: String,
}

impl RoleProfile {
    /// Build a profile for one role from environment credentials
    pub fn from_env(role: Role) -> Result<Self> {
        Ok(Self {
            role,
            credentials: Credentials::from_env(role)?,
            expected_url_suffix: role.post_login_url_suffix().to_string(),
            expected_marker_text: role.login_marker_text().to_string(),
        })
    }

    /// Build the full role table from environment credentials
    pub fn load_all() -> Result<Vec<Self>> {
        Role::all().iter().map(|r| Self::from_env(*r)).collect()
    }
}
