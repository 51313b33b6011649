//! Target environments and per-role credentials.
//!
//! Both are resolved once at process start from environment variables and
//! never change afterwards.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::errors::{Result, SuiteError};

/// Environment used when `TEST_ENV` is not set
pub const DEFAULT_ENVIRONMENT: &str = "qa";

/// Named deployment the suite runs against
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentName {
    Local,
    Qa,
    Staging,
    Production,
}

impl FromStr for EnvironmentName {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(EnvironmentName::Local),
            "qa" => Ok(EnvironmentName::Qa),
            "staging" => Ok(EnvironmentName::Staging),
            "production" => Ok(EnvironmentName::Production),
            other => Err(SuiteError::config(format!(
                "Unknown environment '{}' (expected one of: local, qa, staging, production)",
                other
            ))),
        }
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnvironmentName::Local => "local",
            EnvironmentName::Qa => "qa",
            EnvironmentName::Staging => "staging",
            EnvironmentName::Production => "production",
        };
        f.write_str(name)
    }
}

/// URL overrides read from `BASE_URL` / `API_BASE_URL`
#[derive(Clone, Debug, Default)]
pub struct EnvOverrides {
    pub base_url: Option<String>,
    pub api_base_url: Option<String>,
}

/// Resolved target environment
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Environment {
    pub name: EnvironmentName,
    pub base_url: String,
    pub login_path: String,
    pub api_base_url: String,
}

impl Environment {
    /// Resolve an environment by name.
    ///
    /// An unknown name is a configuration error; nothing is defaulted.
    /// Overrides apply to every environment except `local`.
    pub fn resolve(name: &str, overrides: &EnvOverrides) -> Result<Self> {
        let name: EnvironmentName = name.parse()?;

        let (base_url, api_base_url) = match name {
            EnvironmentName::Local => (
                "http://localhost:3000".to_string(),
                "http://localhost:3001/api".to_string(),
            ),
            remote => {
                let host = match remote {
                    EnvironmentName::Qa => "https://qa-test.intellisense.io",
                    EnvironmentName::Staging => "https://staging.intellisense.io",
                    _ => "https://app.intellisense.io",
                };
                let base = match &overrides.base_url {
                    Some(url) => normalize_url(url, "BASE_URL")?,
                    None => host.to_string(),
                };
                let api = match &overrides.api_base_url {
                    Some(url) => normalize_url(url, "API_BASE_URL")?,
                    None => format!("{}/api", host),
                };
                (base, api)
            }
        };

        Ok(Environment {
            name,
            login_path: format!("{}/next/signin", base_url),
            base_url,
            api_base_url,
        })
    }

    /// Absolute URL for an application path such as `/next/profile`
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn normalize_url(raw: &str, var: &str) -> Result<String> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| SuiteError::config(format!("{} is not a valid URL ({}): {}", var, raw, e)))?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// User role with its own credential set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Standard,
    Admin,
    Readonly,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Standard, Role::Admin, Role::Readonly];

    fn env_prefix(self) -> &'static str {
        match self {
            Role::Standard => "QA_STANDARD_USER",
            Role::Admin => "QA_ADMIN_USER",
            Role::Readonly => "QA_READONLY_USER",
        }
    }

    fn defaults(self) -> (&'static str, &'static str) {
        match self {
            Role::Standard => ("standard_user@example.com", "QA Standard User"),
            Role::Admin => ("admin_user@example.com", "QA Admin User"),
            Role::Readonly => ("readonly_user@example.com", "QA ReadOnly User"),
        }
    }
}

/// Login credentials for one role
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}

impl Credentials {
    /// Read `<PREFIX>_EMAIL`, `<PREFIX>_PASSWORD` and `<PREFIX>_NAME`, falling
    /// back to placeholder values
    pub fn for_role(role: Role, lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let prefix = role.env_prefix();
        let (email, name) = role.defaults();
        let read = |suffix: &str, fallback: &str| {
            lookup(&format!("{}_{}", prefix, suffix))
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        Credentials {
            email: read("EMAIL", email),
            password: read("PASSWORD", "replace_with_actual_password"),
            display_name: read("NAME", name),
        }
    }
}

/// Credentials for every role
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialSet {
    pub standard: Credentials,
    pub admin: Credentials,
    pub readonly: Credentials,
}

impl CredentialSet {
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        CredentialSet {
            standard: Credentials::for_role(Role::Standard, lookup),
            admin: Credentials::for_role(Role::Admin, lookup),
            readonly: Credentials::for_role(Role::Readonly, lookup),
        }
    }

    pub fn get(&self, role: Role) -> &Credentials {
        match role {
            Role::Standard => &self.standard,
            Role::Admin => &self.admin,
            Role::Readonly => &self.readonly,
        }
    }
}

#[cfg(test)]
#[path = "environment_test.rs"]
mod environment_test;
