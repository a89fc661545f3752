//! Unified connection configuration

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_DOMAIN_NAME: &str = "monsoon3";
pub const DEFAULT_PROJECT_NAME: &str = "BS-Automation";
pub const DEFAULT_REGION: &str = "eu-de-1";
pub const DEFAULT_TIMEOUT: i64 = 300;
pub const MAX_TIMEOUT: i64 = 3600;

/// Cloud provider tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenStack,
    Azure,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenStack => "openstack",
            ProviderKind::Azure => "azure",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openstack" => Ok(ProviderKind::OpenStack),
            "azure" => Ok(ProviderKind::Azure),
            other => Err(CloudError::validation(format!(
                "unknown provider \"{}\" (expected openstack or azure)",
                other
            ))),
        }
    }
}

/// Connection parameters shared by every provider
///
/// Use either the `*_name` or the `*_id` field where both exist; an id always
/// wins over the matching name.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub username: Option<String>,

    /// Password or API key
    #[serde(alias = "api_key", alias = "password")]
    pub secret: Option<String>,

    pub auth_url: Option<String>,
    pub domain_name: Option<String>,
    pub domain_id: Option<String>,
    pub project_name: Option<String>,
    pub project_id: Option<String>,
    pub provider: ProviderKind,
    pub region: Option<String>,

    /// Timeout in seconds, see [`normalize_timeout`]
    pub timeout: i64,

    pub debug: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            username: None,
            secret: None,
            auth_url: None,
            domain_name: Some(DEFAULT_DOMAIN_NAME.to_string()),
            domain_id: None,
            project_name: Some(DEFAULT_PROJECT_NAME.to_string()),
            project_id: None,
            provider: ProviderKind::default(),
            region: Some(DEFAULT_REGION.to_string()),
            timeout: DEFAULT_TIMEOUT,
            debug: false,
        }
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("username", &self.username)
            .field("secret", &self.secret.as_ref().map(|_| "********"))
            .field("auth_url", &self.auth_url)
            .field("domain_name", &self.domain_name)
            .field("domain_id", &self.domain_id)
            .field("project_name", &self.project_name)
            .field("project_id", &self.project_id)
            .field("provider", &self.provider)
            .field("region", &self.region)
            .field("timeout", &self.timeout)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Configuration {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            secret: Some(secret.into()),
            ..Self::default()
        }
    }

    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = Some(auth_url.into());
        self
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_domain_id(mut self, domain_id: impl Into<String>) -> Self {
        self.domain_id = Some(domain_id.into());
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_timeout(mut self, timeout: i64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Reject configurations that can never authenticate
    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.username) {
            return Err(CloudError::validation("username missing"));
        }
        if is_blank(&self.secret) {
            return Err(CloudError::validation("password/API key missing"));
        }
        Ok(())
    }

    /// Timeout clamped into `1..=3600` seconds
    pub fn timeout_secs(&self) -> u64 {
        normalize_timeout(self.timeout)
    }

    /// Domain identifier preferred over the name
    pub fn domain(&self) -> Option<&str> {
        non_blank(&self.domain_id).or_else(|| non_blank(&self.domain_name))
    }

    /// Project identifier preferred over the name
    pub fn project(&self) -> Option<&str> {
        non_blank(&self.project_id).or_else(|| non_blank(&self.project_name))
    }

    /// Fill unset fields from parsed OpenRC variables
    ///
    /// Fields that already carry a value are left untouched.
    pub fn apply_openrc(&mut self, vars: &[(String, String)]) {
        for (key, value) in vars {
            let slot = match key.as_str() {
                "os_username" => &mut self.username,
                "os_auth_url" => &mut self.auth_url,
                "os_user_domain_name" | "os_project_domain_name" => &mut self.domain_name,
                "os_user_domain_id" | "os_project_domain_id" => &mut self.domain_id,
                "os_project_name" | "os_tenant_name" => &mut self.project_name,
                "os_project_id" | "os_tenant_id" => &mut self.project_id,
                "os_region_name" => &mut self.region,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.clone());
            }
        }
    }
}

/// Clamp a user supplied timeout: non-positive means the default of 300s,
/// anything above an hour is capped at 3600s
pub fn normalize_timeout(timeout: i64) -> u64 {
    if timeout <= 0 {
        DEFAULT_TIMEOUT as u64
    } else {
        timeout.min(MAX_TIMEOUT) as u64
    }
}

fn is_blank(value: &Option<String>) -> bool {
    non_blank(value).is_none()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
