//! Option layering for the server tool
//!
//! Command-line values win over the YAML file, the file wins over an OpenRC
//! file, and defaults fill whatever is left.

use anyhow::{Context, Result};
use cloudcore::config::{Configuration, ProviderKind};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_AUTH_URL: &str = "https://identity-3.eu-de-1.cloud.sap:443/v3";
pub const DEFAULT_DOMAIN: &str = cloudcore::config::DEFAULT_DOMAIN_NAME;
pub const DEFAULT_TIMEOUT: i64 = cloudcore::config::DEFAULT_TIMEOUT;

const ESSENTIAL: [&str; 3] = ["username", "domain", "project"];

/// One layer of options; `None` means "not set in this layer"
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub debug: Option<bool>,
    pub provider: Option<String>,
    pub auth_url: Option<String>,
    pub domain: Option<String>,
    pub domain_id: Option<String>,
    pub project: Option<String>,
    pub project_id: Option<String>,
    pub region: Option<String>,
    pub create: Option<bool>,
    pub flavor: Option<String>,
    pub image: Option<String>,
    pub keypair: Option<String>,
    pub network: Option<String>,
    pub name: Option<String>,
    /// Server to terminate; empty selects one interactively
    pub terminate: Option<String>,
    pub username: Option<String>,
    #[serde(alias = "api_key")]
    pub password: Option<String>,
    pub timeout: Option<i64>,
}

impl Settings {
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("invalid YAML in {}", path.display()))
    }

    /// Layer built from parsed OpenRC variables
    pub fn from_openrc(vars: &[(String, String)]) -> Self {
        let mut rc = Configuration {
            domain_name: None,
            project_name: None,
            region: None,
            ..Configuration::default()
        };
        rc.apply_openrc(vars);
        Settings {
            username: rc.username,
            auth_url: rc.auth_url,
            domain: rc.domain_name,
            domain_id: rc.domain_id,
            project: rc.project_name,
            project_id: rc.project_id,
            region: rc.region,
            ..Settings::default()
        }
    }

    /// Fill every unset field of `self` from `lower`
    pub fn merge(self, lower: Settings) -> Settings {
        Settings {
            debug: self.debug.or(lower.debug),
            provider: self.provider.or(lower.provider),
            auth_url: self.auth_url.or(lower.auth_url),
            domain: self.domain.or(lower.domain),
            domain_id: self.domain_id.or(lower.domain_id),
            project: self.project.or(lower.project),
            project_id: self.project_id.or(lower.project_id),
            region: self.region.or(lower.region),
            create: self.create.or(lower.create),
            flavor: self.flavor.or(lower.flavor),
            image: self.image.or(lower.image),
            keypair: self.keypair.or(lower.keypair),
            network: self.network.or(lower.network),
            name: self.name.or(lower.name),
            terminate: self.terminate.or(lower.terminate),
            username: self.username.or(lower.username),
            password: self.password.or(lower.password),
            timeout: self.timeout.or(lower.timeout),
        }
    }

    /// Fill what is still unset; Azure gets neither the Keystone URL nor the
    /// domain default
    pub fn with_defaults(self) -> Settings {
        let azure = self
            .provider
            .as_deref()
            .is_some_and(|tag| matches!(tag.parse::<ProviderKind>(), Ok(ProviderKind::Azure)));
        let (auth_url, domain) = if azure {
            (None, None)
        } else {
            (Some(DEFAULT_AUTH_URL.to_string()), Some(DEFAULT_DOMAIN.to_string()))
        };
        self.merge(Settings {
            debug: Some(false),
            provider: Some(ProviderKind::default().to_string()),
            auth_url,
            domain,
            create: Some(false),
            timeout: Some(DEFAULT_TIMEOUT),
            ..Settings::default()
        })
    }

    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    pub fn create(&self) -> bool {
        self.create.unwrap_or(false)
    }

    /// Essential options that are unset or blank; an id stands in for a name
    pub fn missing_essentials(&self) -> Vec<&'static str> {
        let present = [
            is_set(&self.username),
            is_set(&self.domain) || is_set(&self.domain_id),
            is_set(&self.project) || is_set(&self.project_id),
        ];
        ESSENTIAL
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn has_password(&self) -> bool {
        is_set(&self.password)
    }

    pub fn to_configuration(&self) -> Result<Configuration> {
        let provider = match &self.provider {
            Some(tag) => tag.parse::<ProviderKind>()?,
            None => ProviderKind::default(),
        };
        let mut config = Configuration {
            username: self.username.clone(),
            secret: self.password.clone(),
            auth_url: self.auth_url.clone(),
            domain_name: self.domain.clone(),
            domain_id: self.domain_id.clone(),
            project_name: self.project.clone(),
            project_id: self.project_id.clone(),
            provider,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            debug: self.debug(),
            ..Configuration::default()
        };
        if self.region.is_some() {
            config.region = self.region.clone();
        }
        Ok(config)
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// "Error: ..." text for missing essential options
pub fn missing_message(missing: &[&str]) -> String {
    let plural = if missing.len() == 1 { " is" } else { "s are" };
    format!(
        "The following option{} missing:\n{}",
        plural,
        missing.join("\n")
    )
}
