//! Provider-specific connection descriptors
//!
//! A descriptor is the normalized, immutable form of a [`Configuration`] for
//! one provider. Adapters own their descriptor and hand shared references to
//! every resource handle they build.

use crate::config::{Configuration, ProviderKind};
use crate::error::{CloudError, Result};
use std::time::Duration;
use url::Url;

/// Path segment Keystone issues tokens from
pub const TOKEN_PATH: &str = "auth/tokens";

pub const AZURE_AUTHORITY: &str = "https://login.microsoftonline.com";

/// HTTP behaviour shared by every handle of a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub connect_timeout: Duration,
    pub debug_request: bool,
    pub debug_response: bool,
}

impl ConnectionOptions {
    fn from_config(config: &Configuration) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.timeout_secs()),
            debug_request: config.debug,
            debug_response: config.debug,
        }
    }

    /// Whether faults should be reported raw
    pub fn debug(&self) -> bool {
        self.debug_request || self.debug_response
    }
}

#[derive(Clone)]
pub struct OpenStackDescriptor {
    pub username: String,
    pub secret: String,
    /// Canonical token endpoint, always ending in `/auth/tokens`
    pub auth_url: String,
    pub domain_name: Option<String>,
    pub domain_id: Option<String>,
    pub project_name: Option<String>,
    pub project_id: Option<String>,
    pub region: Option<String>,
    pub connection: ConnectionOptions,
}

impl OpenStackDescriptor {
    /// Identity v3 base URL, i.e. the auth URL without the token path
    pub fn identity_url(&self) -> String {
        self.auth_url
            .strip_suffix(TOKEN_PATH)
            .unwrap_or(&self.auth_url)
            .trim_end_matches('/')
            .to_string()
    }
}

impl std::fmt::Debug for OpenStackDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenStackDescriptor")
            .field("username", &self.username)
            .field("auth_url", &self.auth_url)
            .field("domain_name", &self.domain_name)
            .field("domain_id", &self.domain_id)
            .field("project_name", &self.project_name)
            .field("project_id", &self.project_id)
            .field("region", &self.region)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

/// Azure service principal credentials
#[derive(Clone)]
pub struct AzureDescriptor {
    pub client_id: String,
    pub client_secret: String,
    pub tenant: Option<String>,
    pub subscription_id: Option<String>,
    pub authority: String,
    pub region: Option<String>,
    pub connection: ConnectionOptions,
}

impl std::fmt::Debug for AzureDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureDescriptor")
            .field("client_id", &self.client_id)
            .field("tenant", &self.tenant)
            .field("subscription_id", &self.subscription_id)
            .field("authority", &self.authority)
            .field("region", &self.region)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum ConnectionDescriptor {
    OpenStack(OpenStackDescriptor),
    Azure(AzureDescriptor),
}

impl ConnectionDescriptor {
    pub fn provider(&self) -> ProviderKind {
        match self {
            ConnectionDescriptor::OpenStack(_) => ProviderKind::OpenStack,
            ConnectionDescriptor::Azure(_) => ProviderKind::Azure,
        }
    }

    pub fn connection(&self) -> &ConnectionOptions {
        match self {
            ConnectionDescriptor::OpenStack(d) => &d.connection,
            ConnectionDescriptor::Azure(d) => &d.connection,
        }
    }
}

/// Normalize a configuration into the descriptor for its provider
pub fn build(config: &Configuration) -> Result<ConnectionDescriptor> {
    config.validate()?;

    let username = config.username.clone().unwrap_or_default().trim().to_string();
    let secret = config.secret.clone().unwrap_or_default();
    let connection = ConnectionOptions::from_config(config);

    let descriptor = match config.provider {
        ProviderKind::OpenStack => {
            let raw = config.auth_url.as_deref().unwrap_or_default();
            ConnectionDescriptor::OpenStack(OpenStackDescriptor {
                username,
                secret,
                auth_url: canonicalize_auth_url(raw)?,
                domain_name: non_blank(&config.domain_name),
                domain_id: non_blank(&config.domain_id),
                project_name: non_blank(&config.project_name),
                project_id: non_blank(&config.project_id),
                region: non_blank(&config.region),
                connection,
            })
        }
        ProviderKind::Azure => {
            let authority = match non_blank(&config.auth_url) {
                Some(url) => {
                    Url::parse(&url).map_err(|e| invalid_url(&url, e))?;
                    url.trim_end_matches('/').to_string()
                }
                None => AZURE_AUTHORITY.to_string(),
            };
            ConnectionDescriptor::Azure(AzureDescriptor {
                client_id: username,
                client_secret: secret,
                tenant: config.domain().map(str::to_string),
                subscription_id: config.project().map(str::to_string),
                authority,
                region: non_blank(&config.region),
                connection,
            })
        }
    };

    tracing::debug!(provider = %descriptor.provider(), "built connection descriptor");
    Ok(descriptor)
}

/// Append the token path to an identity URL unless it is already there
///
/// Idempotent: a canonical URL is returned unchanged.
pub fn canonicalize_auth_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CloudError::validation("authentication URL missing"));
    }
    Url::parse(trimmed).map_err(|e| invalid_url(trimmed, e))?;

    let base = trimmed.trim_end_matches('/');
    if base.ends_with(&format!("/{}", TOKEN_PATH)) {
        Ok(base.to_string())
    } else {
        Ok(format!("{}/{}", base, TOKEN_PATH))
    }
}

fn invalid_url(url: &str, err: url::ParseError) -> CloudError {
    CloudError::validation(format!("invalid authentication URL \"{}\": {}", url, err))
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn openstack(descriptor: ConnectionDescriptor) -> OpenStackDescriptor {
        match descriptor {
            ConnectionDescriptor::OpenStack(d) => d,
            other => panic!("expected OpenStack descriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_canonicalize_appends_token_path() {
        assert_eq!(
            canonicalize_auth_url("https://host:443/v3").unwrap(),
            "https://host:443/v3/auth/tokens"
        );
        assert_eq!(
            canonicalize_auth_url("https://host:443/v3/").unwrap(),
            "https://host:443/v3/auth/tokens"
        );
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        for raw in [
            "https://host:443/v3",
            "https://host/v3/auth/tokens",
            "https://host/v3/auth/tokens/",
            "http://10.0.0.1:5000/identity/v3/",
        ] {
            let once = canonicalize_auth_url(raw).unwrap();
            let twice = canonicalize_auth_url(&once).unwrap();
            assert_eq!(once, twice);
            assert!(once.ends_with("/auth/tokens"));
            assert!(!once.contains("tokens/auth"));
            assert!(!once["https://".len()..].contains("//"));
        }
    }

    #[test]
    fn test_canonicalize_rejects_garbage() {
        assert!(matches!(
            canonicalize_auth_url(""),
            Err(CloudError::Validation(_))
        ));
        assert!(matches!(
            canonicalize_auth_url("not a url"),
            Err(CloudError::Validation(_))
        ));
    }

    #[test]
    fn test_build_openstack() {
        let config = Configuration::new("jdoe", "pw")
            .with_auth_url("https://identity-3.eu-de-1.cloud.sap:443/v3")
            .with_timeout(7200)
            .with_debug(true);
        let d = openstack(build(&config).unwrap());

        assert_eq!(
            d.auth_url,
            "https://identity-3.eu-de-1.cloud.sap:443/v3/auth/tokens"
        );
        assert_eq!(d.identity_url(), "https://identity-3.eu-de-1.cloud.sap:443/v3");
        assert_eq!(d.domain_name.as_deref(), Some("monsoon3"));
        assert_eq!(d.domain_id, None);
        assert_eq!(d.connection.connect_timeout, Duration::from_secs(3600));
        assert!(d.connection.debug());
    }

    #[test]
    fn test_build_carries_both_name_and_id() {
        let config = Configuration::new("jdoe", "pw")
            .with_auth_url("https://host/v3")
            .with_domain_id("abc");
        let d = openstack(build(&config).unwrap());
        assert_eq!(d.domain_id.as_deref(), Some("abc"));
        assert_eq!(d.domain_name.as_deref(), Some("monsoon3"));
    }

    #[test]
    fn test_build_requires_credentials_first() {
        let config = Configuration::new("", "pw");
        assert_eq!(build(&config).unwrap_err().to_string(), "username missing");

        let config = Configuration::new("jdoe", "");
        assert_eq!(
            build(&config).unwrap_err().to_string(),
            "password/API key missing"
        );
    }

    #[test]
    fn test_build_openstack_requires_auth_url() {
        let config = Configuration::new("jdoe", "pw");
        assert_eq!(
            build(&config).unwrap_err().to_string(),
            "authentication URL missing"
        );
    }

    #[test]
    fn test_build_azure() {
        let config = Configuration::new("client-id", "client-secret")
            .with_provider(ProviderKind::Azure)
            .with_domain_id("tenant-guid")
            .with_project_id("subscription-guid");
        let descriptor = build(&config).unwrap();
        assert_eq!(descriptor.provider(), ProviderKind::Azure);

        let ConnectionDescriptor::Azure(d) = descriptor else {
            panic!("expected Azure descriptor");
        };
        assert_eq!(d.client_id, "client-id");
        assert_eq!(d.tenant.as_deref(), Some("tenant-guid"));
        assert_eq!(d.subscription_id.as_deref(), Some("subscription-guid"));
        assert_eq!(d.authority, AZURE_AUTHORITY);
    }

    #[test]
    fn test_debug_output_hides_secret() {
        let config = Configuration::new("jdoe", "hunter2").with_auth_url("https://host/v3");
        let printed = format!("{:?}", build(&config).unwrap());
        assert!(!printed.contains("hunter2"));
    }
}
