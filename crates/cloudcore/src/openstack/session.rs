//! Keystone v3 session
//!
//! A session authenticates lazily on first use with the password method and
//! keeps the issued token and service catalog for the lifetime of the handle
//! that owns it.

use crate::descriptor::OpenStackDescriptor;
use crate::error::{CloudError, Result};
use crate::fault::ApiFault;
use crate::model::{Endpoint, Tenant};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::OnceCell;

const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";
pub(crate) const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const PUBLIC_INTERFACE: &str = "public";

/// Token issued by Keystone along with its scope and catalog
#[derive(Debug, Clone)]
pub struct Token {
    pub value: String,
    pub project: Option<ScopedProject>,
    pub catalog: Vec<CatalogService>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    project: Option<ScopedProject>,
    #[serde(default)]
    catalog: Vec<CatalogService>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScopedProject {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: Option<NamedRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogService {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEndpoint {
    #[serde(default)]
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub region_id: Option<String>,
}

impl CatalogEndpoint {
    fn in_region(&self, region: &str) -> bool {
        self.region.as_deref() == Some(region) || self.region_id.as_deref() == Some(region)
    }
}

impl Token {
    pub fn tenant(&self) -> Result<Tenant> {
        let project = self.project.as_ref().ok_or_else(|| {
            CloudError::Authentication("token is not scoped to a project".to_string())
        })?;
        Ok(Tenant {
            id: project.id.clone(),
            name: project.name.clone(),
            domain_id: project.domain.as_ref().and_then(|d| d.id.clone()),
        })
    }

    /// Every catalog endpoint, flattened
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.catalog
            .iter()
            .flat_map(|service| {
                service.endpoints.iter().map(|e| Endpoint {
                    id: e.id.clone(),
                    url: e.url.clone(),
                    interface: e.interface.clone(),
                    region: e.region.clone().or_else(|| e.region_id.clone()),
                    service_type: Some(service.service_type.clone()),
                })
            })
            .collect()
    }

    /// Public URL of a service, preferring the given region
    pub fn public_url(&self, service_type: &str, region: Option<&str>) -> Option<String> {
        let candidates: Vec<&CatalogEndpoint> = self
            .catalog
            .iter()
            .filter(|s| s.service_type == service_type)
            .flat_map(|s| s.endpoints.iter())
            .filter(|e| e.interface.as_deref().unwrap_or(PUBLIC_INTERFACE) == PUBLIC_INTERFACE)
            .collect();

        region
            .and_then(|r| candidates.iter().find(|e| e.in_region(r)))
            .or_else(|| candidates.first())
            .map(|e| e.url.trim_end_matches('/').to_string())
    }
}

/// Password authentication request for a descriptor
pub fn auth_request(descriptor: &OpenStackDescriptor) -> Value {
    let domain = match (&descriptor.domain_id, &descriptor.domain_name) {
        (Some(id), _) => json!({ "id": id }),
        (None, Some(name)) => json!({ "name": name }),
        (None, None) => json!({ "id": "default" }),
    };

    let scope = match (&descriptor.project_id, &descriptor.project_name) {
        (Some(id), _) => json!({ "project": { "id": id } }),
        (None, Some(name)) => json!({ "project": { "name": name, "domain": domain } }),
        (None, None) => json!({ "domain": domain }),
    };

    json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": descriptor.username,
                        "domain": domain,
                        "password": descriptor.secret,
                    }
                }
            },
            "scope": scope,
        }
    })
}

/// Authenticated HTTP session against one OpenStack region
pub struct Session {
    http: reqwest::Client,
    descriptor: Arc<OpenStackDescriptor>,
    token: OnceCell<Token>,
}

impl Session {
    pub fn new(http: reqwest::Client, descriptor: Arc<OpenStackDescriptor>) -> Self {
        Self {
            http,
            descriptor,
            token: OnceCell::new(),
        }
    }

    pub fn descriptor(&self) -> &OpenStackDescriptor {
        &self.descriptor
    }

    /// The session token, authenticating on first call
    pub async fn token(&self) -> Result<&Token> {
        self.token.get_or_try_init(|| self.authenticate()).await
    }

    async fn authenticate(&self) -> Result<Token> {
        let descriptor = &self.descriptor;
        tracing::debug!(url = %descriptor.auth_url, user = %descriptor.username, "requesting token");

        let response = self
            .http
            .post(&descriptor.auth_url)
            .timeout(descriptor.connection.connect_timeout)
            .json(&auth_request(descriptor))
            .send()
            .await
            .map_err(|e| CloudError::Authentication(e.to_string()))?;

        let status = response.status();
        let subject = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        if !status.is_success() {
            let fault = ApiFault::new(status, body);
            return Err(CloudError::Authentication(
                fault.describe(descriptor.connection.debug()),
            ));
        }

        let value = subject.ok_or_else(|| {
            CloudError::Authentication(format!("response carries no {} header", SUBJECT_TOKEN_HEADER))
        })?;
        let parsed: TokenResponse = serde_json::from_str(&body)?;

        tracing::info!(
            project = parsed.token.project.as_ref().map(|p| p.name.as_str()).unwrap_or("-"),
            services = parsed.token.catalog.len(),
            "token issued"
        );

        Ok(Token {
            value,
            project: parsed.token.project,
            catalog: parsed.token.catalog,
        })
    }

    /// Public URL of a catalog service
    pub async fn endpoint(&self, service_type: &str) -> Result<String> {
        let region = self.descriptor.region.as_deref();
        self.token()
            .await?
            .public_url(service_type, region)
            .ok_or_else(|| {
                CloudError::Configuration(format!(
                    "no public {} endpoint in the service catalog",
                    service_type
                ))
            })
    }

    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<(StatusCode, String)> {
        let token = self.token().await?;
        let connection = &self.descriptor.connection;

        if connection.debug_request {
            tracing::debug!(method = %method, url = %url, "request");
        }

        let mut request = self
            .http
            .request(method, url)
            .timeout(connection.connect_timeout)
            .header(AUTH_TOKEN_HEADER, &token.value)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if connection.debug_response {
            tracing::debug!(status = %status, body = %text, "response");
        }
        Ok((status, text))
    }

    fn fault(&self, status: StatusCode, body: String) -> CloudError {
        let message = ApiFault::new(status, body).describe(self.descriptor.connection.debug());
        match status {
            StatusCode::UNAUTHORIZED => CloudError::Authentication(message),
            StatusCode::NOT_FOUND => CloudError::NotFound(message),
            _ => CloudError::Provider(message),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let (status, body) = self.send(Method::GET, url, None).await?;
        if !status.is_success() {
            return Err(self.fault(status, body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Like [`Session::get_json`], with 404 mapped to `None`
    pub async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let (status, body) = self.send(Method::GET, url, None).await?;
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(serde_json::from_str(&body)?)),
            s => Err(self.fault(s, body)),
        }
    }

    /// GET returning a raw body, `None` for 204 No Content
    pub async fn get_text(&self, url: &str) -> Result<Option<String>> {
        let (status, body) = self.send(Method::GET, url, None).await?;
        match status {
            StatusCode::NO_CONTENT => Ok(None),
            s if s.is_success() => Ok(Some(body)),
            s => Err(self.fault(s, body)),
        }
    }

    pub async fn post_json<T: DeserializeOwned>(&self, url: &str, body: &Value) -> Result<T> {
        let (status, text) = self.send(Method::POST, url, Some(body)).await?;
        if !status.is_success() {
            return Err(self.fault(status, text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn delete(&self, url: &str) -> Result<()> {
        let (status, body) = self.send(Method::DELETE, url, None).await?;
        if !status.is_success() {
            return Err(self.fault(status, body));
        }
        Ok(())
    }
}

/// Join a base URL and a relative path with exactly one slash
pub fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Ensure a service URL ends with the given API version segment
pub fn versioned(base: &str, version: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with(&format!("/{}", version)) {
        base.to_string()
    } else {
        join(base, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::descriptor::{self, ConnectionDescriptor};

    fn descriptor(config: Configuration) -> OpenStackDescriptor {
        match descriptor::build(&config).unwrap() {
            ConnectionDescriptor::OpenStack(d) => d,
            ConnectionDescriptor::Azure(_) => unreachable!(),
        }
    }

    const TOKEN_BODY: &str = r#"{
        "token": {
            "project": {"id": "p-1", "name": "BS-Automation", "domain": {"id": "d-1", "name": "monsoon3"}},
            "catalog": [
                {"type": "compute", "endpoints": [
                    {"id": "c1", "interface": "internal", "region": "eu-de-1", "url": "https://nova.internal/v2.1"},
                    {"id": "c2", "interface": "public", "region": "eu-nl-1", "url": "https://nova.eu-nl-1/v2.1/"},
                    {"id": "c3", "interface": "public", "region": "eu-de-1", "url": "https://nova.eu-de-1/v2.1"}
                ]},
                {"type": "arc", "endpoints": [
                    {"id": "a1", "interface": "public", "region_id": "eu-de-1", "url": "https://arc.eu-de-1"}
                ]}
            ]
        }
    }"#;

    fn token() -> Token {
        let parsed: TokenResponse = serde_json::from_str(TOKEN_BODY).unwrap();
        Token {
            value: "t".into(),
            project: parsed.token.project,
            catalog: parsed.token.catalog,
        }
    }

    #[test]
    fn test_auth_request_scopes_project_by_name() {
        let body = auth_request(&descriptor(
            Configuration::new("jdoe", "pw").with_auth_url("https://host/v3"),
        ));
        let user = &body["auth"]["identity"]["password"]["user"];
        assert_eq!(user["name"], "jdoe");
        assert_eq!(user["password"], "pw");
        assert_eq!(user["domain"]["name"], "monsoon3");
        assert_eq!(body["auth"]["scope"]["project"]["name"], "BS-Automation");
        assert_eq!(body["auth"]["scope"]["project"]["domain"]["name"], "monsoon3");
    }

    #[test]
    fn test_auth_request_prefers_ids() {
        let body = auth_request(&descriptor(
            Configuration::new("jdoe", "pw")
                .with_auth_url("https://host/v3")
                .with_domain_id("d-1")
                .with_project_id("p-1"),
        ));
        assert_eq!(body["auth"]["identity"]["password"]["user"]["domain"]["id"], "d-1");
        assert_eq!(body["auth"]["scope"]["project"]["id"], "p-1");
        assert!(body["auth"]["scope"]["project"].get("name").is_none());
    }

    #[test]
    fn test_token_tenant() {
        let tenant = token().tenant().unwrap();
        assert_eq!(tenant.id, "p-1");
        assert_eq!(tenant.domain_id.as_deref(), Some("d-1"));

        let unscoped = Token {
            value: "t".into(),
            project: None,
            catalog: vec![],
        };
        assert!(matches!(unscoped.tenant(), Err(CloudError::Authentication(_))));
    }

    #[test]
    fn test_public_url_prefers_region() {
        let token = token();
        assert_eq!(
            token.public_url("compute", Some("eu-de-1")).as_deref(),
            Some("https://nova.eu-de-1/v2.1")
        );
        assert_eq!(
            token.public_url("compute", None).as_deref(),
            Some("https://nova.eu-nl-1/v2.1")
        );
        assert_eq!(
            token.public_url("arc", Some("eu-de-1")).as_deref(),
            Some("https://arc.eu-de-1")
        );
        assert_eq!(token.public_url("dns", None), None);
    }

    #[test]
    fn test_endpoints_are_flattened() {
        let endpoints = token().endpoints();
        assert_eq!(endpoints.len(), 4);
        assert_eq!(endpoints[3].service_type.as_deref(), Some("arc"));
        assert_eq!(endpoints[3].region.as_deref(), Some("eu-de-1"));
    }

    #[test]
    fn test_url_helpers() {
        assert_eq!(join("https://h/v2.1/", "/servers"), "https://h/v2.1/servers");
        assert_eq!(versioned("https://neutron:9696", "v2.0"), "https://neutron:9696/v2.0");
        assert_eq!(versioned("https://neutron:9696/v2.0/", "v2.0"), "https://neutron:9696/v2.0");
    }
}
