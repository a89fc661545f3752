//! Azure Resource Manager session
//!
//! Authenticates a service principal with the OAuth2 client-credentials flow
//! on first use and issues ARM requests with the resulting bearer token.

use crate::descriptor::AzureDescriptor;
use crate::error::{CloudError, Result};
use crate::fault::ApiFault;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub const MANAGEMENT_URL: &str = "https://management.azure.com";
const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// One page of an ARM collection
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default, rename = "nextLink")]
    pub next_link: Option<String>,
}

/// Generic ARM resource envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ArmResource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: Value,
}

impl ArmResource {
    pub fn provisioning_state(&self) -> Option<String> {
        self.properties
            .get("provisioningState")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

pub struct AzureSession {
    http: reqwest::Client,
    descriptor: Arc<AzureDescriptor>,
    token: OnceCell<String>,
}

impl AzureSession {
    pub fn new(http: reqwest::Client, descriptor: Arc<AzureDescriptor>) -> Self {
        Self {
            http,
            descriptor,
            token: OnceCell::new(),
        }
    }

    pub fn descriptor(&self) -> &AzureDescriptor {
        &self.descriptor
    }

    pub fn subscription(&self) -> Result<&str> {
        self.descriptor.subscription_id.as_deref().ok_or_else(|| {
            CloudError::Configuration("subscription id (project) missing".to_string())
        })
    }

    pub fn region(&self) -> Result<&str> {
        self.descriptor
            .region
            .as_deref()
            .ok_or_else(|| CloudError::Configuration("region missing".to_string()))
    }

    /// URL of a path below the configured subscription
    pub fn subscription_url(&self, path: &str) -> Result<String> {
        Ok(format!(
            "{}/subscriptions/{}/{}",
            MANAGEMENT_URL,
            self.subscription()?,
            path.trim_start_matches('/')
        ))
    }

    pub async fn access_token(&self) -> Result<&str> {
        self.token
            .get_or_try_init(|| self.authenticate())
            .await
            .map(String::as_str)
    }

    async fn authenticate(&self) -> Result<String> {
        let descriptor = &self.descriptor;
        let tenant = descriptor.tenant.as_deref().ok_or_else(|| {
            CloudError::Configuration("tenant id (domain) missing".to_string())
        })?;
        let url = format!("{}/{}/oauth2/v2.0/token", descriptor.authority, tenant);
        tracing::debug!(url = %url, client_id = %descriptor.client_id, "requesting token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", descriptor.client_id.as_str()),
            ("client_secret", descriptor.client_secret.as_str()),
            ("scope", MANAGEMENT_SCOPE),
        ];
        let response = self
            .http
            .post(&url)
            .timeout(descriptor.connection.connect_timeout)
            .form(&form)
            .send()
            .await
            .map_err(|e| CloudError::Authentication(e.to_string()))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CloudError::Authentication(
                ApiFault::new(status, body).describe(descriptor.connection.debug()),
            ));
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        tracing::info!(expires_in = token.expires_in.unwrap_or_default(), "token issued");
        Ok(token.access_token)
    }

    async fn send(&self, method: Method, url: &str) -> Result<(StatusCode, String)> {
        let token = self.access_token().await?;
        let connection = &self.descriptor.connection;

        if connection.debug_request {
            tracing::debug!(method = %method, url = %url, "request");
        }

        let response = self
            .http
            .request(method, url)
            .timeout(connection.connect_timeout)
            .bearer_auth(token)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if connection.debug_response {
            tracing::debug!(status = %status, body = %body, "response");
        }
        Ok((status, body))
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
        let (status, body) = self.send(Method::GET, url).await?;
        if !status.is_success() {
            return Err(self.fault(status, body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let (status, body) = self.send(Method::GET, url).await?;
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(serde_json::from_str(&body)?)),
            s => Err(self.fault(s, body)),
        }
    }

    pub async fn delete(&self, url: &str) -> Result<()> {
        let (status, body) = self.send(Method::DELETE, url).await?;
        if !status.is_success() {
            return Err(self.fault(status, body));
        }
        Ok(())
    }

    /// Every item of a collection, following `nextLink`
    pub async fn list<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());
        while let Some(url) = next {
            let page: Page<T> = self.get_json(&url).await?;
            items.extend(page.value);
            next = page.next_link;
        }
        Ok(items)
    }

    /// Resources of one provider type in the subscription
    pub async fn list_resources(&self, resource_type: &str, api_version: &str) -> Result<Vec<ArmResource>> {
        let url = self.subscription_url(&format!(
            "providers/{}?api-version={}",
            resource_type, api_version
        ))?;
        self.list(&url).await
    }

    /// URL of a resource by its full id
    pub fn resource_url(&self, id: &str, api_version: &str) -> String {
        format!(
            "{}/{}?api-version={}",
            MANAGEMENT_URL,
            id.trim_start_matches('/'),
            api_version
        )
    }
}
