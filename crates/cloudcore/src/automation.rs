//! Automation agent inventory
//!
//! Finds the agent-orchestration (Arc) and job-orchestration (Lyra) services
//! in the identity catalog and lists the agents registered for the project.

use crate::descriptor::ConnectionOptions;
use crate::error::{CloudError, Result};
use crate::fault::ApiFault;
use crate::model::{Attributes, Endpoint};
use crate::service::Identity;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;

/// Substring identifying the agent-orchestration endpoint
pub const AGENT_SERVICE_MARKER: &str = "arc";

/// Substring identifying the job-orchestration endpoint
pub const JOB_SERVICE_MARKER: &str = "lyra";

const AGENT_ID_FIELD: &str = "agent_id";

/// Agent-orchestration API
#[async_trait]
pub trait AgentApi: Send + Sync {
    async fn list_agents(&self, token: &str) -> Result<Vec<Attributes>>;
}

/// REST client for the Arc agent service
pub struct ArcClient {
    http: reqwest::Client,
    base_url: String,
    debug: bool,
}

impl ArcClient {
    pub fn new(base_url: impl Into<String>, connection: &ConnectionOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(connection.connect_timeout)
            .timeout(connection.connect_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            debug: connection.debug(),
        })
    }
}

#[async_trait]
impl AgentApi for ArcClient {
    async fn list_agents(&self, token: &str) -> Result<Vec<Attributes>> {
        let url = format!("{}/api/v1/agents", self.base_url);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("X-Auth-Token", token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if self.debug {
            tracing::debug!(status = %status, body = %body, "agent list response");
        }

        if !status.is_success() {
            let fault = ApiFault::new(status, body);
            let message = fault.describe(self.debug);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    CloudError::Authentication(message)
                }
                _ => CloudError::Provider(message),
            });
        }

        let agents: Vec<Value> = serde_json::from_str(&body)?;
        Ok(agents
            .into_iter()
            .filter_map(|agent| match agent {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }
}

/// URLs of the automation services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationEndpoints {
    pub agent_url: String,
    pub job_url: String,
}

impl AutomationEndpoints {
    /// Pick the first agent and job endpoints from a catalog
    pub fn discover(endpoints: &[Endpoint]) -> Result<Self> {
        let find = |marker: &str| {
            endpoints
                .iter()
                .find(|e| e.url.contains(marker))
                .map(|e| e.url.clone())
                .ok_or_else(|| {
                    CloudError::Configuration(format!(
                        "required endpoint not found: no \"{}\" service in the identity catalog",
                        marker
                    ))
                })
        };

        Ok(Self {
            agent_url: find(AGENT_SERVICE_MARKER)?,
            job_url: find(JOB_SERVICE_MARKER)?,
        })
    }
}

/// Agents keyed by id, in response order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentMap {
    entries: Vec<(String, Attributes)>,
}

impl AgentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an agent, keeping its first position
    pub fn insert(&mut self, id: String, attributes: Attributes) {
        match self.entries.iter_mut().find(|(k, _)| *k == id) {
            Some(entry) => entry.1 = attributes,
            None => self.entries.push((id, attributes)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Attributes> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attributes)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Promote each record's `agent_id` to the map key
pub fn index_agents(records: Vec<Attributes>) -> AgentMap {
    let mut agents = AgentMap::new();
    for mut record in records {
        let id = match record.remove(AGENT_ID_FIELD) {
            Some(Value::String(id)) => id,
            Some(Value::Null) | None => {
                tracing::warn!("skipping agent record without {}", AGENT_ID_FIELD);
                continue;
            }
            Some(other) => other.to_string(),
        };
        agents.insert(id, record);
    }
    agents
}

/// Automation inventory bound to one identity session
pub struct Automation {
    endpoints: AutomationEndpoints,
    token: String,
    client: Arc<dyn AgentApi>,
}

impl Automation {
    /// Discover the automation services and capture the current token
    pub async fn new(identity: Identity, connection: &ConnectionOptions) -> Result<Self> {
        let endpoints = AutomationEndpoints::discover(&identity.endpoints().await?)?;
        let token = identity
            .auth_token()
            .await
            .map_err(CloudError::into_authentication)?;
        let client = ArcClient::new(&endpoints.agent_url, connection)?;

        tracing::debug!(agent_url = %endpoints.agent_url, job_url = %endpoints.job_url, "automation endpoints");
        Ok(Self::with_client(endpoints, token, Arc::new(client)))
    }

    pub fn with_client(
        endpoints: AutomationEndpoints,
        token: impl Into<String>,
        client: Arc<dyn AgentApi>,
    ) -> Self {
        Self {
            endpoints,
            token: token.into(),
            client,
        }
    }

    pub fn endpoints(&self) -> &AutomationEndpoints {
        &self.endpoints
    }

    /// Agents visible with the captured token
    pub async fn agent_list(&self) -> Result<AgentMap> {
        self.agent_list_with_token(&self.token).await
    }

    pub async fn agent_list_with_token(&self, token: &str) -> Result<AgentMap> {
        let records = self
            .client
            .list_agents(token)
            .await
            .map_err(CloudError::into_authentication)?;
        Ok(index_agents(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Sdk;
    use crate::testing::StubSdk;
    use serde_json::json;
    use std::sync::Mutex;

    struct StubAgents {
        records: Vec<Value>,
        tokens: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AgentApi for StubAgents {
        async fn list_agents(&self, token: &str) -> Result<Vec<Attributes>> {
            self.tokens.lock().unwrap().push(token.to_string());
            if token == "expired" {
                return Err(CloudError::Provider("token expired".into()));
            }
            Ok(self
                .records
                .iter()
                .map(|r| r.as_object().cloned().unwrap())
                .collect())
        }
    }

    fn endpoint(url: &str) -> Endpoint {
        Endpoint {
            id: url.to_string(),
            url: url.to_string(),
            interface: None,
            region: None,
            service_type: None,
        }
    }

    fn endpoints() -> AutomationEndpoints {
        AutomationEndpoints {
            agent_url: "https://arc.example.com".into(),
            job_url: "https://lyra.example.com".into(),
        }
    }

    #[test]
    fn test_discover_picks_first_match() {
        let catalog = vec![
            endpoint("https://compute.example.com"),
            endpoint("https://arc-1.example.com"),
            endpoint("https://lyra.example.com"),
            endpoint("https://arc-2.example.com"),
        ];
        let found = AutomationEndpoints::discover(&catalog).unwrap();
        assert_eq!(found.agent_url, "https://arc-1.example.com");
        assert_eq!(found.job_url, "https://lyra.example.com");
    }

    #[test]
    fn test_discover_missing_endpoint_is_configuration_error() {
        let catalog = vec![endpoint("https://arc.example.com")];
        let err = AutomationEndpoints::discover(&catalog).unwrap_err();
        assert!(matches!(err, CloudError::Configuration(ref m) if m.contains("lyra")));

        let err = AutomationEndpoints::discover(&[]).unwrap_err();
        assert!(matches!(err, CloudError::Configuration(ref m) if m.contains("required endpoint not found")));
    }

    #[test]
    fn test_index_agents_promotes_agent_id() {
        let records = vec![
            json!({"agent_id": "a-2", "display_name": "web", "project": "p"}),
            json!({"agent_id": "a-1", "display_name": "db", "project": "p"}),
            json!({"display_name": "orphan"}),
        ];
        let agents = index_agents(
            records
                .into_iter()
                .map(|r| r.as_object().cloned().unwrap())
                .collect(),
        );

        assert_eq!(agents.keys().collect::<Vec<_>>(), vec!["a-2", "a-1"]);
        for (_, attributes) in agents.iter() {
            assert!(!attributes.contains_key("agent_id"));
        }
        assert_eq!(agents.get("a-1").unwrap()["display_name"], "db");
    }

    #[tokio::test]
    async fn test_agent_list_uses_captured_token() {
        let client = Arc::new(StubAgents {
            records: vec![json!({"agent_id": "a-1", "display_name": "node01"})],
            tokens: Mutex::new(Vec::new()),
        });
        let automation = Automation::with_client(endpoints(), "captured", client.clone());

        let agents = automation.agent_list().await.unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(client.tokens.lock().unwrap().as_slice(), ["captured"]);

        let _ = automation.agent_list_with_token("other").await.unwrap();
        assert_eq!(client.tokens.lock().unwrap().last().unwrap(), "other");
    }

    #[tokio::test]
    async fn test_agent_list_failure_is_authentication_error() {
        let client = Arc::new(StubAgents {
            records: vec![],
            tokens: Mutex::new(Vec::new()),
        });
        let automation = Automation::with_client(endpoints(), "expired", client);
        let err = automation.agent_list().await.unwrap_err();
        assert!(matches!(err, CloudError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_new_fails_without_catalog_entries() {
        let sdk = StubSdk::new().with_endpoints(&["https://compute.example.com"]);
        let identity = Sdk::<()>::identity(&sdk, &Arc::new(()));
        let connection = ConnectionOptions {
            connect_timeout: std::time::Duration::from_secs(5),
            debug_request: false,
            debug_response: false,
        };
        let err = Automation::new(identity, &connection).await.err().unwrap();
        assert!(matches!(err, CloudError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_new_discovers_endpoints() {
        let sdk = StubSdk::new().with_endpoints(&[
            "https://arc.eu-de-1.example.com",
            "https://lyra.eu-de-1.example.com",
        ]);
        let identity = Sdk::<()>::identity(&sdk, &Arc::new(()));
        let connection = ConnectionOptions {
            connect_timeout: std::time::Duration::from_secs(5),
            debug_request: false,
            debug_response: false,
        };
        let automation = Automation::new(identity, &connection).await.unwrap();
        assert_eq!(automation.endpoints().agent_url, "https://arc.eu-de-1.example.com");
        assert_eq!(automation.endpoints().job_url, "https://lyra.eu-de-1.example.com");
    }
}
