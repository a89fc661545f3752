//! Cloud facade
//!
//! Single entry point over every supported provider:
//!
//! ```text
//! Configuration ──► descriptor::build ──► Adapter::connect ──► Cloud
//!                                            │
//!                     compute / dns / identity / image / network / storage
//! ```

use crate::adapter::{Adapter, Backends, ProviderAdapter};
use crate::automation::Automation;
use crate::config::{Configuration, ProviderKind};
use crate::descriptor::{self, ConnectionOptions};
use crate::error::Result;
use crate::model::Attributes;
use crate::service::{
    Compute, Dns, Identity, ImageStore, Networking, ResourceHandle, ResourceKind, Storage,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Authorized projects keyed by project id
pub type ProjectMap = BTreeMap<String, Attributes>;

const PROJECT_KEY_FIELDS: [&str; 3] = ["id", "is_domain", "enabled"];

pub struct Cloud {
    adapter: Adapter,
    connection: ConnectionOptions,
    domain_id: String,
}

impl std::fmt::Debug for Cloud {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cloud")
            .field("provider", &self.provider())
            .field("domain_id", &self.domain_id)
            .field("connection", &self.connection)
            .finish()
    }
}

impl Cloud {
    /// Validate the configuration and authenticate with the default SDKs
    pub async fn connect(config: &Configuration) -> Result<Self> {
        Self::connect_with(config, &Backends::default()).await
    }

    pub async fn connect_with(config: &Configuration, backends: &Backends) -> Result<Self> {
        let descriptor = descriptor::build(config)?;
        let connection = descriptor.connection().clone();

        tracing::debug!(
            provider = %config.provider,
            timeout = connection.connect_timeout.as_secs(),
            "connecting"
        );

        let adapter = Adapter::connect(descriptor, backends).await?;
        let domain_id = adapter.domain_id().to_string();

        Ok(Self {
            adapter,
            connection,
            domain_id,
        })
    }

    pub fn provider(&self) -> ProviderKind {
        self.adapter.provider()
    }

    pub fn domain_id(&self) -> &str {
        &self.domain_id
    }

    pub fn connection(&self) -> &ConnectionOptions {
        &self.connection
    }

    pub fn debug(&self) -> bool {
        self.connection.debug()
    }

    pub fn resource_handle(&self, kind: ResourceKind) -> ResourceHandle {
        self.adapter.resource_handle(kind)
    }

    pub fn compute(&self) -> Compute {
        self.adapter.compute()
    }

    pub fn dns(&self) -> Dns {
        self.adapter.dns()
    }

    pub fn identity(&self) -> Identity {
        self.adapter.identity()
    }

    pub fn image(&self) -> ImageStore {
        self.adapter.image()
    }

    pub fn network(&self) -> Networking {
        self.adapter.network()
    }

    pub fn storage(&self) -> Storage {
        self.adapter.storage()
    }

    /// Enabled, non-domain projects the caller is authorized for
    ///
    /// The `id`, `is_domain` and `enabled` fields are dropped from each
    /// attribute map since they are implied by the key and the filter.
    pub async fn project_list(&self) -> Result<ProjectMap> {
        let projects = self.identity().auth_projects().await?;
        Ok(filter_projects(projects))
    }

    /// A fresh automation inventory for this session
    pub async fn automation(&self) -> Result<Automation> {
        Automation::new(self.identity(), &self.connection).await
    }
}

fn filter_projects(projects: Vec<Attributes>) -> ProjectMap {
    projects
        .into_iter()
        .filter(|p| {
            p.get("enabled") == Some(&Value::Bool(true))
                && p.get("is_domain") != Some(&Value::Bool(true))
        })
        .filter_map(|mut project| {
            let id = match project.get("id")? {
                Value::String(id) => id.clone(),
                other => other.to_string(),
            };
            for field in PROJECT_KEY_FIELDS {
                project.remove(field);
            }
            Some((id, project))
        })
        .collect()
}
