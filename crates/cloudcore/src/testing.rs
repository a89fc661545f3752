//! In-memory provider used by unit tests

use crate::adapter::Sdk;
use crate::error::{CloudError, Result};
use crate::model::{
    Attributes, AvailabilityZone, Container, CreateServer, DnsZone, Endpoint, Flavor, Image,
    KeyPair, Network, SecurityGroup, Server, Tenant,
};
use crate::service::{
    Compute, ComputeService, Dns, DnsService, Identity, IdentityService, ImageService,
    ImageStore, NetworkService, Networking, Storage, StorageService,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct StubData {
    auth_failure: Option<String>,
    projects: Vec<Attributes>,
    endpoints: Vec<Endpoint>,
    servers: Vec<Server>,
    flavors: Vec<Flavor>,
    networks: Vec<Network>,
    key_pairs: Vec<KeyPair>,
    /// Scripted answers for `server(id)`; the last one repeats
    status_script: VecDeque<Option<String>>,
    created: Vec<CreateServer>,
    destroyed: Vec<String>,
}

/// Stub SDK that records how many handles were built
#[derive(Clone, Default)]
pub struct StubSdk {
    data: Arc<Mutex<StubData>>,
    handles: Arc<AtomicUsize>,
    polls: Arc<AtomicUsize>,
}

impl StubSdk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_auth(self, message: &str) -> Self {
        self.data.lock().unwrap().auth_failure = Some(message.to_string());
        self
    }

    pub fn with_projects(self, projects: Vec<serde_json::Value>) -> Self {
        self.data.lock().unwrap().projects = projects
            .into_iter()
            .map(|p| p.as_object().cloned().unwrap())
            .collect();
        self
    }

    pub fn with_endpoints(self, urls: &[&str]) -> Self {
        self.data.lock().unwrap().endpoints = urls
            .iter()
            .enumerate()
            .map(|(i, url)| Endpoint {
                id: format!("ep-{}", i),
                url: url.to_string(),
                interface: Some("public".to_string()),
                region: Some("eu-de-1".to_string()),
                service_type: None,
            })
            .collect();
        self
    }

    pub fn with_servers(self, servers: &[(&str, &str, &str)]) -> Self {
        self.data.lock().unwrap().servers = servers
            .iter()
            .map(|(id, name, status)| Server {
                id: id.to_string(),
                name: name.to_string(),
                status: status.to_string(),
            })
            .collect();
        self
    }

    pub fn with_flavors(self, flavors: &[(&str, &str)]) -> Self {
        self.data.lock().unwrap().flavors = flavors
            .iter()
            .map(|(id, name)| Flavor {
                id: id.to_string(),
                name: name.to_string(),
                vcpus: None,
                ram_mb: None,
                disk_gb: None,
            })
            .collect();
        self
    }

    pub fn with_networks(self, networks: &[(&str, &str)]) -> Self {
        self.data.lock().unwrap().networks = networks
            .iter()
            .map(|(id, name)| Network {
                id: id.to_string(),
                name: name.to_string(),
                status: Some("ACTIVE".to_string()),
            })
            .collect();
        self
    }

    pub fn with_key_pairs(self, names: &[&str]) -> Self {
        self.data.lock().unwrap().key_pairs = names
            .iter()
            .map(|name| KeyPair {
                name: name.to_string(),
                fingerprint: None,
            })
            .collect();
        self
    }

    /// Statuses returned by successive `server(id)` calls, `None` meaning gone
    pub fn with_status_script(self, script: &[Option<&str>]) -> Self {
        self.data.lock().unwrap().status_script =
            script.iter().map(|s| s.map(str::to_string)).collect();
        self
    }

    pub fn handles_built(&self) -> usize {
        self.handles.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<CreateServer> {
        self.data.lock().unwrap().created.clone()
    }

    pub fn destroyed(&self) -> Vec<String> {
        self.data.lock().unwrap().destroyed.clone()
    }

    fn handle(&self) -> Arc<StubHandle> {
        self.handles.fetch_add(1, Ordering::SeqCst);
        Arc::new(StubHandle { sdk: self.clone() })
    }
}

impl<D: Send + Sync + 'static> Sdk<D> for StubSdk {
    fn compute(&self, _descriptor: &Arc<D>) -> Compute {
        self.handle()
    }

    fn dns(&self, _descriptor: &Arc<D>) -> Dns {
        self.handle()
    }

    fn identity(&self, _descriptor: &Arc<D>) -> Identity {
        self.handle()
    }

    fn image(&self, _descriptor: &Arc<D>) -> ImageStore {
        self.handle()
    }

    fn network(&self, _descriptor: &Arc<D>) -> Networking {
        self.handle()
    }

    fn storage(&self, _descriptor: &Arc<D>) -> Storage {
        self.handle()
    }
}

pub struct StubHandle {
    sdk: StubSdk,
}

impl StubHandle {
    fn check_auth(&self) -> Result<()> {
        match &self.sdk.data.lock().unwrap().auth_failure {
            Some(message) => Err(CloudError::Provider(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ComputeService for StubHandle {
    async fn servers(&self) -> Result<Vec<Server>> {
        self.check_auth()?;
        Ok(self.sdk.data.lock().unwrap().servers.clone())
    }

    async fn server(&self, id: &str) -> Result<Option<Server>> {
        self.check_auth()?;
        self.sdk.polls.fetch_add(1, Ordering::SeqCst);
        let mut data = self.sdk.data.lock().unwrap();
        let status = if data.status_script.len() > 1 {
            data.status_script.pop_front().flatten()
        } else if let Some(last) = data.status_script.front() {
            last.clone()
        } else {
            return Ok(data.servers.iter().find(|s| s.id == id).cloned());
        };
        Ok(status.map(|status| Server {
            id: id.to_string(),
            name: format!("server-{}", id),
            status,
        }))
    }

    async fn create_server(&self, request: &CreateServer) -> Result<Server> {
        self.check_auth()?;
        let mut data = self.sdk.data.lock().unwrap();
        data.created.push(request.clone());
        Ok(Server {
            id: format!("new-{}", data.created.len()),
            name: request.name.clone(),
            status: "BUILD".to_string(),
        })
    }

    async fn destroy_server(&self, id: &str) -> Result<()> {
        self.check_auth()?;
        self.sdk.data.lock().unwrap().destroyed.push(id.to_string());
        Ok(())
    }

    async fn flavors(&self) -> Result<Vec<Flavor>> {
        self.check_auth()?;
        Ok(self.sdk.data.lock().unwrap().flavors.clone())
    }

    async fn images(&self) -> Result<Vec<Image>> {
        self.check_auth()?;
        Ok(Vec::new())
    }

    async fn key_pairs(&self) -> Result<Vec<KeyPair>> {
        self.check_auth()?;
        Ok(self.sdk.data.lock().unwrap().key_pairs.clone())
    }

    async fn security_groups(&self) -> Result<Vec<SecurityGroup>> {
        self.check_auth()?;
        Ok(Vec::new())
    }

    async fn availability_zones(&self) -> Result<Vec<AvailabilityZone>> {
        self.check_auth()?;
        Ok(vec![AvailabilityZone {
            name: "eu-de-1a".to_string(),
            available: true,
        }])
    }
}

#[async_trait]
impl IdentityService for StubHandle {
    async fn current_tenant(&self) -> Result<Tenant> {
        self.check_auth()?;
        Ok(Tenant {
            id: "stub-project".to_string(),
            name: "BS-Automation".to_string(),
            domain_id: Some("stub-domain".to_string()),
        })
    }

    async fn auth_projects(&self) -> Result<Vec<Attributes>> {
        self.check_auth()?;
        Ok(self.sdk.data.lock().unwrap().projects.clone())
    }

    async fn endpoints(&self) -> Result<Vec<Endpoint>> {
        self.check_auth()?;
        Ok(self.sdk.data.lock().unwrap().endpoints.clone())
    }

    async fn auth_token(&self) -> Result<String> {
        self.check_auth()?;
        Ok("stub-token".to_string())
    }
}

#[async_trait]
impl ImageService for StubHandle {
    async fn images(&self) -> Result<Vec<Image>> {
        ComputeService::images(self).await
    }
}

#[async_trait]
impl NetworkService for StubHandle {
    async fn networks(&self) -> Result<Vec<Network>> {
        self.check_auth()?;
        Ok(self.sdk.data.lock().unwrap().networks.clone())
    }
}

#[async_trait]
impl DnsService for StubHandle {
    async fn zones(&self) -> Result<Vec<DnsZone>> {
        self.check_auth()?;
        Ok(Vec::new())
    }
}

#[async_trait]
impl StorageService for StubHandle {
    async fn containers(&self) -> Result<Vec<Container>> {
        self.check_auth()?;
        Ok(Vec::new())
    }
}
