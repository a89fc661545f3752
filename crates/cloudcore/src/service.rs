//! Resource handle capabilities
//!
//! Every provider exposes the same six capability surfaces. A handle is bound
//! to the descriptor it was built from and is cheap to re-create; nothing is
//! shared between two handles of the same kind.

use crate::error::{CloudError, Result};
use crate::model::{
    Attributes, AvailabilityZone, Container, CreateServer, DnsZone, Endpoint, Flavor, Image,
    KeyPair, Network, SecurityGroup, Server, Tenant,
};
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

#[async_trait]
pub trait ComputeService: Send + Sync {
    async fn servers(&self) -> Result<Vec<Server>>;

    /// Look up a single server, `None` once it no longer exists
    async fn server(&self, id: &str) -> Result<Option<Server>>;

    async fn create_server(&self, request: &CreateServer) -> Result<Server>;

    async fn destroy_server(&self, id: &str) -> Result<()>;

    async fn flavors(&self) -> Result<Vec<Flavor>>;

    async fn images(&self) -> Result<Vec<Image>>;

    async fn key_pairs(&self) -> Result<Vec<KeyPair>>;

    async fn security_groups(&self) -> Result<Vec<SecurityGroup>>;

    async fn availability_zones(&self) -> Result<Vec<AvailabilityZone>>;
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Project the session is scoped to, including its domain
    async fn current_tenant(&self) -> Result<Tenant>;

    /// Projects the caller is authorized for, as raw attribute maps
    async fn auth_projects(&self) -> Result<Vec<Attributes>>;

    /// Service endpoints visible in the catalog
    async fn endpoints(&self) -> Result<Vec<Endpoint>>;

    /// Token of the current session
    async fn auth_token(&self) -> Result<String>;
}

#[async_trait]
pub trait ImageService: Send + Sync {
    async fn images(&self) -> Result<Vec<Image>>;
}

#[async_trait]
pub trait NetworkService: Send + Sync {
    async fn networks(&self) -> Result<Vec<Network>>;
}

#[async_trait]
pub trait DnsService: Send + Sync {
    async fn zones(&self) -> Result<Vec<DnsZone>>;
}

#[async_trait]
pub trait StorageService: Send + Sync {
    async fn containers(&self) -> Result<Vec<Container>>;
}

pub type Compute = Arc<dyn ComputeService>;
pub type Identity = Arc<dyn IdentityService>;
pub type ImageStore = Arc<dyn ImageService>;
pub type Networking = Arc<dyn NetworkService>;
pub type Dns = Arc<dyn DnsService>;
pub type Storage = Arc<dyn StorageService>;

/// Capability category of a resource handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Compute,
    Dns,
    Identity,
    Image,
    Network,
    Storage,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Compute,
        ResourceKind::Dns,
        ResourceKind::Identity,
        ResourceKind::Image,
        ResourceKind::Network,
        ResourceKind::Storage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Compute => "compute",
            ResourceKind::Dns => "dns",
            ResourceKind::Identity => "identity",
            ResourceKind::Image => "image",
            ResourceKind::Network => "network",
            ResourceKind::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CloudError::UnknownResourceType(s.to_string()))
    }
}

/// A resource handle of any kind
#[derive(Clone)]
pub enum ResourceHandle {
    Compute(Compute),
    Dns(Dns),
    Identity(Identity),
    Image(ImageStore),
    Network(Networking),
    Storage(Storage),
}

impl ResourceHandle {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceHandle::Compute(_) => ResourceKind::Compute,
            ResourceHandle::Dns(_) => ResourceKind::Dns,
            ResourceHandle::Identity(_) => ResourceKind::Identity,
            ResourceHandle::Image(_) => ResourceKind::Image,
            ResourceHandle::Network(_) => ResourceKind::Network,
            ResourceHandle::Storage(_) => ResourceKind::Storage,
        }
    }
}

impl std::fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResourceHandle({})", self.kind())
    }
}
