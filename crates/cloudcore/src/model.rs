//! Resource records returned by provider handles

use serde::{Deserialize, Serialize};

/// Free-form attribute map, as returned by the control plane
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// A compute instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    /// Provider status string (e.g. "BUILD", "ACTIVE", "VM running")
    pub status: String,
}

/// Parameters for creating a compute instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateServer {
    pub name: String,
    pub image_ref: String,
    pub flavor_ref: String,
    pub key_name: Option<String>,
    /// Network ids to attach a NIC to
    pub networks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    pub vcpus: Option<u64>,
    pub ram_mb: Option<u64>,
    pub disk_gb: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPair {
    pub name: String,
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityZone {
    pub name: String,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsZone {
    pub id: String,
    pub name: String,
}

/// Object storage container (Swift container, Azure storage account)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub count: Option<u64>,
    pub bytes: Option<u64>,
}

/// Service endpoint from the identity catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,
    pub url: String,
    pub interface: Option<String>,
    pub region: Option<String>,
    pub service_type: Option<String>,
}

/// The project the current token is scoped to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub domain_id: Option<String>,
}
