//! Virtual machine handle

use super::session::{ArmResource, AzureSession};
use crate::error::{CloudError, Result};
use crate::model::{
    AvailabilityZone, CreateServer, Flavor, Image, KeyPair, SecurityGroup, Server,
};
use crate::service::ComputeService;
use async_trait::async_trait;
use serde::Deserialize;

const COMPUTE_API: &str = "2024-03-01";
const NETWORK_API: &str = "2023-09-01";
const LOCATIONS_API: &str = "2022-12-01";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VmSize {
    name: String,
    number_of_cores: Option<u64>,
    #[serde(rename = "memoryInMB")]
    memory_in_mb: Option<u64>,
    #[serde(rename = "resourceDiskSizeInMB")]
    resource_disk_size_in_mb: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    name: String,
    #[serde(default)]
    availability_zone_mappings: Vec<ZoneMapping>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneMapping {
    logical_zone: String,
}

fn server_from(resource: ArmResource) -> Server {
    Server {
        status: resource
            .provisioning_state()
            .unwrap_or_else(|| "unknown".to_string()),
        id: resource.id,
        name: resource.name,
    }
}

fn zones_of(locations: Vec<Location>, region: &str) -> Vec<AvailabilityZone> {
    let mut zones: Vec<AvailabilityZone> = locations
        .into_iter()
        .filter(|l| l.name.eq_ignore_ascii_case(region))
        .flat_map(|l| l.availability_zone_mappings)
        .map(|m| AvailabilityZone {
            name: format!("{}-{}", region, m.logical_zone),
            available: true,
        })
        .collect();
    zones.sort_by(|a, b| a.name.cmp(&b.name));
    zones
}

pub struct AzureCompute {
    session: AzureSession,
}

impl AzureCompute {
    pub fn new(session: AzureSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl ComputeService for AzureCompute {
    async fn servers(&self) -> Result<Vec<Server>> {
        let vms = self
            .session
            .list_resources("Microsoft.Compute/virtualMachines", COMPUTE_API)
            .await?;
        Ok(vms.into_iter().map(server_from).collect())
    }

    async fn server(&self, id: &str) -> Result<Option<Server>> {
        let url = self.session.resource_url(id, COMPUTE_API);
        let found: Option<ArmResource> = self.session.get_optional(&url).await?;
        Ok(found.map(server_from))
    }

    async fn create_server(&self, _request: &CreateServer) -> Result<Server> {
        Err(CloudError::Unsupported {
            provider: "azure",
            operation: "create_server",
        })
    }

    async fn destroy_server(&self, id: &str) -> Result<()> {
        self.session
            .delete(&self.session.resource_url(id, COMPUTE_API))
            .await
            .map_err(CloudError::into_provider)?;
        tracing::info!(id = %id, "virtual machine deletion requested");
        Ok(())
    }

    async fn flavors(&self) -> Result<Vec<Flavor>> {
        let url = self.session.subscription_url(&format!(
            "providers/Microsoft.Compute/locations/{}/vmSizes?api-version={}",
            self.session.region()?,
            COMPUTE_API
        ))?;
        let sizes: Vec<VmSize> = self.session.list(&url).await?;
        Ok(sizes
            .into_iter()
            .map(|s| Flavor {
                id: s.name.clone(),
                name: s.name,
                vcpus: s.number_of_cores,
                ram_mb: s.memory_in_mb,
                disk_gb: s.resource_disk_size_in_mb.map(|mb| mb / 1024),
            })
            .collect())
    }

    async fn images(&self) -> Result<Vec<Image>> {
        super::list_images(&self.session).await
    }

    async fn key_pairs(&self) -> Result<Vec<KeyPair>> {
        let keys = self
            .session
            .list_resources("Microsoft.Compute/sshPublicKeys", COMPUTE_API)
            .await?;
        Ok(keys
            .into_iter()
            .map(|k| KeyPair {
                name: k.name,
                fingerprint: None,
            })
            .collect())
    }

    async fn security_groups(&self) -> Result<Vec<SecurityGroup>> {
        let groups = self
            .session
            .list_resources("Microsoft.Network/networkSecurityGroups", NETWORK_API)
            .await?;
        Ok(groups
            .into_iter()
            .map(|g| SecurityGroup {
                description: g.location.clone(),
                id: g.id,
                name: g.name,
            })
            .collect())
    }

    async fn availability_zones(&self) -> Result<Vec<AvailabilityZone>> {
        let region = self.session.region()?.to_string();
        let url = self
            .session
            .subscription_url(&format!("locations?api-version={}", LOCATIONS_API))?;
        let locations: Vec<Location> = self.session.list(&url).await?;
        Ok(zones_of(locations, &region))
    }
}
