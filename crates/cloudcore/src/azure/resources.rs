//! Image, network, DNS and storage handles

use super::session::AzureSession;
use crate::error::Result;
use crate::model::{Container, DnsZone, Image, Network};
use crate::service::{DnsService, ImageService, NetworkService, StorageService};
use async_trait::async_trait;

const COMPUTE_API: &str = "2024-03-01";
const NETWORK_API: &str = "2023-09-01";
const DNS_API: &str = "2018-05-01";
const STORAGE_API: &str = "2023-01-01";

/// Managed images of the subscription
pub(super) async fn list_images(session: &AzureSession) -> Result<Vec<Image>> {
    let images = session
        .list_resources("Microsoft.Compute/images", COMPUTE_API)
        .await?;
    Ok(images
        .into_iter()
        .map(|i| Image {
            status: i.provisioning_state(),
            id: i.id,
            name: i.name,
        })
        .collect())
}

pub struct AzureImages {
    session: AzureSession,
}

impl AzureImages {
    pub fn new(session: AzureSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl ImageService for AzureImages {
    async fn images(&self) -> Result<Vec<Image>> {
        list_images(&self.session).await
    }
}

pub struct AzureNetworks {
    session: AzureSession,
}

impl AzureNetworks {
    pub fn new(session: AzureSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl NetworkService for AzureNetworks {
    async fn networks(&self) -> Result<Vec<Network>> {
        let vnets = self
            .session
            .list_resources("Microsoft.Network/virtualNetworks", NETWORK_API)
            .await?;
        Ok(vnets
            .into_iter()
            .map(|v| Network {
                status: v.provisioning_state(),
                id: v.id,
                name: v.name,
            })
            .collect())
    }
}

pub struct AzureDns {
    session: AzureSession,
}

impl AzureDns {
    pub fn new(session: AzureSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl DnsService for AzureDns {
    async fn zones(&self) -> Result<Vec<DnsZone>> {
        let zones = self
            .session
            .list_resources("Microsoft.Network/dnszones", DNS_API)
            .await?;
        Ok(zones
            .into_iter()
            .map(|z| DnsZone {
                id: z.id,
                name: z.name,
            })
            .collect())
    }
}

pub struct AzureStorage {
    session: AzureSession,
}

impl AzureStorage {
    pub fn new(session: AzureSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl StorageService for AzureStorage {
    async fn containers(&self) -> Result<Vec<Container>> {
        let accounts = self
            .session
            .list_resources("Microsoft.Storage/storageAccounts", STORAGE_API)
            .await?;
        Ok(accounts
            .into_iter()
            .map(|a| Container {
                name: a.name,
                count: None,
                bytes: None,
            })
            .collect())
    }
}
