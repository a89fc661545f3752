//! Provider adapters
//!
//! An adapter turns a descriptor into resource handles for one provider.
//! Handles are built through an [`Sdk`], the seam between the facade and the
//! REST clients, and are never cached: every accessor call builds a fresh
//! handle bound to the same descriptor.

use crate::azure::AzureSdk;
use crate::config::ProviderKind;
use crate::descriptor::{AzureDescriptor, ConnectionDescriptor, OpenStackDescriptor};
use crate::error::{CloudError, Result};
use crate::openstack::OpenStackSdk;
use crate::service::{
    Compute, Dns, Identity, ImageStore, Networking, ResourceHandle, ResourceKind, Storage,
};
use std::sync::Arc;

/// Resource handle constructors for one provider
pub trait Sdk<D>: Send + Sync {
    fn compute(&self, descriptor: &Arc<D>) -> Compute;
    fn dns(&self, descriptor: &Arc<D>) -> Dns;
    fn identity(&self, descriptor: &Arc<D>) -> Identity;
    fn image(&self, descriptor: &Arc<D>) -> ImageStore;
    fn network(&self, descriptor: &Arc<D>) -> Networking;
    fn storage(&self, descriptor: &Arc<D>) -> Storage;
}

/// Capability set shared by every provider adapter
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Domain the session authenticates against; empty where the provider has
    /// no such concept
    fn domain_id(&self) -> &str;

    fn compute(&self) -> Compute;
    fn dns(&self) -> Dns;
    fn identity(&self) -> Identity;
    fn image(&self) -> ImageStore;
    fn network(&self) -> Networking;
    fn storage(&self) -> Storage;

    fn resource_handle(&self, kind: ResourceKind) -> ResourceHandle {
        match kind {
            ResourceKind::Compute => ResourceHandle::Compute(self.compute()),
            ResourceKind::Dns => ResourceHandle::Dns(self.dns()),
            ResourceKind::Identity => ResourceHandle::Identity(self.identity()),
            ResourceKind::Image => ResourceHandle::Image(self.image()),
            ResourceKind::Network => ResourceHandle::Network(self.network()),
            ResourceKind::Storage => ResourceHandle::Storage(self.storage()),
        }
    }
}

/// SDK implementations used to build adapters
#[derive(Clone)]
pub struct Backends {
    pub openstack: Arc<dyn Sdk<OpenStackDescriptor>>,
    pub azure: Arc<dyn Sdk<AzureDescriptor>>,
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            openstack: Arc::new(OpenStackSdk::new()),
            azure: Arc::new(AzureSdk::new()),
        }
    }
}

pub struct OpenStackAdapter {
    descriptor: Arc<OpenStackDescriptor>,
    sdk: Arc<dyn Sdk<OpenStackDescriptor>>,
    domain_id: String,
}

impl OpenStackAdapter {
    /// Build the adapter, resolving the domain id through the identity
    /// service unless the descriptor carries one
    pub async fn new(
        descriptor: OpenStackDescriptor,
        sdk: Arc<dyn Sdk<OpenStackDescriptor>>,
    ) -> Result<Self> {
        let descriptor = Arc::new(descriptor);

        let domain_id = match &descriptor.domain_id {
            Some(id) => id.clone(),
            None => {
                let tenant = sdk
                    .identity(&descriptor)
                    .current_tenant()
                    .await
                    .map_err(CloudError::into_authentication)?;
                tenant
                    .domain_id
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| {
                        CloudError::Authentication(format!(
                            "project \"{}\" carries no domain id",
                            tenant.name
                        ))
                    })?
            }
        };

        tracing::info!(domain_id = %domain_id, "authenticated against OpenStack");

        Ok(Self {
            descriptor,
            sdk,
            domain_id,
        })
    }

    pub fn descriptor(&self) -> &OpenStackDescriptor {
        &self.descriptor
    }
}

impl ProviderAdapter for OpenStackAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenStack
    }

    fn domain_id(&self) -> &str {
        &self.domain_id
    }

    fn compute(&self) -> Compute {
        self.sdk.compute(&self.descriptor)
    }

    fn dns(&self) -> Dns {
        self.sdk.dns(&self.descriptor)
    }

    fn identity(&self) -> Identity {
        self.sdk.identity(&self.descriptor)
    }

    fn image(&self) -> ImageStore {
        self.sdk.image(&self.descriptor)
    }

    fn network(&self) -> Networking {
        self.sdk.network(&self.descriptor)
    }

    fn storage(&self) -> Storage {
        self.sdk.storage(&self.descriptor)
    }
}

pub struct AzureAdapter {
    descriptor: Arc<AzureDescriptor>,
    sdk: Arc<dyn Sdk<AzureDescriptor>>,
}

impl AzureAdapter {
    pub fn new(descriptor: AzureDescriptor, sdk: Arc<dyn Sdk<AzureDescriptor>>) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            sdk,
        }
    }

    pub fn descriptor(&self) -> &AzureDescriptor {
        &self.descriptor
    }
}

impl ProviderAdapter for AzureAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Azure
    }

    fn domain_id(&self) -> &str {
        ""
    }

    fn compute(&self) -> Compute {
        self.sdk.compute(&self.descriptor)
    }

    fn dns(&self) -> Dns {
        self.sdk.dns(&self.descriptor)
    }

    fn identity(&self) -> Identity {
        self.sdk.identity(&self.descriptor)
    }

    fn image(&self) -> ImageStore {
        self.sdk.image(&self.descriptor)
    }

    fn network(&self) -> Networking {
        self.sdk.network(&self.descriptor)
    }

    fn storage(&self) -> Storage {
        self.sdk.storage(&self.descriptor)
    }
}

/// Adapter selected by provider tag
pub enum Adapter {
    OpenStack(OpenStackAdapter),
    Azure(AzureAdapter),
}

impl Adapter {
    pub async fn connect(descriptor: ConnectionDescriptor, backends: &Backends) -> Result<Self> {
        match descriptor {
            ConnectionDescriptor::OpenStack(d) => Ok(Adapter::OpenStack(
                OpenStackAdapter::new(d, backends.openstack.clone()).await?,
            )),
            ConnectionDescriptor::Azure(d) => Ok(Adapter::Azure(AzureAdapter::new(
                d,
                backends.azure.clone(),
            ))),
        }
    }

    fn inner(&self) -> &dyn ProviderAdapter {
        match self {
            Adapter::OpenStack(adapter) => adapter,
            Adapter::Azure(adapter) => adapter,
        }
    }
}

impl ProviderAdapter for Adapter {
    fn provider(&self) -> ProviderKind {
        self.inner().provider()
    }

    fn domain_id(&self) -> &str {
        self.inner().domain_id()
    }

    fn compute(&self) -> Compute {
        self.inner().compute()
    }

    fn dns(&self) -> Dns {
        self.inner().dns()
    }

    fn identity(&self) -> Identity {
        self.inner().identity()
    }

    fn image(&self) -> ImageStore {
        self.inner().image()
    }

    fn network(&self) -> Networking {
        self.inner().network()
    }

    fn storage(&self) -> Storage {
        self.inner().storage()
    }
}
