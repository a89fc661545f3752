//! Azure provider
//!
//! Azure Resource Manager clients authenticated as a service principal.

mod compute;
mod identity;
mod resources;
pub mod session;

pub use compute::AzureCompute;
pub use identity::AzureIdentity;
pub use resources::{AzureDns, AzureImages, AzureNetworks, AzureStorage};
pub use session::AzureSession;

use crate::adapter::Sdk;
use crate::descriptor::AzureDescriptor;
use crate::service::{Compute, Dns, Identity, ImageStore, Networking, Storage};
use resources::list_images;
use std::sync::Arc;

/// [`Sdk`] backed by Azure Resource Manager
#[derive(Clone, Default)]
pub struct AzureSdk {
    http: reqwest::Client,
}

impl AzureSdk {
    pub fn new() -> Self {
        Self::default()
    }

    fn session(&self, descriptor: &Arc<AzureDescriptor>) -> AzureSession {
        AzureSession::new(self.http.clone(), descriptor.clone())
    }
}

impl Sdk<AzureDescriptor> for AzureSdk {
    fn compute(&self, descriptor: &Arc<AzureDescriptor>) -> Compute {
        Arc::new(AzureCompute::new(self.session(descriptor)))
    }

    fn dns(&self, descriptor: &Arc<AzureDescriptor>) -> Dns {
        Arc::new(AzureDns::new(self.session(descriptor)))
    }

    fn identity(&self, descriptor: &Arc<AzureDescriptor>) -> Identity {
        Arc::new(AzureIdentity::new(self.session(descriptor)))
    }

    fn image(&self, descriptor: &Arc<AzureDescriptor>) -> ImageStore {
        Arc::new(AzureImages::new(self.session(descriptor)))
    }

    fn network(&self, descriptor: &Arc<AzureDescriptor>) -> Networking {
        Arc::new(AzureNetworks::new(self.session(descriptor)))
    }

    fn storage(&self, descriptor: &Arc<AzureDescriptor>) -> Storage {
        Arc::new(AzureStorage::new(self.session(descriptor)))
    }
}
