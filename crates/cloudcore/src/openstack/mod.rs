//! OpenStack provider
//!
//! REST clients for Keystone, Nova, Neutron, Glance, Designate and Swift.
//! Every handle owns its own [`Session`] and authenticates on first use.

mod compute;
mod dns;
mod identity;
mod image;
mod network;
pub mod session;
mod storage;

pub use compute::NovaCompute;
pub use dns::DesignateDns;
pub use identity::KeystoneIdentity;
pub use image::GlanceImages;
pub use network::NeutronNetworks;
pub use session::Session;
pub use storage::SwiftStorage;

use crate::adapter::Sdk;
use crate::descriptor::OpenStackDescriptor;
use crate::service::{Compute, Dns, Identity, ImageStore, Networking, Storage};
use std::sync::Arc;

/// [`Sdk`] backed by the OpenStack REST APIs
#[derive(Clone, Default)]
pub struct OpenStackSdk {
    http: reqwest::Client,
}

impl OpenStackSdk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn session(&self, descriptor: &Arc<OpenStackDescriptor>) -> Session {
        Session::new(self.http.clone(), descriptor.clone())
    }
}

impl Sdk<OpenStackDescriptor> for OpenStackSdk {
    fn compute(&self, descriptor: &Arc<OpenStackDescriptor>) -> Compute {
        Arc::new(NovaCompute::new(self.session(descriptor)))
    }

    fn dns(&self, descriptor: &Arc<OpenStackDescriptor>) -> Dns {
        Arc::new(DesignateDns::new(self.session(descriptor)))
    }

    fn identity(&self, descriptor: &Arc<OpenStackDescriptor>) -> Identity {
        Arc::new(KeystoneIdentity::new(self.session(descriptor)))
    }

    fn image(&self, descriptor: &Arc<OpenStackDescriptor>) -> ImageStore {
        Arc::new(GlanceImages::new(self.session(descriptor)))
    }

    fn network(&self, descriptor: &Arc<OpenStackDescriptor>) -> Networking {
        Arc::new(NeutronNetworks::new(self.session(descriptor)))
    }

    fn storage(&self, descriptor: &Arc<OpenStackDescriptor>) -> Storage {
        Arc::new(SwiftStorage::new(self.session(descriptor)))
    }
}
