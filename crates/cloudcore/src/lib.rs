//! Cloudcore
//!
//! One configuration entry point for OpenStack and Azure, exposing the same
//! compute, dns, identity, image, network and storage handles for both.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 cloudserver CLI                   │
//! └─────────────────┬────────────────────────────────┘
//!                   │
//! ┌─────────────────▼────────────────────────────────┐
//! │                   Cloud facade                    │
//! │  ┌──────────────┐ ┌────────────┐ ┌────────────┐  │
//! │  │  Descriptor  │ │ Automation │ │  Selector  │  │
//! │  │   builder    │ │ inventory  │ │            │  │
//! │  └──────────────┘ └────────────┘ └────────────┘  │
//! │  ┌──────────────────────────────────────────┐    │
//! │  │   Adapter (ProviderAdapter + Sdk<D>)      │    │
//! │  └──────────────────────────────────────────┘    │
//! └───────┬─────────────────┬────────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │   OpenStack   │ │     Azure     │
//! │   REST SDK    │ │   ARM SDK     │
//! └───────────────┘ └───────────────┘
//! ```
//!
//! Provisioning flows wait for the resulting state with [`lifecycle`].

pub mod adapter;
pub mod automation;
pub mod azure;
pub mod cloud;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod fault;
pub mod interactive;
pub mod lifecycle;
pub mod model;
pub mod openrc;
pub mod openstack;
pub mod service;

#[cfg(test)]
mod testing;

// Re-exports
pub use adapter::{Adapter, Backends, ProviderAdapter, Sdk};
pub use automation::{AgentApi, AgentMap, Automation, AutomationEndpoints};
pub use cloud::{Cloud, ProjectMap};
pub use config::{Configuration, ProviderKind};
pub use descriptor::{ConnectionDescriptor, ConnectionOptions};
pub use error::{CloudError, Result};
pub use interactive::{ListingStrategy, SelectableItem, Selection, Selector};
pub use lifecycle::{Observable, PollConfig, ServerWatch, Transition};
pub use model::*;
pub use service::{
    Compute, ComputeService, Dns, DnsService, Identity, IdentityService, ImageService,
    ImageStore, NetworkService, Networking, ResourceHandle, ResourceKind, Storage,
    StorageService,
};
