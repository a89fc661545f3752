//! Neutron network handle

use super::session::{Session, join, versioned};
use crate::error::Result;
use crate::model::Network;
use crate::service::NetworkService;
use async_trait::async_trait;
use serde::Deserialize;

const SERVICE_TYPE: &str = "network";

#[derive(Debug, Deserialize)]
struct NetworkList {
    networks: Vec<Network>,
}

pub struct NeutronNetworks {
    session: Session,
}

impl NeutronNetworks {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl NetworkService for NeutronNetworks {
    async fn networks(&self) -> Result<Vec<Network>> {
        let root = self.session.endpoint(SERVICE_TYPE).await?;
        let url = join(&versioned(&root, "v2.0"), "networks");
        let list: NetworkList = self.session.get_json(&url).await?;
        Ok(list.networks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_networks() {
        let list: NetworkList = serde_json::from_str(
            r#"{"networks": [{"id": "n-1", "name": "private", "status": "ACTIVE", "shared": false}]}"#,
        )
        .unwrap();
        assert_eq!(list.networks[0].name, "private");
        assert_eq!(list.networks[0].status.as_deref(), Some("ACTIVE"));
    }
}
