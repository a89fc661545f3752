//! Designate DNS handle

use super::session::{Session, join, versioned};
use crate::error::Result;
use crate::model::DnsZone;
use crate::service::DnsService;
use async_trait::async_trait;
use serde::Deserialize;

const SERVICE_TYPE: &str = "dns";

#[derive(Debug, Deserialize)]
struct ZoneList {
    zones: Vec<DnsZone>,
}

pub struct DesignateDns {
    session: Session,
}

impl DesignateDns {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl DnsService for DesignateDns {
    async fn zones(&self) -> Result<Vec<DnsZone>> {
        let root = self.session.endpoint(SERVICE_TYPE).await?;
        let list: ZoneList = self
            .session
            .get_json(&join(&versioned(&root, "v2"), "zones"))
            .await?;
        Ok(list.zones)
    }
}
