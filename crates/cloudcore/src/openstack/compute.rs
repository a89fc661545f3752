//! Nova compute handle

use super::image;
use super::session::{Session, join};
use crate::error::{CloudError, Result};
use crate::model::{
    AvailabilityZone, CreateServer, Flavor, Image, KeyPair, SecurityGroup, Server,
};
use crate::service::ComputeService;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

const SERVICE_TYPE: &str = "compute";

/// Status Nova omits from the create response
const INITIAL_STATUS: &str = "BUILD";

#[derive(Debug, Deserialize)]
struct ServerRecord {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: Option<String>,
}

impl From<ServerRecord> for Server {
    fn from(r: ServerRecord) -> Self {
        Server {
            id: r.id,
            name: r.name,
            status: r.status.unwrap_or_else(|| INITIAL_STATUS.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServerList {
    servers: Vec<ServerRecord>,
}

#[derive(Debug, Deserialize)]
struct ServerEnvelope {
    server: ServerRecord,
}

#[derive(Debug, Deserialize)]
struct FlavorList {
    flavors: Vec<FlavorRecord>,
}

#[derive(Debug, Deserialize)]
struct FlavorRecord {
    id: String,
    name: String,
    vcpus: Option<u64>,
    ram: Option<u64>,
    disk: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct KeyPairList {
    keypairs: Vec<KeyPairEnvelope>,
}

#[derive(Debug, Deserialize)]
struct KeyPairEnvelope {
    keypair: KeyPair,
}

#[derive(Debug, Deserialize)]
struct SecurityGroupList {
    security_groups: Vec<SecurityGroup>,
}

#[derive(Debug, Deserialize)]
struct ZoneList {
    #[serde(rename = "availabilityZoneInfo")]
    zones: Vec<ZoneRecord>,
}

#[derive(Debug, Deserialize)]
struct ZoneRecord {
    #[serde(rename = "zoneName")]
    name: String,
    #[serde(rename = "zoneState")]
    state: ZoneState,
}

#[derive(Debug, Deserialize)]
struct ZoneState {
    available: bool,
}

fn create_request(request: &CreateServer) -> Value {
    let mut server = json!({
        "name": request.name,
        "imageRef": request.image_ref,
        "flavorRef": request.flavor_ref,
    });
    if let Some(key) = &request.key_name {
        server["key_name"] = json!(key);
    }
    if !request.networks.is_empty() {
        server["networks"] = request
            .networks
            .iter()
            .map(|id| json!({ "uuid": id }))
            .collect();
    }
    json!({ "server": server })
}

pub struct NovaCompute {
    session: Session,
}

impl NovaCompute {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    async fn url(&self, path: &str) -> Result<String> {
        Ok(join(&self.session.endpoint(SERVICE_TYPE).await?, path))
    }
}

#[async_trait]
impl ComputeService for NovaCompute {
    async fn servers(&self) -> Result<Vec<Server>> {
        let list: ServerList = self.session.get_json(&self.url("servers/detail").await?).await?;
        Ok(list.servers.into_iter().map(Server::from).collect())
    }

    async fn server(&self, id: &str) -> Result<Option<Server>> {
        let url = self.url(&format!("servers/{}", id)).await?;
        let found: Option<ServerEnvelope> = self.session.get_optional(&url).await?;
        Ok(found.map(|e| e.server.into()))
    }

    async fn create_server(&self, request: &CreateServer) -> Result<Server> {
        let url = self.url("servers").await?;
        let created: ServerEnvelope = self
            .session
            .post_json(&url, &create_request(request))
            .await
            .map_err(CloudError::into_provider)?;

        let mut server = Server::from(created.server);
        if server.name.is_empty() {
            server.name = request.name.clone();
        }
        tracing::info!(id = %server.id, name = %server.name, "server created");
        Ok(server)
    }

    async fn destroy_server(&self, id: &str) -> Result<()> {
        let url = self.url(&format!("servers/{}", id)).await?;
        self.session
            .delete(&url)
            .await
            .map_err(CloudError::into_provider)?;
        tracing::info!(id = %id, "server deletion requested");
        Ok(())
    }

    async fn flavors(&self) -> Result<Vec<Flavor>> {
        let list: FlavorList = self.session.get_json(&self.url("flavors/detail").await?).await?;
        Ok(list
            .flavors
            .into_iter()
            .map(|f| Flavor {
                id: f.id,
                name: f.name,
                vcpus: f.vcpus,
                ram_mb: f.ram,
                disk_gb: f.disk,
            })
            .collect())
    }

    async fn images(&self) -> Result<Vec<Image>> {
        image::list_images(&self.session).await
    }

    async fn key_pairs(&self) -> Result<Vec<KeyPair>> {
        let list: KeyPairList = self.session.get_json(&self.url("os-keypairs").await?).await?;
        Ok(list.keypairs.into_iter().map(|k| k.keypair).collect())
    }

    async fn security_groups(&self) -> Result<Vec<SecurityGroup>> {
        let list: SecurityGroupList = self
            .session
            .get_json(&self.url("os-security-groups").await?)
            .await?;
        Ok(list.security_groups)
    }

    async fn availability_zones(&self) -> Result<Vec<AvailabilityZone>> {
        let list: ZoneList = self
            .session
            .get_json(&self.url("os-availability-zone").await?)
            .await?;
        Ok(list
            .zones
            .into_iter()
            .map(|z| AvailabilityZone {
                name: z.name,
                available: z.state.available,
            })
            .collect())
    }
}
