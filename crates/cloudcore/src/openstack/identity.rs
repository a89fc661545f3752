//! Keystone identity handle

use super::session::{Session, join};
use crate::error::Result;
use crate::model::{Attributes, Endpoint, Tenant};
use crate::service::IdentityService;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ProjectList {
    projects: Vec<Attributes>,
}

pub struct KeystoneIdentity {
    session: Session,
}

impl KeystoneIdentity {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl IdentityService for KeystoneIdentity {
    async fn current_tenant(&self) -> Result<Tenant> {
        self.session.token().await?.tenant()
    }

    async fn auth_projects(&self) -> Result<Vec<Attributes>> {
        let url = join(&self.session.descriptor().identity_url(), "auth/projects");
        let list: ProjectList = self.session.get_json(&url).await?;
        Ok(list.projects)
    }

    async fn endpoints(&self) -> Result<Vec<Endpoint>> {
        Ok(self.session.token().await?.endpoints())
    }

    async fn auth_token(&self) -> Result<String> {
        Ok(self.session.token().await?.value.clone())
    }
}
