//! Subscription-level identity handle

use super::session::{AzureSession, MANAGEMENT_URL};
use crate::error::Result;
use crate::model::{Attributes, Endpoint, Tenant};
use crate::service::IdentityService;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

const SUBSCRIPTIONS_API: &str = "2022-12-01";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Subscription {
    subscription_id: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    tenant_id: Option<String>,
}

/// Attribute map for a subscription, shaped like a Keystone project
fn subscription_attributes(subscription: &Value) -> Option<Attributes> {
    let id = subscription.get("subscriptionId")?.as_str()?;
    let mut attributes = Attributes::new();
    attributes.insert("id".into(), Value::from(id));
    attributes.insert(
        "name".into(),
        subscription
            .get("displayName")
            .cloned()
            .unwrap_or(Value::Null),
    );
    attributes.insert(
        "enabled".into(),
        Value::Bool(subscription.get("state").and_then(Value::as_str) == Some("Enabled")),
    );
    attributes.insert("is_domain".into(), Value::Bool(false));
    if let Some(tenant) = subscription.get("tenantId") {
        attributes.insert("domain_id".into(), tenant.clone());
    }
    Some(attributes)
}

pub struct AzureIdentity {
    session: AzureSession,
}

impl AzureIdentity {
    pub fn new(session: AzureSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl IdentityService for AzureIdentity {
    async fn current_tenant(&self) -> Result<Tenant> {
        let url = format!(
            "{}/subscriptions/{}?api-version={}",
            MANAGEMENT_URL,
            self.session.subscription()?,
            SUBSCRIPTIONS_API
        );
        let subscription: Subscription = self.session.get_json(&url).await?;
        Ok(Tenant {
            id: subscription.subscription_id,
            name: subscription.display_name,
            domain_id: subscription
                .tenant_id
                .or_else(|| self.session.descriptor().tenant.clone()),
        })
    }

    async fn auth_projects(&self) -> Result<Vec<Attributes>> {
        let url = format!(
            "{}/subscriptions?api-version={}",
            MANAGEMENT_URL, SUBSCRIPTIONS_API
        );
        let subscriptions: Vec<Value> = self.session.list(&url).await?;
        Ok(subscriptions
            .iter()
            .filter_map(subscription_attributes)
            .collect())
    }

    /// ARM has no service catalog
    async fn endpoints(&self) -> Result<Vec<Endpoint>> {
        Ok(Vec::new())
    }

    async fn auth_token(&self) -> Result<String> {
        Ok(self.session.access_token().await?.to_string())
    }
}
