//! Swift object storage handle

use super::session::Session;
use crate::error::Result;
use crate::model::Container;
use crate::service::StorageService;
use async_trait::async_trait;

const SERVICE_TYPE: &str = "object-store";

/// Parse an account listing; an empty account answers with no body
fn parse_containers(body: Option<&str>) -> Result<Vec<Container>> {
    match body.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => Ok(serde_json::from_str(text)?),
    }
}

pub struct SwiftStorage {
    session: Session,
}

impl SwiftStorage {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl StorageService for SwiftStorage {
    async fn containers(&self) -> Result<Vec<Container>> {
        let account = self.session.endpoint(SERVICE_TYPE).await?;
        let body = self
            .session
            .get_text(&format!("{}?format=json", account))
            .await?;
        parse_containers(body.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_containers() {
        assert!(parse_containers(None).unwrap().is_empty());
        assert!(parse_containers(Some(" ")).unwrap().is_empty());

        let containers = parse_containers(Some(
            r#"[{"name": "backups", "count": 3, "bytes": 4096, "last_modified": "2024-01-01"}]"#,
        ))
        .unwrap();
        assert_eq!(containers[0].name, "backups");
        assert_eq!(containers[0].bytes, Some(4096));
    }
}
