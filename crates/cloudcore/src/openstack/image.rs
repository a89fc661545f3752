//! Glance image handle

use super::session::{Session, join, versioned};
use crate::error::Result;
use crate::model::Image;
use crate::service::ImageService;
use async_trait::async_trait;
use serde::Deserialize;

const SERVICE_TYPE: &str = "image";

#[derive(Debug, Deserialize)]
struct ImagePage {
    images: Vec<ImageRecord>,
    /// Path of the next page, relative to the service root
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// List every image visible to the project, following pagination
pub(super) async fn list_images(session: &Session) -> Result<Vec<Image>> {
    let root = session.endpoint(SERVICE_TYPE).await?;
    let mut url = join(&versioned(&root, "v2"), "images");
    let mut images = Vec::new();

    loop {
        let page: ImagePage = session.get_json(&url).await?;
        images.extend(page.images.into_iter().map(|r| Image {
            name: r.name.unwrap_or_else(|| r.id.clone()),
            id: r.id,
            status: r.status,
        }));

        match page.next {
            Some(next) => url = join(&root, &next),
            None => break,
        }
    }

    Ok(images)
}

pub struct GlanceImages {
    session: Session,
}

impl GlanceImages {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl ImageService for GlanceImages {
    async fn images(&self) -> Result<Vec<Image>> {
        list_images(&self.session).await
    }
}
