//! The file-store capability the resolution engine talks to.

use super::error::StoreError;
use async_trait::async_trait;

/// One entry returned by a search or a children listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    pub is_folder: bool,
    pub is_file: bool,
    pub web_url: Option<String>,
    pub size_bytes: u64,
}

impl DriveItem {
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_folder: true,
            ..Default::default()
        }
    }

    pub fn file(id: impl Into<String>, name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_file: true,
            size_bytes,
            ..Default::default()
        }
    }

    pub fn with_web_url(mut self, url: impl Into<String>) -> Self {
        self.web_url = Some(url.into());
        self
    }
}

/// An authenticated view of a cloud drive.
///
/// Implementations report non-success responses as `Err` and never retry.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Full-text search scoped to `root`.
    async fn search(&self, root: &str, term: &str) -> Result<Vec<DriveItem>, StoreError>;

    /// The immediate children of a folder, in store order.
    async fn list_children(&self, item_id: &str) -> Result<Vec<DriveItem>, StoreError>;
}
