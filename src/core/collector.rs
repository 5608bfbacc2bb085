//! Walks folder trees in the store and collects spreadsheets.

use super::error::CoreError;
use super::query::ProjectCode;
use super::ranker::Ranker;
use super::search::SearchEngine;
use super::store::{DriveItem, FileStore};
use super::{FileReference, FolderCandidate};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    /// Descend into subfolders; otherwise only the folder's own children count.
    pub recurse_subfolders: bool,
    /// Narrow several matches down to one via the ranker.
    pub auto_select: bool,
}

impl CollectOptions {
    /// Full-depth walk that ends in a single ranked file.
    pub const SINGLE_BEST: Self = Self {
        recurse_subfolders: true,
        auto_select: true,
    };
}

/// A listed folder whose children are still being visited.
struct FolderFrame {
    children: std::vec::IntoIter<DriveItem>,
    path: String,
}

pub struct FileCollector {
    store: Arc<dyn FileStore>,
    ranker: Arc<dyn Ranker>,
    extension: String,
}

impl FileCollector {
    pub fn new(store: Arc<dyn FileStore>, ranker: Arc<dyn Ranker>, extension: impl Into<String>) -> Self {
        Self {
            store,
            ranker,
            extension: extension.into(),
        }
    }

    /// Collects spreadsheets from `folder`, falling back to its same-named
    /// duplicates in order until one of them yields at least one file.
    pub async fn collect(
        &self,
        folder: &FolderCandidate,
        options: CollectOptions,
        code: &ProjectCode,
        project_name: &str,
    ) -> Vec<FileReference> {
        let candidates = folder.fallback_order();

        for (attempt, candidate) in candidates.iter().enumerate() {
            if attempt == 0 {
                tracing::info!(
                    "Collecting spreadsheets from folder{}...",
                    if options.recurse_subfolders {
                        " (including subfolders)"
                    } else {
                        ""
                    }
                );
            } else {
                tracing::info!(
                    "⚠ No spreadsheets in the previous folder, trying candidate {}/{}: {}",
                    attempt + 1,
                    candidates.len(),
                    candidate.name
                );
            }

            let files = self.walk(&candidate.id, options.recurse_subfolders).await;
            tracing::info!("✓ Found {} spreadsheet(s) in: {}", files.len(), candidate.name);
            if files.is_empty() {
                continue;
            }

            for (i, file) in files.iter().enumerate() {
                tracing::info!("  {}. {} ({:.2} MB)", i + 1, file.path, file.size_mb());
            }
            return self.select(files, options, code, project_name).await;
        }

        Vec::new()
    }

    async fn select(
        &self,
        mut files: Vec<FileReference>,
        options: CollectOptions,
        code: &ProjectCode,
        project_name: &str,
    ) -> Vec<FileReference> {
        if files.len() < 2 || !options.auto_select {
            return files;
        }

        tracing::info!("🔍 Several spreadsheets found, ranking them...");
        let ranked = self.ranker.rank_file(&files, code, project_name).await;
        let index = if ranked.index < files.len() {
            ranked.index
        } else {
            0
        };
        vec![files.swap_remove(index)]
    }

    /// Depth-first walk over an explicit stack of folders.
    ///
    /// Children are visited in the order the store returned them; a subfolder
    /// is walked completely before its next sibling. A failed listing drops
    /// only that subtree.
    pub async fn walk(&self, root_id: &str, recurse_subfolders: bool) -> Vec<FileReference> {
        let mut found = Vec::new();
        let mut stack: Vec<FolderFrame> = self
            .open_folder(root_id, String::new())
            .await
            .into_iter()
            .collect();

        while let Some(frame) = stack.last_mut() {
            let Some(item) = frame.children.next() else {
                stack.pop();
                continue;
            };
            let path = join_path(&frame.path, &item.name);

            if item.is_file && SearchEngine::is_spreadsheet(&item.name, &self.extension) {
                found.push(file_reference(item, path));
            } else if item.is_folder && recurse_subfolders {
                tracing::debug!("  📁 Searching subfolder: {}", path);
                if let Some(subfolder) = self.open_folder(&item.id, path).await {
                    stack.push(subfolder);
                }
            }
        }

        found
    }

    async fn open_folder(&self, id: &str, path: String) -> Option<FolderFrame> {
        match self.store.list_children(id).await {
            Ok(children) => Some(FolderFrame {
                children: children.into_iter(),
                path,
            }),
            Err(source) => {
                let err = CoreError::ListingFailed {
                    item_id: id.to_string(),
                    source,
                };
                let location = if path.is_empty() { "root" } else { path.as_str() };
                tracing::warn!("✗ {} (at {})", err, location);
                None
            }
        }
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

fn file_reference(item: DriveItem, path: String) -> FileReference {
    FileReference {
        id: item.id,
        name: item.name,
        path,
        size_bytes: item.size_bytes,
        external_link: item.web_url,
    }
}
