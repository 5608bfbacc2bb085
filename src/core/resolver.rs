//! Turns a project code and name into the karta stavby file.

use super::collector::{CollectOptions, FileCollector};
use super::error::CoreError;
use super::locator::FolderLocator;
use super::query::ProjectCode;
use super::ranker::Ranker;
use super::store::FileStore;
use super::{FileReference, SearchOptions};
use std::sync::Arc;

/// Composes folder location and file collection.
pub struct Resolver {
    locator: FolderLocator,
    collector: FileCollector,
}

impl Resolver {
    pub fn new(store: Arc<dyn FileStore>, ranker: Arc<dyn Ranker>, options: SearchOptions) -> Self {
        let collector = FileCollector::new(
            store.clone(),
            ranker.clone(),
            options.spreadsheet_extension.clone(),
        );
        Self {
            locator: FolderLocator::new(store, ranker, options),
            collector,
        }
    }

    /// Resolves to a single file, walking subfolders and ranking when needed.
    ///
    /// Fails only with `SearchFailed` or `NoMatch`.
    pub async fn resolve(
        &self,
        code: &ProjectCode,
        project_name: &str,
    ) -> Result<FileReference, CoreError> {
        let mut files = self
            .files(code, project_name, CollectOptions::SINGLE_BEST)
            .await?;
        let file = files.swap_remove(0);
        tracing::info!("📄 Selected file: {}", file.name);
        match &file.external_link {
            Some(link) => tracing::info!("🔗 Link: {}", link),
            None => tracing::warn!("⚠ The store returned no link for {}", file.name),
        }
        Ok(file)
    }

    /// Locates the folder and collects its spreadsheets with explicit options.
    /// Never returns an empty `Ok`.
    pub async fn files(
        &self,
        code: &ProjectCode,
        project_name: &str,
        options: CollectOptions,
    ) -> Result<Vec<FileReference>, CoreError> {
        let folder = self.locator.locate(code, project_name).await?;
        let files = self
            .collector
            .collect(&folder, options, code, project_name)
            .await;

        if files.is_empty() {
            return Err(CoreError::NoMatch(format!(
                "no spreadsheet in folder '{}' or its duplicates",
                folder.name
            )));
        }
        Ok(files)
    }
}
