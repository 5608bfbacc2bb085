//! Finds the project folder for a code, disambiguating when several match.

use super::error::CoreError;
use super::query::ProjectCode;
use super::ranker::Ranker;
use super::search::SearchEngine;
use super::store::{DriveItem, FileStore};
use super::{FileDisambiguationProfile, FolderCandidate, FolderRef, SearchOptions};
use std::collections::HashMap;
use std::sync::Arc;

pub struct FolderLocator {
    store: Arc<dyn FileStore>,
    ranker: Arc<dyn Ranker>,
    options: SearchOptions,
}

impl FolderLocator {
    pub fn new(store: Arc<dyn FileStore>, ranker: Arc<dyn Ranker>, options: SearchOptions) -> Self {
        Self {
            store,
            ranker,
            options,
        }
    }

    /// Searches the store for folders named after `code`.
    ///
    /// Same-named folders collapse into one candidate that keeps the others
    /// as fallbacks. With a single distinct name no ranking happens; with more,
    /// each folder's own spreadsheets are listed and the ranker picks one.
    pub async fn locate(
        &self,
        code: &ProjectCode,
        project_name: &str,
    ) -> Result<FolderCandidate, CoreError> {
        match code.year() {
            Some(year) => tracing::info!(
                "Searching for a folder containing '{}' (year: {})...",
                code.code(),
                year
            ),
            None => tracing::info!("Searching for a folder containing '{}'...", code.code()),
        }

        let items = self
            .store
            .search(&self.options.root, code.code())
            .await
            .map_err(|source| {
                let err = CoreError::SearchFailed {
                    term: code.code().to_string(),
                    source,
                };
                tracing::error!("✗ {}", err);
                err
            })?;

        let folders = SearchEngine::folders_matching(&items, code.code());
        if folders.is_empty() {
            tracing::info!("✗ No folder containing '{}' was found", code.code());
            return Err(CoreError::NoMatch(format!(
                "no folder containing '{}'",
                code.code()
            )));
        }

        let mut candidates = group_by_name(folders);
        if candidates.len() == 1 {
            let folder = candidates.remove(0);
            tracing::info!("✓ Found 1 folder: {} (ID: {})", folder.name, folder.id);
            return Ok(folder);
        }

        tracing::info!("✓ Found {} distinct folders", candidates.len());
        let mut profiles = Vec::with_capacity(candidates.len());
        for (i, folder) in candidates.into_iter().enumerate() {
            let spreadsheet_names = self.spreadsheet_names(&folder).await;
            tracing::info!(
                "  {}. {} ({} spreadsheet(s))",
                i + 1,
                folder.name,
                spreadsheet_names.len()
            );
            for name in &spreadsheet_names {
                tracing::debug!("       - {}", name);
            }
            profiles.push(FileDisambiguationProfile {
                folder,
                spreadsheet_names,
            });
        }

        let ranked = self
            .ranker
            .rank_folder(&profiles, code, project_name)
            .await;
        let index = if ranked.index < profiles.len() {
            ranked.index
        } else {
            0
        };
        let folder = profiles.swap_remove(index).folder;
        tracing::info!("  Selected folder: {} (ID: {})", folder.name, folder.id);
        Ok(folder)
    }

    /// Lists the spreadsheets directly inside a folder. A failed listing
    /// yields an empty profile rather than aborting the search.
    async fn spreadsheet_names(&self, folder: &FolderCandidate) -> Vec<String> {
        match self.store.list_children(&folder.id).await {
            Ok(children) => {
                SearchEngine::spreadsheet_names(&children, &self.options.spreadsheet_extension)
            }
            Err(source) => {
                let err = CoreError::ListingFailed {
                    item_id: folder.id.clone(),
                    source,
                };
                tracing::warn!("⚠ {}", err);
                Vec::new()
            }
        }
    }
}

/// Groups folders by case-insensitive name, keeping first-seen order.
///
/// Each returned candidate is the first folder seen with its name and carries
/// every folder of that name, itself first, as `duplicates_of_same_name`.
pub fn group_by_name(folders: Vec<DriveItem>) -> Vec<FolderCandidate> {
    let mut index_by_name: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<DriveItem>> = Vec::new();

    for folder in folders {
        let key = folder.name.to_lowercase();
        match index_by_name.get(&key) {
            Some(&i) => groups[i].push(folder),
            None => {
                index_by_name.insert(key, groups.len());
                groups.push(vec![folder]);
            }
        }
    }

    groups
        .into_iter()
        .map(|group| {
            if group.len() > 1 {
                tracing::info!(
                    "  ℹ️ Found {} variants of folder '{}'",
                    group.len(),
                    group[0].name
                );
                for variant in &group[1..] {
                    tracing::info!("    - Duplicate variant (ID: {})", variant.id);
                }
            }
            let duplicates = group
                .iter()
                .map(|item| FolderRef {
                    id: item.id.clone(),
                    name: item.name.clone(),
                })
                .collect();
            FolderCandidate {
                id: group[0].id.clone(),
                name: group[0].name.clone(),
                duplicates_of_same_name: duplicates,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FirstCandidateRanker;
    use crate::utils::test_helpers::{setup_test_logging, CountingRanker, InMemoryStore};

    fn locator(store: InMemoryStore, ranker: Arc<dyn Ranker>) -> FolderLocator {
        FolderLocator::new(Arc::new(store), ranker, SearchOptions::default())
    }

    #[test]
    fn test_group_by_name_is_case_insensitive() {
        let groups = group_by_name(vec![
            DriveItem::folder("A", "EP25005 - Raslavice"),
            DriveItem::folder("C", "EP25005 - Other"),
            DriveItem::folder("B", "ep25005 - RASLAVICE"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].id, "A");
        let dup_ids: Vec<_> = groups[0]
            .duplicates_of_same_name
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(dup_ids, vec!["A", "B"]);
        assert_eq!(groups[1].duplicates_of_same_name.len(), 1);
    }

    #[tokio::test]
    async fn test_identical_names_collapse_into_one_candidate() {
        setup_test_logging();
        let store = InMemoryStore::new().with_search_results(vec![
            DriveItem::folder("1", "EP25005 - Raslavice"),
            DriveItem::folder("2", "EP25005 - Raslavice"),
            DriveItem::folder("3", "ep25005 - raslavice"),
        ]);
        let ranker = Arc::new(CountingRanker::choosing(0));

        let folder = locator(store, ranker.clone())
            .locate(&ProjectCode::parse("EP25005/2025"), "Raslavice")
            .await
            .unwrap();

        assert_eq!(folder.id, "1");
        assert_eq!(folder.duplicates_of_same_name.len(), 3);
        assert_eq!(ranker.folder_calls(), 0, "a single name needs no ranking");
    }

    #[tokio::test]
    async fn test_files_and_non_matching_folders_are_ignored() {
        let store = InMemoryStore::new().with_search_results(vec![
            DriveItem::file("f", "EP25005.xlsx", 10),
            DriveItem::folder("x", "Archive"),
            DriveItem::folder("1", "Stavba EP25005"),
        ]);
        let ranker = Arc::new(CountingRanker::choosing(0));

        let folder = locator(store, ranker.clone())
            .locate(&ProjectCode::parse("ep25005"), "")
            .await
            .unwrap();

        assert_eq!(folder.id, "1");
        assert_eq!(ranker.folder_calls(), 0);
    }

    #[tokio::test]
    async fn test_no_matching_folder_is_no_match() {
        let store = InMemoryStore::new().with_search_results(vec![DriveItem::folder("x", "Other")]);
        let result = locator(store, Arc::new(FirstCandidateRanker))
            .locate(&ProjectCode::parse("EP25005"), "")
            .await;
        assert!(matches!(result, Err(CoreError::NoMatch(_))));
    }

    #[tokio::test]
    async fn test_search_failure_is_search_failed() {
        let store = InMemoryStore::new().failing_search();
        let result = locator(store, Arc::new(FirstCandidateRanker))
            .locate(&ProjectCode::parse("EP25005"), "")
            .await;
        assert!(matches!(result, Err(CoreError::SearchFailed { .. })));
    }

    #[tokio::test]
    async fn test_distinct_names_are_profiled_and_ranked() {
        setup_test_logging();
        let store = InMemoryStore::new()
            .with_search_results(vec![
                DriveItem::folder("A", "EP25005 - Raslavice"),
                DriveItem::folder("C", "EP25005 - Other"),
            ])
            .with_children(
                "A",
                vec![
                    DriveItem::file("a1", "Karta stavby - EP25005.xlsx", 10),
                    DriveItem::file("a2", "notes.docx", 10),
                    DriveItem::folder("a3", "Sub"),
                ],
            )
            .failing_listing("C");
        let ranker = Arc::new(CountingRanker::choosing(1));

        let folder = locator(store, ranker.clone())
            .locate(&ProjectCode::parse("EP25005/2025"), "Raslavice")
            .await
            .unwrap();

        assert_eq!(folder.id, "C");
        assert_eq!(ranker.folder_calls(), 1);
        let profiles = ranker.last_folder_profiles();
        assert_eq!(
            profiles[0].spreadsheet_names,
            vec!["Karta stavby - EP25005.xlsx".to_string()]
        );
        assert!(
            profiles[1].spreadsheet_names.is_empty(),
            "a failed listing degrades to an empty profile"
        );
    }
}
