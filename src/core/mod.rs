pub mod collector;
pub mod error;
pub mod locator;
pub mod query;
pub mod ranker;
pub mod resolver;
pub mod search;
pub mod store;

use serde::{Deserialize, Serialize};

/// A lightweight reference to a folder in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRef {
    pub id: String,
    pub name: String,
}

/// A folder whose name matched the project code.
///
/// `duplicates_of_same_name` lists every folder found with the same
/// case-insensitive name, starting with this folder itself. The collector
/// walks them left to right until one of them yields spreadsheets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderCandidate {
    pub id: String,
    pub name: String,
    pub duplicates_of_same_name: Vec<FolderRef>,
}

impl FolderCandidate {
    /// Builds a candidate whose only duplicate is itself.
    pub fn single(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        let name = name.into();
        Self {
            duplicates_of_same_name: vec![FolderRef {
                id: id.clone(),
                name: name.clone(),
            }],
            id,
            name,
        }
    }

    /// The order in which same-named folders are tried, self first.
    pub fn fallback_order(&self) -> Vec<FolderRef> {
        let mut order = vec![FolderRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }];
        order.extend(
            self.duplicates_of_same_name
                .iter()
                .filter(|dup| dup.id != self.id)
                .cloned(),
        );
        order
    }
}

/// A folder together with the spreadsheet names found directly inside it.
/// Only built when more than one distinct folder name matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDisambiguationProfile {
    pub folder: FolderCandidate,
    pub spreadsheet_names: Vec<String>,
}

/// A spreadsheet found while walking a folder tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub id: String,
    pub name: String,
    /// Slash-joined path from the walked folder down to the file.
    pub path: String,
    pub size_bytes: u64,
    pub external_link: Option<String>,
}

impl FileReference {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Where to search and what counts as a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Drive item the full-text search is scoped to; `root` is the drive root.
    pub root: String,
    pub spreadsheet_extension: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            root: "root".to_string(),
            spreadsheet_extension: ".xlsx".to_string(),
        }
    }
}

pub use collector::{CollectOptions, FileCollector};
pub use error::{CoreError, StoreError};
pub use locator::FolderLocator;
pub use query::ProjectCode;
pub use ranker::{BackendRanker, FirstCandidateRanker, Ranked, Ranker, RankingBackend};
pub use resolver::Resolver;
pub use search::SearchEngine;
pub use store::{DriveItem, FileStore};
