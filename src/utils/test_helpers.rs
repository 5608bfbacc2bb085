//! Test doubles for the store, ranking and notification seams.

use crate::core::ranker::RankingPrompt;
use crate::core::{
    CoreError, DriveItem, FileDisambiguationProfile, FileReference, FileStore, ProjectCode,
    Ranked, Ranker, RankingBackend, StoreError,
};
use crate::notify::{Notification, Notifier};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, Once, PoisonError};

static LOGGING_INIT: Once = Once::new();

/// Initializes the tracing subscriber for tests.
///
/// This function is wrapped in a `Once` block to ensure that the global
/// subscriber is set exactly one time, even when tests are run in parallel.
pub fn setup_test_logging() {
    LOGGING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Locks a double's recorded state; a panic in another test thread does not
/// make the recording unreadable.
fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A file reference under `docs/`, for ranking tests.
pub fn file_ref(name: &str) -> FileReference {
    FileReference {
        id: name.to_string(),
        name: name.to_string(),
        path: format!("docs/{}", name),
        size_bytes: 0,
        external_link: None,
    }
}

/// An in-memory drive. Unknown folders list as empty.
#[derive(Default)]
pub struct InMemoryStore {
    search_results: Vec<DriveItem>,
    children: HashMap<String, Vec<DriveItem>>,
    failing_listings: HashSet<String>,
    search_fails: bool,
    searches: AtomicUsize,
    listed: Mutex<Vec<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_results(mut self, items: Vec<DriveItem>) -> Self {
        self.search_results = items;
        self
    }

    pub fn with_children(mut self, folder_id: &str, items: Vec<DriveItem>) -> Self {
        self.children.insert(folder_id.to_string(), items);
        self
    }

    pub fn failing_listing(mut self, folder_id: &str) -> Self {
        self.failing_listings.insert(folder_id.to_string());
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.search_fails = true;
        self
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    /// Folder ids whose children were requested, in call order.
    pub fn listed(&self) -> Vec<String> {
        locked(&self.listed).clone()
    }
}

#[async_trait]
impl FileStore for InMemoryStore {
    async fn search(&self, _root: &str, term: &str) -> Result<Vec<DriveItem>, StoreError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.search_fails {
            return Err(StoreError::Status {
                status: 503,
                body: format!("search for {} unavailable", term),
            });
        }
        Ok(self.search_results.clone())
    }

    async fn list_children(&self, item_id: &str) -> Result<Vec<DriveItem>, StoreError> {
        locked(&self.listed).push(item_id.to_string());
        if self.failing_listings.contains(item_id) {
            return Err(StoreError::Status {
                status: 404,
                body: "itemNotFound".to_string(),
            });
        }
        Ok(self.children.get(item_id).cloned().unwrap_or_default())
    }
}

/// A ranking backend that replays canned answers.
pub struct ScriptedBackend {
    answers: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<RankingPrompt>>,
}

impl ScriptedBackend {
    pub fn answering(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| Ok(a.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answers: Mutex::new(VecDeque::from([Err("connection reset".to_string())])),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<RankingPrompt> {
        locked(&self.prompts).clone()
    }
}

#[async_trait]
impl RankingBackend for ScriptedBackend {
    async fn complete(&self, prompt: &RankingPrompt) -> Result<String, CoreError> {
        locked(&self.prompts).push(prompt.clone());
        match locked(&self.answers).pop_front() {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(reason)) => Err(CoreError::RankerUnavailable(reason)),
            None => Err(CoreError::RankerUnavailable("no scripted answer left".to_string())),
        }
    }
}

/// A ranker that always picks the same index and counts its calls.
pub struct CountingRanker {
    choice: usize,
    folder_calls: AtomicUsize,
    file_calls: AtomicUsize,
    last_profiles: Mutex<Vec<FileDisambiguationProfile>>,
}

impl CountingRanker {
    pub fn choosing(choice: usize) -> Self {
        Self {
            choice,
            folder_calls: AtomicUsize::new(0),
            file_calls: AtomicUsize::new(0),
            last_profiles: Mutex::new(Vec::new()),
        }
    }

    pub fn folder_calls(&self) -> usize {
        self.folder_calls.load(Ordering::SeqCst)
    }

    pub fn file_calls(&self) -> usize {
        self.file_calls.load(Ordering::SeqCst)
    }

    pub fn last_folder_profiles(&self) -> Vec<FileDisambiguationProfile> {
        locked(&self.last_profiles).clone()
    }
}

#[async_trait]
impl Ranker for CountingRanker {
    async fn rank_folder(
        &self,
        candidates: &[FileDisambiguationProfile],
        _code: &ProjectCode,
        _project_name: &str,
    ) -> Ranked {
        self.folder_calls.fetch_add(1, Ordering::SeqCst);
        *locked(&self.last_profiles) = candidates.to_vec();
        Ranked {
            index: self.choice,
            degraded: None,
        }
    }

    async fn rank_file(
        &self,
        _candidates: &[FileReference],
        _code: &ProjectCode,
        _project_name: &str,
    ) -> Ranked {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        Ranked {
            index: self.choice,
            degraded: None,
        }
    }
}

/// A notifier that keeps every message; optionally rejects some subjects.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    reject_subject_containing: Option<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(fragment: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject_subject_containing: Some(fragment.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        locked(&self.sent).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        if let Some(fragment) = &self.reject_subject_containing {
            if notification.subject.contains(fragment) {
                anyhow::bail!("mailbox rejected '{}'", notification.subject);
            }
        }
        locked(&self.sent).push(notification.clone());
        Ok(())
    }
}
