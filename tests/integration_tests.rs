//! End-to-end tests of the resolution engine and the notification workflow,
//! run against the in-memory store, ranking and mail doubles.

use karta_finder::core::{
    ranker::RankingPrompt, BackendRanker, CoreError, DriveItem, FirstCandidateRanker,
    FolderLocator, ProjectCode, Ranker, RankingBackend, Resolver, SearchOptions,
};
use karta_finder::notify::{JsonLedger, Ledger, NotificationWorkflow};
use karta_finder::utils::test_helpers::{
    setup_test_logging, CountingRanker, InMemoryStore, RecordingNotifier, ScriptedBackend,
};
use std::sync::Arc;

/// Contains the test infrastructure.
mod helpers {
    use super::*;

    /// Search hits for EP25005: two same-named folders (A, B) and one other (C).
    /// A is empty, B holds the record sheet among other spreadsheets.
    pub fn raslavice_store() -> InMemoryStore {
        InMemoryStore::new()
            .with_search_results(vec![
                DriveItem::folder("A", "EP25005 - Raslavice"),
                DriveItem::file("f", "EP25005 - poznamky.xlsx", 1),
                DriveItem::folder("C", "EP25005 - Other"),
                DriveItem::folder("B", "ep25005 - raslavice"),
            ])
            .with_children("A", vec![])
            .with_children(
                "B",
                vec![
                    DriveItem::folder("B-oz", "Oznamenia"),
                    DriveItem::file("B1", "ORS tabulka EP25005.xlsx", 10)
                        .with_web_url("https://sp.example/B1"),
                    DriveItem::file("B2", "Karta stavby - EP25005.xlsx", 20)
                        .with_web_url("https://sp.example/B2"),
                ],
            )
            .with_children(
                "B-oz",
                vec![DriveItem::file("B3", "Oznamenie.xlsx", 5).with_web_url("https://sp.example/B3")],
            )
            .with_children(
                "C",
                vec![DriveItem::file("C1", "Rozpocet.xlsx", 10).with_web_url("https://sp.example/C1")],
            )
    }

    pub fn resolver(store: Arc<InMemoryStore>, ranker: Arc<dyn Ranker>) -> Resolver {
        Resolver::new(store, ranker, SearchOptions::default())
    }
}

#[tokio::test]
async fn test_ambiguous_folders_are_ranked_and_keep_duplicates() {
    setup_test_logging();
    let store = Arc::new(helpers::raslavice_store());
    let backend_ranker = Arc::new(BackendRanker::new(ScriptedBackend::answering(&["1"])));
    let locator = FolderLocator::new(store.clone(), backend_ranker, SearchOptions::default());

    let folder = locator
        .locate(&ProjectCode::parse("EP25005"), "Raslavice – VN, TS, NN")
        .await
        .unwrap();

    assert_eq!(folder.id, "A");
    let ids: Vec<_> = folder
        .duplicates_of_same_name
        .iter()
        .map(|d| d.id.as_str())
        .collect();
    assert_eq!(ids, vec!["A", "B"]);
    // Only the two distinct names were profiled.
    assert_eq!(store.listed(), vec!["A", "C"]);
}

#[tokio::test]
async fn test_resolve_falls_back_to_duplicate_and_ranks_files() {
    setup_test_logging();
    let store = Arc::new(helpers::raslavice_store());
    let backend = ScriptedBackend::answering(&["1", "Odpoveď: 3"]);
    let resolver = helpers::resolver(store.clone(), Arc::new(BackendRanker::new(backend)));

    let file = resolver
        .resolve(&ProjectCode::parse("EP25005/2025"), "Raslavice – VN, TS, NN")
        .await
        .unwrap();

    assert_eq!(file.id, "B2");
    assert_eq!(file.path, "Karta stavby - EP25005.xlsx");
    assert_eq!(file.external_link.as_deref(), Some("https://sp.example/B2"));
    assert_eq!(store.searches(), 1);
    // Profiles for A and C, then A (empty), then B and its subfolder.
    assert_eq!(store.listed(), vec!["A", "C", "A", "B", "B-oz"]);
}

#[tokio::test]
async fn test_ranked_prompts_carry_the_candidates() {
    let store = Arc::new(helpers::raslavice_store());
    let backend = Arc::new(ScriptedBackend::answering(&["1", "2"]));

    struct Shared(Arc<ScriptedBackend>);

    #[async_trait::async_trait]
    impl RankingBackend for Shared {
        async fn complete(&self, prompt: &RankingPrompt) -> Result<String, CoreError> {
            self.0.complete(prompt).await
        }
    }

    let resolver = helpers::resolver(
        store,
        Arc::new(BackendRanker::new(Shared(backend.clone()))),
    );
    resolver
        .resolve(&ProjectCode::parse("EP25005/2025"), "Raslavice")
        .await
        .unwrap();

    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].user.contains("1. EP25005 - Raslavice\n   (žiadne XLSX súbory)"));
    assert!(prompts[0].user.contains("2. EP25005 - Other"));
    assert!(prompts[1].user.contains("1. Oznamenia/Oznamenie.xlsx"));
    assert!(prompts[1].user.contains("2. ORS tabulka EP25005.xlsx"));
    assert!(prompts[1].user.contains("3. Karta stavby - EP25005.xlsx"));
}

#[tokio::test]
async fn test_single_folder_never_invokes_ranker() {
    let store = Arc::new(
        InMemoryStore::new()
            .with_search_results(vec![
                DriveItem::folder("X", "IP12360 - Čerhov"),
                DriveItem::folder("Y", "IP12360 - ČERHOV"),
            ])
            .with_children(
                "X",
                vec![DriveItem::file("k", "Karta stavby IP12360.xlsx", 1)],
            ),
    );
    let ranker = Arc::new(CountingRanker::choosing(0));
    let resolver = helpers::resolver(store, ranker.clone());

    let file = resolver
        .resolve(&ProjectCode::parse("IP12360/2024"), "Čerhov - úprava NN a DP z TS4")
        .await
        .unwrap();

    assert_eq!(file.id, "k");
    assert_eq!(ranker.folder_calls(), 0);
    assert_eq!(ranker.file_calls(), 0);
}

#[tokio::test]
async fn test_search_failure_resolves_to_not_found() {
    let store = Arc::new(InMemoryStore::new().failing_search());
    let resolver = helpers::resolver(store, Arc::new(FirstCandidateRanker));

    let err = resolver
        .resolve(&ProjectCode::parse("EP25005"), "")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::SearchFailed { .. }));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_workflow_resolves_records_and_notifies() {
    setup_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    std::fs::write(
        &path,
        r#"[
            {"idnotification": 1, "znacka": "EP25005/2025", "nazovstavby": "Raslavice", "done": false},
            {"idnotification": 2, "znacka": "EP99999/2025", "nazovstavby": "Nikde", "done": false},
            {"idnotification": 3, "znacka": "EP25042/2025", "nazovstavby": "Humenné", "sharedDocumentLink": "https://sp.example/known", "done": false},
            {"idnotification": 4, "znacka": "EP25001/2025", "nazovstavby": "Hotovo", "done": true}
        ]"#,
    )
    .unwrap();

    let store = Arc::new(helpers::raslavice_store());
    let resolver = helpers::resolver(store.clone(), Arc::new(FirstCandidateRanker));
    let notifier = RecordingNotifier::new();
    let mut ledger = JsonLedger::open(&path).unwrap();

    let summary = NotificationWorkflow::new(&resolver, &mut ledger, &notifier, "team@example.com")
        .run()
        .await
        .unwrap();

    assert_eq!(summary.notified, 3);
    assert_eq!(summary.with_link, 2);
    assert_eq!(summary.without_link, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(store.searches(), 2, "the entry with a stored link is not searched");

    let sent = notifier.sent();
    assert_eq!(sent.len(), 3);
    assert!(sent[0].body.contains("https://sp.example/B3"));
    assert!(sent[1].body.contains("nepodarilo nájsť"));
    assert!(sent[2].body.contains("https://sp.example/known"));

    let reopened = JsonLedger::open(&path).unwrap();
    assert!(reopened.pending().unwrap().is_empty());
    assert_eq!(
        reopened.entries()[0].document_link.as_deref(),
        Some("https://sp.example/B3")
    );
    assert_eq!(reopened.entries()[1].document_link, None);
}

#[tokio::test]
async fn test_workflow_leaves_failed_delivery_pending() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    std::fs::write(
        &path,
        r#"[
            {"idnotification": 1, "znacka": "EP1", "nazovstavby": "Prvá", "sharedDocumentLink": "https://x/1"},
            {"idnotification": 2, "znacka": "EP2", "nazovstavby": "Druhá", "sharedDocumentLink": "https://x/2"}
        ]"#,
    )
    .unwrap();

    let resolver = helpers::resolver(Arc::new(InMemoryStore::new()), Arc::new(FirstCandidateRanker));
    let notifier = RecordingNotifier::rejecting("EP1");
    let mut ledger = JsonLedger::open(&path).unwrap();

    let summary = NotificationWorkflow::new(&resolver, &mut ledger, &notifier, "team@example.com")
        .run()
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.notified, 1);
    let pending = ledger.pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, 1);
}
