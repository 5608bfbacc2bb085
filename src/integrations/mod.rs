//! Concrete collaborators that talk to remote services over HTTP.

pub mod graph;
pub mod mail;
pub mod openai;

use crate::config::RankerConfig;
use crate::core::{BackendRanker, FirstCandidateRanker, Ranker};
use anyhow::Result;
use std::sync::Arc;

pub use graph::{GraphClient, GraphSession};
pub use mail::GraphMailNotifier;
pub use openai::OpenAiBackend;

/// Picks the ranker implementation: the chat backend when an API key is
/// configured, otherwise the first-candidate fallback.
pub fn ranker_from_config(config: &RankerConfig) -> Result<Arc<dyn Ranker>> {
    match config.api_key.as_deref().filter(|key| !key.is_empty()) {
        Some(key) => {
            let backend = OpenAiBackend::new(config, key)?;
            Ok(Arc::new(BackendRanker::new(backend)))
        }
        None => {
            tracing::warn!(
                "No ranking API key configured, ambiguous matches fall back to the first candidate"
            );
            Ok(Arc::new(FirstCandidateRanker))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CoreError, ProjectCode};
    use crate::utils::test_helpers::file_ref;

    #[tokio::test]
    async fn test_missing_key_selects_first_candidate_ranker() {
        let ranker = ranker_from_config(&RankerConfig::default()).unwrap();
        let ranked = ranker
            .rank_file(
                &[file_ref("a.xlsx"), file_ref("b.xlsx")],
                &ProjectCode::parse("EP1"),
                "",
            )
            .await;
        assert_eq!(ranked.index, 0);
        assert!(matches!(
            ranked.degraded,
            Some(CoreError::RankerUnavailable(_))
        ));
    }
}
