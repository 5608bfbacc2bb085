//! Defines the custom error types for the `core` module.

use thiserror::Error;

/// A failed call against the file store.
///
/// The store never throws on a bad HTTP status; it reports it here and the
/// core decides whether the failure is terminal or local to one subtree.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered with a non-success status.
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A request could not be built from the configured values.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No usable access token could be obtained.
    #[error("Authentication failed: {0}")]
    Auth(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

/// The primary error type for the `core` module.
///
/// Only `SearchFailed` and `NoMatch` ever reach the caller of a resolution.
/// Listing failures are absorbed per subtree and ranker failures degrade to
/// the first candidate; they are still expressed as values so they can be
/// logged and inspected.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The full-text search call failed. Terminal for the resolution.
    #[error("Search for '{term}' failed: {source}")]
    SearchFailed {
        term: String,
        #[source]
        source: StoreError,
    },

    /// Listing the children of one folder failed.
    #[error("Listing children of {item_id} failed: {source}")]
    ListingFailed {
        item_id: String,
        #[source]
        source: StoreError,
    },

    /// No ranking backend is configured or the backend call failed.
    #[error("Ranking backend unavailable: {0}")]
    RankerUnavailable(String),

    /// The backend answered, but not with a usable candidate number.
    #[error("Ranking backend returned an unusable answer: {0:?}")]
    RankerInvalidAnswer(String),

    /// Nothing matched after all fallback attempts.
    #[error("No match: {0}")]
    NoMatch(String),
}

impl CoreError {
    /// `true` for the outcomes the notification workflow reports as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::SearchFailed { .. } | CoreError::NoMatch(_))
    }
}
