//! Sends a notification for every pending ledger entry, resolving the
//! karta stavby link on the way when the entry does not have one yet.

pub mod ledger;

use crate::core::{ProjectCode, Resolver};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use ledger::JsonLedger;

/// One tracked project. Field names match the table the entries are exported from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(rename = "idnotification")]
    pub id: u64,
    #[serde(rename = "znacka")]
    pub code: String,
    #[serde(rename = "nazovstavby")]
    pub project_name: String,
    #[serde(rename = "sharedDocumentLink", default)]
    pub document_link: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notified_at: Option<DateTime<Utc>>,
}

/// The store of tracked projects.
pub trait Ledger {
    /// Entries not yet marked done, in stored order.
    fn pending(&self) -> Result<Vec<LedgerEntry>>;

    fn record_link(&mut self, id: u64, link: &str) -> Result<()>;

    fn mark_done(&mut self, id: u64, at: DateTime<Utc>) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn for_entry(entry: &LedgerEntry, link: Option<&str>, to: &str) -> Self {
        let mut body = format!("{} – {}\n\n", entry.code, entry.project_name);
        match link {
            Some(link) => body.push_str(&format!("Karta stavby: {}\n", link)),
            None => body.push_str("Kartu stavby sa nepodarilo nájsť.\n"),
        }
        body.push_str("\nToto je automatická správa, neodpovedaj prosím na ňu.\n");

        Self {
            to: to.to_string(),
            subject: format!("{} - {}", entry.code, entry.project_name),
            body,
        }
    }
}

/// Delivers notifications. Fire once per call; no retries.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub notified: usize,
    pub with_link: usize,
    pub without_link: usize,
    pub failed: usize,
}

pub struct NotificationWorkflow<'a> {
    resolver: &'a Resolver,
    ledger: &'a mut dyn Ledger,
    notifier: &'a dyn Notifier,
    recipient: String,
}

impl<'a> NotificationWorkflow<'a> {
    pub fn new(
        resolver: &'a Resolver,
        ledger: &'a mut dyn Ledger,
        notifier: &'a dyn Notifier,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            ledger,
            notifier,
            recipient: recipient.into(),
        }
    }

    /// Processes pending entries one after another. A failing entry is
    /// logged, counted and left pending; the run continues with the next one.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let pending = self.ledger.pending()?;
        tracing::info!("{} pending notification(s)", pending.len());

        let mut summary = RunSummary::default();
        for entry in pending {
            tracing::info!("=== {} | {} ===", entry.code, entry.project_name);
            match self.process(&entry).await {
                Ok(true) => {
                    summary.notified += 1;
                    summary.with_link += 1;
                }
                Ok(false) => {
                    summary.notified += 1;
                    summary.without_link += 1;
                }
                Err(e) => {
                    tracing::error!("[{}] Notification failed: {:#}", entry.id, e);
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }

    async fn process(&mut self, entry: &LedgerEntry) -> Result<bool> {
        let link = match &entry.document_link {
            Some(link) => Some(link.clone()),
            None => self.lookup_link(entry).await?,
        };

        let notification = Notification::for_entry(entry, link.as_deref(), &self.recipient);
        self.notifier
            .send(&notification)
            .await
            .with_context(|| format!("sending notification for {}", entry.code))?;

        tracing::info!("[{}] Marking as done", entry.id);
        self.ledger.mark_done(entry.id, Utc::now())?;
        Ok(link.is_some())
    }

    async fn lookup_link(&mut self, entry: &LedgerEntry) -> Result<Option<String>> {
        let code = ProjectCode::parse(&entry.code);
        match self.resolver.resolve(&code, &entry.project_name).await {
            Ok(file) => match file.external_link {
                Some(link) => {
                    self.ledger.record_link(entry.id, &link)?;
                    Ok(Some(link))
                }
                None => Ok(None),
            },
            Err(e) => {
                tracing::warn!("[{}] Karta stavby not found: {}", entry.id, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(link: Option<&str>) -> LedgerEntry {
        LedgerEntry {
            id: 7,
            code: "EP25005/2025".to_string(),
            project_name: "Raslavice – VN, TS, NN".to_string(),
            document_link: link.map(str::to_string),
            done: false,
            notified_at: None,
        }
    }

    #[test]
    fn test_notification_with_link() {
        let n = Notification::for_entry(&entry(None), Some("https://x/k"), "team@example.com");
        assert_eq!(n.subject, "EP25005/2025 - Raslavice – VN, TS, NN");
        assert_eq!(n.to, "team@example.com");
        assert!(n.body.contains("Karta stavby: https://x/k"));
    }

    #[test]
    fn test_notification_without_link() {
        let n = Notification::for_entry(&entry(None), None, "team@example.com");
        assert!(n.body.contains("nepodarilo nájsť"));
    }

    #[test]
    fn test_entry_uses_table_field_names() {
        let json = r#"{"idnotification": 3, "znacka": "IP12360/2024", "nazovstavby": "Čerhov", "sharedDocumentLink": null, "done": false}"#;
        let parsed: LedgerEntry = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id, 3);
        assert_eq!(parsed.code, "IP12360/2024");
        assert_eq!(parsed.document_link, None);
        assert_eq!(parsed.notified_at, None);
    }
}
