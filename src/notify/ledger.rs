//! A ledger kept as a pretty-printed JSON array on disk.

use super::{Ledger, LedgerEntry};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

pub struct JsonLedger {
    path: PathBuf,
    entries: Vec<LedgerEntry>,
}

impl JsonLedger {
    /// Opens the ledger at `path`. A missing file is an empty ledger.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading ledger {:?}", path))?;
            serde_json::from_str(&content).with_context(|| format!("parsing ledger {:?}", path))?
        } else {
            tracing::info!("Ledger {:?} not found, starting empty", path);
            Vec::new()
        };
        Ok(Self { path, entries })
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    fn entry_mut(&mut self, id: u64) -> Result<&mut LedgerEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| anyhow::anyhow!("No ledger entry with id {}", id))
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json).with_context(|| format!("writing ledger {:?}", self.path))?;
        Ok(())
    }
}

impl Ledger for JsonLedger {
    fn pending(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.entries.iter().filter(|e| !e.done).cloned().collect())
    }

    fn record_link(&mut self, id: u64, link: &str) -> Result<()> {
        self.entry_mut(id)?.document_link = Some(link.to_string());
        self.save()
    }

    fn mark_done(&mut self, id: u64, at: DateTime<Utc>) -> Result<()> {
        let entry = self.entry_mut(id)?;
        entry.done = true;
        entry.notified_at = Some(at);
        self.save()
    }
}
