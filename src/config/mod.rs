pub mod settings;

use crate::core::SearchOptions;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// e.g. `https://firma.sharepoint.com/sites/stavby`
    pub site_url: String,
    pub base_url: String,
    pub authority_url: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            site_url: String::new(),
            base_url: "https://graph.microsoft.com/v1.0".to_string(),
            authority_url: "https://login.microsoftonline.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RankerConfig {
    /// Without a key the first candidate is always chosen.
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MailConfig {
    /// Mailbox the notifications are sent from.
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub root: String,
    pub spreadsheet_extension: String,
    pub recurse_subfolders: bool,
    pub auto_select: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let defaults = SearchOptions::default();
        Self {
            root: defaults.root,
            spreadsheet_extension: defaults.spreadsheet_extension,
            recurse_subfolders: true,
            auto_select: true,
        }
    }
}

impl SearchConfig {
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            root: self.root.clone(),
            spreadsheet_extension: self.spreadsheet_extension.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub graph: GraphConfig,
    pub ranker: RankerConfig,
    pub mail: MailConfig,
    pub search: SearchConfig,
    pub ledger_path: Option<PathBuf>,
}

impl AppConfig {
    /// Reads the config file (or the default location) and applies the
    /// environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = settings::load_config(path)?;
        config.apply_env_from(lookup);
        Ok(config)
    }

    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = value;
            }
        };

        set(&mut self.graph.tenant_id, "TENANT_ID");
        set(&mut self.graph.client_id, "CLIENT_ID");
        set(&mut self.graph.client_secret, "CLIENT_SECRET");
        set(&mut self.graph.site_url, "SHAREPOINT_SITE_URL");
        set(&mut self.mail.from, "EMAIL");
        set(&mut self.mail.to, "NOTIFY_TO");

        if let Some(key) = lookup("OPENAI_API_KEY").filter(|v| !v.is_empty()) {
            self.ranker.api_key = Some(key);
        }
        if self.mail.to.is_empty() {
            self.mail.to = self.mail.from.clone();
        }
    }
}
