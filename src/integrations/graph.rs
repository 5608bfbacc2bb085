//! Microsoft Graph access to a SharePoint document library.

use crate::config::GraphConfig;
use crate::core::{DriveItem, FileStore, StoreError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct GraphItem {
    id: String,
    name: String,
    #[serde(rename = "webUrl")]
    web_url: Option<String>,
    #[serde(default)]
    size: u64,
    folder: Option<Value>,
    file: Option<Value>,
}

impl From<GraphItem> for DriveItem {
    fn from(item: GraphItem) -> Self {
        DriveItem {
            id: item.id,
            name: item.name,
            is_folder: item.folder.is_some(),
            is_file: item.file.is_some(),
            web_url: item.web_url,
            size_bytes: item.size,
        }
    }
}

#[derive(Deserialize)]
struct GraphList {
    #[serde(default)]
    value: Vec<GraphItem>,
}

#[derive(Deserialize)]
struct Site {
    id: String,
}

/// An app-only Graph token plus the HTTP client it is used with.
#[derive(Clone)]
pub struct GraphSession {
    http: Client,
    base_url: String,
    token: String,
}

impl GraphSession {
    /// Acquires a token with the OAuth2 client-credentials grant.
    pub async fn authenticate(config: &GraphConfig) -> Result<Self, StoreError> {
        for (name, value) in [
            ("tenant_id", &config.tenant_id),
            ("client_id", &config.client_id),
            ("client_secret", &config.client_secret),
        ] {
            if value.is_empty() {
                return Err(StoreError::Auth(format!("{} is not configured", name)));
            }
        }

        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            config.authority_url.trim_end_matches('/'),
            config.tenant_id
        );
        let response = http
            .post(&url)
            .form(&[
                ("client_id", config.client_id.as_str()),
                ("client_secret", config.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;
        let token: TokenResponse = response.json().await?;

        match token.access_token {
            Some(access_token) => {
                tracing::info!("✓ Access token acquired");
                Ok(Self {
                    http,
                    base_url: config.base_url.trim_end_matches('/').to_string(),
                    token: access_token,
                })
            }
            None => Err(StoreError::Auth(
                token
                    .error_description
                    .or(token.error)
                    .unwrap_or_else(|| "no access token in response".to_string()),
            )),
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    pub(crate) async fn post_json(&self, path: &str, body: &Value) -> Result<u16, StoreError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(status.as_u16())
    }
}

/// The document library of one SharePoint site.
pub struct GraphClient {
    session: GraphSession,
    site_id: String,
}

impl GraphClient {
    /// Resolves the site id for `site_url` and binds the client to it.
    pub async fn for_site(session: GraphSession, site_url: &str) -> Result<Self, StoreError> {
        let path = site_lookup_path(site_url)?;
        tracing::info!("Resolving site id from: {}", path);
        let site: Site = session.get_json(&path).await?;
        tracing::info!("✓ Site ID: {}", site.id);
        Ok(Self {
            session,
            site_id: site.id,
        })
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    async fn list(&self, path: &str) -> Result<Vec<DriveItem>, StoreError> {
        let list: GraphList = self.session.get_json(path).await?;
        Ok(list.value.into_iter().map(DriveItem::from).collect())
    }
}

#[async_trait]
impl FileStore for GraphClient {
    async fn search(&self, root: &str, term: &str) -> Result<Vec<DriveItem>, StoreError> {
        self.list(&search_path(&self.site_id, root, term)).await
    }

    async fn list_children(&self, item_id: &str) -> Result<Vec<DriveItem>, StoreError> {
        self.list(&format!(
            "/sites/{}/drive/items/{}/children",
            self.site_id, item_id
        ))
        .await
    }
}

/// `https://host/sites/name` becomes `/sites/host:/sites/name`.
pub fn site_lookup_path(site_url: &str) -> Result<String, StoreError> {
    let without_scheme = site_url
        .strip_prefix("https://")
        .or_else(|| site_url.strip_prefix("http://"))
        .unwrap_or(site_url);
    let (hostname, site_path) = match without_scheme.split_once('/') {
        Some((host, path)) => (host, path.trim_end_matches('/')),
        None => (without_scheme, ""),
    };

    if hostname.is_empty() {
        return Err(StoreError::InvalidRequest(format!(
            "site url '{}' has no host",
            site_url
        )));
    }
    if site_path.is_empty() {
        Ok(format!("/sites/{}", hostname))
    } else {
        Ok(format!("/sites/{}:/{}", hostname, site_path))
    }
}

/// Full-text search path; single quotes in the term are doubled.
pub fn search_path(site_id: &str, root: &str, term: &str) -> String {
    let term = urlencoding::encode(&term.replace('\'', "''")).into_owned();
    if root == "root" {
        format!("/sites/{}/drive/root/search(q='{}')", site_id, term)
    } else {
        format!(
            "/sites/{}/drive/items/{}/search(q='{}')",
            site_id, root, term
        )
    }
}
