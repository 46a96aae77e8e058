//! HTTP client for the draft-based repository
//!
//! A thin reqwest wrapper translating [`RepositoryApi`] calls into the
//! repository's REST endpoints. All engine logic lives above this layer.

use crate::error::Result;
use crate::repository::endpoints;
use crate::repository::types::*;
use crate::repository::RepositoryApi;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Default timeout for repository requests in seconds.
/// Can be overridden via the ADP_API_TIMEOUT_SECS environment variable.
/// Generous because archival packages carry large media files.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 300;

/// Repository API client
pub struct RepositoryClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
    #[serde(default)]
    metadata: SearchHitMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct SearchHitMetadata {
    #[serde(default)]
    title: String,
}

impl RepositoryClient {
    /// Create a new client for the repository at `base_url`
    pub fn new(base_url: String, token: Option<String>) -> Result<Self> {
        let timeout_secs = std::env::var("ADP_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_API_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl RepositoryApi for RepositoryClient {
    async fn create_draft(&self, draft: &DraftRecord) -> Result<RecordInfo> {
        let url = endpoints::records_url(&self.base_url);
        let response = self
            .authorized(self.client.post(&url).json(draft))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn get_draft(&self, id: &str) -> Result<DraftRecord> {
        let url = endpoints::draft_url(&self.base_url, id);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn update_draft(&self, id: &str, draft: &DraftRecord) -> Result<()> {
        let url = endpoints::draft_url(&self.base_url, id);
        self.authorized(self.client.put(&url).json(draft))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete_draft(&self, id: &str) -> Result<()> {
        let url = endpoints::draft_url(&self.base_url, id);
        self.authorized(self.client.delete(&url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn publish_draft(&self, id: &str) -> Result<RecordInfo> {
        let url = endpoints::publish_url(&self.base_url, id);
        let response = self
            .authorized(self.client.post(&url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn new_version(&self, id: &str) -> Result<DraftRecord> {
        let url = endpoints::versions_url(&self.base_url, id);
        let response = self
            .authorized(self.client.post(&url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn draft_from_published(&self, id: &str) -> Result<DraftRecord> {
        let url = endpoints::draft_url(&self.base_url, id);
        let response = self
            .authorized(self.client.post(&url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn import_files(&self, draft_id: &str) -> Result<()> {
        let url = endpoints::import_files_url(&self.base_url, draft_id);
        self.authorized(self.client.post(&url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn list_drafts(&self) -> Result<Vec<String>> {
        let url = endpoints::user_records_url(&self.base_url);
        let response = self
            .authorized(self.client.get(&url).query(&[("q", "is_published:false")]))
            .send()
            .await?
            .error_for_status()?;
        let search: SearchResponse = response.json().await?;
        Ok(search.hits.hits.into_iter().map(|h| h.id).collect())
    }

    async fn list_record_files(&self, id: &str) -> Result<FileListing> {
        let url = endpoints::record_files_url(&self.base_url, id);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn list_draft_files(&self, id: &str) -> Result<FileListing> {
        let url = endpoints::draft_files_url(&self.base_url, id);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn upload_draft_file(&self, id: &str, key: &str, content: Vec<u8>) -> Result<()> {
        // Three-step upload: register the key, send the bytes, commit.
        let start_url = endpoints::draft_files_url(&self.base_url, id);
        self.authorized(
            self.client
                .post(&start_url)
                .json(&serde_json::json!([{ "key": key }])),
        )
        .send()
        .await?
        .error_for_status()?;

        let content_url = endpoints::draft_file_content_url(&self.base_url, id, key);
        self.authorized(self.client.put(&content_url).body(content))
            .send()
            .await?
            .error_for_status()?;

        let commit_url = endpoints::draft_file_commit_url(&self.base_url, id, key);
        self.authorized(self.client.post(&commit_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete_draft_file(&self, id: &str, key: &str) -> Result<()> {
        let url = endpoints::draft_file_url(&self.base_url, id, key);
        self.authorized(self.client.delete(&url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn get_draft_file(&self, id: &str, key: &str) -> Result<Vec<u8>> {
        let url = endpoints::draft_file_content_url(&self.base_url, id, key);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn get_record_file(&self, id: &str, key: &str) -> Result<Vec<u8>> {
        let url = endpoints::record_file_content_url(&self.base_url, id, key);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn find_record_by_title(&self, title: &str) -> Result<Option<String>> {
        let url = endpoints::user_records_url(&self.base_url);
        let query = format!("metadata.title:\"{}\"", title);
        let response = self
            .authorized(self.client.get(&url).query(&[("q", query.as_str())]))
            .send()
            .await?
            .error_for_status()?;
        let search: SearchResponse = response.json().await?;
        // The search is a phrase match; insist on an exact title.
        Ok(search
            .hits
            .hits
            .into_iter()
            .find(|hit| hit.metadata.title == title)
            .map(|hit| hit.id))
    }

    async fn get_record(&self, id: &str) -> Result<RecordInfo> {
        let url = endpoints::record_url(&self.base_url, id);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn is_draft(&self, id: &str) -> Result<bool> {
        let url = endpoints::record_url(&self.base_url, id);
        let response = self.authorized(self.client.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            // Only a draft exists under this id
            return Ok(true);
        }
        let info: RecordInfo = response.error_for_status()?.json().await?;
        Ok(!info.is_published)
    }

    fn record_url(&self, id: &str) -> String {
        endpoints::landing_page_url(&self.base_url, id)
    }
}

impl std::fmt::Debug for RepositoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
