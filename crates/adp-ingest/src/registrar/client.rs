//! HTTP client for the identifier registrar

use crate::error::{IngestError, Result};
use crate::registrar::{MintedIdentifier, RegistrarApi, RegistrarMetadata};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_REGISTRAR_TIMEOUT_SECS: u64 = 60;

/// Registrar API client using basic authentication
pub struct RegistrarClient {
    client: Client,
    base_url: String,
    user: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct IdentifierResponse {
    data: IdentifierData,
}

#[derive(Debug, Deserialize)]
struct IdentifierData {
    id: String,
    attributes: IdentifierAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct IdentifierAttributes {
    #[serde(default)]
    suffix: String,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Deserialize)]
struct IdentifierListResponse {
    #[serde(default)]
    data: Vec<IdentifierData>,
}

impl RegistrarClient {
    pub fn new(base_url: String, user: String, password: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REGISTRAR_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user,
            password,
        })
    }

    fn identifiers_url(&self) -> String {
        format!("{}/dois", self.base_url)
    }

    fn identifier_url(&self, id: &str) -> String {
        format!("{}/dois/{}", self.base_url, id)
    }

    /// List every draft identifier under the prefix
    async fn list_drafts(&self, prefix: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.identifiers_url())
            .basic_auth(&self.user, Some(&self.password))
            .query(&[("prefix", prefix), ("state", "draft")])
            .send()
            .await?
            .error_for_status()?;
        let listing: IdentifierListResponse = response.json().await?;
        Ok(listing
            .data
            .into_iter()
            .filter(|d| d.attributes.state == "draft")
            .map(|d| d.id)
            .collect())
    }
}

#[async_trait]
impl RegistrarApi for RegistrarClient {
    async fn mint_draft(&self, prefix: &str) -> Result<MintedIdentifier> {
        let body = serde_json::json!({
            "data": {
                "type": "dois",
                "attributes": { "prefix": prefix }
            }
        });
        let response = self
            .client
            .post(self.identifiers_url())
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let minted: IdentifierResponse = response.json().await?;
        let suffix = if minted.data.attributes.suffix.is_empty() {
            minted
                .data
                .id
                .split_once('/')
                .map(|(_, s)| s.to_string())
                .ok_or_else(|| {
                    IngestError::remote(format!(
                        "registrar returned identifier without a suffix: {}",
                        minted.data.id
                    ))
                })?
        } else {
            minted.data.attributes.suffix
        };
        Ok(MintedIdentifier {
            id: minted.data.id,
            suffix,
        })
    }

    async fn update_metadata(&self, id: &str, metadata: &RegistrarMetadata) -> Result<()> {
        let body = serde_json::json!({
            "data": {
                "type": "dois",
                "attributes": {
                    "titles": [{ "title": metadata.title }],
                    "creators": metadata
                        .creators
                        .iter()
                        .map(|name| serde_json::json!({ "name": name }))
                        .collect::<Vec<_>>(),
                    "publicationYear": metadata.publication_year,
                    "url": metadata.url,
                }
            }
        });
        self.client
            .put(self.identifier_url(id))
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn publish_all_drafts(&self, prefix: &str) -> Result<()> {
        for id in self.list_drafts(prefix).await? {
            let body = serde_json::json!({
                "data": {
                    "type": "dois",
                    "attributes": { "event": "publish" }
                }
            });
            self.client
                .put(self.identifier_url(&id))
                .basic_auth(&self.user, Some(&self.password))
                .json(&body)
                .send()
                .await?
                .error_for_status()?;
        }
        Ok(())
    }

    async fn delete_all_drafts(&self, prefix: &str) -> Result<()> {
        for id in self.list_drafts(prefix).await? {
            self.client
                .delete(self.identifier_url(&id))
                .basic_auth(&self.user, Some(&self.password))
                .send()
                .await?
                .error_for_status()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for RegistrarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrarClient")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .finish()
    }
}
