//! Pinecone-backed vector store.
//!
//! Queries an existing serverless index over the REST data plane. The query
//! text is embedded with the configured embedding model first, so the index
//! must have been built with the same model.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::store::{DocumentChunk, VectorStore};
use crate::core::config::VectorStoreConfig;
use crate::core::errors::ApiError;
use crate::llm::LlmService;

const SERVICE: &str = "pinecone";
const API_VERSION: &str = "2024-07";

pub struct PineconeStore {
    client: Client,
    api_key: String,
    index_name: String,
    host: String,
    namespace: Option<String>,
    text_key: String,
    embedder: LlmService,
}

#[derive(Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

impl PineconeStore {
    /// Connect to an existing index.
    ///
    /// When `index_host` is not configured the data-plane host is looked up
    /// through the control plane, so a missing index fails here at startup.
    pub async fn connect(
        config: &VectorStoreConfig,
        embedder: LlmService,
    ) -> Result<Self, ApiError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ApiError::config("PINECONE_API_KEY is not set"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::config(format!("Failed to build Pinecone client: {}", e)))?;

        let host = match config.index_host.as_deref().filter(|h| !h.trim().is_empty()) {
            Some(host) => normalize_host(host),
            None => {
                describe_index(&client, &config.control_plane_url, &api_key, &config.index_name)
                    .await?
            }
        };

        tracing::info!("Using Pinecone index '{}' at {}", config.index_name, host);

        Ok(Self {
            client,
            api_key,
            index_name: config.index_name.clone(),
            host,
            namespace: config.namespace.clone().filter(|n| !n.is_empty()),
            text_key: config.text_key.clone(),
            embedder,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn query_vector(
        &self,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<DocumentChunk>, ApiError> {
        let url = format!("{}/query", self.host);

        let mut body = json!({
            "vector": vector,
            "topK": limit,
            "includeMetadata": true,
            "includeValues": false,
        });
        if let (Some(ns), Some(obj)) = (&self.namespace, body.as_object_mut()) {
            obj.insert("namespace".to_string(), json!(ns));
        }

        let res = self
            .request(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::upstream(SERVICE, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::upstream(
                SERVICE,
                format!("query failed ({}): {}", status, text),
            ));
        }

        let payload: QueryResponse = res
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("pinecone query: {}", e)))?;

        Ok(payload
            .matches
            .into_iter()
            .filter_map(|m| into_chunk(m, &self.text_key))
            .collect())
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    async fn similarity_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<DocumentChunk>, ApiError> {
        let vector = self.embedder.embed_query(query).await?;
        self.query_vector(vector, limit).await
    }
}

async fn describe_index(
    client: &Client,
    control_plane_url: &str,
    api_key: &str,
    index_name: &str,
) -> Result<String, ApiError> {
    let url = format!(
        "{}/indexes/{}",
        control_plane_url.trim_end_matches('/'),
        index_name
    );

    let res = client
        .get(&url)
        .header("Api-Key", api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .send()
        .await
        .map_err(|e| ApiError::upstream(SERVICE, e))?;

    if res.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(ApiError::config(format!(
            "Pinecone index '{}' does not exist",
            index_name
        )));
    }
    if !res.status().is_success() {
        return Err(ApiError::upstream(
            SERVICE,
            format!("describe index failed: {}", res.status()),
        ));
    }

    let payload: DescribeIndexResponse = res
        .json()
        .await
        .map_err(|e| ApiError::InvalidResponse(format!("pinecone describe index: {}", e)))?;

    Ok(normalize_host(&payload.host))
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Matches without stored text cannot ground an answer and are dropped.
fn into_chunk(m: QueryMatch, text_key: &str) -> Option<DocumentChunk> {
    let mut metadata = m.metadata.unwrap_or_default();
    let text = match metadata.remove(text_key) {
        Some(Value::String(text)) if !text.trim().is_empty() => text,
        _ => {
            tracing::warn!("Pinecone match '{}' has no '{}' metadata; skipped", m.id, text_key);
            return None;
        }
    };

    Some(DocumentChunk {
        id: m.id,
        text,
        metadata,
        score: m.score,
    })
}
