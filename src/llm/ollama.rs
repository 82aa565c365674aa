use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::errors::ApiError;

const SERVICE: &str = "ollama";

#[derive(Clone)]
pub struct OllamaProvider {
    base_url: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::config(format!("Failed to build Ollama client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

fn build_options(request: &ChatRequest) -> Map<String, Value> {
    let mut options = Map::new();
    if let Some(t) = request.temperature {
        options.insert("temperature".to_string(), json!(t));
    }
    if let Some(n) = request.max_tokens {
        options.insert("num_predict".to_string(), json!(n));
    }
    options
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError> {
        let url = format!("{}/api/chat", self.base_url);

        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });
        let options = build_options(&request);
        if !options.is_empty() {
            if let Some(obj) = body.as_object_mut() {
                obj.insert("options".to_string(), Value::Object(options));
            }
        }

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::upstream(SERVICE, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::upstream(
                SERVICE,
                format!("chat failed ({}): {}", status, text),
            ));
        }

        let payload: ChatResponse = res
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("ollama chat: {}", e)))?;

        payload
            .message
            .map(|m| m.content)
            .ok_or_else(|| ApiError::InvalidResponse("ollama chat: missing message".to_string()))
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        let url = format!("{}/api/embed", self.base_url);

        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::upstream(SERVICE, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::upstream(
                SERVICE,
                format!("embed failed ({}): {}", status, text),
            ));
        }

        let payload: EmbedResponse = res
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("ollama embed: {}", e)))?;

        if payload.embeddings.len() != inputs.len() {
            return Err(ApiError::InvalidResponse(format!(
                "ollama embed: expected {} vectors, got {}",
                inputs.len(),
                payload.embeddings.len()
            )));
        }

        Ok(payload.embeddings)
    }
}
