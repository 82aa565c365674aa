use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::AppConfig;
use super::validation::{validate_config, validate_settings};
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 10] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "access_key",
    "access_token",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 4] = ["max_tokens", "total_tokens", "token_count", "tokens"];

/// Environment variables that override a configuration field, as
/// `(variable, section, key)`.
const ENV_OVERRIDES: [(&str, &str, &str); 10] = [
    ("PINECONE_API_KEY", "vector_store", "api_key"),
    ("PINECONE_INDEX_NAME", "vector_store", "index_name"),
    ("PINECONE_INDEX_HOST", "vector_store", "index_host"),
    ("PINECONE_NAMESPACE", "vector_store", "namespace"),
    ("OLLAMA_BASE_URL", "llm", "base_url"),
    ("TAXBOT_LLM_BASE_URL", "llm", "base_url"),
    ("OPENAI_API_KEY", "llm", "api_key"),
    ("TAXBOT_LLM_PROVIDER", "llm", "provider"),
    ("TAXBOT_CHAT_MODEL", "llm", "chat_model"),
    ("TAXBOT_EMBEDDING_MODEL", "llm", "embedding_model"),
];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("TAXBOT_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Merged raw configuration: `config.yml`, then `secrets.yaml`, then the
    /// process environment.
    pub fn load_raw(&self) -> Result<Value, ApiError> {
        self.load_raw_with(|name| env::var(name).ok())
    }

    pub fn load_raw_with<F>(&self, lookup: F) -> Result<Value, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let public_config = load_yaml_file(&self.config_path())?;
        let secrets_config = load_yaml_file(&self.secrets_path())?;
        let merged = deep_merge(&public_config, &secrets_config);
        Ok(apply_env_overrides(merged, lookup))
    }

    pub fn load(&self) -> Result<AppConfig, ApiError> {
        self.load_with(|name| env::var(name).ok())
    }

    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = self.load_raw_with(lookup)?;
        validate_config(&raw)?;
        let config: AppConfig = serde_json::from_value(raw)
            .map_err(|e| ApiError::config(format!("Failed to parse configuration: {}", e)))?;
        validate_settings(&config)?;
        Ok(config)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

/// A missing file is an empty configuration. A file that exists but cannot
/// be read or parsed is a configuration error.
fn load_yaml_file(path: &Path) -> Result<Value, ApiError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ApiError::config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    match serde_yaml::from_str::<Value>(&contents) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(Value::Null) => Ok(Value::Object(Map::new())),
        Ok(_) => Err(ApiError::config(format!(
            "Invalid config file {}: top level must be a mapping",
            path.display()
        ))),
        Err(e) => Err(ApiError::config(format!(
            "Failed to parse {}: {}",
            path.display(),
            e
        ))),
    }
}

fn apply_env_overrides<F>(mut config: Value, lookup: F) -> Value
where
    F: Fn(&str) -> Option<String>,
{
    if !config.is_object() {
        config = Value::Object(Map::new());
    }

    for (variable, section, key) in ENV_OVERRIDES {
        let Some(value) = lookup(variable).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        if let Some(root) = config.as_object_mut() {
            let entry = root
                .entry(section.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Some(section_map) = entry.as_object_mut() {
                section_map.insert(key.to_string(), Value::String(value));
            }
        }
    }

    config
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LlmProviderKind;
    use serde_json::json;
    use std::collections::HashMap;

    fn service_in(dir: &Path) -> ConfigService {
        ConfigService::new(Arc::new(AppPaths::from_dirs(
            dir.to_path_buf(),
            dir.join("data"),
        )))
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "a": 1,
            "b": { "c": 2, "d": 3 },
            "arr": [1, 2]
        });
        let override_value = json!({
            "b": { "c": 99 },
            "arr": [3],
            "e": "x"
        });

        let merged = deep_merge(&base, &override_value);

        assert_eq!(
            merged,
            json!({
                "a": 1,
                "b": { "c": 99, "d": 3 },
                "arr": [3],
                "e": "x"
            })
        );
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "vector_store": { "api_key": "pc-secret", "top_k": 4 },
            "llm": { "api_key": null, "max_tokens": 512 }
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "vector_store": { "api_key": "****", "top_k": 4 },
                "llm": { "api_key": null, "max_tokens": 512 }
            })
        );
    }

    #[test]
    fn env_overrides_win_over_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yml"),
            "vector_store:\n  index_name: from-file\n  top_k: 7\n",
        )
        .unwrap();
        let service = service_in(dir.path());

        let config = service
            .load_with(env_from(&[
                ("PINECONE_API_KEY", "pc-key"),
                ("PINECONE_INDEX_NAME", "from-env"),
            ]))
            .unwrap();

        assert_eq!(config.vector_store.index_name, "from-env");
        assert_eq!(config.vector_store.top_k, 7);
        assert_eq!(config.vector_store.api_key.as_deref(), Some("pc-key"));
    }

    #[test]
    fn secrets_file_is_merged() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());
        fs::write(
            service.secrets_path(),
            "vector_store:\n  api_key: from-secrets\n",
        )
        .unwrap();

        let config = service.load_with(env_from(&[])).unwrap();
        assert_eq!(config.vector_store.api_key.as_deref(), Some("from-secrets"));
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());

        let err = service.load_with(env_from(&[])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn malformed_config_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yml"),
            "vector_store:\n  index_name: my-index\n top_k: [\n",
        )
        .unwrap();
        let service = service_in(dir.path());

        let err = service
            .load_with(env_from(&[("PINECONE_API_KEY", "pc-key")]))
            .unwrap_err();

        assert!(err.is_startup_fatal());
        assert!(err.to_string().contains("config.yml"));
    }

    #[test]
    fn malformed_secrets_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());
        fs::write(service.secrets_path(), "- just\n- a list\n").unwrap();

        let err = service.load_raw_with(env_from(&[])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn empty_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yml"), "").unwrap();
        let service = service_in(dir.path());

        let config = service
            .load_with(env_from(&[("PINECONE_API_KEY", "pc-key")]))
            .unwrap();
        assert_eq!(config.vector_store.index_name, "tax-markdown-index");
    }

    #[test]
    fn defaults_match_local_ollama_setup() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());

        let config = service
            .load_with(env_from(&[("PINECONE_API_KEY", "pc-key")]))
            .unwrap();

        assert_eq!(config.llm.provider, LlmProviderKind::Ollama);
        assert_eq!(config.llm.chat_model, "llama3.2");
        assert_eq!(config.llm.embedding_model, "nomic-embed-text");
        assert_eq!(config.vector_store.index_name, "tax-markdown-index");
        assert_eq!(config.rewrite.dictionary, vec!["사람을 나타내는 표현 -> 거주자"]);
        assert_eq!(config.answer.few_shot.len(), 3);
    }

    #[test]
    fn provider_can_be_switched_from_env() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());

        let config = service
            .load_with(env_from(&[
                ("PINECONE_API_KEY", "pc-key"),
                ("TAXBOT_LLM_PROVIDER", "openai_compatible"),
                ("TAXBOT_LLM_BASE_URL", "http://localhost:1234"),
            ]))
            .unwrap();

        assert_eq!(config.llm.provider, LlmProviderKind::OpenaiCompatible);
        assert_eq!(config.llm.base_url, "http://localhost:1234");
    }
}
