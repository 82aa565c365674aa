use serde_json::{Map, Value};

use super::settings::{AppConfig, LlmProviderKind, MIN_HISTORY_LIMIT};
use crate::core::errors::ApiError;

/// Shape checks on the merged raw configuration, before deserialization.
pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_one_of_field(llm, "llm.provider", "provider", &["ollama", "openai_compatible"])?;
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.chat_model", "chat_model")?;
        validate_optional_string_field(llm, "llm.embedding_model", "embedding_model")?;
        validate_u64_field(llm, "llm.timeout_secs", "timeout_secs", 1, 3_600)?;
        validate_u64_field(llm, "llm.max_tokens", "max_tokens", 1, 1_000_000)?;
    }

    if let Some(store) = expect_optional_object(root, "vector_store")? {
        validate_optional_string_field(store, "vector_store.index_name", "index_name")?;
        validate_optional_string_field(store, "vector_store.index_host", "index_host")?;
        validate_optional_string_field(store, "vector_store.namespace", "namespace")?;
        validate_u64_field(store, "vector_store.top_k", "top_k", 1, 100)?;
        validate_u64_field(store, "vector_store.timeout_secs", "timeout_secs", 1, 3_600)?;
    }

    if let Some(rewrite) = expect_optional_object(root, "rewrite")? {
        validate_bool_field(rewrite, "rewrite.llm_pass", "llm_pass")?;
        validate_string_array_field(rewrite, "rewrite.dictionary", "dictionary")?;
    }

    if let Some(answer) = expect_optional_object(root, "answer")? {
        validate_bool_field(answer, "answer.include_citations", "include_citations")?;
        validate_u64_field(
            answer,
            "answer.history_limit",
            "history_limit",
            MIN_HISTORY_LIMIT as u64,
            1_000,
        )?;
        validate_u64_field(
            answer,
            "answer.max_context_length",
            "max_context_length",
            1,
            1_000_000,
        )?;
    }

    Ok(())
}

/// Semantic checks on the typed configuration. Failures here are startup-fatal.
pub fn validate_settings(config: &AppConfig) -> Result<(), ApiError> {
    let api_key = config.vector_store.api_key.as_deref().unwrap_or("");
    if api_key.trim().is_empty() {
        return Err(ApiError::config(
            "PINECONE_API_KEY is not set (vector_store.api_key)",
        ));
    }

    if config.vector_store.index_name.trim().is_empty() {
        return Err(ApiError::config("vector_store.index_name cannot be empty"));
    }

    if config.llm.base_url.trim().is_empty() {
        return Err(ApiError::config("llm.base_url cannot be empty"));
    }

    if config.llm.chat_model.trim().is_empty() || config.llm.embedding_model.trim().is_empty() {
        return Err(ApiError::config(
            "llm.chat_model and llm.embedding_model must both be set",
        ));
    }

    if config.llm.provider == LlmProviderKind::OpenaiCompatible
        && !config.llm.base_url.starts_with("http")
    {
        return Err(ApiError::config(
            "llm.base_url must be an http(s) URL for the openai_compatible provider",
        ));
    }

    validate_history_limit(config.answer.history_limit)?;

    for rule in &config.rewrite.dictionary {
        if !rule.contains("->") {
            return Err(ApiError::config(format!(
                "rewrite.dictionary rule '{}' must look like '<phrase> -> <term>'",
                rule
            )));
        }
    }

    Ok(())
}

/// Follow-ups are only reformulated against the window, so it must hold at
/// least one full exchange.
pub fn validate_history_limit(limit: usize) -> Result<(), ApiError> {
    if limit < MIN_HISTORY_LIMIT {
        return Err(ApiError::Config(format!(
            "Invalid config at 'answer.history_limit': must be at least {}",
            MIN_HISTORY_LIMIT
        )));
    }
    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(config_type_error(key, "object")),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::Config(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_one_of_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if allowed.contains(&text) {
        return Ok(());
    }
    Err(ApiError::Config(format!(
        "Invalid config at '{}': expected one of {}",
        path,
        allowed.join(", ")
    )))
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::Config(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::Config(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
