//! Known chat models and lookup helpers

use crate::types::{DEFAULT_STOP_SEQUENCES, Model};

/// Model used when nothing else is configured
pub const DEFAULT_MODEL_ID: &str = "gpt-4o-mini";

/// Default endpoint for OpenAI-compatible chat completions
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Reply budget for chat turns
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

struct ModelEntry {
    id: &'static str,
    name: &'static str,
    vision: bool,
}

const MODEL_ENTRIES: &[ModelEntry] = &[
    ModelEntry {
        id: "gpt-4o-mini",
        name: "GPT-4o mini",
        vision: true,
    },
    ModelEntry {
        id: "gpt-4o",
        name: "GPT-4o",
        vision: true,
    },
    ModelEntry {
        id: "gpt-4.1-mini",
        name: "GPT-4.1 mini",
        vision: true,
    },
    ModelEntry {
        id: "gpt-3.5-turbo",
        name: "GPT-3.5 Turbo",
        vision: false,
    },
];

impl ModelEntry {
    fn to_model(&self) -> Model {
        Model {
            id: self.id.to_string(),
            name: self.name.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            vision: self.vision,
            stop: DEFAULT_STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Look up a registered model by ID.
pub fn get_model_by_id(id: &str) -> Option<Model> {
    MODEL_ENTRIES
        .iter()
        .find(|e| e.id == id)
        .map(|e| e.to_model())
}

/// Get all registered models.
pub fn get_all_models() -> Vec<Model> {
    MODEL_ENTRIES.iter().map(|e| e.to_model()).collect()
}

/// Resolve a model ID, building a custom entry for unknown IDs.
pub fn resolve_model(id: &str, base_url: Option<&str>) -> Model {
    let mut model = get_model_by_id(id).unwrap_or_else(|| Model {
        id: id.to_string(),
        name: id.to_string(),
        base_url: DEFAULT_BASE_URL.to_string(),
        max_tokens: DEFAULT_MAX_TOKENS,
        vision: true,
        stop: DEFAULT_STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
    });
    if let Some(url) = base_url {
        model.base_url = url.to_string();
    }
    model
}

/// The default chat model
pub fn default_model() -> Model {
    resolve_model(DEFAULT_MODEL_ID, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model() {
        let model = default_model();
        assert_eq!(model.id, "gpt-4o-mini");
        assert_eq!(model.max_tokens, 1024);
        assert_eq!(model.stop, vec!["\n\n\n", "<|im_end|>"]);
    }

    #[test]
    fn test_unknown_model_is_custom() {
        let model = resolve_model("local-llama", Some("http://localhost:11434/v1"));
        assert_eq!(model.id, "local-llama");
        assert_eq!(model.base_url, "http://localhost:11434/v1");
        assert!(get_model_by_id("local-llama").is_none());
    }

    #[test]
    fn test_all_models_listed() {
        let ids: Vec<String> = get_all_models().into_iter().map(|m| m.id).collect();
        assert!(ids.contains(&"gpt-4o".to_string()));
    }
}
