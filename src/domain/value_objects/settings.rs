//! Remote settings document
//!
//! # Architectural Note (Settings Serialization)
//!
//! The settings document intentionally includes serde derives because:
//! 1. It is owned by the remote generation service and read/written as JSON
//! 2. It is relayed unchanged to the console shell's settings form
//! 3. The JSON schema IS the contract with both sides

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Settings as reported by the remote service (API key masked)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteSettings {
    #[serde(default)]
    pub openai_api_key_masked: String,
    #[serde(default)]
    pub openai_api_key_set: bool,
    /// Install path of the image generation backend
    #[serde(default)]
    pub comfyui_path: String,
    #[serde(default = "default_true")]
    pub use_reference_image: bool,
    #[serde(default)]
    pub selected_model: String,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_cfg")]
    pub cfg: f64,
    #[serde(default = "default_sampler")]
    pub sampler_name: String,
    #[serde(default = "default_scheduler")]
    pub scheduler: String,
    #[serde(default)]
    pub prompts: PromptTemplates,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            openai_api_key_masked: String::new(),
            openai_api_key_set: false,
            comfyui_path: String::new(),
            use_reference_image: true,
            selected_model: String::new(),
            steps: default_steps(),
            cfg: default_cfg(),
            sampler_name: default_sampler(),
            scheduler: default_scheduler(),
            prompts: PromptTemplates::default(),
        }
    }
}

/// Per-step prompt templates
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PromptTemplates {
    #[serde(default)]
    pub draft_generation: String,
    #[serde(default)]
    pub story_confirmation: String,
    #[serde(default)]
    pub title_generation: String,
    /// Templates the console does not edit directly (script parsing, style prompts, ...)
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

/// Partial settings update; only present fields are written
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comfyui_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_reference_image: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampler_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptTemplates>,
}

impl SettingsUpdate {
    /// An empty API key means "leave unchanged", so it is never sent
    pub fn without_blank_key(mut self) -> Self {
        if self.openai_api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            self.openai_api_key = None;
        }
        self
    }
}

fn default_true() -> bool {
    true
}

fn default_steps() -> u32 {
    30
}

fn default_cfg() -> f64 {
    7.5
}

fn default_sampler() -> String {
    "dpmpp_2m".to_string()
}

fn default_scheduler() -> String {
    "karras".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_remote_defaults() {
        let settings: RemoteSettings = serde_json::from_str("{}").unwrap();
        assert!(settings.use_reference_image);
        assert_eq!(settings.steps, 30);
        assert_eq!(settings.sampler_name, "dpmpp_2m");
    }

    #[test]
    fn test_unknown_prompt_templates_are_kept() {
        let json = r#"{"prompts": {"draft_generation": "d", "script_parsing": "p"}}"#;
        let settings: RemoteSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.prompts.draft_generation, "d");
        assert_eq!(
            settings.prompts.other.get("script_parsing"),
            Some(&serde_json::Value::String("p".to_string()))
        );
    }

    #[test]
    fn test_update_skips_absent_and_blank_key() {
        let update = SettingsUpdate {
            openai_api_key: Some("  ".to_string()),
            comfyui_path: Some("C:/ComfyUI".to_string()),
            ..Default::default()
        }
        .without_blank_key();

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"comfyui_path": "C:/ComfyUI"}));
    }
}
