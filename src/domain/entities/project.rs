//! Project history records - folders of past generation runs kept by the remote service

use serde::{Deserialize, Serialize};

use super::{GeneratedCut, GenerationResult};

/// Entry of the project history list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(default)]
    pub id: String,
    pub folder_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub resolution: String,
    #[serde(default)]
    pub cuts: u32,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Asset paths relative to the remote host
    #[serde(default)]
    pub thumbnails: Vec<String>,
}

/// Full project with its generated assets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetail {
    pub title: String,
    pub folder_name: String,
    #[serde(default)]
    pub assets: Vec<String>,
    #[serde(default)]
    pub metadata: GenerationResult,
}

impl ProjectDetail {
    /// Replace the per-cut metadata after video prompts were generated
    pub fn with_cuts(mut self, cuts: Vec<GeneratedCut>) -> Self {
        self.metadata.cuts_data = cuts;
        self
    }
}
