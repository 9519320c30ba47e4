//! Generation job payloads - the final result of an image generation run

use serde::{Deserialize, Serialize};

use super::lenient::{lenient_u32, or_default};
use super::Cut;

/// Result of a finished (or truncated) generation run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(default, deserialize_with = "or_default")]
    pub title: String,
    /// Job mode label, e.g. "Long Form (16:9)"
    #[serde(default, deserialize_with = "or_default")]
    pub mode: String,
    #[serde(default, deserialize_with = "or_default")]
    pub resolution: String,
    /// Number of planned cuts
    #[serde(default, deserialize_with = "lenient_u32")]
    pub cuts: u32,
    #[serde(default, deserialize_with = "or_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "or_default")]
    pub cuts_data: Vec<GeneratedCut>,
    #[serde(default, deserialize_with = "or_default")]
    pub folder_name: String,
    #[serde(default, deserialize_with = "or_default")]
    pub completed: bool,
}

impl GenerationResult {
    /// Cuts that actually produced an image file
    pub fn generated_count(&self) -> usize {
        self.cuts_data.iter().filter(|c| !c.filename.is_empty()).count()
    }
}

/// A cut with the file it produced (empty when generation was skipped or failed)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneratedCut {
    #[serde(flatten)]
    pub cut: Cut,
    #[serde(default, deserialize_with = "or_default")]
    pub filename: String,
}

/// Signal sent to a running generation job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// Abort the job
    Stop,
    /// Stop after the current cut and finalize what exists
    FinishEarly,
}

impl ControlAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::FinishEarly => "finish_early",
        }
    }
}
