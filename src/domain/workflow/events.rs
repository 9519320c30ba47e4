//! Typed events of the three remote streams and outcomes of one-shot calls

use serde::{Deserialize, Serialize};

use crate::domain::entities::lenient::or_default;
use crate::domain::entities::{Cut, Draft, GenerationResult};

/// Events of the bulk draft stream
#[derive(Debug, Clone, PartialEq)]
pub enum DraftStreamEvent {
    Delta { draft_id: u32, text: String },
    Draft(Draft),
    Complete { total: u32 },
    Error { error: String },
}

/// Events of the story stream
#[derive(Debug, Clone, PartialEq)]
pub enum StoryStreamEvent {
    Delta { text: String },
    Complete(StoryOutline),
    Error { error: String },
}

/// Cut list and character description of a finished story
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryOutline {
    #[serde(default, deserialize_with = "or_default")]
    pub cuts: Vec<Cut>,
    #[serde(default, deserialize_with = "or_default")]
    pub character_prompt: String,
    #[serde(default, deserialize_with = "or_default")]
    pub full_text: String,
}

/// Events of the generation progress stream
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationStreamEvent {
    Log { message: String, cut_index: Option<u32> },
    Preview { image: String, cut_index: Option<u32> },
    Result(GenerationResult),
    Done(Option<GenerationResult>),
    Error { message: String },
}

/// Result of splitting a hand-written script into cuts
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedScript {
    pub total_cuts: u32,
    pub cuts: Vec<Cut>,
    pub character_prompt: String,
}

/// Why a remote call did not produce a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The service answered but reported failure
    Rejected(String),
    /// The service could not be reached or answered garbage
    Transport(String),
}

impl Failure {
    pub fn message(&self) -> &str {
        match self {
            Self::Rejected(m) | Self::Transport(m) => m,
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
