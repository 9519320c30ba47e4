//! Domain entities - Core business objects of the generation workflow

mod cut;
mod draft;
mod generation;
pub(crate) mod lenient;
mod project;
mod saved_set;
mod title;

pub use cut::{story_text, Cut};
pub use draft::{upsert_sorted, Draft, DRAFT_BATCH_SIZE};
pub use generation::{ControlAction, GeneratedCut, GenerationResult};
pub use project::{ProjectDetail, ProjectSummary};
pub use saved_set::{DraftSetSnapshot, SavedPayload, SavedSet, SavedSetKind, StorySnapshot};
pub use title::{TitleStyle, TitleSuggestion};
