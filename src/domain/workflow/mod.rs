//! Workflow state machine
//!
//! The five-step flow (mode select, topic select, story confirm, image
//! generation, title select) as a pure reducer over tagged actions.

mod action;
mod effect;
mod events;
mod reducer;
mod stage;
mod state;

pub use action::{Action, UserAction, WorkflowEvent};
pub use effect::{DraftQuery, Effect, GenerationJob, NavigationTarget, ReferenceRequest, StoryRequest};
pub use events::{
    DraftStreamEvent, Failure, GenerationStreamEvent, ParsedScript, StoryOutline, StoryStreamEvent,
};
pub use reducer::{reduce, Transition};
pub use stage::Stage;
pub use state::{LoadingStatus, Notice, StreamKind, StreamToken, WorkflowState};
