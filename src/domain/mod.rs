//! Domain layer - Core workflow logic with no I/O
//!
//! This layer contains:
//! - Entities: Draft, Cut, SavedSet, GenerationResult, project history records
//! - Value Objects: format and style choices, identifiers, remote settings
//! - Workflow: stages, state snapshot, actions, effects and the reducer

pub mod entities;
pub mod value_objects;
pub mod workflow;
