//! Data Transfer Objects - For API boundaries
//!
//! DTOs live in the application layer so infrastructure (HTTP client, HTTP
//! routes) can serialize/deserialize wire shapes without leaking them into
//! the domain model.

pub mod console;
pub mod remote;
pub mod stream_event;

pub use console::*;
pub use stream_event::{decode_draft_event, decode_generation_event, decode_story_event, RawEvent};
