//! Application layer - Use cases over the workflow domain
//!
//! This layer contains:
//! - Ports: traits for the remote generation service and saved set storage
//! - DTOs: wire shapes of the remote service and of the console API
//! - Services: the session actor, saved sets, project history and settings

pub mod dto;
pub mod ports;
pub mod services;
