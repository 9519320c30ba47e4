//! Outbound ports - Interfaces that the application requires from external systems

mod remote_port;
mod saved_set_port;

pub use remote_port::{
    EventStream, GenerationServicePort, ProjectHistoryPort, RemoteError, RemoteSettingsPort,
};
pub use saved_set_port::{SavedSetError, SavedSetRepositoryPort};
