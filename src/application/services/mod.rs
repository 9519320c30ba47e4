//! Application services - Use case implementations
//!
//! This module contains the application services that drive the workflow
//! sessions and serve the saved-set, history and settings screens. Each
//! service follows hexagonal architecture principles, accepting port
//! dependencies and returning domain entities or DTOs.

pub mod history_service;
pub mod saved_set_service;
pub mod settings_service;
pub mod workflow_service;

pub use history_service::{HistoryError, HistoryService};
pub use saved_set_service::{SavedSetService, SavedSetServiceImpl};
pub use settings_service::{BackendStatus, SettingsService, SettingsServiceError};
pub use workflow_service::{SessionError, WorkflowPorts, WorkflowSession};
