//! Shared application state

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::RwLock;

use crate::application::ports::outbound::{
    GenerationServicePort, ProjectHistoryPort, RemoteSettingsPort, SavedSetRepositoryPort,
};
use crate::application::services::{
    HistoryService, SavedSetServiceImpl, SettingsService, WorkflowPorts,
};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::persistence::{self, SqliteSavedSetRepository};
use crate::infrastructure::remote::RemoteClient;
use crate::infrastructure::session::WorkflowSessionManager;

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    /// Client of the remote generation service, used directly for reference uploads
    pub generation: Arc<dyn GenerationServicePort>,
    /// Active console sessions
    pub sessions: RwLock<WorkflowSessionManager>,
    // Application services
    pub saved_set_service: SavedSetServiceImpl,
    pub history_service: HistoryService,
    pub settings_service: SettingsService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let pool = persistence::connect(&config.database_url).await?;
        let saved_sets = SqliteSavedSetRepository::new(pool)
            .await
            .context("Failed to prepare saved set table")?;

        let remote = Arc::new(RemoteClient::from_config(&config));
        Ok(Self::with_adapters(
            config,
            remote.clone(),
            remote.clone(),
            remote,
            Arc::new(saved_sets),
        ))
    }

    /// Wire services over explicit adapters
    pub fn with_adapters(
        config: AppConfig,
        generation: Arc<dyn GenerationServicePort>,
        settings: Arc<dyn RemoteSettingsPort>,
        history: Arc<dyn ProjectHistoryPort>,
        saved_sets: Arc<dyn SavedSetRepositoryPort>,
    ) -> Self {
        let ports = WorkflowPorts {
            generation: generation.clone(),
            settings: settings.clone(),
        };

        Self {
            config,
            generation,
            sessions: RwLock::new(WorkflowSessionManager::new(ports)),
            saved_set_service: SavedSetServiceImpl::new(saved_sets),
            history_service: HistoryService::new(history),
            settings_service: SettingsService::new(settings),
        }
    }
}
