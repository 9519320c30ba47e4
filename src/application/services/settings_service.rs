use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::application::ports::outbound::{RemoteError, RemoteSettingsPort};
use crate::domain::value_objects::{RemoteSettings, SettingsUpdate};

#[derive(Debug, thiserror::Error)]
pub enum SettingsServiceError {
    #[error("A settings save is already in progress")]
    Busy,
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Reachability of the remote generation backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendStatus {
    pub online: bool,
    pub api_key_set: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct SettingsService {
    remote: Arc<dyn RemoteSettingsPort>,
    cache: RwLock<Option<RemoteSettings>>,
    saving: AtomicBool,
}

/// Clears the in-flight flag when the save finishes, however it finishes
struct SaveGuard<'a>(&'a AtomicBool);

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SettingsService {
    pub fn new(remote: Arc<dyn RemoteSettingsPort>) -> Self {
        Self {
            remote,
            cache: RwLock::new(None),
            saving: AtomicBool::new(false),
        }
    }

    /// Get current settings (cached after the first successful read)
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<RemoteSettings, SettingsServiceError> {
        let cache = self.cache.read().await;
        if let Some(settings) = &*cache {
            return Ok(settings.clone());
        }
        drop(cache);

        self.refresh().await
    }

    /// Re-read settings from the remote service
    pub async fn refresh(&self) -> Result<RemoteSettings, SettingsServiceError> {
        let settings = self.remote.get_settings().await?;
        *self.cache.write().await = Some(settings.clone());
        Ok(settings)
    }

    /// Send a partial update and return the settings as stored afterwards
    ///
    /// Refused while a previous save is still outstanding. A blank API key
    /// is never sent, so saving without typing one keeps the stored key.
    #[instrument(skip(self, update))]
    pub async fn update(&self, update: SettingsUpdate) -> Result<RemoteSettings, SettingsServiceError> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SettingsServiceError::Busy);
        }
        let _guard = SaveGuard(&self.saving);

        let update = update.without_blank_key();
        if let Err(e) = self.remote.update_settings(&update).await {
            warn!(error = %e, "Settings update failed");
            return Err(e.into());
        }
        info!("Settings updated");

        *self.cache.write().await = None;
        self.refresh().await
    }

    #[instrument(skip(self))]
    pub async fn models(&self) -> Result<Vec<String>, SettingsServiceError> {
        Ok(self.remote.list_models().await?)
    }

    /// Probe the backend; never fails
    #[instrument(skip(self))]
    pub async fn status(&self) -> BackendStatus {
        match self.refresh().await {
            Ok(settings) => BackendStatus {
                online: true,
                api_key_set: settings.openai_api_key_set,
                error: None,
            },
            Err(e) => BackendStatus {
                online: false,
                api_key_set: false,
                error: Some(e.to_string()),
            },
        }
    }
}
