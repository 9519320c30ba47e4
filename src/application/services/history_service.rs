//! History Service - Past generation projects kept by the remote service

use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::ports::outbound::{ProjectHistoryPort, RemoteError};
use crate::domain::entities::{GeneratedCut, ProjectDetail, ProjectSummary};

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Invalid project folder: {0}")]
    InvalidFolder(String),
    #[error("Title must not be empty")]
    InvalidTitle,
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub struct HistoryService {
    history: Arc<dyn ProjectHistoryPort>,
}

impl HistoryService {
    pub fn new(history: Arc<dyn ProjectHistoryPort>) -> Self {
        Self { history }
    }

    /// Folder names are single path segments on the remote host
    fn check_folder(folder: &str) -> Result<(), HistoryError> {
        let invalid = folder.trim().is_empty()
            || folder.contains('/')
            || folder.contains('\\')
            || folder == "."
            || folder == "..";
        if invalid {
            return Err(HistoryError::InvalidFolder(folder.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ProjectSummary>, HistoryError> {
        Ok(self.history.list_projects().await?)
    }

    #[instrument(skip(self))]
    pub async fn detail(&self, folder: &str) -> Result<ProjectDetail, HistoryError> {
        Self::check_folder(folder)?;
        Ok(self.history.get_project(folder).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, folder: &str) -> Result<(), HistoryError> {
        Self::check_folder(folder)?;
        self.history.delete_project(folder).await?;
        info!("Project deleted");
        Ok(())
    }

    /// Returns the title the remote service stored
    #[instrument(skip(self))]
    pub async fn rename(&self, folder: &str, title: &str) -> Result<String, HistoryError> {
        Self::check_folder(folder)?;
        let title = title.trim();
        if title.is_empty() {
            return Err(HistoryError::InvalidTitle);
        }
        let stored = self.history.rename_project(folder, title).await?;
        info!(title = %stored, "Project renamed");
        Ok(stored)
    }

    /// Fill in missing video prompts; returns the updated cuts and the refreshed detail
    #[instrument(skip(self))]
    pub async fn generate_video_prompts(
        &self,
        folder: &str,
    ) -> Result<(Vec<GeneratedCut>, ProjectDetail), HistoryError> {
        Self::check_folder(folder)?;
        let updated = self.history.generate_video_prompts(folder).await?;
        let detail = self.history.get_project(folder).await?;
        info!(cuts = updated.len(), "Video prompts generated");
        Ok((updated.clone(), detail.with_cuts(updated)))
    }
}
