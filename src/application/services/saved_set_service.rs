//! Saved Set Service - Named snapshots of draft lists and confirmed stories
//!
//! Two independent ordered lists, one per [`SavedSetKind`]. Saving captures
//! the relevant part of a session's workflow state; loading turns a set back
//! into the user action that restores it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::application::dto::SavedSetListsDto;
use crate::application::ports::outbound::{SavedSetError, SavedSetRepositoryPort};
use crate::domain::entities::{DraftSetSnapshot, SavedPayload, SavedSet, SavedSetKind, StorySnapshot};
use crate::domain::value_objects::SavedSetId;
use crate::domain::workflow::{UserAction, WorkflowState};

#[async_trait]
pub trait SavedSetService: Send + Sync {
    /// Snapshot the session state into a new set at the end of its list
    ///
    /// A missing name gets the dated default; a blank one is rejected.
    async fn save_from_state(
        &self,
        kind: SavedSetKind,
        name: Option<String>,
        state: &WorkflowState,
    ) -> Result<SavedSet, SavedSetError>;

    async fn list(&self) -> Result<SavedSetListsDto, SavedSetError>;

    async fn delete(&self, id: SavedSetId) -> Result<(), SavedSetError>;

    /// Delete the item at `position` of one list
    async fn delete_at(&self, kind: SavedSetKind, position: usize) -> Result<SavedSet, SavedSetError>;

    async fn clear(&self, kind: SavedSetKind) -> Result<u64, SavedSetError>;

    /// The action that restores this set into a session
    async fn load(&self, id: SavedSetId) -> Result<UserAction, SavedSetError>;

    /// Import an array exported from the browser's local storage
    async fn import_legacy(
        &self,
        kind: SavedSetKind,
        records: serde_json::Value,
    ) -> Result<usize, SavedSetError>;
}

pub struct SavedSetServiceImpl {
    repository: Arc<dyn SavedSetRepositoryPort>,
}

impl SavedSetServiceImpl {
    pub fn new(repository: Arc<dyn SavedSetRepositoryPort>) -> Self {
        Self { repository }
    }

    fn snapshot(kind: SavedSetKind, state: &WorkflowState) -> Result<SavedPayload, SavedSetError> {
        match kind {
            SavedSetKind::Draft => {
                if state.drafts.is_empty() {
                    return Err(SavedSetError::Validation(
                        "저장할 초안이 없습니다.".to_string(),
                    ));
                }
                Ok(SavedPayload::Drafts(DraftSetSnapshot {
                    category: state.category.clone(),
                    input_mode: state.input_mode,
                    custom_input: state.custom_input.clone(),
                    drafts: state.drafts.clone(),
                }))
            }
            SavedSetKind::Story => Ok(SavedPayload::Story(StorySnapshot {
                format: state.format,
                selected_draft: state.selected_draft.clone(),
                cuts: state.cuts.clone(),
                character_prompt: state.character_prompt.clone(),
                edited_story: state.edited_story.clone(),
            })),
        }
    }
}

#[async_trait]
impl SavedSetService for SavedSetServiceImpl {
    #[instrument(skip(self, state), fields(kind = kind.as_str()))]
    async fn save_from_state(
        &self,
        kind: SavedSetKind,
        name: Option<String>,
        state: &WorkflowState,
    ) -> Result<SavedSet, SavedSetError> {
        let name = match name {
            Some(name) if name.trim().is_empty() => {
                return Err(SavedSetError::Validation("이름을 입력해주세요.".to_string()))
            }
            Some(name) => name.trim().to_string(),
            None => kind.default_name(Utc::now()),
        };

        let set = SavedSet::new(name, Self::snapshot(kind, state)?);
        self.repository.append(&set).await?;

        info!(set_id = %set.id, name = %set.name, "Saved set created");
        Ok(set)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<SavedSetListsDto, SavedSetError> {
        Ok(SavedSetListsDto {
            drafts: self.repository.list(SavedSetKind::Draft).await?,
            stories: self.repository.list(SavedSetKind::Story).await?,
        })
    }

    #[instrument(skip(self), fields(set_id = %id))]
    async fn delete(&self, id: SavedSetId) -> Result<(), SavedSetError> {
        if !self.repository.delete(id).await? {
            return Err(SavedSetError::NotFound(id.to_string()));
        }
        info!("Saved set deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(kind = kind.as_str()))]
    async fn delete_at(&self, kind: SavedSetKind, position: usize) -> Result<SavedSet, SavedSetError> {
        let set = self
            .repository
            .list(kind)
            .await?
            .into_iter()
            .nth(position)
            .ok_or_else(|| SavedSetError::NotFound(format!("{}[{}]", kind.storage_key(), position)))?;

        self.delete(set.id).await?;
        Ok(set)
    }

    #[instrument(skip(self), fields(kind = kind.as_str()))]
    async fn clear(&self, kind: SavedSetKind) -> Result<u64, SavedSetError> {
        let removed = self.repository.clear(kind).await?;
        info!(removed, "Saved list cleared");
        Ok(removed)
    }

    #[instrument(skip(self), fields(set_id = %id))]
    async fn load(&self, id: SavedSetId) -> Result<UserAction, SavedSetError> {
        let set = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| SavedSetError::NotFound(id.to_string()))?;

        debug!(name = %set.name, kind = set.kind().as_str(), "Loading saved set");
        Ok(match set.payload {
            SavedPayload::Drafts(set) => UserAction::LoadDraftSet { set },
            SavedPayload::Story(story) => UserAction::LoadStorySet { story },
        })
    }

    #[instrument(skip(self, records), fields(kind = kind.as_str()))]
    async fn import_legacy(
        &self,
        kind: SavedSetKind,
        records: serde_json::Value,
    ) -> Result<usize, SavedSetError> {
        let serde_json::Value::Array(records) = records else {
            return Err(SavedSetError::Validation(format!(
                "{} must be a JSON array",
                kind.storage_key()
            )));
        };

        let mut imported = 0;
        for record in records {
            let mut set = SavedSet::from_legacy(kind, record);
            if set.name.trim().is_empty() {
                set.name = kind.default_name(set.saved_at);
            }
            self.repository.append(&set).await?;
            imported += 1;
        }

        info!(imported, "Legacy saved sets imported");
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use serde_json::json;

    use crate::domain::entities::{Cut, Draft};
    use crate::domain::value_objects::ContentFormat;
    use crate::domain::workflow::{reduce, Stage};

    #[derive(Default)]
    struct InMemorySavedSets {
        sets: Mutex<Vec<SavedSet>>,
    }

    #[async_trait]
    impl SavedSetRepositoryPort for InMemorySavedSets {
        async fn append(&self, set: &SavedSet) -> Result<(), SavedSetError> {
            self.sets.lock().unwrap().push(set.clone());
            Ok(())
        }

        async fn list(&self, kind: SavedSetKind) -> Result<Vec<SavedSet>, SavedSetError> {
            Ok(self
                .sets
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.kind() == kind)
                .cloned()
                .collect())
        }

        async fn get(&self, id: SavedSetId) -> Result<Option<SavedSet>, SavedSetError> {
            Ok(self.sets.lock().unwrap().iter().find(|s| s.id == id).cloned())
        }

        async fn delete(&self, id: SavedSetId) -> Result<bool, SavedSetError> {
            let mut sets = self.sets.lock().unwrap();
            let before = sets.len();
            sets.retain(|s| s.id != id);
            Ok(sets.len() != before)
        }

        async fn clear(&self, kind: SavedSetKind) -> Result<u64, SavedSetError> {
            let mut sets = self.sets.lock().unwrap();
            let before = sets.len();
            sets.retain(|s| s.kind() != kind);
            Ok((before - sets.len()) as u64)
        }
    }

    fn create_test_service() -> SavedSetServiceImpl {
        SavedSetServiceImpl::new(Arc::new(InMemorySavedSets::default()))
    }

    fn create_test_story_state() -> WorkflowState {
        let story = StorySnapshot {
            format: ContentFormat::Short,
            selected_draft: Some(Draft::new(3, "비 오는 날의 구조", "요약")),
            cuts: (1..=20).map(|i| Cut::new(i, format!("장면 {}", i))).collect(),
            character_prompt: "a small white dog".to_string(),
            edited_story: "1. 장면 1".to_string(),
        };
        reduce(&WorkflowState::new(), UserAction::LoadStorySet { story }.into()).state
    }

    #[tokio::test]
    async fn test_story_set_round_trip_restores_story() {
        let service = create_test_service();
        let original = create_test_story_state();

        let saved = service
            .save_from_state(SavedSetKind::Story, Some("스토리 A".to_string()), &original)
            .await
            .unwrap();
        let action = service.load(saved.id).await.unwrap();
        let restored = reduce(&WorkflowState::new(), action.into()).state;

        assert_eq!(restored.stage, Stage::StoryConfirm);
        assert_eq!(restored.format, ContentFormat::Short);
        assert_eq!(restored.selected_draft, original.selected_draft);
        assert_eq!(restored.cuts, original.cuts);
        assert_eq!(restored.character_prompt, original.character_prompt);
        assert_eq!(restored.edited_story, original.edited_story);
    }

    #[tokio::test]
    async fn test_blank_name_and_empty_drafts_rejected() {
        let service = create_test_service();
        let state = create_test_story_state();

        let blank = service
            .save_from_state(SavedSetKind::Story, Some("   ".to_string()), &state)
            .await;
        assert!(matches!(blank, Err(SavedSetError::Validation(_))));

        let empty = service.save_from_state(SavedSetKind::Draft, None, &state).await;
        assert!(matches!(empty, Err(SavedSetError::Validation(_))));
        assert!(service.list().await.unwrap().drafts.is_empty());
    }

    #[tokio::test]
    async fn test_missing_name_uses_dated_default() {
        let service = create_test_service();
        let saved = service
            .save_from_state(SavedSetKind::Story, None, &create_test_story_state())
            .await
            .unwrap();
        assert!(saved.name.starts_with("스토리_"));
    }

    #[tokio::test]
    async fn test_delete_at_preserves_order() {
        let service = create_test_service();
        let state = create_test_story_state();
        for name in ["a", "b", "c", "d"] {
            service
                .save_from_state(SavedSetKind::Story, Some(name.to_string()), &state)
                .await
                .unwrap();
        }

        let removed = service.delete_at(SavedSetKind::Story, 1).await.unwrap();
        assert_eq!(removed.name, "b");

        let names: Vec<String> = service
            .list()
            .await
            .unwrap()
            .stories
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["a", "c", "d"]);

        let missing = service.delete_at(SavedSetKind::Story, 3).await;
        assert!(matches!(missing, Err(SavedSetError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_clear_only_touches_one_list() {
        let service = create_test_service();
        service
            .import_legacy(SavedSetKind::Draft, json!([{"title": "d", "drafts": []}]))
            .await
            .unwrap();
        service
            .save_from_state(SavedSetKind::Story, None, &create_test_story_state())
            .await
            .unwrap();

        assert_eq!(service.clear(SavedSetKind::Draft).await.unwrap(), 1);
        let lists = service.list().await.unwrap();
        assert!(lists.drafts.is_empty());
        assert_eq!(lists.stories.len(), 1);
    }

    #[tokio::test]
    async fn test_import_legacy_coerces_records() {
        let service = create_test_service();
        let records = json!([
            {"title": "초안 모음", "category": "모성애", "drafts": [{"id": 2, "title": "t", "summary": "s"}]},
            {"drafts": "not a list", "savedAt": "2025-01-03T09:00:00.000Z"}
        ]);

        let imported = service.import_legacy(SavedSetKind::Draft, records).await.unwrap();
        assert_eq!(imported, 2);

        let drafts = service.list().await.unwrap().drafts;
        assert_eq!(drafts[0].name, "초안 모음");
        assert_eq!(drafts[1].name, "초안_2025. 1. 3.");
        let SavedPayload::Drafts(second) = &drafts[1].payload else {
            panic!("expected draft payload");
        };
        assert!(second.drafts.is_empty());

        let not_array = service.import_legacy(SavedSetKind::Draft, json!({"title": "x"})).await;
        assert!(matches!(not_array, Err(SavedSetError::Validation(_))));
    }
}
