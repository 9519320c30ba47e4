use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::application::ports::outbound::{SavedSetError, SavedSetRepositoryPort};
use crate::domain::entities::{SavedPayload, SavedSet, SavedSetKind};
use crate::domain::value_objects::SavedSetId;

type SavedSetRow = (String, String, String, DateTime<Utc>);

/// Saved sets in one SQLite table; `seq` keeps insertion order per list
pub struct SqliteSavedSetRepository {
    pool: SqlitePool,
}

impl SqliteSavedSetRepository {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS saved_sets (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                payload TEXT NOT NULL,
                saved_at TIMESTAMP NOT NULL
            )
        "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS saved_sets_kind ON saved_sets (kind, seq)")
            .execute(&pool)
            .await?;

        Ok(Self { pool })
    }

    fn from_row((id, name, payload, saved_at): SavedSetRow) -> Result<SavedSet, SavedSetError> {
        let id: SavedSetId = id
            .parse()
            .map_err(|e| SavedSetError::Serialization(format!("bad id {}: {}", id, e)))?;
        let payload: SavedPayload =
            serde_json::from_str(&payload).map_err(|e| SavedSetError::Serialization(e.to_string()))?;
        Ok(SavedSet {
            id,
            name,
            saved_at,
            payload,
        })
    }
}

fn database_error(e: sqlx::Error) -> SavedSetError {
    SavedSetError::Database(e.to_string())
}

#[async_trait]
impl SavedSetRepositoryPort for SqliteSavedSetRepository {
    async fn append(&self, set: &SavedSet) -> Result<(), SavedSetError> {
        let payload =
            serde_json::to_string(&set.payload).map_err(|e| SavedSetError::Serialization(e.to_string()))?;

        sqlx::query("INSERT INTO saved_sets (id, kind, name, payload, saved_at) VALUES (?, ?, ?, ?, ?)")
            .bind(set.id.to_string())
            .bind(set.kind().storage_key())
            .bind(&set.name)
            .bind(payload)
            .bind(set.saved_at)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(())
    }

    async fn list(&self, kind: SavedSetKind) -> Result<Vec<SavedSet>, SavedSetError> {
        let rows: Vec<SavedSetRow> = sqlx::query_as(
            "SELECT id, name, payload, saved_at FROM saved_sets WHERE kind = ? ORDER BY seq",
        )
        .bind(kind.storage_key())
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.into_iter().map(Self::from_row).collect()
    }

    async fn get(&self, id: SavedSetId) -> Result<Option<SavedSet>, SavedSetError> {
        let row: Option<SavedSetRow> =
            sqlx::query_as("SELECT id, name, payload, saved_at FROM saved_sets WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(database_error)?;

        row.map(Self::from_row).transpose()
    }

    async fn delete(&self, id: SavedSetId) -> Result<bool, SavedSetError> {
        let result = sqlx::query("DELETE FROM saved_sets WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, kind: SavedSetKind) -> Result<u64, SavedSetError> {
        let result = sqlx::query("DELETE FROM saved_sets WHERE kind = ?")
            .bind(kind.storage_key())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::domain::entities::{Cut, Draft, DraftSetSnapshot, StorySnapshot};
    use crate::domain::value_objects::ContentFormat;

    async fn create_test_repository() -> SqliteSavedSetRepository {
        // One connection: every connection to `sqlite::memory:` is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteSavedSetRepository::new(pool).await.unwrap()
    }

    fn draft_set(name: &str) -> SavedSet {
        SavedSet::new(
            name,
            SavedPayload::Drafts(DraftSetSnapshot {
                category: "모성애".to_string(),
                drafts: vec![Draft::new(1, "t", "s")],
                ..Default::default()
            }),
        )
    }

    #[tokio::test]
    async fn test_append_and_list_in_insertion_order() {
        let repo = create_test_repository().await;
        for name in ["first", "second", "third"] {
            repo.append(&draft_set(name)).await.unwrap();
        }
        let story = SavedSet::new(
            "story",
            SavedPayload::Story(StorySnapshot {
                format: ContentFormat::Short,
                cuts: vec![Cut::new(1, "d")],
                ..Default::default()
            }),
        );
        repo.append(&story).await.unwrap();

        let names: Vec<String> = repo
            .list(SavedSetKind::Draft)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);

        let stories = repo.list(SavedSetKind::Story).await.unwrap();
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].id, story.id);
        assert_eq!(stories[0].payload, story.payload);
        assert_eq!(stories[0].saved_at.timestamp_millis(), story.saved_at.timestamp_millis());
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let repo = create_test_repository().await;
        let set = draft_set("one");
        repo.append(&set).await.unwrap();

        let loaded = repo.get(set.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "one");
        assert_eq!(loaded.payload, set.payload);
        assert!(repo.delete(set.id).await.unwrap());
        assert!(!repo.delete(set.id).await.unwrap());
        assert_eq!(repo.get(set.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_one_kind() {
        let repo = create_test_repository().await;
        repo.append(&draft_set("a")).await.unwrap();
        repo.append(&draft_set("b")).await.unwrap();
        repo.append(&SavedSet::new("s", SavedPayload::Story(StorySnapshot::default())))
            .await
            .unwrap();

        assert_eq!(repo.clear(SavedSetKind::Draft).await.unwrap(), 2);
        assert!(repo.list(SavedSetKind::Draft).await.unwrap().is_empty());
        assert_eq!(repo.list(SavedSetKind::Story).await.unwrap().len(), 1);
    }
}
