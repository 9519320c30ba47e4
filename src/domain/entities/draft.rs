//! Draft entity - One candidate story premise offered before story expansion

use serde::{Deserialize, Serialize};

/// Number of drafts generated per batch; draft ids run 1..=DRAFT_BATCH_SIZE
pub const DRAFT_BATCH_SIZE: u32 = 10;

const THEME_ERROR: &str = "error";
const THEME_LOADING: &str = "loading";

/// A draft produced by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub theme: String,
}

impl Draft {
    pub fn new(id: u32, title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            summary: summary.into(),
            theme: String::new(),
        }
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    /// Whether `id` belongs to a draft batch
    pub fn is_valid_id(id: u32) -> bool {
        (1..=DRAFT_BATCH_SIZE).contains(&id)
    }

    pub fn is_regenerating(&self) -> bool {
        self.theme == THEME_LOADING
    }

    /// Placeholder shown while the draft is being regenerated
    pub fn regenerating(&self) -> Self {
        Self {
            id: self.id,
            title: self.title.clone(),
            summary: "재생성 중...".to_string(),
            theme: THEME_LOADING.to_string(),
        }
    }

    /// Marker left when regeneration failed
    pub fn failed(id: u32, error: &str) -> Self {
        Self {
            id,
            title: "Error".to_string(),
            summary: format!("재생성 실패: {}", error),
            theme: THEME_ERROR.to_string(),
        }
    }
}

/// Insert or replace `draft` keeping the list sorted by id ascending
pub fn upsert_sorted(drafts: &mut Vec<Draft>, draft: Draft) {
    match drafts.binary_search_by_key(&draft.id, |d| d.id) {
        Ok(pos) => drafts[pos] = draft,
        Err(pos) => drafts.insert(pos, draft),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_keeps_order_and_replaces() {
        let mut drafts = Vec::new();
        for id in [3, 1, 2] {
            upsert_sorted(&mut drafts, Draft::new(id, format!("t{}", id), "s"));
        }
        upsert_sorted(&mut drafts, Draft::new(2, "replaced", "s"));

        let ids: Vec<u32> = drafts.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(drafts[1].title, "replaced");
    }

    #[test]
    fn test_valid_id_range() {
        assert!(!Draft::is_valid_id(0));
        assert!(Draft::is_valid_id(1));
        assert!(Draft::is_valid_id(10));
        assert!(!Draft::is_valid_id(11));
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let draft: Draft = serde_json::from_str(r#"{"id": 4}"#).unwrap();
        assert_eq!(draft, Draft::new(4, "", ""));
    }
}
