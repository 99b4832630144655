//! Consultation draft hand-off between the entry view and the summary view.

use crate::error::Result;
use crate::storage::{KeyValueStore, CONSULTATION_DATA_KEY, CONSULTATION_ID_KEY, DRAFT_KEY};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultDraft {
    pub text: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

pub fn save_draft(store: &dyn KeyValueStore, text: &str) -> Result<ConsultDraft> {
    let draft = ConsultDraft {
        text: text.to_string(),
        created_at: Utc::now().timestamp_millis(),
    };
    store.set(DRAFT_KEY, &serde_json::to_string(&draft)?)?;
    Ok(draft)
}

/// Unreadable drafts are treated as absent.
pub fn load_draft(store: &dyn KeyValueStore) -> Option<ConsultDraft> {
    let raw = store.get(DRAFT_KEY)?;
    serde_json::from_str(&raw).ok()
}

pub fn clear_draft(store: &dyn KeyValueStore) -> Result<()> {
    store.remove(DRAFT_KEY)
}

/// Record a successful submission so the summary view can pick it up.
pub fn record_submission(
    store: &dyn KeyValueStore,
    consultation_id: &str,
    payload: &serde_json::Value,
) -> Result<()> {
    store.set(CONSULTATION_ID_KEY, consultation_id)?;
    store.set(CONSULTATION_DATA_KEY, &serde_json::to_string(payload)?)?;
    Ok(())
}

pub fn last_submission(store: &dyn KeyValueStore) -> Option<(String, serde_json::Value)> {
    let id = store.get(CONSULTATION_ID_KEY)?;
    let data = store
        .get(CONSULTATION_DATA_KEY)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or(serde_json::Value::Null);
    Some((id, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn draft_roundtrip_uses_camel_case() {
        let store = MemoryStore::new();
        let saved = save_draft(&store, "ビールのモニター会をしたい").unwrap();
        let raw = store.get(DRAFT_KEY).unwrap();
        assert!(raw.contains("createdAt"));
        assert_eq!(load_draft(&store), Some(saved));
        clear_draft(&store).unwrap();
        assert!(load_draft(&store).is_none());
    }

    #[test]
    fn garbage_draft_is_absent() {
        let store = MemoryStore::new();
        store.set(DRAFT_KEY, "{broken").unwrap();
        assert!(load_draft(&store).is_none());
    }

    #[test]
    fn submission_is_recorded() {
        let store = MemoryStore::new();
        let payload = serde_json::json!({ "consultation_id": "c-1", "summary_title": "t" });
        record_submission(&store, "c-1", &payload).unwrap();
        let (id, data) = last_submission(&store).unwrap();
        assert_eq!(id, "c-1");
        assert_eq!(data, payload);
    }
}
