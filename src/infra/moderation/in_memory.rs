// In-memory implementation of AlertStore.
//
// Used for throwaway runs (SAFETY_STORE=memory) and by the service tests.
// Nothing survives a restart.

use crate::core::moderation::{
    AlertReview, AlertStatus, AlertStore, ModerationAlert, ModerationError, NewAlert,
};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// DashMap-backed alert store.
///
/// `by_message` is the uniqueness index: an alert is only created while
/// holding the vacant index entry for its message id, so concurrent retries
/// for the same message can't both insert.
pub struct InMemoryAlertStore {
    alerts: DashMap<i64, ModerationAlert>,
    by_message: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl InMemoryAlertStore {
    pub fn new() -> Self {
        Self {
            alerts: DashMap::new(),
            by_message: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryAlertStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn insert_alert(&self, alert: NewAlert) -> Result<ModerationAlert, ModerationError> {
        match self.by_message.entry(alert.message_id.clone()) {
            Entry::Occupied(entry) => {
                let id = *entry.get();
                self.alerts.get(&id).map(|a| a.clone()).ok_or_else(|| {
                    ModerationError::StorageError(format!(
                        "alert index points at missing alert {}",
                        id
                    ))
                })
            }
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                let stored = ModerationAlert::from_new(id, alert);
                self.alerts.insert(id, stored.clone());
                entry.insert(id);
                Ok(stored)
            }
        }
    }

    async fn get_alert(&self, id: i64) -> Result<Option<ModerationAlert>, ModerationError> {
        Ok(self.alerts.get(&id).map(|a| a.clone()))
    }

    async fn get_alert_for_message(
        &self,
        message_id: &str,
    ) -> Result<Option<ModerationAlert>, ModerationError> {
        let id = match self.by_message.get(message_id) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.alerts.get(&id).map(|a| a.clone()))
    }

    async fn list_alerts(
        &self,
        status: Option<AlertStatus>,
        limit: usize,
    ) -> Result<Vec<ModerationAlert>, ModerationError> {
        let mut alerts: Vec<ModerationAlert> = self
            .alerts
            .iter()
            .filter(|entry| status.map_or(true, |s| entry.value().status == s))
            .map(|entry| entry.value().clone())
            .collect();

        // Newest first
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        alerts.truncate(limit);

        Ok(alerts)
    }

    async fn apply_review(&self, id: i64, review: &AlertReview) -> Result<bool, ModerationError> {
        let Some(mut alert) = self.alerts.get_mut(&id) else {
            return Ok(false);
        };

        if alert.status != AlertStatus::Open {
            return Ok(false);
        }

        alert.status = review.status;
        alert.reviewed_by = Some(review.reviewer.clone());
        alert.reviewed_at = Some(review.reviewed_at);
        alert.review_note = review.note.clone();

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{classify, OutgoingMessage};
    use chrono::Utc;

    fn new_alert(message_id: &str, content: &str) -> NewAlert {
        let message = OutgoingMessage {
            message_id: message_id.to_string(),
            sender_id: "coach-9".to_string(),
            recipient_id: "athlete-3".to_string(),
            content: content.to_string(),
        };
        NewAlert::from_screening(&message, &classify(content))
    }

    #[tokio::test]
    async fn test_insert_is_idempotent_per_message() {
        let store = InMemoryAlertStore::new();

        let first = store.insert_alert(new_alert("m1", "kill")).await.unwrap();
        let second = store.insert_alert(new_alert("m1", "kill")).await.unwrap();
        let other = store.insert_alert(new_alert("m2", "kill")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(first, second);
        assert_eq!(other.id, 2);
        assert_eq!(store.list_alerts(None, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_lookup_by_message() {
        let store = InMemoryAlertStore::new();
        let inserted = store
            .insert_alert(new_alert("m1", "Follow me @username"))
            .await
            .unwrap();

        let found = store.get_alert_for_message("m1").await.unwrap();
        assert_eq!(found, Some(inserted));
        assert!(store.get_alert_for_message("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_respects_limit_and_order() {
        let store = InMemoryAlertStore::new();
        for i in 0..5 {
            store
                .insert_alert(new_alert(&format!("m{}", i), "loser"))
                .await
                .unwrap();
        }

        let alerts = store.list_alerts(None, 3).await.unwrap();
        assert_eq!(alerts.len(), 3);
        assert!(alerts[0].id > alerts[1].id);
        assert!(alerts[1].id > alerts[2].id);
    }

    #[tokio::test]
    async fn test_apply_review_only_from_open() {
        let store = InMemoryAlertStore::new();
        let alert = store.insert_alert(new_alert("m1", "hate you")).await.unwrap();

        let review = AlertReview {
            status: AlertStatus::Reviewed,
            reviewer: "admin".to_string(),
            note: None,
            reviewed_at: Utc::now(),
        };

        assert!(store.apply_review(alert.id, &review).await.unwrap());
        assert!(!store.apply_review(alert.id, &review).await.unwrap());
        assert!(!store.apply_review(999, &review).await.unwrap());

        let stored = store.get_alert(alert.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AlertStatus::Reviewed);
        assert_eq!(stored.reviewed_by.as_deref(), Some("admin"));
    }
}
