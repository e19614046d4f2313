// SQLite-backed alert store for persistent moderation alerts.
//
// Tables:
// - moderation_alerts: One row per flagged message, unique on message_id

use crate::core::moderation::{
    AlertReview, AlertStatus, AlertStore, ModerationAlert, ModerationError, ModerationReason,
    ModerationScore, NewAlert, Severity,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

const ALERT_COLUMNS: &str = r#"
    id, message_id, sender_id, recipient_id, content, reasons,
    toxicity, profanity, threat, inappropriate, severity, status,
    created_at, reviewed_by, reviewed_at, review_note
"#;

pub struct SqliteAlertStore {
    pool: Pool<Sqlite>,
}

impl SqliteAlertStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Open (or create) the database file at `path` and run migrations.
    pub async fn connect(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .connect(&format!("sqlite://{}?mode=rwc", path.display()))
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), ModerationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS moderation_alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id TEXT NOT NULL UNIQUE,
                sender_id TEXT NOT NULL,
                recipient_id TEXT NOT NULL,
                content TEXT NOT NULL,
                reasons TEXT NOT NULL DEFAULT '[]',
                toxicity REAL NOT NULL DEFAULT 0,
                profanity REAL NOT NULL DEFAULT 0,
                threat REAL NOT NULL DEFAULT 0,
                inappropriate REAL NOT NULL DEFAULT 0,
                severity TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'open',
                created_at TEXT NOT NULL,
                reviewed_by TEXT,
                reviewed_at TEXT,
                review_note TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_moderation_alerts_status
                ON moderation_alerts(status, created_at);
            CREATE INDEX IF NOT EXISTS idx_moderation_alerts_created
                ON moderation_alerts(created_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        Ok(())
    }
}

// Fixed-width timestamps so TEXT ordering matches time ordering
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ModerationError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ModerationError::StorageError(format!("bad timestamp {:?}: {}", value, e)))
}

fn row_to_alert(row: &SqliteRow) -> Result<ModerationAlert, ModerationError> {
    let reasons_json: String = row.get("reasons");
    let reasons: Vec<ModerationReason> = serde_json::from_str(&reasons_json)
        .map_err(|e| ModerationError::StorageError(format!("bad reasons column: {}", e)))?;

    let severity_str: String = row.get("severity");
    let severity = Severity::parse(&severity_str).ok_or_else(|| {
        ModerationError::StorageError(format!("unknown severity {:?}", severity_str))
    })?;

    let status_str: String = row.get("status");
    let status = AlertStatus::parse(&status_str)
        .ok_or_else(|| ModerationError::StorageError(format!("unknown status {:?}", status_str)))?;

    let created_at: String = row.get("created_at");
    let reviewed_at: Option<String> = row.get("reviewed_at");

    let alert = ModerationAlert {
        id: row.get("id"),
        message_id: row.get("message_id"),
        sender_id: row.get("sender_id"),
        recipient_id: row.get("recipient_id"),
        content: row.get("content"),
        reasons,
        score: ModerationScore {
            toxicity: row.get("toxicity"),
            profanity: row.get("profanity"),
            threat: row.get("threat"),
            inappropriate: row.get("inappropriate"),
        },
        severity,
        status,
        created_at: parse_timestamp(&created_at)?,
        reviewed_by: row.get("reviewed_by"),
        reviewed_at: reviewed_at.as_deref().map(parse_timestamp).transpose()?,
        review_note: row.get("review_note"),
    };

    // Severity is a function of the score; a mismatch means the row was edited by hand
    if alert.recomputed_severity() != alert.severity {
        tracing::warn!(
            alert_id = alert.id,
            stored = %alert.severity,
            recomputed = %alert.recomputed_severity(),
            "Stored alert severity does not match its score"
        );
    }

    Ok(alert)
}

#[async_trait]
impl AlertStore for SqliteAlertStore {
    async fn insert_alert(&self, alert: NewAlert) -> Result<ModerationAlert, ModerationError> {
        let reasons_json = serde_json::to_string(&alert.reasons)
            .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO moderation_alerts (
                message_id, sender_id, recipient_id, content, reasons,
                toxicity, profanity, threat, inappropriate, severity, status, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'open', ?)
            ON CONFLICT(message_id) DO NOTHING
            "#,
        )
        .bind(&alert.message_id)
        .bind(&alert.sender_id)
        .bind(&alert.recipient_id)
        .bind(&alert.content)
        .bind(&reasons_json)
        .bind(alert.score.toxicity)
        .bind(alert.score.profanity)
        .bind(alert.score.threat)
        .bind(alert.score.inappropriate)
        .bind(alert.severity.as_str())
        .bind(format_timestamp(&alert.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        // Either the row we just wrote or the one a previous attempt wrote
        self.get_alert_for_message(&alert.message_id)
            .await?
            .ok_or_else(|| {
                ModerationError::StorageError(format!(
                    "alert for message {} vanished after insert",
                    alert.message_id
                ))
            })
    }

    async fn get_alert(&self, id: i64) -> Result<Option<ModerationAlert>, ModerationError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM moderation_alerts WHERE id = ?",
            ALERT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        row.as_ref().map(row_to_alert).transpose()
    }

    async fn get_alert_for_message(
        &self,
        message_id: &str,
    ) -> Result<Option<ModerationAlert>, ModerationError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM moderation_alerts WHERE message_id = ?",
            ALERT_COLUMNS
        ))
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        row.as_ref().map(row_to_alert).transpose()
    }

    async fn list_alerts(
        &self,
        status: Option<AlertStatus>,
        limit: usize,
    ) -> Result<Vec<ModerationAlert>, ModerationError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    r#"
                    SELECT {} FROM moderation_alerts
                    WHERE status = ?
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?
                    "#,
                    ALERT_COLUMNS
                ))
                .bind(status.as_str())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    r#"
                    SELECT {} FROM moderation_alerts
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?
                    "#,
                    ALERT_COLUMNS
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        rows.iter().map(row_to_alert).collect()
    }

    async fn apply_review(&self, id: i64, review: &AlertReview) -> Result<bool, ModerationError> {
        let result = sqlx::query(
            r#"
            UPDATE moderation_alerts
            SET status = ?, reviewed_by = ?, reviewed_at = ?, review_note = ?
            WHERE id = ? AND status = 'open'
            "#,
        )
        .bind(review.status.as_str())
        .bind(&review.reviewer)
        .bind(format_timestamp(&review.reviewed_at))
        .bind(&review.note)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{classify, OutgoingMessage};
    use tempfile::TempDir;

    async fn temp_store() -> (TempDir, SqliteAlertStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteAlertStore::connect(dir.path().join("data/alerts.db"))
            .await
            .unwrap();
        (dir, store)
    }

    fn new_alert(message_id: &str, content: &str) -> NewAlert {
        let message = OutgoingMessage {
            message_id: message_id.to_string(),
            sender_id: "coach-1".to_string(),
            recipient_id: "athlete-1".to_string(),
            content: content.to_string(),
        };
        NewAlert::from_screening(&message, &classify(content))
    }

    #[tokio::test]
    async fn test_insert_and_reload() {
        let (_dir, store) = temp_store().await;

        let alert = store
            .insert_alert(new_alert("m1", "You stupid bitch, call me at 555-123-4567"))
            .await
            .unwrap();

        assert_eq!(alert.status, AlertStatus::Open);
        assert_eq!(alert.severity, Severity::Critical);
        assert!(alert.reasons.contains(&ModerationReason::PhoneNumberExchange));
        assert_eq!(alert.score.threat, 0.9);
        assert_eq!(alert.score.toxicity, 0.8);

        let loaded = store.get_alert(alert.id).await.unwrap().unwrap();
        assert_eq!(loaded, alert);
        assert_eq!(loaded.recomputed_severity(), loaded.severity);
    }

    #[tokio::test]
    async fn test_duplicate_message_keeps_first_alert() {
        let (_dir, store) = temp_store().await;

        let first = store.insert_alert(new_alert("m1", "kill")).await.unwrap();
        let second = store
            .insert_alert(new_alert("m1", "Follow me @username"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.content, "kill");
        assert_eq!(store.list_alerts(None, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_review_and_filter() {
        let (_dir, store) = temp_store().await;

        let a = store.insert_alert(new_alert("m1", "loser")).await.unwrap();
        store.insert_alert(new_alert("m2", "idiot")).await.unwrap();

        let review = AlertReview {
            status: AlertStatus::Dismissed,
            reviewer: "admin".to_string(),
            note: Some("banter between teammates".to_string()),
            reviewed_at: Utc::now(),
        };
        assert!(store.apply_review(a.id, &review).await.unwrap());
        assert!(!store.apply_review(a.id, &review).await.unwrap());

        let dismissed = store
            .list_alerts(Some(AlertStatus::Dismissed), 10)
            .await
            .unwrap();
        assert_eq!(dismissed.len(), 1);
        assert_eq!(dismissed[0].review_note.as_deref(), Some("banter between teammates"));
        assert!(dismissed[0].reviewed_at.is_some());

        let open = store.list_alerts(Some(AlertStatus::Open), 10).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].message_id, "m2");
    }

    #[tokio::test]
    async fn test_missing_alert() {
        let (_dir, store) = temp_store().await;
        assert!(store.get_alert(12).await.unwrap().is_none());
        assert!(store.get_alert_for_message("m9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_alerts_survive_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.db");

        let id = {
            let store = SqliteAlertStore::connect(&path).await.unwrap();
            store.insert_alert(new_alert("m1", "weapon")).await.unwrap().id
        };

        let store = SqliteAlertStore::connect(&path).await.unwrap();
        let alert = store.get_alert(id).await.unwrap().unwrap();
        assert_eq!(alert.message_id, "m1");
    }
}
