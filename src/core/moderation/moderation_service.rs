// Moderation service - the message write path and the alert review workflow.
//
// This service handles:
// - Screening outgoing messages with the content filter
// - Creating one moderation alert per flagged message (retries re-use it)
// - Human review transitions (open -> reviewed / dismissed)
//
// NO storage or CLI dependencies here - just pure domain logic.

use super::content_filter;
use super::moderation_models::{
    AlertReview, AlertStatus, MessageScreening, ModerationAlert, ModerationReason,
    ModerationResult, NewAlert, OutgoingMessage, ReviewDecision, SafetyConfig,
};
use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Moderation alert {0} not found")]
    AlertNotFound(i64),

    #[error("Moderation alert {id} was already {status}")]
    AlreadyReviewed { id: i64, status: AlertStatus },

    #[error("Invalid review: {0}")]
    InvalidReview(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting moderation alerts.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Insert an alert for a message.
    ///
    /// At most one alert exists per `message_id`: inserting again for the same
    /// message returns the existing record unchanged.
    async fn insert_alert(&self, alert: NewAlert) -> Result<ModerationAlert, ModerationError>;

    async fn get_alert(&self, id: i64) -> Result<Option<ModerationAlert>, ModerationError>;

    async fn get_alert_for_message(
        &self,
        message_id: &str,
    ) -> Result<Option<ModerationAlert>, ModerationError>;

    /// List alerts, newest first, optionally filtered by status.
    async fn list_alerts(
        &self,
        status: Option<AlertStatus>,
        limit: usize,
    ) -> Result<Vec<ModerationAlert>, ModerationError>;

    /// Apply a review to an alert that is still open.
    ///
    /// Returns `false` if the alert does not exist or has already left `Open`.
    async fn apply_review(&self, id: i64, review: &AlertReview) -> Result<bool, ModerationError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Moderation service for screening messages and triaging alerts.
pub struct ModerationService<S: AlertStore> {
    store: S,
    config: SafetyConfig,
}

impl<S: AlertStore> ModerationService<S> {
    /// Create a new moderation service with the given store.
    pub fn new(store: S, config: SafetyConfig) -> Self {
        Self { store, config }
    }

    /// Classify content without touching storage.
    pub fn classify(&self, content: &str) -> ModerationResult {
        content_filter::classify(content)
    }

    /// Screen a message before it is persisted or forwarded.
    ///
    /// Flagged messages get a moderation alert (when alerts are enabled).
    /// Screening the same message twice never creates a second alert.
    pub async fn screen_message(
        &self,
        message: &OutgoingMessage,
    ) -> Result<MessageScreening, ModerationError> {
        let result = self.classify(&message.content);
        let severity = result.severity();

        let mut alert_id = None;

        if result.flagged {
            tracing::warn!(
                message_id = %message.message_id,
                sender_id = %message.sender_id,
                severity = %severity,
                contact_info = result.has(ModerationReason::ContactInfoSharing),
                reasons = ?result.reasons,
                "Message flagged by content filter"
            );

            if self.config.alerts_enabled {
                let alert = self
                    .store
                    .insert_alert(NewAlert::from_screening(message, &result))
                    .await?;

                tracing::info!(
                    alert_id = alert.id,
                    message_id = %alert.message_id,
                    severity = %alert.severity,
                    "Moderation alert recorded"
                );
                alert_id = Some(alert.id);
            }
        }

        Ok(MessageScreening {
            message_id: message.message_id.clone(),
            flagged: result.flagged,
            reasons: result.reasons,
            score: result.score,
            severity,
            alert_id,
        })
    }

    /// Record a reviewer's decision on an open alert.
    ///
    /// Alerts only ever leave `Open` through this call.
    pub async fn review_alert(
        &self,
        alert_id: i64,
        decision: ReviewDecision,
        reviewer: &str,
        note: Option<String>,
    ) -> Result<ModerationAlert, ModerationError> {
        let reviewer = reviewer.trim();
        if reviewer.is_empty() {
            return Err(ModerationError::InvalidReview(
                "reviewer name is required".to_string(),
            ));
        }

        let alert = self
            .store
            .get_alert(alert_id)
            .await?
            .ok_or(ModerationError::AlertNotFound(alert_id))?;

        if !alert.is_open() {
            return Err(ModerationError::AlreadyReviewed {
                id: alert_id,
                status: alert.status,
            });
        }

        let review = AlertReview {
            status: decision.into(),
            reviewer: reviewer.to_string(),
            note: note
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            reviewed_at: Utc::now(),
        };

        if !self.store.apply_review(alert_id, &review).await? {
            // Someone else reviewed it between our read and write
            let current = self
                .store
                .get_alert(alert_id)
                .await?
                .ok_or(ModerationError::AlertNotFound(alert_id))?;
            return Err(ModerationError::AlreadyReviewed {
                id: alert_id,
                status: current.status,
            });
        }

        tracing::info!(
            alert_id,
            status = %review.status,
            reviewer = %review.reviewer,
            "Moderation alert reviewed"
        );

        self.store
            .get_alert(alert_id)
            .await?
            .ok_or(ModerationError::AlertNotFound(alert_id))
    }

    pub async fn get_alert(&self, alert_id: i64) -> Result<Option<ModerationAlert>, ModerationError> {
        self.store.get_alert(alert_id).await
    }

    pub async fn list_alerts(
        &self,
        status: Option<AlertStatus>,
        limit: usize,
    ) -> Result<Vec<ModerationAlert>, ModerationError> {
        self.store.list_alerts(status, limit).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
