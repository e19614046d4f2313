// Moderation domain models - data structures for the message safety system.
//
// These are pure domain types with no storage or CLI dependencies.
// The infra layer persists them, the cli layer renders them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content_filter;

/// Why a message was flagged.
///
/// The contact-info tags are layered: a phone number yields both
/// `PhoneNumberExchange` and `ContactInfoSharing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationReason {
    Profanity,
    PotentialThreat,
    PotentiallyInappropriate,
    PotentialBullying,
    PhoneNumberExchange,
    EmailSharing,
    SocialMediaHandle,
    ContactInfoSharing,
}

impl ModerationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationReason::Profanity => "profanity",
            ModerationReason::PotentialThreat => "potential_threat",
            ModerationReason::PotentiallyInappropriate => "potentially_inappropriate",
            ModerationReason::PotentialBullying => "potential_bullying",
            ModerationReason::PhoneNumberExchange => "phone_number_exchange",
            ModerationReason::EmailSharing => "email_sharing",
            ModerationReason::SocialMediaHandle => "social_media_handle",
            ModerationReason::ContactInfoSharing => "contact_info_sharing",
        }
    }

    /// Explanation shown to reviewers next to the tag.
    pub fn description(&self) -> &'static str {
        match self {
            ModerationReason::Profanity => "Message contains profane language",
            ModerationReason::PotentialThreat => "Message contains threatening language",
            ModerationReason::PotentiallyInappropriate => {
                "Message contains romantic or inappropriate language"
            }
            ModerationReason::PotentialBullying => "Message contains insulting language",
            ModerationReason::PhoneNumberExchange => "Message shares a phone number",
            ModerationReason::EmailSharing => "Message shares an email address",
            ModerationReason::SocialMediaHandle => "Message shares a social media handle",
            ModerationReason::ContactInfoSharing => {
                "Message moves contact off the platform"
            }
        }
    }
}

impl std::fmt::Display for ModerationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Four independent score axes, each in [0, 1].
///
/// Axes are never averaged. Every rule that fires raises its axis to at
/// least its own value, so an axis only ever goes up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModerationScore {
    pub toxicity: f64,
    pub profanity: f64,
    pub threat: f64,
    pub inappropriate: f64,
}

impl ModerationScore {
    pub fn raise_toxicity(&mut self, value: f64) {
        raise(&mut self.toxicity, value);
    }

    pub fn raise_profanity(&mut self, value: f64) {
        raise(&mut self.profanity, value);
    }

    pub fn raise_threat(&mut self, value: f64) {
        raise(&mut self.threat, value);
    }

    pub fn raise_inappropriate(&mut self, value: f64) {
        raise(&mut self.inappropriate, value);
    }

    /// Highest value across all four axes.
    pub fn max_axis(&self) -> f64 {
        self.toxicity
            .max(self.profanity)
            .max(self.threat)
            .max(self.inappropriate)
    }
}

fn raise(slot: &mut f64, value: f64) {
    if value > *slot {
        *slot = value;
    }
}

/// Verdict for a single piece of message content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModerationResult {
    pub flagged: bool,
    /// Triggered tags in rule-evaluation order, no duplicates.
    pub reasons: Vec<ModerationReason>,
    pub score: ModerationScore,
}

impl ModerationResult {
    pub fn has(&self, reason: ModerationReason) -> bool {
        self.reasons.contains(&reason)
    }

    pub fn severity(&self) -> Severity {
        content_filter::severity(&self.score)
    }
}

/// Triage priority derived from a score. Ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Review state of a moderation alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Open,
    Reviewed,
    Dismissed,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Open => "open",
            AlertStatus::Reviewed => "reviewed",
            AlertStatus::Dismissed => "dismissed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(AlertStatus::Open),
            "reviewed" => Some(AlertStatus::Reviewed),
            "dismissed" => Some(AlertStatus::Dismissed),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// What a human reviewer can decide about an open alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    /// The alert was looked at and acted upon.
    Reviewed,
    /// The alert was a false positive.
    Dismissed,
}

impl From<ReviewDecision> for AlertStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Reviewed => AlertStatus::Reviewed,
            ReviewDecision::Dismissed => AlertStatus::Dismissed,
        }
    }
}

/// A message on its way through the send pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub message_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
}

/// Insert payload for a new alert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub message_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub reasons: Vec<ModerationReason>,
    pub score: ModerationScore,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl NewAlert {
    pub fn from_screening(message: &OutgoingMessage, result: &ModerationResult) -> Self {
        Self {
            message_id: message.message_id.clone(),
            sender_id: message.sender_id.clone(),
            recipient_id: message.recipient_id.clone(),
            content: message.content.clone(),
            reasons: result.reasons.clone(),
            score: result.score,
            severity: result.severity(),
            created_at: Utc::now(),
        }
    }
}

/// A persisted moderation alert awaiting (or past) human review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationAlert {
    pub id: i64,
    pub message_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub reasons: Vec<ModerationReason>,
    pub score: ModerationScore,
    pub severity: Severity,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_note: Option<String>,
}

impl ModerationAlert {
    /// Build the stored form of a freshly inserted alert.
    pub fn from_new(id: i64, alert: NewAlert) -> Self {
        Self {
            id,
            message_id: alert.message_id,
            sender_id: alert.sender_id,
            recipient_id: alert.recipient_id,
            content: alert.content,
            reasons: alert.reasons,
            score: alert.score,
            severity: alert.severity,
            status: AlertStatus::Open,
            created_at: alert.created_at,
            reviewed_by: None,
            reviewed_at: None,
            review_note: None,
        }
    }

    /// Severity derived again from the stored score. Always equals `severity`.
    pub fn recomputed_severity(&self) -> Severity {
        content_filter::severity(&self.score)
    }

    pub fn is_open(&self) -> bool {
        self.status == AlertStatus::Open
    }
}

/// A reviewer's status transition for one alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertReview {
    pub status: AlertStatus,
    pub reviewer: String,
    pub note: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

/// Outcome of running one message through the write path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageScreening {
    pub message_id: String,
    pub flagged: bool,
    pub reasons: Vec<ModerationReason>,
    pub score: ModerationScore,
    pub severity: Severity,
    /// Alert backing this message, if one was created or already existed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<i64>,
}

/// Configuration for the moderation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Whether flagged messages produce alert records. Classification always runs.
    pub alerts_enabled: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            alerts_enabled: true,
        }
    }
}
