// Content safety classifier - keyword and pattern rules for message text.
//
// Every rule is independent. Keyword rules run on lowercased text, pattern
// rules run on the original text so digit and symbol structure is intact.
// Matching is plain substring matching and deliberately over-flags
// ("passing" contains "ass", "destroyed" contains "destroy").
//
// NO storage here - `classify` is pure and safe to call from any thread.

use super::moderation_models::{ModerationReason, ModerationResult, ModerationScore, Severity};
use lazy_static::lazy_static;
use regex::Regex;

const PROFANITY_WORDS: &[&str] = &["fuck", "shit", "bitch", "damn", "ass", "bastard"];

const THREAT_WORDS: &[&str] = &[
    "kill", "hurt", "harm", "attack", "destroy", "murder", "weapon",
];

const INAPPROPRIATE_WORDS: &[&str] = &[
    "sexy",
    "hot",
    "beautiful",
    "attractive",
    "date",
    "relationship",
    "love you",
];

const BULLYING_WORDS: &[&str] = &[
    "stupid", "worthless", "loser", "idiot", "useless", "hate you",
];

const PROFANITY_SCORE: f64 = 0.8;
const THREAT_SCORE: f64 = 0.9;
const INAPPROPRIATE_SCORE: f64 = 0.7;
const BULLYING_SCORE: f64 = 0.8;
const PHONE_SCORE: f64 = 0.9;
const EMAIL_SCORE: f64 = 0.7;
const SOCIAL_HANDLE_SCORE: f64 = 0.6;

// Digit and handle classes are ASCII-only. Digits and letters from other
// scripts never make a phone number or a handle.
lazy_static! {
    // Phone patterns, checked in order
    static ref PHONE_PATTERNS: Vec<Regex> = vec![
        // 555-123-4567 / 555.123.4567
        Regex::new(r"\b[0-9]{3}[-.][0-9]{3}[-.][0-9]{4}\b").unwrap(),
        // (555) 123-4567
        Regex::new(r"\([0-9]{3}\)\s*[0-9]{3}[-.\s]?[0-9]{4}").unwrap(),
        // 5551234567
        Regex::new(r"\b[0-9]{10}\b").unwrap(),
        // 555 123 4567
        Regex::new(r"\b[0-9]{3} [0-9]{3} [0-9]{4}\b").unwrap(),
        // +1-555-123-4567, +44 20 7946 0958
        Regex::new(r"\+[0-9]{1,3}[-.\s]?[0-9]{1,4}[-.\s]?[0-9]{1,4}[-.\s]?[0-9]{1,9}").unwrap(),
    ];

    static ref EMAIL_REGEX: Regex = Regex::new(
        r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"
    ).unwrap();

    static ref SOCIAL_HANDLE_REGEX: Regex = Regex::new(r"@[A-Za-z0-9_]+").unwrap();
}

fn contains_any(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|word| haystack.contains(word))
}

fn has_phone_number(content: &str) -> bool {
    PHONE_PATTERNS.iter().any(|re| re.is_match(content))
}

/// Classify message content.
///
/// Total over all inputs, including the empty string. `flagged` is true
/// exactly when at least one reason fired.
pub fn classify(content: &str) -> ModerationResult {
    let lowered = content.to_lowercase();
    let mut reasons = Vec::new();
    let mut score = ModerationScore::default();

    if contains_any(&lowered, PROFANITY_WORDS) {
        reasons.push(ModerationReason::Profanity);
        score.raise_profanity(PROFANITY_SCORE);
    }

    if contains_any(&lowered, THREAT_WORDS) {
        reasons.push(ModerationReason::PotentialThreat);
        score.raise_threat(THREAT_SCORE);
    }

    if contains_any(&lowered, INAPPROPRIATE_WORDS) {
        reasons.push(ModerationReason::PotentiallyInappropriate);
        score.raise_inappropriate(INAPPROPRIATE_SCORE);
    }

    if contains_any(&lowered, BULLYING_WORDS) {
        reasons.push(ModerationReason::PotentialBullying);
        score.raise_toxicity(BULLYING_SCORE);
    }

    let mut shares_contact_info = false;

    // Phone sharing counts as at least as severe as an explicit threat
    if has_phone_number(content) {
        reasons.push(ModerationReason::PhoneNumberExchange);
        score.raise_threat(PHONE_SCORE);
        shares_contact_info = true;
    }

    if EMAIL_REGEX.is_match(content) {
        reasons.push(ModerationReason::EmailSharing);
        score.raise_inappropriate(EMAIL_SCORE);
        shares_contact_info = true;
    }

    if SOCIAL_HANDLE_REGEX.is_match(content) {
        reasons.push(ModerationReason::SocialMediaHandle);
        score.raise_inappropriate(SOCIAL_HANDLE_SCORE);
        shares_contact_info = true;
    }

    if shares_contact_info {
        reasons.push(ModerationReason::ContactInfoSharing);
    }

    ModerationResult {
        flagged: !reasons.is_empty(),
        reasons,
        score,
    }
}

/// Derive a triage severity from a score. First matching tier wins.
pub fn severity(score: &ModerationScore) -> Severity {
    let max = score.max_axis();

    // Both threat clauses are kept; the second only matters for threat
    // values strictly between 0.7 and 0.9.
    if score.threat >= 0.9 || score.threat > 0.7 {
        Severity::Critical
    } else if max > 0.8 {
        Severity::High
    } else if max > 0.5 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ModerationReason::*;

    #[test]
    fn test_empty_message_is_clean() {
        let result = classify("");
        assert!(!result.flagged);
        assert!(result.reasons.is_empty());
        assert_eq!(result.score, ModerationScore::default());
        assert_eq!(severity(&result.score), Severity::Low);
    }

    #[test]
    fn test_clean_messages_not_flagged() {
        let messages = [
            "Great job at practice today!",
            "See you on Saturday for drills.",
            "Remember to stretch before the game",
            "The final score was 21-14",
            "Nice work on your footwork this week",
            "Bring water and your cleats",
        ];

        for message in messages {
            let result = classify(message);
            assert!(!result.flagged, "{:?} should not be flagged", message);
            assert!(result.reasons.is_empty());
        }
    }

    #[test]
    fn test_sports_score_is_not_a_phone_number() {
        let result = classify("21-14");
        assert!(!result.flagged);
    }

    #[test]
    fn test_keyword_matching_ignores_case() {
        let upper = classify("KILL");
        let lower = classify("kill");

        assert!(upper.flagged);
        assert_eq!(upper, lower);
        assert_eq!(upper.reasons, vec![PotentialThreat]);
        assert_eq!(upper.score.threat, 0.9);
    }

    #[test]
    fn test_profanity() {
        let result = classify("What the hell, that was shit");
        assert_eq!(result.reasons, vec![Profanity]);
        assert_eq!(result.score.profanity, 0.8);
        assert_eq!(result.severity(), Severity::Medium);
    }

    #[test]
    fn test_bullying_sets_toxicity() {
        let result = classify("You are such a loser");
        assert_eq!(result.reasons, vec![PotentialBullying]);
        assert_eq!(result.score.toxicity, 0.8);
        assert_eq!(result.score.threat, 0.0);
        assert_eq!(result.severity(), Severity::Medium);
    }

    #[test]
    fn test_inappropriate_language() {
        let result = classify("You look so attractive in your uniform");
        assert_eq!(result.reasons, vec![PotentiallyInappropriate]);
        assert_eq!(result.score.inappropriate, 0.7);
        assert_eq!(result.severity(), Severity::Medium);
    }

    #[test]
    fn test_phone_number_formats() {
        let messages = [
            "555-123-4567",
            "555.123.4567",
            "(555) 123-4567",
            "555 123 4567",
            "5551234567",
            "+1-555-123-4567",
        ];

        for message in messages {
            let result = classify(message);
            assert!(
                result.has(PhoneNumberExchange),
                "{:?} should be detected as a phone number",
                message
            );
            assert!(result.has(ContactInfoSharing));
            assert_eq!(result.score.threat, 0.9);
            assert_eq!(result.severity(), Severity::Critical, "{:?}", message);
        }
    }

    #[test]
    fn test_email_sharing() {
        let result = classify("Email me at coach@example.com");
        assert!(result.flagged);
        assert!(result.has(EmailSharing));
        assert!(result.has(ContactInfoSharing));
        assert_eq!(result.score.inappropriate, 0.7);
        assert_eq!(result.severity(), Severity::Medium);
    }

    #[test]
    fn test_social_media_handle() {
        let result = classify("Follow me @username");
        assert_eq!(result.reasons, vec![SocialMediaHandle, ContactInfoSharing]);
        assert_eq!(result.score.inappropriate, 0.6);
        assert_eq!(result.severity(), Severity::Medium);
    }

    #[test]
    fn test_combined_violations() {
        let result = classify("You stupid bitch, call me at 555-123-4567");

        for reason in [
            Profanity,
            PotentialBullying,
            PhoneNumberExchange,
            ContactInfoSharing,
        ] {
            assert!(result.has(reason), "missing {}", reason);
        }
        assert_eq!(result.severity(), Severity::Critical);
    }

    #[test]
    fn test_grooming_pattern_is_critical() {
        let result = classify("You're so beautiful, text me at 555-123-4567");
        assert!(result.has(PotentiallyInappropriate));
        assert!(result.has(PhoneNumberExchange));
        assert_eq!(result.severity(), Severity::Critical);
    }

    #[test]
    fn test_contact_tag_added_once() {
        let result = classify("Call 555-123-4567 or mail coach@example.com, I'm @coachbob");
        let count = result
            .reasons
            .iter()
            .filter(|r| **r == ContactInfoSharing)
            .count();
        assert_eq!(count, 1);
        assert_eq!(result.reasons.last(), Some(&ContactInfoSharing));
    }

    #[test]
    fn test_known_false_positives_are_flagged() {
        // Over-flagging is accepted: better to flag than to miss a real threat
        let result = classify("We destroyed the competition today!");
        assert!(result.flagged);
        assert!(result.has(PotentialThreat));

        let result = classify("Work on your passing drills");
        assert!(result.has(Profanity));
    }

    #[test]
    fn test_very_long_message() {
        let content = "practice ".repeat(50_000);
        let result = classify(&content);
        assert!(!result.flagged);
    }

    #[test]
    fn test_severity_ladder() {
        let score = |toxicity, profanity, threat, inappropriate| ModerationScore {
            toxicity,
            profanity,
            threat,
            inappropriate,
        };

        assert_eq!(severity(&score(0.0, 0.0, 0.9, 0.0)), Severity::Critical);
        // Second critical clause
        assert_eq!(severity(&score(0.0, 0.0, 0.75, 0.0)), Severity::Critical);
        assert_eq!(severity(&score(0.0, 0.0, 0.7, 0.0)), Severity::Medium);
        assert_eq!(severity(&score(0.85, 0.0, 0.0, 0.0)), Severity::High);
        assert_eq!(severity(&score(0.0, 0.8, 0.0, 0.0)), Severity::Medium);
        assert_eq!(severity(&score(0.0, 0.0, 0.0, 0.5)), Severity::Low);
        assert_eq!(severity(&ModerationScore::default()), Severity::Low);
    }

    #[test]
    fn test_severity_survives_stored_score() {
        for message in [
            "",
            "Follow me @username",
            "You stupid bitch, call me at 555-123-4567",
            "You are useless",
        ] {
            let result = classify(message);
            let stored = serde_json::to_string(&result.score).unwrap();
            let restored: ModerationScore = serde_json::from_str(&stored).unwrap();

            assert_eq!(restored, result.score);
            assert_eq!(severity(&restored), result.severity(), "{:?}", message);
        }
    }

    #[test]
    fn test_non_ascii_digits_and_letters_ignored() {
        // Arabic-Indic digits
        assert!(!classify("٥٥٥١٢٣٤٥٦٧").flagged);
        assert!(!classify("Great run @ñandú").flagged);

        let result = classify("café 555-123-4567");
        assert!(result.has(PhoneNumberExchange));
        let result = classify("follow @fast_runner9");
        assert!(result.has(SocialMediaHandle));
    }
}
