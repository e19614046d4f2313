use crate::core::moderation::{ModerationAlert, Severity};
use std::fmt::Write;

const EXCERPT_CHARS: usize = 60;

fn severity_badge(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "🚨 CRITICAL",
        Severity::High => "🔴 HIGH",
        Severity::Medium => "🟠 MEDIUM",
        Severity::Low => "🟢 LOW",
    }
}

/// Shorten content to a single line for listings.
fn excerpt(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        flat
    } else {
        let mut short: String = flat.chars().take(EXCERPT_CHARS).collect();
        short.push_str("...");
        short
    }
}

pub fn format_alert_line(alert: &ModerationAlert) -> String {
    let reasons: Vec<&str> = alert.reasons.iter().map(|r| r.as_str()).collect();
    format!(
        "#{:<5} {:<12} {:<10} {}  [{}] \"{}\"",
        alert.id,
        severity_badge(alert.severity),
        alert.status,
        alert.created_at.format("%Y-%m-%d %H:%M"),
        reasons.join(", "),
        excerpt(&alert.content)
    )
}

pub fn format_alert_list(alerts: &[ModerationAlert]) -> String {
    if alerts.is_empty() {
        return "No moderation alerts found.\n".to_string();
    }

    let mut out = String::new();
    for alert in alerts {
        out.push_str(&format_alert_line(alert));
        out.push('\n');
    }
    let _ = writeln!(out, "{} alert(s)", alerts.len());
    out
}

pub fn format_alert_details(alert: &ModerationAlert) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Moderation alert #{}", alert.id);
    let _ = writeln!(out, "  Severity:   {}", severity_badge(alert.severity));
    let _ = writeln!(out, "  Status:     {}", alert.status);
    let _ = writeln!(out, "  Message:    {}", alert.message_id);
    let _ = writeln!(
        out,
        "  From -> To: {} -> {}",
        alert.sender_id, alert.recipient_id
    );
    let _ = writeln!(out, "  Created:    {}", alert.created_at.to_rfc3339());
    let _ = writeln!(out, "  Content:    {}", alert.content);

    let _ = writeln!(out, "  Reasons:");
    for reason in &alert.reasons {
        let _ = writeln!(out, "    - {} ({})", reason, reason.description());
    }

    let score = &alert.score;
    let _ = writeln!(
        out,
        "  Score:      toxicity {:.1} | profanity {:.1} | threat {:.1} | inappropriate {:.1}",
        score.toxicity, score.profanity, score.threat, score.inappropriate
    );

    if let Some(reviewer) = &alert.reviewed_by {
        let reviewed_at = alert
            .reviewed_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "unknown time".to_string());
        let _ = writeln!(out, "  Reviewed:   by {} at {}", reviewer, reviewed_at);
    }
    if let Some(note) = &alert.review_note {
        let _ = writeln!(out, "  Note:       {}", note);
    }

    out
}
