// Command execution - translates CLI commands into moderation service calls.
//
// Output goes to the injected writer: JSON for pipeline commands, plain text
// for the review commands.

use super::formatter::{format_alert_details, format_alert_list};
use super::Commands;
use crate::core::moderation::{
    classify, AlertStore, ModerationError, ModerationResult, ModerationService,
    OutgoingMessage, ReviewDecision, Severity,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{BufRead, Read, Write};

/// JSON shape printed by `check`.
#[derive(Debug, Serialize)]
struct CheckReport {
    #[serde(flatten)]
    result: ModerationResult,
    severity: Severity,
}

/// Classify text from the arguments, or from all of `input` when none were given.
pub fn check<R: BufRead, W: Write>(text: &[String], mut input: R, out: &mut W) -> Result<()> {
    let content = if text.is_empty() {
        let mut buf = String::new();
        input
            .read_to_string(&mut buf)
            .context("Failed to read message text from stdin")?;
        buf
    } else {
        text.join(" ")
    };

    let result = classify(&content);
    let report = CheckReport {
        severity: result.severity(),
        result,
    };

    writeln!(out, "{}", serde_json::to_string(&report)?)?;
    Ok(())
}

/// Screen JSON-lines messages. Lines that are not UTF-8 or not valid JSON
/// are skipped with a warning.
pub async fn scan<S: AlertStore, R: BufRead, W: Write>(
    service: &ModerationService<S>,
    input: R,
    out: &mut W,
) -> Result<()> {
    let mut total = 0usize;
    let mut flagged = 0usize;
    let mut skipped = 0usize;

    for (index, raw) in input.split(b'\n').enumerate() {
        let raw = raw.context("Failed to read from stdin")?;
        let line = match String::from_utf8(raw) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(line = index + 1, "Skipping line that is not UTF-8: {}", e);
                skipped += 1;
                continue;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message: OutgoingMessage = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(line = index + 1, "Skipping malformed message: {}", e);
                skipped += 1;
                continue;
            }
        };

        let screening = service.screen_message(&message).await?;
        total += 1;
        if screening.flagged {
            flagged += 1;
        }

        writeln!(out, "{}", serde_json::to_string(&screening)?)?;
    }

    tracing::info!(total, flagged, skipped, "Scan complete");
    Ok(())
}

/// Run a parsed command against the moderation service.
pub async fn run<S: AlertStore, R: BufRead, W: Write>(
    command: Commands,
    service: &ModerationService<S>,
    input: R,
    out: &mut W,
) -> Result<()> {
    match command {
        Commands::Check { text } => check(&text, input, out),

        Commands::Send {
            message_id,
            sender,
            recipient,
            text,
        } => {
            let message = OutgoingMessage {
                message_id,
                sender_id: sender,
                recipient_id: recipient,
                content: text.join(" "),
            };
            let screening = service.screen_message(&message).await?;
            writeln!(out, "{}", serde_json::to_string(&screening)?)?;
            Ok(())
        }

        Commands::Scan => scan(service, input, out).await,

        Commands::Alerts { status, limit } => {
            let alerts = service.list_alerts(status.map(Into::into), limit).await?;
            write!(out, "{}", format_alert_list(&alerts))?;
            Ok(())
        }

        Commands::Show { id } => {
            let alert = service
                .get_alert(id)
                .await?
                .ok_or(ModerationError::AlertNotFound(id))?;
            write!(out, "{}", format_alert_details(&alert))?;
            Ok(())
        }

        Commands::Review {
            id,
            reviewer,
            dismiss,
            note,
        } => {
            let decision = if dismiss {
                ReviewDecision::Dismissed
            } else {
                ReviewDecision::Reviewed
            };
            let alert = service.review_alert(id, decision, &reviewer, note).await?;
            write!(out, "{}", format_alert_details(&alert))?;
            Ok(())
        }
    }
}
