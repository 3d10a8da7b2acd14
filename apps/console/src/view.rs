//! Terminal projection of the dashboard and notices.

use std::fmt::Write as _;

use client_core::{
    render::{CONNECTION_FAILED_TEXT, EMPTY_TEXT},
    Dashboard, FeedbackKind, Notice,
};

/// Drops control characters so entry text cannot drive the terminal.
fn terminal_safe(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect()
}

pub fn format_dashboard(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "== entries: {} | cache: {} @ {} | health: {} ==",
        dashboard.total_entries, dashboard.cache_label, dashboard.cache_fetched_at, dashboard.health
    );
    let details = dashboard.details();
    if !details.is_empty() {
        let line: Vec<String> = details
            .into_iter()
            .map(|(label, value)| format!("{label}: {}", terminal_safe(&value)))
            .collect();
        let _ = writeln!(out, "   {}", line.join(" | "));
    }

    if dashboard.unreachable {
        let _ = writeln!(out, "{CONNECTION_FAILED_TEXT}");
        return out;
    }
    if dashboard.view.entries.is_empty() {
        let _ = writeln!(out, "{EMPTY_TEXT}");
        return out;
    }
    for entry in &dashboard.view.entries {
        let _ = writeln!(
            out,
            "#{:<5} {}  {}: {}",
            entry.id,
            entry.created_at,
            terminal_safe(&entry.name),
            terminal_safe(&entry.message)
        );
    }
    out
}

fn feedback_tag(kind: FeedbackKind) -> &'static str {
    match kind {
        FeedbackKind::Success => "[ok]",
        FeedbackKind::Update => "[updated]",
        FeedbackKind::Delete => "[purged]",
        FeedbackKind::Error => "[error]",
    }
}

pub fn format_notice(notice: &Notice) -> String {
    let text = match notice {
        Notice::Created => "Entry saved.".to_string(),
        Notice::Updated { id } => format!("Entry {id} updated."),
        Notice::Deleted { id } => format!("Entry {id} purged."),
        other => other.text().unwrap_or_default().to_string(),
    };
    let tag = feedback_tag(notice.feedback());
    if notice.is_blocking() {
        format!("{tag} {text} (fix the input and try again)")
    } else {
        format!("{tag} {text}")
    }
}
