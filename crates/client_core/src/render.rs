//! Projection of store state into display markup.
//!
//! All user-supplied text passes through [`escape_markup`] before it is
//! embedded. Rendered entries keep the raw name and message next to the
//! markup so the edit affordance never has to read text back out of it.

use chrono::{DateTime, Local, Utc};
use shared::domain::{Entry, EntryDraft, EntryId, HealthStatus};

use crate::store::{ListState, StoreSnapshot};

pub const EMPTY_PLACEHOLDER: &str =
    r#"<div class="entry">System log empty. Initialize sequence...</div>"#;
pub const CONNECTION_FAILED: &str =
    r#"<div class="error">Connection Failed. Backend Service Unreachable.</div>"#;
pub const STATS_PLACEHOLDER: &str = "-";
pub const EMPTY_TEXT: &str = "System log empty. Initialize sequence...";
pub const CONNECTION_FAILED_TEXT: &str = "Connection Failed. Backend Service Unreachable.";

pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Inverse of [`escape_markup`] for the entities it produces.
pub fn unescape_markup(text: &str) -> String {
    const ENTITIES: [(&str, char); 5] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&#39;", '\''),
    ];

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match ENTITIES
            .iter()
            .find(|(entity, _)| rest.starts_with(entity))
        {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn display_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%m/%d/%Y %H:%M:%S")
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEntry {
    pub id: EntryId,
    pub name: String,
    pub message: String,
    pub created_at: String,
}

impl RenderedEntry {
    /// Values reported by the edit affordance.
    pub fn edit_prefill(&self) -> EntryDraft {
        EntryDraft::new(self.name.clone(), self.message.clone())
    }

    fn markup(&self) -> String {
        format!(
            concat!(
                r#"<div class="entry" data-id="{id}">"#,
                r#"<div class="entry-header"><div>"#,
                r#"<span class="entry-name">{name}</span>"#,
                r#"<span class="entry-date">{date}</span>"#,
                r#"</div><div class="entry-actions">"#,
                r#"<button class="entry-btn edit-btn" data-id="{id}">Edit</button>"#,
                r#"<button class="entry-btn delete-btn" data-id="{id}">Purge</button>"#,
                r#"</div></div>"#,
                r#"<div class="entry-message">{message}</div>"#,
                r#"</div>"#
            ),
            id = self.id,
            name = escape_markup(&self.name),
            date = escape_markup(&self.created_at),
            message = escape_markup(&self.message),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    pub markup: String,
    pub entries: Vec<RenderedEntry>,
}

impl RenderedView {
    pub fn find(&self, id: EntryId) -> Option<&RenderedEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }
}

pub fn render(entries: &[Entry]) -> RenderedView {
    if entries.is_empty() {
        return RenderedView {
            markup: EMPTY_PLACEHOLDER.to_string(),
            entries: Vec::new(),
        };
    }

    let entries: Vec<RenderedEntry> = entries
        .iter()
        .map(|entry| RenderedEntry {
            id: entry.id,
            name: entry.name.clone(),
            message: entry.message.clone(),
            created_at: display_time(entry.created_at),
        })
        .collect();
    let markup = entries.iter().map(RenderedEntry::markup).collect();
    RenderedView { markup, entries }
}

pub fn health_glyph(health: Option<HealthStatus>) -> &'static str {
    match health {
        Some(HealthStatus::Healthy) => "✓",
        Some(HealthStatus::Degraded) => "⚠",
        Some(HealthStatus::Unhealthy) => "✖",
        None => STATS_PLACEHOLDER,
    }
}

/// Status panels plus the entry list, as shown on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub view: RenderedView,
    pub unreachable: bool,
    pub total_entries: String,
    pub cache_label: &'static str,
    pub cache_fetched_at: String,
    pub health: &'static str,
    /// Optional panel details; each is shown only when the server sent it.
    pub total_created: Option<String>,
    pub cache_available: Option<bool>,
    pub database: Option<String>,
    pub redis: Option<String>,
    pub health_time: Option<String>,
}

impl Dashboard {
    /// Markup for the list panel, swapped for the failure panel when the
    /// last refresh could not reach the server.
    pub fn list_markup(&self) -> &str {
        if self.unreachable {
            CONNECTION_FAILED
        } else {
            &self.view.markup
        }
    }

    /// Label/value pairs for the optional details that are present.
    pub fn details(&self) -> Vec<(&'static str, String)> {
        let mut details = Vec::new();
        if let Some(created) = &self.total_created {
            details.push(("created", created.clone()));
        }
        if let Some(available) = self.cache_available {
            let value = if available { "available" } else { "unavailable" };
            details.push(("cache backend", value.to_string()));
        }
        if let Some(database) = &self.database {
            details.push(("database", database.clone()));
        }
        if let Some(redis) = &self.redis {
            details.push(("redis", redis.clone()));
        }
        if let Some(time) = &self.health_time {
            details.push(("checked", time.clone()));
        }
        details
    }
}

/// Status panels and list as one markup fragment.
pub fn dashboard_markup(dashboard: &Dashboard) -> String {
    let details: String = dashboard
        .details()
        .into_iter()
        .map(|(label, value)| {
            format!(
                r#"<span class="stat-detail" data-label="{label}">{value}</span>"#,
                value = escape_markup(&value),
            )
        })
        .collect();
    format!(
        concat!(
            r#"<div class="stats">"#,
            r#"<span id="totalEntries">{total}</span>"#,
            r#"<span id="cacheStatus">{cache}</span>"#,
            r#"<span id="cacheTimestamp">{fetched_at}</span>"#,
            r#"<span id="healthStatus">{health}</span>"#,
            "{details}",
            r#"</div><div id="entriesList">{list}</div>"#
        ),
        total = escape_markup(&dashboard.total_entries),
        cache = escape_markup(dashboard.cache_label),
        fetched_at = escape_markup(&dashboard.cache_fetched_at),
        health = dashboard.health,
        details = details,
        list = dashboard.list_markup(),
    )
}

pub fn render_dashboard(snapshot: &StoreSnapshot) -> Dashboard {
    let stats = snapshot.stats.as_ref();
    let health = snapshot.health_detail.as_ref();
    Dashboard {
        view: render(&snapshot.entries),
        unreachable: snapshot.list_state == ListState::Unreachable,
        total_entries: stats
            .map(|stats| stats.total_entries().to_string())
            .unwrap_or_else(|| STATS_PLACEHOLDER.to_string()),
        cache_label: snapshot.cache.label(),
        cache_fetched_at: snapshot
            .cache
            .fetched_at_label()
            .unwrap_or_else(|| STATS_PLACEHOLDER.to_string()),
        health: health_glyph(snapshot.health),
        total_created: stats.and_then(|stats| stats.total_entries_created.clone()),
        cache_available: stats.and_then(|stats| stats.cache_available),
        database: health.and_then(|health| health.database.clone()),
        redis: health.and_then(|health| health.redis.clone()),
        health_time: health.and_then(|health| health.time.clone()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use shared::protocol::{HealthResponse, StatsResponse};

    use super::*;

    fn stats(total: i64) -> Option<StatsResponse> {
        Some(StatsResponse {
            total_entries_db: Some(total),
            ..StatsResponse::default()
        })
    }

    fn entry(id: i64, name: &str, message: &str) -> Entry {
        Entry {
            id: EntryId(id),
            name: name.to_string(),
            message: message.to_string(),
            created_at: Utc
                .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    #[test]
    fn empty_list_renders_placeholder_only() {
        let view = render(&[]);
        assert_eq!(view.markup, EMPTY_PLACEHOLDER);
        assert!(view.entries.is_empty());
    }

    #[test]
    fn user_text_is_escaped_in_markup() {
        let view = render(&[entry(1, "<b>x</b>", "a & <script>alert('x')</script>")]);
        assert!(!view.markup.contains("<b>x</b>"));
        assert!(!view.markup.contains("<script>"));
        assert!(view.markup.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(view.markup.contains("a &amp; &lt;script&gt;alert(&#39;x&#39;)"));
        assert!(view.markup.contains(r#"data-id="1""#));
    }

    #[test]
    fn edit_prefill_reports_raw_values() {
        let view = render(&[entry(7, "<b>x</b>", "fish & chips")]);
        let rendered = view.find(EntryId(7)).expect("rendered");
        assert_eq!(
            rendered.edit_prefill(),
            EntryDraft::new("<b>x</b>", "fish & chips")
        );
        assert!(view.find(EntryId(8)).is_none());
    }

    #[test]
    fn escaping_is_losslessly_reversible() {
        for sample in [
            "<b>x</b>",
            "Tom & Jerry",
            r#"say "hi" it's"#,
            "&amp; already",
            "plain",
            "",
            "& trailing &",
        ] {
            let escaped = escape_markup(sample);
            assert_eq!(unescape_markup(&escaped), sample);
            assert_eq!(escape_markup(&unescape_markup(&escaped)), escaped);
        }
    }

    #[test]
    fn unescape_leaves_unknown_entities_alone() {
        assert_eq!(unescape_markup("&nbsp;&lt;"), "&nbsp;<");
    }

    #[test]
    fn dashboard_uses_placeholders_before_first_fetch() {
        let dashboard = render_dashboard(&StoreSnapshot::default());
        assert_eq!(dashboard.list_markup(), EMPTY_PLACEHOLDER);
        assert_eq!(dashboard.total_entries, "-");
        assert_eq!(dashboard.cache_label, "N/A");
        assert_eq!(dashboard.health, "-");
        assert!(dashboard.details().is_empty());
    }

    #[test]
    fn unreachable_list_swaps_in_failure_panel() {
        let snapshot = StoreSnapshot {
            entries: vec![entry(1, "ada", "hi")],
            list_state: ListState::Unreachable,
            stats: stats(3),
            health: Some(HealthStatus::Degraded),
            ..StoreSnapshot::default()
        };
        let dashboard = render_dashboard(&snapshot);
        assert_eq!(dashboard.list_markup(), CONNECTION_FAILED);
        assert_eq!(dashboard.view.entries.len(), 1);
        assert_eq!(dashboard.total_entries, "3");
        assert_eq!(dashboard.health, "⚠");
    }

    #[test]
    fn dashboard_markup_embeds_panels_and_list() {
        let snapshot = StoreSnapshot {
            entries: vec![entry(1, "<i>ada</i>", "hi")],
            list_state: ListState::Loaded,
            stats: stats(1),
            health: Some(HealthStatus::Healthy),
            ..StoreSnapshot::default()
        };
        let markup = dashboard_markup(&render_dashboard(&snapshot));
        assert!(markup.contains(r#"<span id="totalEntries">1</span>"#));
        assert!(markup.contains(r#"<span id="healthStatus">✓</span>"#));
        assert!(markup.contains("&lt;i&gt;ada&lt;/i&gt;"));
        assert!(!markup.contains("<i>ada</i>"));
    }

    #[test]
    fn optional_stats_and_health_details_are_shown_when_present() {
        let snapshot = StoreSnapshot {
            stats: Some(StatsResponse {
                total_entries_db: Some(4),
                total_entries_created: Some("9".to_string()),
                cache_available: Some(false),
            }),
            health: Some(HealthStatus::Degraded),
            health_detail: Some(HealthResponse {
                status: "degraded".to_string(),
                database: Some("healthy".to_string()),
                redis: Some("<down>".to_string()),
                time: None,
            }),
            ..StoreSnapshot::default()
        };
        let dashboard = render_dashboard(&snapshot);
        assert_eq!(
            dashboard.details(),
            vec![
                ("created", "9".to_string()),
                ("cache backend", "unavailable".to_string()),
                ("database", "healthy".to_string()),
                ("redis", "<down>".to_string()),
            ]
        );

        let markup = dashboard_markup(&dashboard);
        assert!(markup.contains(r#"<span class="stat-detail" data-label="created">9</span>"#));
        assert!(markup.contains(r#"data-label="redis">&lt;down&gt;</span>"#));
        assert!(!markup.contains(r#"data-label="checked""#));
    }

    #[test]
    fn health_glyphs_cover_all_states() {
        assert_eq!(health_glyph(Some(HealthStatus::Healthy)), "✓");
        assert_eq!(health_glyph(Some(HealthStatus::Unhealthy)), "✖");
    }
}
