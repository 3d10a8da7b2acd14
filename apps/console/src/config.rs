use std::{fs, path::Path, time::Duration};

use client_core::{ControllerOptions, RefreshOrdering};
use serde::Deserialize;
use shared::domain::SortOrder;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "logbook.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub poll_interval_secs: u64,
    pub sort_order: SortOrder,
    pub strict_refresh_ordering: bool,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            poll_interval_secs: 30,
            sort_order: SortOrder::Descending,
            strict_refresh_ordering: false,
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            sort_order: self.sort_order,
            ordering: if self.strict_refresh_ordering {
                RefreshOrdering::LatestIssuedWins
            } else {
                RefreshOrdering::LastResolvedWins
            },
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    poll_interval_secs: Option<u64>,
    sort_order: Option<String>,
    strict_refresh_ordering: Option<bool>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then the config file (if present), then environment overrides.
pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub(crate) fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(cfg) => cfg,
        Err(err) => {
            warn!(error = %err, "ignoring unreadable config file");
            return;
        }
    };

    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.poll_interval_secs {
        settings.poll_interval_secs = v;
    }
    if let Some(v) = file_cfg.sort_order.and_then(|v| v.parse().ok()) {
        settings.sort_order = v;
    }
    if let Some(v) = file_cfg.strict_refresh_ordering {
        settings.strict_refresh_ordering = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
}

pub(crate) fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("LOGBOOK_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = var("APP__POLL_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
        settings.poll_interval_secs = v;
    }

    if let Some(v) = var("APP__SORT_ORDER").and_then(|v| v.parse().ok()) {
        settings.sort_order = v;
    }

    if let Some(v) = var("APP__STRICT_REFRESH_ORDERING").and_then(|v| parse_flag(&v)) {
        settings.strict_refresh_ordering = v;
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        settings.request_timeout_secs = Some(v);
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
