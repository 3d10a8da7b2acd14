use super::*;

use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_poll_every_thirty_seconds_newest_first() {
    let settings = Settings::default();
    let options = settings.controller_options();
    assert_eq!(options.poll_interval, Duration::from_secs(30));
    assert_eq!(options.sort_order, SortOrder::Descending);
    assert_eq!(options.ordering, RefreshOrdering::LastResolvedWins);
    assert_eq!(settings.request_timeout(), None);
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
server_url = "http://logs.internal:9000"
poll_interval_secs = 5
sort_order = "asc"
strict_refresh_ordering = true
request_timeout_secs = 10
"#,
    );

    assert_eq!(settings.server_url, "http://logs.internal:9000");
    assert_eq!(settings.poll_interval_secs, 5);
    assert_eq!(settings.sort_order, SortOrder::Ascending);
    assert_eq!(
        settings.controller_options().ordering,
        RefreshOrdering::LatestIssuedWins
    );
    assert_eq!(settings.request_timeout(), Some(Duration::from_secs(10)));
}

#[test]
fn malformed_file_is_ignored() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "server_url = [not toml");
    assert_eq!(settings, Settings::default());
}

#[test]
fn env_overrides_file_and_skips_unparseable_values() {
    let mut settings = Settings::default();
    apply_file(&mut settings, r#"server_url = "http://from-file:1""#);
    apply_env(
        &mut settings,
        env(&[
            ("LOGBOOK_SERVER_URL", "http://legacy:2"),
            ("APP__SERVER_URL", "http://from-env:3"),
            ("APP__POLL_INTERVAL_SECS", "soon"),
            ("APP__SORT_ORDER", "asc"),
            ("APP__STRICT_REFRESH_ORDERING", "yes"),
        ]),
    );

    assert_eq!(settings.server_url, "http://from-env:3");
    assert_eq!(settings.poll_interval_secs, 30);
    assert_eq!(settings.sort_order, SortOrder::Ascending);
    assert!(settings.strict_refresh_ordering);
}

#[test]
fn zero_poll_interval_is_clamped() {
    let settings = Settings {
        poll_interval_secs: 0,
        request_timeout_secs: Some(0),
        ..Settings::default()
    };
    assert_eq!(
        settings.controller_options().poll_interval,
        Duration::from_secs(1)
    );
    assert_eq!(settings.request_timeout(), None);
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let settings = load_settings(Path::new("/nonexistent/logbook.toml"));
    assert_eq!(settings.poll_interval_secs, Settings::default().poll_interval_secs);
}
