//! Cache provenance of list fetches, as reported by the `X-Cache` marker.

use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    #[default]
    Unknown,
}

impl CacheStatus {
    pub fn classify(marker: Option<&str>) -> Self {
        match marker {
            Some("HIT") => CacheStatus::Hit,
            Some("MISS") => CacheStatus::Miss,
            _ => CacheStatus::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CacheStatus::Hit => "From cache (HIT)",
            CacheStatus::Miss => "From database (MISS)",
            CacheStatus::Unknown => "N/A",
        }
    }
}

/// Last observed provenance plus the local wall-clock time it was observed at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheProvenanceTracker {
    status: CacheStatus,
    fetched_at: Option<DateTime<Local>>,
}

impl CacheProvenanceTracker {
    pub fn record(&mut self, marker: Option<&str>) -> CacheStatus {
        self.record_at(marker, Local::now())
    }

    pub fn record_at(&mut self, marker: Option<&str>, now: DateTime<Local>) -> CacheStatus {
        self.status = CacheStatus::classify(marker);
        self.fetched_at = Some(now);
        self.status
    }

    /// Transport failure: no marker was observed, so provenance is unknown.
    pub fn reset(&mut self) {
        self.status = CacheStatus::Unknown;
    }

    pub fn status(&self) -> CacheStatus {
        self.status
    }

    pub fn label(&self) -> &'static str {
        self.status.label()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Local>> {
        self.fetched_at
    }

    pub fn fetched_at_label(&self) -> Option<String> {
        self.fetched_at
            .map(|at| at.format("%H:%M:%S").to_string())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn classifies_transport_markers() {
        assert_eq!(CacheStatus::classify(Some("HIT")), CacheStatus::Hit);
        assert_eq!(CacheStatus::classify(Some("MISS")), CacheStatus::Miss);
        assert_eq!(CacheStatus::classify(None), CacheStatus::Unknown);
        assert_eq!(CacheStatus::classify(Some("hit")), CacheStatus::Unknown);
        assert_eq!(CacheStatus::classify(Some("STALE")), CacheStatus::Unknown);
    }

    #[test]
    fn record_stamps_wall_clock_time() {
        let mut tracker = CacheProvenanceTracker::default();
        assert_eq!(tracker.fetched_at_label(), None);

        let now = Local
            .with_ymd_and_hms(2024, 5, 1, 9, 4, 7)
            .single()
            .expect("unambiguous local time");
        assert_eq!(tracker.record_at(Some("HIT"), now), CacheStatus::Hit);
        assert_eq!(tracker.label(), "From cache (HIT)");
        assert_eq!(tracker.fetched_at_label().as_deref(), Some("09:04:07"));
    }

    #[test]
    fn reset_forgets_status_but_keeps_last_timestamp() {
        let mut tracker = CacheProvenanceTracker::default();
        tracker.record(Some("MISS"));
        let stamped = tracker.fetched_at();

        tracker.reset();
        assert_eq!(tracker.status(), CacheStatus::Unknown);
        assert_eq!(tracker.label(), "N/A");
        assert_eq!(tracker.fetched_at(), stamped);
    }
}
