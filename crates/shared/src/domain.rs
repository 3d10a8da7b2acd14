use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseDomainError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseDomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map($name)
                    .map_err(|_| ParseDomainError::new(stringify!($name), s))
            }
        }
    };
}

id_newtype!(EntryId);

/// A stored log entry as the remote store reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Editable fields of an entry, used both as form state and as the
/// create/update request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub name: String,
    pub message: String,
}

impl EntryDraft {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns the whitespace-trimmed draft, or `None` when either field is blank.
    pub fn normalized(&self) -> Option<EntryDraft> {
        let name = self.name.trim();
        let message = self.message.trim();
        if name.is_empty() || message.is_empty() {
            return None;
        }
        Some(EntryDraft::new(name, message))
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.message.clear();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl FromStr for SortOrder {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "oldest" => Ok(SortOrder::Ascending),
            "desc" | "descending" | "newest" => Ok(SortOrder::Descending),
            _ => Err(ParseDomainError::new("SortOrder", s)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => f.write_str("asc"),
            SortOrder::Descending => f.write_str("desc"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Maps the raw `status` string of the health endpoint. Anything other
    /// than `healthy` or `degraded` is treated as unhealthy.
    pub fn from_status(raw: &str) -> Self {
        match raw {
            "healthy" => HealthStatus::Healthy,
            "degraded" => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_draft_trims_and_rejects_blank_fields() {
        let draft = EntryDraft::new("  alice ", "\thello\n");
        assert_eq!(draft.normalized(), Some(EntryDraft::new("alice", "hello")));

        assert_eq!(EntryDraft::new("", "hello").normalized(), None);
        assert_eq!(EntryDraft::new("alice", "   ").normalized(), None);
    }

    #[test]
    fn sort_order_parses_select_values() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Ascending);
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Descending);
        assert!("sideways".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default(), SortOrder::Descending);
    }

    #[test]
    fn health_status_maps_unknown_strings_to_unhealthy() {
        assert_eq!(HealthStatus::from_status("healthy"), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_status("degraded"), HealthStatus::Degraded);
        assert_eq!(HealthStatus::from_status("down"), HealthStatus::Unhealthy);
        assert_eq!(HealthStatus::from_status(""), HealthStatus::Unhealthy);
    }

    #[test]
    fn entry_id_round_trips_through_text() {
        assert_eq!(" 42 ".parse::<EntryId>().unwrap(), EntryId(42));
        assert_eq!(EntryId(42).to_string(), "42");
        assert!("abc".parse::<EntryId>().is_err());
    }
}
