//! Logo cache models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// External provider that produced a cached logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogoSource {
    Google,
    Clearbit,
}

impl LogoSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogoSource::Google => "google",
            LogoSource::Clearbit => "clearbit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "google" => Some(LogoSource::Google),
            "clearbit" => Some(LogoSource::Clearbit),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the persisted name -> logo file mapping.
///
/// The key is the exact trimmed display name; case and punctuation variants
/// are distinct entries on purpose.
#[derive(Debug, Clone)]
pub struct LogoCacheEntry {
    pub name: String,
    /// Storage key of the materialized image, e.g. `logos/docker-3fa9c1d2.png`.
    pub storage_key: String,
    pub source: LogoSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of resolving a name to a logo URL.
#[derive(Debug, Clone)]
pub struct LogoResolution {
    pub url: String,
    /// True when the answer came from the cache without an external call.
    pub cached: bool,
    pub source: LogoSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logo_source_round_trips_as_text() {
        for source in [LogoSource::Google, LogoSource::Clearbit] {
            assert_eq!(LogoSource::parse(source.as_str()), Some(source));
        }
        assert_eq!(LogoSource::parse("bing"), None);
    }

    #[test]
    fn logo_source_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&LogoSource::Clearbit).unwrap(),
            "\"clearbit\""
        );
    }
}
