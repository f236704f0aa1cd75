//! Content-addressed cache and local quota guarding synthesis calls.

pub mod key;
pub mod quota;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use key::{CacheKey, normalize_text};
pub use quota::{QuotaUsage, QuotaWindow};
pub use store::{AudioCache, CacheEntry};

/// How a resolution was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheStatus {
    /// Served from cache, no quota consumed
    Hit,
    /// Rendered now, quota consumed
    Miss,
    /// Quota exhausted, an older rendering of the same key was served
    RateLimitedServedStale,
    /// Quota exhausted and nothing cached for the key
    RateLimitedNoData,
}

impl CacheStatus {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::RateLimitedServedStale => "RATE_LIMITED_SERVED_STALE",
            CacheStatus::RateLimitedNoData => "RATE_LIMITED_NO_DATA",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(CacheStatus::Hit.to_string(), "HIT");
        assert_eq!(
            serde_json::to_string(&CacheStatus::RateLimitedServedStale).unwrap(),
            "\"RATE_LIMITED_SERVED_STALE\""
        );
        assert_eq!(
            serde_json::from_str::<CacheStatus>("\"RATE_LIMITED_NO_DATA\"").unwrap(),
            CacheStatus::RateLimitedNoData
        );
    }
}
