use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamps carried by every stored entry.
///
/// Invariant: `created_at <= modified_at`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Meta {
    /// Metadata for a first write at `now`.
    pub fn created(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            modified_at: now,
        }
    }

    /// Metadata for an overwrite at `now` that keeps the first creation time.
    ///
    /// `modified_at` never moves before `created_at`, even if the wall clock
    /// steps backwards between writes.
    pub fn touched(&self, now: DateTime<Utc>) -> Self {
        Self {
            created_at: self.created_at,
            modified_at: now.max(self.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn created_sets_both_timestamps() {
        let meta = Meta::created(at(1_000));
        assert_eq!(meta.created_at, meta.modified_at);
    }

    #[test]
    fn touched_preserves_creation() {
        let meta = Meta::created(at(1_000)).touched(at(2_000));
        assert_eq!(meta.created_at, at(1_000));
        assert_eq!(meta.modified_at, at(2_000));
    }

    #[test]
    fn touched_never_precedes_creation() {
        let meta = Meta::created(at(2_000)).touched(at(1_000));
        assert_eq!(meta.modified_at, at(2_000));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(Meta::created(at(0))).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("modifiedAt").is_some());
    }
}
