use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stored call allowance of one subject. The subject id is the storage key
/// and thus not part of the record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaRecord {
    pub remaining: u32,
    pub last_reset_day: NaiveDate,
}

impl QuotaRecord {
    pub fn fresh(max_per_day: u32, today: NaiveDate) -> Self {
        Self {
            remaining: max_per_day,
            last_reset_day: today,
        }
    }

    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.last_reset_day == today
    }

    /// One fewer call left. Saturates at zero.
    pub fn consumed(self) -> Self {
        Self {
            remaining: self.remaining.saturating_sub(1),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_format() {
        let record = QuotaRecord::fresh(3, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"remaining":3,"lastResetDay":"2026-10-19"}"#
        );
    }

    #[test]
    fn reads_stored_days_only_in_iso_format() {
        let record: QuotaRecord =
            serde_json::from_str(r#"{"remaining":1,"lastResetDay":"2026-10-19"}"#).unwrap();
        assert_eq!(
            record,
            QuotaRecord {
                remaining: 1,
                last_reset_day: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            }
        );
        assert!(serde_json::from_str::<QuotaRecord>(
            r#"{"remaining":1,"lastResetDay":"19.10.2026"}"#
        )
        .is_err());
    }

    #[test]
    fn consumed_never_goes_below_zero() {
        let record = QuotaRecord::fresh(1, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert_eq!(record.consumed().remaining, 0);
        assert_eq!(record.consumed().consumed().remaining, 0);
    }
}
