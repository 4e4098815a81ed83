//! Daily call allowance per subject.
//!
//! Records are stored under `callsRemaining_<subject id>` as
//! `{"remaining": 2, "lastResetDay": "2026-10-19"}`. A record that was last
//! reset on another day is replaced by a fresh one on first access.

use async_trait::async_trait;
use chrono::NaiveDate;
use model::{quota::QuotaRecord, subject::Subject};
use tokio::sync::Mutex;
use utility::id::Id;

use crate::error::QuotaError;

pub mod backend;
pub mod calendar;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use calendar::{Calendar, FixedCalendar, LocalCalendar};

pub type Result<T> = std::result::Result<T, QuotaError>;

pub const KEY_PREFIX: &str = "callsRemaining_";

pub fn storage_key(subject: &Id<Subject>) -> String {
    format!("{}{}", KEY_PREFIX, subject)
}

#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Calls left today. Creates or resets the record if it is missing or
    /// from an earlier day.
    async fn get_remaining(&self, subject: &Id<Subject>, max_per_day: u32)
        -> Result<u32>;

    /// Uses up one call and returns what is left afterwards. Does nothing if
    /// no calls are left, so callers should check `get_remaining` first.
    async fn consume(&self, subject: &Id<Subject>, max_per_day: u32) -> Result<u32>;

    fn today(&self) -> NaiveDate;
}

/// `QuotaStore` on top of any key-value medium. Every read-modify-write runs
/// under one lock, so concurrent consumes never lose a decrement.
pub struct KeyValueQuotaStore<B, C> {
    backend: Mutex<B>,
    calendar: C,
}

impl<B, C> KeyValueQuotaStore<B, C>
where
    B: KeyValueBackend,
    C: Calendar,
{
    pub fn new(backend: B, calendar: C) -> Self {
        Self {
            backend: Mutex::new(backend),
            calendar,
        }
    }

    fn current_record(
        backend: &mut B,
        key: &str,
        max_per_day: u32,
        today: NaiveDate,
    ) -> Result<QuotaRecord> {
        let stored = match backend.get(key)? {
            Some(raw) => match serde_json::from_value::<QuotaRecord>(raw) {
                Ok(record) => Some(record),
                Err(why) => {
                    log::warn!("discarding unreadable quota record {}: {}", key, why);
                    None
                }
            },
            None => None,
        };
        match stored {
            Some(record) if record.is_current(today) => Ok(record),
            _ => {
                let fresh = QuotaRecord::fresh(max_per_day, today);
                Self::store(backend, key, &fresh)?;
                log::debug!("quota {} reset to {} for {}", key, max_per_day, today);
                Ok(fresh)
            }
        }
    }

    fn store(backend: &mut B, key: &str, record: &QuotaRecord) -> Result<()> {
        let value = serde_json::to_value(record)?;
        backend.put(key, value)?;
        Ok(())
    }
}

impl<C: Calendar> KeyValueQuotaStore<MemoryBackend, C> {
    pub fn in_memory(calendar: C) -> Self {
        Self::new(MemoryBackend::new(), calendar)
    }
}

#[async_trait]
impl<B, C> QuotaStore for KeyValueQuotaStore<B, C>
where
    B: KeyValueBackend,
    C: Calendar,
{
    async fn get_remaining(
        &self,
        subject: &Id<Subject>,
        max_per_day: u32,
    ) -> Result<u32> {
        let key = storage_key(subject);
        let today = self.calendar.today();
        let mut backend = self.backend.lock().await;
        Self::current_record(&mut backend, &key, max_per_day, today)
            .map(|record| record.remaining)
    }

    async fn consume(&self, subject: &Id<Subject>, max_per_day: u32) -> Result<u32> {
        let key = storage_key(subject);
        let today = self.calendar.today();
        let mut backend = self.backend.lock().await;
        let record = Self::current_record(&mut backend, &key, max_per_day, today)?;
        if record.remaining == 0 {
            return Ok(0);
        }
        let consumed = record.consumed();
        Self::store(&mut backend, &key, &consumed)?;
        Ok(consumed.remaining)
    }

    fn today(&self) -> NaiveDate {
        self.calendar.today()
    }
}


#[cfg(test)]
mod tests {
    use std::sync::{atomic::Ordering, Arc};

    use serde_json::json;

    use super::testing::FlakyBackend;
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn subject(id: &str) -> Id<Subject> {
        Id::new(id.to_owned())
    }

    #[tokio::test]
    async fn unknown_subject_starts_with_full_quota() {
        let store = KeyValueQuotaStore::in_memory(FixedCalendar::new(day(19)));
        assert_eq!(store.get_remaining(&subject("ORD-1"), 3).await.unwrap(), 3);
        assert_eq!(store.today(), day(19));
    }

    #[tokio::test]
    async fn consuming_max_times_drains_quota() {
        let store = KeyValueQuotaStore::in_memory(FixedCalendar::new(day(19)));
        for max_per_day in 1..6 {
            let order = subject(&format!("ORD-{}", max_per_day));
            for expected in (0..max_per_day).rev() {
                assert_eq!(store.consume(&order, max_per_day).await.unwrap(), expected);
            }
            assert_eq!(store.get_remaining(&order, max_per_day).await.unwrap(), 0);
            // further consumes are no-ops
            assert_eq!(store.consume(&order, max_per_day).await.unwrap(), 0);
        }
    }

    #[tokio::test]
    async fn subjects_do_not_share_quota() {
        let store = KeyValueQuotaStore::in_memory(FixedCalendar::new(day(19)));
        store.consume(&subject("TRK-001"), 3).await.unwrap();
        assert_eq!(store.get_remaining(&subject("TRK-001"), 3).await.unwrap(), 2);
        assert_eq!(store.get_remaining(&subject("TRK-002"), 3).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn new_day_resets_exactly_once() {
        let calendar = FixedCalendar::new(day(19));
        let store = KeyValueQuotaStore::in_memory(calendar.clone());
        let order = subject("ORD-1");
        for _ in 0..3 {
            store.consume(&order, 3).await.unwrap();
        }
        assert_eq!(store.get_remaining(&order, 3).await.unwrap(), 0);

        calendar.advance_days(1);
        assert_eq!(store.get_remaining(&order, 3).await.unwrap(), 3);
        assert_eq!(store.consume(&order, 3).await.unwrap(), 2);
        // more reads on the same day do not reset again
        for _ in 0..5 {
            assert_eq!(store.get_remaining(&order, 3).await.unwrap(), 2);
        }
    }

    #[tokio::test]
    async fn writes_through_in_stored_format() {
        let store = KeyValueQuotaStore::in_memory(FixedCalendar::new(day(19)));
        store.consume(&subject("ORD-1"), 3).await.unwrap();
        let backend = store.backend.lock().await;
        assert_eq!(
            backend.get("callsRemaining_ORD-1").unwrap(),
            Some(json!({"remaining": 2, "lastResetDay": "2026-10-19"}))
        );
    }

    #[tokio::test]
    async fn unreadable_record_is_replaced() {
        let mut backend = MemoryBackend::new();
        backend
            .put("callsRemaining_ORD-1", json!({"calls": "many"}))
            .unwrap();
        let store = KeyValueQuotaStore::new(backend, FixedCalendar::new(day(19)));
        assert_eq!(store.get_remaining(&subject("ORD-1"), 3).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn failed_write_keeps_last_persisted_value() {
        let backend = FlakyBackend::default();
        let failing = backend.failing.clone();
        let store = KeyValueQuotaStore::new(backend, FixedCalendar::new(day(19)));
        let order = subject("ORD-1");

        assert_eq!(store.consume(&order, 3).await.unwrap(), 2);
        failing.store(true, Ordering::SeqCst);
        assert!(matches!(
            store.consume(&order, 3).await,
            Err(QuotaError::Backend(_))
        ));
        failing.store(false, Ordering::SeqCst);
        assert_eq!(store.get_remaining(&order, 3).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn survives_restart_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quota.json");
        let calendar = FixedCalendar::new(day(19));
        let order = subject("ORD-1");

        let store = KeyValueQuotaStore::new(FileBackend::open(&path).unwrap(), calendar.clone());
        store.consume(&order, 3).await.unwrap();
        store.consume(&order, 3).await.unwrap();
        drop(store);

        let store = KeyValueQuotaStore::new(FileBackend::open(&path).unwrap(), calendar);
        assert_eq!(store.get_remaining(&order, 3).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_consumes_are_not_lost() {
        let store = Arc::new(KeyValueQuotaStore::in_memory(FixedCalendar::new(day(19))));
        let tasks = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.consume(&subject("TRK-007"), 50).await })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(store.get_remaining(&subject("TRK-007"), 50).await.unwrap(), 30);
    }
}
