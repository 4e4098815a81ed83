use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Days, Local, NaiveDate};

/// Source of the current calendar day used for quota resets.
pub trait Calendar: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The machine's local date, so a day ends at local midnight.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCalendar;

impl Calendar for LocalCalendar {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A calendar that only moves when told to. Clones share the same date.
#[derive(Debug, Clone)]
pub struct FixedCalendar(Arc<Mutex<NaiveDate>>);

impl FixedCalendar {
    pub fn new(date: NaiveDate) -> Self {
        Self(Arc::new(Mutex::new(date)))
    }

    pub fn advance_days(&self, days: u64) {
        let mut date = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = date.checked_add_days(Days::new(days)) {
            *date = next;
        }
    }
}

impl Calendar for FixedCalendar {
    fn today(&self) -> NaiveDate {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
