use std::{collections::HashMap, fmt, sync::Arc};

use model::{snapshot::TrackingSnapshot, subject::Subject};
use tokio::sync::Mutex;
use tracking::{quota::QuotaStore, TrackingError, TrackingHandle, TrackingSettings};
use utility::id::Id;

use crate::demo::{Catalog, CatalogEntry};

#[derive(Debug)]
pub enum SessionError {
    UnknownSubject(Id<Subject>),
    NotOpen(Id<Subject>),
    Tracking(TrackingError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSubject(id) => write!(f, "there is no subject {}", id),
            Self::NotOpen(id) => write!(f, "{} is not being tracked right now", id),
            Self::Tracking(why) => write!(f, "{}", why),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<TrackingError> for SessionError {
    fn from(value: TrackingError) -> Self {
        Self::Tracking(value)
    }
}

/// One tracking controller per subject, started on first open and kept
/// around afterwards so the last snapshot stays readable.
#[derive(Clone)]
pub struct Sessions {
    catalog: Arc<Catalog>,
    quota: Arc<dyn QuotaStore>,
    settings: TrackingSettings,
    running: Arc<Mutex<HashMap<Id<Subject>, TrackingHandle>>>,
}

impl Sessions {
    pub fn new(catalog: Catalog, quota: Arc<dyn QuotaStore>, settings: TrackingSettings) -> Self {
        Self {
            catalog: Arc::new(catalog),
            quota,
            settings,
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn subjects(&self) -> Vec<Subject> {
        self.catalog
            .values()
            .map(|entry| entry.subject.clone())
            .collect()
    }

    fn entry(&self, id: &Id<Subject>) -> Result<&CatalogEntry, SessionError> {
        self.catalog
            .get(id)
            .ok_or_else(|| SessionError::UnknownSubject(id.clone()))
    }

    pub async fn open(&self, id: &Id<Subject>) -> Result<TrackingSnapshot, SessionError> {
        let entry = self.entry(id)?;
        let handle = self
            .running
            .lock()
            .await
            .entry(id.clone())
            .or_insert_with(|| tracking::spawn(self.quota.clone(), self.settings.clone()))
            .clone();
        Ok(handle
            .open(entry.subject.clone(), entry.route.clone())
            .await?)
    }

    /// The controller of `id`, whether its session is open or not.
    pub async fn get(&self, id: &Id<Subject>) -> Result<TrackingHandle, SessionError> {
        self.entry(id)?;
        self.running
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotOpen(id.clone()))
    }

    /// The controller of `id`, only if its session is open.
    pub async fn get_open(&self, id: &Id<Subject>) -> Result<TrackingHandle, SessionError> {
        let handle = self.get(id).await?;
        if handle.snapshots().borrow().is_open {
            Ok(handle)
        } else {
            Err(SessionError::NotOpen(id.clone()))
        }
    }
}
