pub mod call;
pub mod controller;
pub mod error;
pub mod progress;
pub mod quota;
pub mod scheduler;
pub mod settings;

pub use controller::{spawn, TrackingHandle};
pub use error::{QuotaError, TrackingError};
pub use settings::TrackingSettings;
