use std::{error::Error, fmt, io};

use actors::actor::ActorError;

#[derive(Debug)]
pub enum QuotaError {
    /// The key-value medium could not be read or written.
    Backend(io::Error),
    Serialization(serde_json::Error),
}

impl fmt::Display for QuotaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(why) => write!(f, "quota storage failed: {}", why),
            Self::Serialization(why) => {
                write!(f, "could not serialize quota record: {}", why)
            }
        }
    }
}

impl Error for QuotaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(why) => Some(why),
            Self::Serialization(why) => Some(why),
        }
    }
}

impl From<io::Error> for QuotaError {
    fn from(why: io::Error) -> Self {
        Self::Backend(why)
    }
}

impl From<serde_json::Error> for QuotaError {
    fn from(why: serde_json::Error) -> Self {
        Self::Serialization(why)
    }
}

#[derive(Debug)]
pub enum TrackingError {
    /// The tracking actor is gone or dropped the request.
    Actor(ActorError),
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actor(why) => write!(f, "tracking session unavailable: {}", why),
        }
    }
}

impl Error for TrackingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Actor(why) => Some(why),
        }
    }
}

impl From<ActorError> for TrackingError {
    fn from(why: ActorError) -> Self {
        Self::Actor(why)
    }
}

pub type TrackingResult<T> = Result<T, TrackingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_errors_keep_their_cause() {
        let error = TrackingError::from(ActorError::MailboxClosed);
        assert_eq!(
            error.to_string(),
            "tracking session unavailable: actor mailbox is closed"
        );
        assert!(matches!(
            error
                .source()
                .and_then(|source| source.downcast_ref::<ActorError>()),
            Some(ActorError::MailboxClosed)
        ));
    }
}
