use crate::services::ServiceError;
use px_core::SnapshotError;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(thiserror::Error, Debug)]
pub enum EditorError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{context}: {source}")]
    Service {
        context: &'static str,
        #[source]
        source: ServiceError,
    },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("busy: {0}")]
    Busy(String),

    #[error("stale ticket {0}")]
    StaleTicket(u64),
}

impl EditorError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn service(context: &'static str, source: ServiceError) -> Self {
        Self::Service { context, source }
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(EditorError::validation("x").to_string().contains("validation error:"));
        assert!(EditorError::busy("x").to_string().contains("busy:"));
        assert_eq!(EditorError::StaleTicket(7).to_string(), "stale ticket 7");
    }

    #[test]
    fn service_keeps_reason() {
        let err = EditorError::service("remove background", ServiceError::new("quota exceeded"));
        assert_eq!(err.to_string(), "remove background: quota exceeded");
    }
}
