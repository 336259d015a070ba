//! Error types for s3events

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Configuration Errors
    #[error("Invalid S3 path: {0}")]
    InvalidS3Path(String),

    #[error("Unknown event type: {0}. Expected one of ObjectCreated:*, ObjectRemoved:*, ReducedRedundancyLostObject")]
    UnknownEventType(String),

    #[error("Unknown SNS target kind: {0}. Expected one of topicArn, targetArn, phoneNum")]
    UnknownTargetKind(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Source Errors
    #[error("Failed to list objects in s3://{bucket}/{prefix}: {message}")]
    Enumeration {
        bucket: String,
        prefix: String,
        message: String,
    },

    #[error("Failed to read notification configuration of bucket {bucket}: {message}")]
    NotificationConfig { bucket: String, message: String },

    // Destination Errors
    #[error("Failed to resolve queue {queue}: {message}")]
    QueueResolution { queue: String, message: String },

    #[error("Dispatch to {target} failed: {message}")]
    Provider { target: String, message: String },

    #[error("{failed} dispatch(es) failed, stopping replay")]
    DispatchFailed { failed: usize },

    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidS3Path(_) => "InvalidS3Path",
            Error::UnknownEventType(_) => "UnknownEventType",
            Error::UnknownTargetKind(_) => "UnknownTargetKind",
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::Enumeration { .. } => "EnumerationFailed",
            Error::NotificationConfig { .. } => "NotificationConfigUnavailable",
            Error::QueueResolution { .. } => "QueueResolutionFailed",
            Error::Provider { .. } => "ProviderCallFailed",
            Error::DispatchFailed { .. } => "DispatchFailed",
            Error::Serialization(_) => "SerializationFailed",
        }
    }

    /// Configuration errors are raised before any dispatch happens
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidS3Path(_)
                | Error::UnknownEventType(_)
                | Error::UnknownTargetKind(_)
                | Error::InvalidArgument(_)
        )
    }

    /// Errors that concern a single destination and can be isolated from siblings
    pub fn is_destination_failure(&self) -> bool {
        matches!(self, Error::QueueResolution { .. } | Error::Provider { .. })
    }

    pub fn provider(target: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Provider {
            target: target.into(),
            message: message.to_string(),
        }
    }

    pub fn queue_resolution(queue: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::QueueResolution {
            queue: queue.into(),
            message: message.to_string(),
        }
    }
}
