//! s3events Core Library
//!
//! Core types for replaying S3 event notifications: filter rules,
//! destination configurations, the event envelope and the error type
//! shared by the dispatch engine and the CLI.

pub mod error;
pub mod types;

pub use error::{Error, Result};

/// s3events version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default AWS region
pub const DEFAULT_REGION: &str = "us-east-1";

/// Number of objects dispatched concurrently before the next batch starts
pub const DEFAULT_BATCH_SIZE: usize = 30;

/// Subject used for SNS notifications
pub const NOTIFICATION_SUBJECT: &str = "Amazon S3 Notification";
