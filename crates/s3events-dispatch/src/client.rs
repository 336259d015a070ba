//! Destination client ports
//!
//! One trait per provider. The engine only talks to these traits, so AWS
//! clients and in-memory fakes are interchangeable.

use async_trait::async_trait;
use s3events_core::types::DirectTargetKind;
use s3events_core::Result;
use serde::Serialize;
use std::sync::Arc;

/// Raw reply of a provider call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderResponse {
    Published {
        message_id: Option<String>,
    },
    Enqueued {
        message_id: Option<String>,
        md5_of_body: Option<String>,
    },
    Invoked {
        status_code: i32,
        function_error: Option<String>,
    },
}

/// Address of an SNS publish
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PublishTarget {
    Topic(String),
    Target(String),
    PhoneNumber(String),
}

impl PublishTarget {
    pub fn direct(kind: DirectTargetKind, target: &str) -> Self {
        match kind {
            DirectTargetKind::TopicArn => PublishTarget::Topic(target.to_string()),
            DirectTargetKind::TargetArn => PublishTarget::Target(target.to_string()),
            DirectTargetKind::PhoneNumber => PublishTarget::PhoneNumber(target.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PublishTarget::Topic(s) | PublishTarget::Target(s) | PublishTarget::PhoneNumber(s) => s,
        }
    }
}

/// SNS-compatible publisher
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    async fn publish(
        &self,
        target: &PublishTarget,
        subject: &str,
        message: &str,
    ) -> Result<ProviderResponse>;
}

/// SQS-compatible queue
#[async_trait]
pub trait QueueSender: Send + Sync {
    /// Map a queue ARN to the URL messages are sent to.
    ///
    /// Fails with `Error::QueueResolution`.
    async fn resolve_queue_url(&self, queue_arn: &str) -> Result<String>;

    async fn send_message(&self, queue_url: &str, body: &str) -> Result<ProviderResponse>;
}

/// Lambda-compatible function invoker
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    async fn invoke(&self, function_arn: &str, payload: &str) -> Result<ProviderResponse>;
}

/// Provider clients handed to the dispatcher at construction
#[derive(Clone)]
pub struct DestinationClients {
    pub topics: Arc<dyn TopicPublisher>,
    pub queues: Arc<dyn QueueSender>,
    pub functions: Arc<dyn FunctionInvoker>,
}

impl DestinationClients {
    pub fn new(
        topics: Arc<dyn TopicPublisher>,
        queues: Arc<dyn QueueSender>,
        functions: Arc<dyn FunctionInvoker>,
    ) -> Self {
        Self {
            topics,
            queues,
            functions,
        }
    }
}
