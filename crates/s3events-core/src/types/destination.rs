//! Notification destinations
//!
//! S3-compatible bucket notification configuration plus the flattened
//! [`DestinationConfig`] the dispatcher works with:
//! - Topic destinations (SNS)
//! - Queue destinations (SQS)
//! - Function destinations (Lambda)
//! - Direct SNS targets (topic ARN, endpoint ARN or phone number)

use super::S3KeyFilter;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Destination Kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    Topic,
    Queue,
    Function,
    Direct,
}

impl DestinationKind {
    /// Service label used in reports
    pub fn service(&self) -> &'static str {
        match self {
            DestinationKind::Topic | DestinationKind::Direct => "SNS",
            DestinationKind::Queue => "SQS",
            DestinationKind::Function => "Lambda",
        }
    }
}

/// How a direct SNS publish is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DirectTargetKind {
    TopicArn,
    TargetArn,
    #[serde(rename = "phoneNum")]
    PhoneNumber,
}

impl DirectTargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectTargetKind::TopicArn => "topicArn",
            DirectTargetKind::TargetArn => "targetArn",
            DirectTargetKind::PhoneNumber => "phoneNum",
        }
    }
}

impl fmt::Display for DirectTargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectTargetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topicArn" => Ok(DirectTargetKind::TopicArn),
            "targetArn" => Ok(DirectTargetKind::TargetArn),
            "phoneNum" | "phoneNumber" => Ok(DirectTargetKind::PhoneNumber),
            other => Err(Error::UnknownTargetKind(other.to_string())),
        }
    }
}

// ============================================================================
// Destination Config
// ============================================================================

/// One fan-out target together with its subscription filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationConfig {
    Topic {
        topic_arn: String,
        filter: S3KeyFilter,
    },
    Queue {
        queue_arn: String,
        filter: S3KeyFilter,
    },
    Function {
        function_arn: String,
        filter: S3KeyFilter,
    },
    Direct {
        kind: DirectTargetKind,
        target: String,
        filter: S3KeyFilter,
    },
}

impl DestinationConfig {
    pub fn topic(topic_arn: impl Into<String>) -> Self {
        DestinationConfig::Topic {
            topic_arn: topic_arn.into(),
            filter: S3KeyFilter::none(),
        }
    }

    pub fn queue(queue_arn: impl Into<String>) -> Self {
        DestinationConfig::Queue {
            queue_arn: queue_arn.into(),
            filter: S3KeyFilter::none(),
        }
    }

    pub fn function(function_arn: impl Into<String>) -> Self {
        DestinationConfig::Function {
            function_arn: function_arn.into(),
            filter: S3KeyFilter::none(),
        }
    }

    pub fn direct(kind: DirectTargetKind, target: impl Into<String>) -> Self {
        DestinationConfig::Direct {
            kind,
            target: target.into(),
            filter: S3KeyFilter::none(),
        }
    }

    /// Replace the subscription filter
    pub fn with_filter(mut self, new_filter: S3KeyFilter) -> Self {
        match &mut self {
            DestinationConfig::Topic { filter, .. }
            | DestinationConfig::Queue { filter, .. }
            | DestinationConfig::Function { filter, .. }
            | DestinationConfig::Direct { filter, .. } => *filter = new_filter,
        }
        self
    }

    pub fn kind(&self) -> DestinationKind {
        match self {
            DestinationConfig::Topic { .. } => DestinationKind::Topic,
            DestinationConfig::Queue { .. } => DestinationKind::Queue,
            DestinationConfig::Function { .. } => DestinationKind::Function,
            DestinationConfig::Direct { .. } => DestinationKind::Direct,
        }
    }

    /// ARN, phone number or function name the event is addressed to
    pub fn target(&self) -> &str {
        match self {
            DestinationConfig::Topic { topic_arn, .. } => topic_arn,
            DestinationConfig::Queue { queue_arn, .. } => queue_arn,
            DestinationConfig::Function { function_arn, .. } => function_arn,
            DestinationConfig::Direct { target, .. } => target,
        }
    }

    pub fn filter(&self) -> &S3KeyFilter {
        match self {
            DestinationConfig::Topic { filter, .. }
            | DestinationConfig::Queue { filter, .. }
            | DestinationConfig::Function { filter, .. }
            | DestinationConfig::Direct { filter, .. } => filter,
        }
    }
}

// ============================================================================
// Bucket Notification Configuration
// ============================================================================

/// Notification filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<S3KeyFilter>,
}

impl NotificationFilter {
    pub fn key(filter: S3KeyFilter) -> Self {
        Self { key: Some(filter) }
    }
}

fn key_filter(filter: &Option<NotificationFilter>) -> S3KeyFilter {
    filter
        .as_ref()
        .and_then(|f| f.key.clone())
        .unwrap_or_default()
}

/// Topic notification configuration (SNS)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TopicConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub topic_arn: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<NotificationFilter>,
}

/// Queue notification configuration (SQS)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueueConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub queue_arn: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<NotificationFilter>,
}

/// Lambda function notification configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LambdaFunctionConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub lambda_function_arn: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<NotificationFilter>,
}

/// Complete bucket notification configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationConfiguration {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topic_configurations: Vec<TopicConfiguration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queue_configurations: Vec<QueueConfiguration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lambda_function_configurations: Vec<LambdaFunctionConfiguration>,
}

impl NotificationConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_topic(mut self, config: TopicConfiguration) -> Self {
        self.topic_configurations.push(config);
        self
    }

    pub fn add_queue(mut self, config: QueueConfiguration) -> Self {
        self.queue_configurations.push(config);
        self
    }

    pub fn add_lambda_function(mut self, config: LambdaFunctionConfiguration) -> Self {
        self.lambda_function_configurations.push(config);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.topic_configurations.is_empty()
            && self.queue_configurations.is_empty()
            && self.lambda_function_configurations.is_empty()
    }

    /// Flatten into destinations: topics, then queues, then functions
    pub fn destinations(&self) -> Vec<DestinationConfig> {
        let topics = self.topic_configurations.iter().map(|c| {
            DestinationConfig::topic(&c.topic_arn).with_filter(key_filter(&c.filter))
        });
        let queues = self.queue_configurations.iter().map(|c| {
            DestinationConfig::queue(&c.queue_arn).with_filter(key_filter(&c.filter))
        });
        let functions = self.lambda_function_configurations.iter().map(|c| {
            DestinationConfig::function(&c.lambda_function_arn).with_filter(key_filter(&c.filter))
        });

        topics.chain(queues).chain(functions).collect()
    }
}
