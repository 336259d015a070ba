//! AWS adapters for the dispatch ports
//!
//! S3 listing and notification config, SNS publish, SQS send and Lambda
//! invoke, all built from one shared SDK config.

use crate::config::Config;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::NotificationConfigurationFilter;
use s3events_core::types::{
    FilterRule, FilterRuleKind, LambdaFunctionConfiguration, NotificationConfiguration,
    NotificationFilter, QueueConfiguration, S3KeyFilter, StorageObjectRef, TopicConfiguration,
};
use s3events_core::{Error, Result, DEFAULT_REGION};
use s3events_dispatch::{
    DestinationClients, FunctionInvoker, NotificationConfigSource, ObjectLister, ObjectPage,
    ProviderResponse, PublishTarget, QueueSender, TopicPublisher,
};
use std::sync::Arc;
use tracing::debug;

/// Configured region first, then the SDK chain (environment, profile files, IMDS), then us-east-1
pub fn region_provider(configured: Option<&str>) -> RegionProviderChain {
    RegionProviderChain::first_try(configured.map(|region| Region::new(region.to_string())))
        .or_default_provider()
        .or_else(Region::new(DEFAULT_REGION))
}

/// Load the shared SDK config from a CLI profile
pub async fn load_sdk_config(config: &Config) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider(config.region.as_deref()));
    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
        let credentials = Credentials::new(access_key, secret_key, None, None, "s3events-cli");
        loader = loader.credentials_provider(credentials);
    }

    let shared = loader.load().await;
    debug!("Using region {:?}", shared.region());
    shared
}

/// SDK clients for every service a replay touches
#[derive(Clone)]
pub struct AwsClients {
    pub s3: aws_sdk_s3::Client,
    pub sns: aws_sdk_sns::Client,
    pub sqs: aws_sdk_sqs::Client,
    pub lambda: aws_sdk_lambda::Client,
}

impl AwsClients {
    pub async fn load(config: &Config) -> Self {
        let shared = load_sdk_config(config).await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.path_style)
            .build();

        Self {
            s3: aws_sdk_s3::Client::from_conf(s3_config),
            sns: aws_sdk_sns::Client::new(&shared),
            sqs: aws_sdk_sqs::Client::new(&shared),
            lambda: aws_sdk_lambda::Client::new(&shared),
        }
    }

    pub fn destination_clients(&self) -> DestinationClients {
        DestinationClients::new(
            Arc::new(SnsPublisher::new(self.sns.clone())),
            Arc::new(SqsSender::new(self.sqs.clone())),
            Arc::new(LambdaInvoker::new(self.lambda.clone())),
        )
    }

    pub fn lister(&self) -> Arc<S3ObjectLister> {
        Arc::new(S3ObjectLister::new(self.s3.clone()))
    }

    pub fn config_source(&self) -> S3NotificationConfigSource {
        S3NotificationConfigSource::new(self.s3.clone())
    }
}

// ============================================================================
// S3
// ============================================================================

/// ListObjectsV2 pages
pub struct S3ObjectLister {
    client: aws_sdk_s3::Client,
}

impl S3ObjectLister {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectLister for S3ObjectLister {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage> {
        let mut req = self.client.list_objects_v2().bucket(bucket).prefix(prefix);

        if let Some(token) = continuation_token {
            req = req.continuation_token(token);
        }

        let resp = req.send().await.map_err(|e| Error::Enumeration {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            message: DisplayErrorContext(&e).to_string(),
        })?;

        let objects = resp
            .contents()
            .iter()
            .filter_map(|object| {
                let mut item = StorageObjectRef::new(object.key()?);
                item.size = object.size();
                item.etag = object.e_tag().map(str::to_string);
                Some(item)
            })
            .collect();

        let next_continuation_token = if resp.is_truncated().unwrap_or(false) {
            resp.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ObjectPage {
            objects,
            next_continuation_token,
        })
    }
}

/// GetBucketNotificationConfiguration
pub struct S3NotificationConfigSource {
    client: aws_sdk_s3::Client,
}

impl S3NotificationConfigSource {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationConfigSource for S3NotificationConfigSource {
    async fn load(&self, bucket: &str) -> Result<NotificationConfiguration> {
        let resp = self
            .client
            .get_bucket_notification_configuration()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| Error::NotificationConfig {
                bucket: bucket.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let mut config = NotificationConfiguration::new();

        for topic in resp.topic_configurations() {
            config = config.add_topic(TopicConfiguration {
                id: topic.id().map(str::to_string),
                topic_arn: topic.topic_arn().to_string(),
                events: topic.events().iter().map(|e| e.as_str().to_string()).collect(),
                filter: notification_filter(topic.filter()),
            });
        }

        for queue in resp.queue_configurations() {
            config = config.add_queue(QueueConfiguration {
                id: queue.id().map(str::to_string),
                queue_arn: queue.queue_arn().to_string(),
                events: queue.events().iter().map(|e| e.as_str().to_string()).collect(),
                filter: notification_filter(queue.filter()),
            });
        }

        for function in resp.lambda_function_configurations() {
            config = config.add_lambda_function(LambdaFunctionConfiguration {
                id: function.id().map(str::to_string),
                lambda_function_arn: function.lambda_function_arn().to_string(),
                events: function.events().iter().map(|e| e.as_str().to_string()).collect(),
                filter: notification_filter(function.filter()),
            });
        }

        Ok(config)
    }
}

fn notification_filter(filter: Option<&NotificationConfigurationFilter>) -> Option<NotificationFilter> {
    let rules = filter?.key()?.filter_rules();

    let filter_rules = rules
        .iter()
        .filter_map(|rule| {
            let kind = rule
                .name()
                .map(|name| FilterRuleKind::from_name(name.as_str()))
                .unwrap_or(FilterRuleKind::Suffix);
            Some(FilterRule {
                kind,
                value: rule.value()?.to_string(),
            })
        })
        .collect();

    Some(NotificationFilter::key(S3KeyFilter { filter_rules }))
}

// ============================================================================
// SNS
// ============================================================================

pub struct SnsPublisher {
    client: aws_sdk_sns::Client,
}

impl SnsPublisher {
    pub fn new(client: aws_sdk_sns::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TopicPublisher for SnsPublisher {
    async fn publish(
        &self,
        target: &PublishTarget,
        subject: &str,
        message: &str,
    ) -> Result<ProviderResponse> {
        let req = self.client.publish().subject(subject).message(message);
        let req = match target {
            PublishTarget::Topic(arn) => req.topic_arn(arn),
            PublishTarget::Target(arn) => req.target_arn(arn),
            PublishTarget::PhoneNumber(number) => req.phone_number(number),
        };

        let resp = req.send().await.map_err(|e| {
            Error::provider(target.as_str(), aws_sdk_sns::error::DisplayErrorContext(&e))
        })?;

        Ok(ProviderResponse::Published {
            message_id: resp.message_id().map(str::to_string),
        })
    }
}

// ============================================================================
// SQS
// ============================================================================

pub struct SqsSender {
    client: aws_sdk_sqs::Client,
}

impl SqsSender {
    pub fn new(client: aws_sdk_sqs::Client) -> Self {
        Self { client }
    }
}

/// Owner account and queue name of `arn:aws:sqs:<region>:<account>:<name>`
pub fn parse_queue_arn(queue_arn: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = queue_arn.split(':').collect();

    match parts.as_slice() {
        ["arn", _, "sqs", _, account, name] if !account.is_empty() && !name.is_empty() => {
            Ok((*account, *name))
        }
        _ => Err(Error::queue_resolution(queue_arn, "not an SQS queue ARN")),
    }
}

#[async_trait]
impl QueueSender for SqsSender {
    async fn resolve_queue_url(&self, queue_arn: &str) -> Result<String> {
        let (account, name) = parse_queue_arn(queue_arn)?;

        let resp = self
            .client
            .get_queue_url()
            .queue_name(name)
            .queue_owner_aws_account_id(account)
            .send()
            .await
            .map_err(|e| {
                Error::queue_resolution(queue_arn, aws_sdk_sqs::error::DisplayErrorContext(&e))
            })?;

        resp.queue_url()
            .map(str::to_string)
            .ok_or_else(|| Error::queue_resolution(queue_arn, "no queue URL returned"))
    }

    async fn send_message(&self, queue_url: &str, body: &str) -> Result<ProviderResponse> {
        let resp = self
            .client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| Error::provider(queue_url, aws_sdk_sqs::error::DisplayErrorContext(&e)))?;

        Ok(ProviderResponse::Enqueued {
            message_id: resp.message_id().map(str::to_string),
            md5_of_body: resp.md5_of_message_body().map(str::to_string),
        })
    }
}

// ============================================================================
// Lambda
// ============================================================================

/// Asynchronous (`Event`) Lambda invocations
pub struct LambdaInvoker {
    client: aws_sdk_lambda::Client,
}

impl LambdaInvoker {
    pub fn new(client: aws_sdk_lambda::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FunctionInvoker for LambdaInvoker {
    async fn invoke(&self, function_arn: &str, payload: &str) -> Result<ProviderResponse> {
        let resp = self
            .client
            .invoke()
            .function_name(function_arn)
            .invocation_type(InvocationType::Event)
            .payload(Blob::new(payload.as_bytes()))
            .send()
            .await
            .map_err(|e| {
                Error::provider(function_arn, aws_sdk_lambda::error::DisplayErrorContext(&e))
            })?;

        Ok(ProviderResponse::Invoked {
            status_code: resp.status_code(),
            function_error: resp.function_error().map(str::to_string),
        })
    }
}
