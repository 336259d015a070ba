//! Event Dispatcher
//!
//! Sends one replayed event to one destination: gate on the filter, build
//! the envelope at send time, make exactly one provider call.

use crate::client::{DestinationClients, ProviderResponse, PublishTarget};
use s3events_core::types::{
    Clock, DestinationConfig, DestinationKind, EventType, FilterSemantics, S3EventMessage,
    S3EventRecord, StorageObjectRef, SystemClock,
};
use s3events_core::{Error, Result, NOTIFICATION_SUBJECT};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Inputs of a dispatch, echoed back in its result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchRequest {
    pub bucket: String,
    pub event_type: EventType,
    pub object: StorageObjectRef,
}

impl DispatchRequest {
    pub fn new(bucket: impl Into<String>, event_type: EventType, object: StorageObjectRef) -> Self {
        Self {
            bucket: bucket.into(),
            event_type,
            object,
        }
    }
}

/// Result of a dispatch operation
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub target: String,
    pub kind: DestinationKind,
    /// The object passed the filter; true for dry runs too
    pub sent: bool,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ProviderResponse>,
    pub request: DispatchRequest,
}

impl DispatchResult {
    fn new(
        destination: &DestinationConfig,
        request: &DispatchRequest,
        sent: bool,
        dry_run: bool,
        response: Option<ProviderResponse>,
    ) -> Self {
        Self {
            target: destination.target().to_string(),
            kind: destination.kind(),
            sent,
            dry_run,
            response,
            request: request.clone(),
        }
    }
}

/// Dispatches events through injected provider clients
pub struct Dispatcher {
    clients: DestinationClients,
    clock: Arc<dyn Clock>,
    semantics: FilterSemantics,
}

impl Dispatcher {
    pub fn new(clients: DestinationClients) -> Self {
        Self {
            clients,
            clock: Arc::new(SystemClock),
            semantics: FilterSemantics::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_semantics(mut self, semantics: FilterSemantics) -> Self {
        self.semantics = semantics;
        self
    }

    /// Dispatch one event to one destination.
    ///
    /// Provider failures are returned as errors; nothing is retried here.
    pub async fn dispatch(
        &self,
        destination: &DestinationConfig,
        request: &DispatchRequest,
        dry_run: bool,
    ) -> Result<DispatchResult> {
        if !destination.filter().matches(&request.object, self.semantics) {
            debug!(
                "Skipping {} for {}: filter [{}] does not match",
                request.object.key,
                destination.target(),
                destination.filter()
            );
            return Ok(DispatchResult::new(destination, request, false, dry_run, None));
        }

        if dry_run {
            return Ok(DispatchResult::new(destination, request, true, true, None));
        }

        let body = self.message_body(request)?;

        let response = match destination {
            DestinationConfig::Topic { topic_arn, .. } => {
                let target = PublishTarget::Topic(topic_arn.clone());
                self.clients
                    .topics
                    .publish(&target, NOTIFICATION_SUBJECT, &body)
                    .await?
            }
            DestinationConfig::Direct { kind, target, .. } => {
                let target = PublishTarget::direct(*kind, target);
                self.clients
                    .topics
                    .publish(&target, NOTIFICATION_SUBJECT, &body)
                    .await?
            }
            DestinationConfig::Queue { queue_arn, .. } => {
                let queue_url = self.clients.queues.resolve_queue_url(queue_arn).await?;
                self.clients
                    .queues
                    .send_message(&queue_url, &body)
                    .await
                    .map_err(|e| match e {
                        // Report the configured ARN, not the resolved URL
                        Error::Provider { message, .. } => Error::Provider {
                            target: queue_arn.clone(),
                            message,
                        },
                        other => other,
                    })?
            }
            DestinationConfig::Function { function_arn, .. } => {
                self.clients.functions.invoke(function_arn, &body).await?
            }
        };

        info!(
            "Sent {} for {} to {}",
            request.event_type, request.object.key, destination.target()
        );

        Ok(DispatchResult::new(
            destination,
            request,
            true,
            false,
            Some(response),
        ))
    }

    /// Serialized `{"Records": [...]}` body, timestamped now
    fn message_body(&self, request: &DispatchRequest) -> Result<String> {
        let record = S3EventRecord::build(
            &request.bucket,
            request.event_type.event_name(),
            &request.object,
            self.clock.now(),
        );
        S3EventMessage::single(record).to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDestinations;
    use chrono::{TimeZone, Utc};
    use s3events_core::types::{DirectTargetKind, FixedClock, S3KeyFilter};

    const QUEUE_ARN: &str = "arn:aws:sqs:us-east-1:000000000000:S3EventsSQSQueue";
    const TOPIC_ARN: &str = "arn:aws:sns:us-east-1:000000000000:S3EventsSNSTopic";

    fn request(key: &str) -> DispatchRequest {
        DispatchRequest::new(
            "s3events-test",
            EventType::ObjectCreated,
            StorageObjectRef::new(key),
        )
    }

    fn dispatcher(destinations: &InMemoryDestinations) -> Dispatcher {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        Dispatcher::new(destinations.clients()).with_clock(Arc::new(clock))
    }

    #[tokio::test]
    async fn test_send_to_queue() {
        let destinations = InMemoryDestinations::new();
        destinations.queues.create_queue(QUEUE_ARN);
        let destination = DestinationConfig::queue(QUEUE_ARN);

        let result = dispatcher(&destinations)
            .dispatch(&destination, &request("test-file.json"), false)
            .await
            .unwrap();

        assert!(result.sent);
        assert!(matches!(
            result.response,
            Some(ProviderResponse::Enqueued { .. })
        ));

        let messages = destinations.queues.messages(QUEUE_ARN);
        assert_eq!(messages.len(), 1);
        let message = S3EventMessage::from_json(&messages[0]).unwrap();
        assert_eq!(message.records[0].s3.object.key, "test-file.json");
        assert_eq!(message.records[0].event_name, "s3:ObjectCreated:*");
        assert_eq!(message.records[0].event_time, Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
    }

    #[tokio::test]
    async fn test_unmatched_filter_skips_without_calls() {
        let destinations = InMemoryDestinations::new();
        destinations.queues.create_queue(QUEUE_ARN);
        let destination = DestinationConfig::queue(QUEUE_ARN).with_filter(S3KeyFilter::suffix("gz"));

        let result = dispatcher(&destinations)
            .dispatch(&destination, &request("test-file.json"), false)
            .await
            .unwrap();

        assert!(!result.sent);
        assert!(result.response.is_none());
        assert_eq!(result.target, QUEUE_ARN);
        assert_eq!(destinations.queues.resolutions(), 0);
        assert_eq!(destinations.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_reports_without_sending() {
        let destinations = InMemoryDestinations::new();
        let all = [
            DestinationConfig::topic(TOPIC_ARN),
            DestinationConfig::queue(QUEUE_ARN),
            DestinationConfig::function("arn:aws:lambda:us-east-1:0:function:f"),
            DestinationConfig::direct(DirectTargetKind::PhoneNumber, "+15550100"),
        ];
        let dispatcher = dispatcher(&destinations);

        for destination in &all {
            let result = dispatcher
                .dispatch(destination, &request("test-file.json"), true)
                .await
                .unwrap();
            assert!(result.sent);
            assert!(result.dry_run);
            assert!(result.response.is_none());
        }

        // Queue was never created: a real send would have failed resolution
        assert_eq!(destinations.queues.resolutions(), 0);
        assert_eq!(destinations.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_keeps_filter_verdict() {
        let destinations = InMemoryDestinations::new();
        let destination = DestinationConfig::topic(TOPIC_ARN).with_filter(S3KeyFilter::suffix("json"));

        let result = dispatcher(&destinations)
            .dispatch(&destination, &request("test-file.gz"), true)
            .await
            .unwrap();

        assert!(!result.sent);
    }

    #[tokio::test]
    async fn test_publish_to_topic_and_direct_targets() {
        let destinations = InMemoryDestinations::new();
        let dispatcher = dispatcher(&destinations);

        dispatcher
            .dispatch(&DestinationConfig::topic(TOPIC_ARN), &request("a"), false)
            .await
            .unwrap();
        dispatcher
            .dispatch(
                &DestinationConfig::direct(DirectTargetKind::TargetArn, "arn:aws:sns:endpoint"),
                &request("b"),
                false,
            )
            .await
            .unwrap();

        let published = destinations.topics.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].target, PublishTarget::Topic(TOPIC_ARN.to_string()));
        assert_eq!(published[0].subject, "Amazon S3 Notification");
        assert_eq!(
            published[1].target,
            PublishTarget::Target("arn:aws:sns:endpoint".to_string())
        );
    }

    #[tokio::test]
    async fn test_invoke_function() {
        let destinations = InMemoryDestinations::new();
        let arn = "arn:aws:lambda:us-east-1:0:function:handler";

        let result = dispatcher(&destinations)
            .dispatch(&DestinationConfig::function(arn), &request("k.json"), false)
            .await
            .unwrap();

        assert_eq!(
            result.response,
            Some(ProviderResponse::Invoked {
                status_code: 202,
                function_error: None
            })
        );
        let invocations = destinations.functions.invocations();
        assert_eq!(invocations[0].function_arn, arn);
        let payload = S3EventMessage::from_json(&invocations[0].payload).unwrap();
        assert_eq!(payload.records[0].s3.bucket.name, "s3events-test");
    }

    #[tokio::test]
    async fn test_queue_resolution_failure_is_distinct() {
        let destinations = InMemoryDestinations::new();

        let err = dispatcher(&destinations)
            .dispatch(&DestinationConfig::queue(QUEUE_ARN), &request("k"), false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::QueueResolution { .. }));
        assert_eq!(destinations.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let destinations = InMemoryDestinations::new();
        destinations.topics.fail_target(TOPIC_ARN);

        let err = dispatcher(&destinations)
            .dispatch(&DestinationConfig::topic(TOPIC_ARN), &request("k"), false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Provider { .. }));
    }

    #[tokio::test]
    async fn test_queue_send_failure_names_queue_arn() {
        let destinations = InMemoryDestinations::new();
        destinations.queues.fail_queue(QUEUE_ARN);

        let err = dispatcher(&destinations)
            .dispatch(&DestinationConfig::queue(QUEUE_ARN), &request("k"), false)
            .await
            .unwrap_err();

        match err {
            Error::Provider { target, .. } => assert_eq!(target, QUEUE_ARN),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(destinations.queues.resolutions(), 1);
        assert!(destinations.queues.messages(QUEUE_ARN).is_empty());
    }

    #[tokio::test]
    async fn test_last_rule_wins_semantics() {
        let destinations = InMemoryDestinations::new();
        let destination = DestinationConfig::topic(TOPIC_ARN)
            .with_filter(S3KeyFilter::prefix("logs/").with_suffix(".json"));
        let request = request("data/app.json");

        let strict = dispatcher(&destinations)
            .dispatch(&destination, &request, true)
            .await
            .unwrap();
        assert!(!strict.sent);

        let lenient = dispatcher(&destinations)
            .with_semantics(FilterSemantics::LastRuleWins)
            .dispatch(&destination, &request, true)
            .await
            .unwrap();
        assert!(lenient.sent);
    }
}
