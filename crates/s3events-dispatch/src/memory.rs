//! In-memory providers
//!
//! Record every call so tests can assert on what was (or was not) sent.

use crate::client::{
    DestinationClients, FunctionInvoker, ProviderResponse, PublishTarget, QueueSender,
    TopicPublisher,
};
use crate::driver::{NotificationConfigSource, ObjectLister, ObjectPage};
use async_trait::async_trait;
use parking_lot::Mutex;
use s3events_core::types::{NotificationConfiguration, StorageObjectRef};
use s3events_core::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Destinations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub target: PublishTarget,
    pub subject: String,
    pub message: String,
}

/// SNS stand-in
#[derive(Default)]
pub struct InMemoryTopics {
    published: Mutex<Vec<PublishedMessage>>,
    failing: Mutex<HashSet<String>>,
}

impl InMemoryTopics {
    /// Make every publish to `target` fail
    pub fn fail_target(&self, target: impl Into<String>) {
        self.failing.lock().insert(target.into());
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().clone()
    }
}

#[async_trait]
impl TopicPublisher for InMemoryTopics {
    async fn publish(
        &self,
        target: &PublishTarget,
        subject: &str,
        message: &str,
    ) -> Result<ProviderResponse> {
        if self.failing.lock().contains(target.as_str()) {
            return Err(Error::provider(target.as_str(), "publish rejected"));
        }

        let mut published = self.published.lock();
        published.push(PublishedMessage {
            target: target.clone(),
            subject: subject.to_string(),
            message: message.to_string(),
        });

        Ok(ProviderResponse::Published {
            message_id: Some(format!("msg-{}", published.len())),
        })
    }
}

/// SQS stand-in; queues must be created before they resolve
#[derive(Default)]
pub struct InMemoryQueues {
    urls: Mutex<HashMap<String, String>>,
    messages: Mutex<HashMap<String, Vec<String>>>,
    failing: Mutex<HashSet<String>>,
    resolutions: AtomicUsize,
}

impl InMemoryQueues {
    /// Register a queue ARN and return its URL
    pub fn create_queue(&self, queue_arn: &str) -> String {
        let name = queue_arn.rsplit(':').next().unwrap_or(queue_arn);
        let url = format!("https://sqs.local/{}", name);
        self.urls.lock().insert(queue_arn.to_string(), url.clone());
        url
    }

    /// Create the queue and make every send to it fail
    pub fn fail_queue(&self, queue_arn: &str) {
        let url = self.create_queue(queue_arn);
        self.failing.lock().insert(url);
    }

    /// Messages sent to the queue behind `queue_arn`
    pub fn messages(&self, queue_arn: &str) -> Vec<String> {
        let url = match self.urls.lock().get(queue_arn) {
            Some(url) => url.clone(),
            None => return Vec::new(),
        };
        self.messages.lock().get(&url).cloned().unwrap_or_default()
    }

    pub fn total_messages(&self) -> usize {
        self.messages.lock().values().map(Vec::len).sum()
    }

    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueSender for InMemoryQueues {
    async fn resolve_queue_url(&self, queue_arn: &str) -> Result<String> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        self.urls
            .lock()
            .get(queue_arn)
            .cloned()
            .ok_or_else(|| Error::queue_resolution(queue_arn, "queue does not exist"))
    }

    async fn send_message(&self, queue_url: &str, body: &str) -> Result<ProviderResponse> {
        if self.failing.lock().contains(queue_url) {
            return Err(Error::provider(queue_url, "send rejected"));
        }

        let mut messages = self.messages.lock();
        let queue = messages.entry(queue_url.to_string()).or_default();
        queue.push(body.to_string());

        Ok(ProviderResponse::Enqueued {
            message_id: Some(format!("{}#{}", queue_url, queue.len())),
            md5_of_body: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub function_arn: String,
    pub payload: String,
}

/// Lambda stand-in
#[derive(Default)]
pub struct InMemoryFunctions {
    invocations: Mutex<Vec<Invocation>>,
}

impl InMemoryFunctions {
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }
}

#[async_trait]
impl FunctionInvoker for InMemoryFunctions {
    async fn invoke(&self, function_arn: &str, payload: &str) -> Result<ProviderResponse> {
        self.invocations.lock().push(Invocation {
            function_arn: function_arn.to_string(),
            payload: payload.to_string(),
        });

        Ok(ProviderResponse::Invoked {
            status_code: 202,
            function_error: None,
        })
    }
}

/// All three providers, shared with the dispatcher
#[derive(Clone, Default)]
pub struct InMemoryDestinations {
    pub topics: Arc<InMemoryTopics>,
    pub queues: Arc<InMemoryQueues>,
    pub functions: Arc<InMemoryFunctions>,
}

impl InMemoryDestinations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clients(&self) -> DestinationClients {
        DestinationClients::new(
            self.topics.clone(),
            self.queues.clone(),
            self.functions.clone(),
        )
    }

    /// Provider calls that reached a destination (resolutions excluded)
    pub fn total_calls(&self) -> usize {
        self.topics.published().len()
            + self.queues.total_messages()
            + self.functions.invocations().len()
    }
}

// ============================================================================
// Sources
// ============================================================================

/// Bucket listing over a fixed set of objects, paginated like ListObjectsV2
pub struct InMemoryLister {
    buckets: HashMap<String, Vec<StorageObjectRef>>,
    page_size: usize,
    calls: AtomicUsize,
}

impl InMemoryLister {
    pub fn new(page_size: usize) -> Self {
        Self {
            buckets: HashMap::new(),
            page_size: page_size.max(1),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_objects(
        mut self,
        bucket: &str,
        objects: impl IntoIterator<Item = StorageObjectRef>,
    ) -> Self {
        self.buckets
            .entry(bucket.to_string())
            .or_default()
            .extend(objects);
        self
    }

    /// Number of pages requested so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectLister for InMemoryLister {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let objects = self
            .buckets
            .get(bucket)
            .ok_or_else(|| Error::Enumeration {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
                message: "NoSuchBucket".to_string(),
            })?;

        let start = match continuation_token {
            Some(token) => token.parse::<usize>().map_err(|_| Error::Enumeration {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
                message: format!("invalid continuation token {}", token),
            })?,
            None => 0,
        };

        let matching: Vec<&StorageObjectRef> = objects
            .iter()
            .filter(|o| o.key.starts_with(prefix))
            .collect();
        let end = (start + self.page_size).min(matching.len());
        let page = matching
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|o| (*o).clone())
            .collect();

        Ok(ObjectPage {
            objects: page,
            next_continuation_token: (end < matching.len()).then(|| end.to_string()),
        })
    }
}

/// Notification configuration fixed at construction
pub struct StaticConfigSource(pub NotificationConfiguration);

#[async_trait]
impl NotificationConfigSource for StaticConfigSource {
    async fn load(&self, _bucket: &str) -> Result<NotificationConfiguration> {
        Ok(self.0.clone())
    }
}
