//! Event replay engine
//!
//! Evaluates destination filters, builds S3 event envelopes and fans them
//! out to SNS topics, SQS queues and Lambda functions:
//! - [`Dispatcher`]: one object, one destination
//! - [`Dispatcher::dispatch_to_all`]: one object, every destination, concurrently
//! - [`Replayer`]: every object under a prefix, in bounded batches

mod client;
mod dispatcher;
mod driver;
mod fanout;
pub mod memory;
mod replay;

pub use client::{
    DestinationClients, FunctionInvoker, ProviderResponse, PublishTarget, QueueSender,
    TopicPublisher,
};
pub use dispatcher::{DispatchRequest, DispatchResult, Dispatcher};
pub use driver::{NotificationConfigSource, ObjectLister, ObjectPage, ObjectPages};
pub use fanout::DispatchOutcome;
pub use replay::{NoopObserver, ReplayObserver, ReplayOptions, Replayer, RunSummary};
