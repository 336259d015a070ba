//! Replay driver
//!
//! Walks every object under a prefix and fans each one out, `batch_size`
//! objects at a time. A batch is joined completely before the next starts.

use crate::dispatcher::{DispatchRequest, Dispatcher};
use crate::driver::{NotificationConfigSource, ObjectLister, ObjectPages};
use crate::fanout::DispatchOutcome;
use futures::future::join_all;
use s3events_core::types::{DestinationConfig, EventType, S3KeyFilter, S3Path};
use s3events_core::{Error, Result, DEFAULT_BATCH_SIZE};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Replay options
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Objects in flight at once
    pub batch_size: usize,
    /// Stop after the first batch containing a failed dispatch
    pub fail_fast: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            fail_fast: true,
        }
    }
}

/// Counters of a replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub objects_scanned: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcomes: &[DispatchOutcome]) {
        for outcome in outcomes {
            match &outcome.result {
                Ok(result) if result.sent => self.sent += 1,
                Ok(_) => self.skipped += 1,
                Err(_) => self.failed += 1,
            }
        }
    }
}

/// Receives per-object outcomes as batches settle
pub trait ReplayObserver: Send {
    fn on_object(&mut self, request: &DispatchRequest, outcomes: &[DispatchOutcome]);

    fn on_batch(&mut self, _summary: &RunSummary) {}
}

/// Observer that ignores everything
pub struct NoopObserver;

impl ReplayObserver for NoopObserver {
    fn on_object(&mut self, _request: &DispatchRequest, _outcomes: &[DispatchOutcome]) {}
}

/// Replays events for existing objects
pub struct Replayer {
    lister: Arc<dyn ObjectLister>,
    dispatcher: Arc<Dispatcher>,
    options: ReplayOptions,
}

impl Replayer {
    pub fn new(lister: Arc<dyn ObjectLister>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            lister,
            dispatcher,
            options: ReplayOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReplayOptions) -> Self {
        self.options = options;
        self
    }

    /// Replay to every destination registered on the bucket
    pub async fn notify_all(
        &self,
        source: &dyn NotificationConfigSource,
        event_type: EventType,
        s3_path: &str,
        dry_run: bool,
        observer: &mut dyn ReplayObserver,
    ) -> Result<RunSummary> {
        let path = S3Path::parse(s3_path)?;
        let config = source.load(&path.bucket).await?;
        let destinations = config.destinations();

        info!(
            "Replaying {} for {} to {} destination(s)",
            event_type,
            path,
            destinations.len()
        );

        self.replay(event_type, &path, &destinations, dry_run, observer)
            .await
    }

    /// Replay to a single destination, optionally restricted to a key suffix
    pub async fn notify_one(
        &self,
        event_type: EventType,
        destination: DestinationConfig,
        s3_path: &str,
        suffix: Option<&str>,
        dry_run: bool,
        observer: &mut dyn ReplayObserver,
    ) -> Result<RunSummary> {
        let path = S3Path::parse(s3_path)?;
        let filter = match suffix {
            Some(suffix) => S3KeyFilter::suffix(suffix),
            None => S3KeyFilter::none(),
        };
        let destinations = [destination.with_filter(filter)];

        info!(
            "Replaying {} for {} to {}",
            event_type,
            path,
            destinations[0].target()
        );

        self.replay(event_type, &path, &destinations, dry_run, observer)
            .await
    }

    /// Fan out every object under `path` to `destinations`
    pub async fn replay(
        &self,
        event_type: EventType,
        path: &S3Path,
        destinations: &[DestinationConfig],
        dry_run: bool,
        observer: &mut dyn ReplayObserver,
    ) -> Result<RunSummary> {
        let batch_size = self.options.batch_size.max(1);
        let mut summary = RunSummary::default();
        let mut pages = ObjectPages::new(self.lister.clone(), path.clone());

        while let Some(objects) = pages.next_page().await? {
            for batch in objects.chunks(batch_size) {
                let fan_outs = batch.iter().map(move |object| async move {
                    let request = DispatchRequest::new(&path.bucket, event_type, object.clone());
                    let outcomes = self
                        .dispatcher
                        .dispatch_to_all(&request, destinations, dry_run)
                        .await;
                    (request, outcomes)
                });
                let settled = join_all(fan_outs).await;

                let failed_before = summary.failed;
                for (request, outcomes) in &settled {
                    summary.record(outcomes);
                    observer.on_object(request, outcomes);
                }
                summary.objects_scanned += batch.len();
                observer.on_batch(&summary);

                let failed = summary.failed - failed_before;
                if failed > 0 && self.options.fail_fast {
                    error!(
                        "Stopping replay of {} after {} object(s): {} dispatch(es) failed",
                        path, summary.objects_scanned, failed
                    );
                    return Err(Error::DispatchFailed { failed });
                }
            }

            debug!("Scanned {} object(s) so far", summary.objects_scanned);
        }

        info!(
            "Replay of {} done: {} scanned, {} sent, {} skipped, {} failed",
            path, summary.objects_scanned, summary.sent, summary.skipped, summary.failed
        );

        Ok(summary)
    }
}
