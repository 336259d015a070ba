//! Fan-out of one object to every destination

use crate::dispatcher::{DispatchRequest, DispatchResult, Dispatcher};
use futures::future::join_all;
use s3events_core::types::{DestinationConfig, DestinationKind};
use s3events_core::{Error, Result};
use std::collections::BTreeMap;
use tracing::warn;

/// Settled dispatch for one destination
#[derive(Debug)]
pub struct DispatchOutcome {
    pub kind: DestinationKind,
    pub target: String,
    pub result: Result<DispatchResult>,
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(&self.result, Ok(result) if result.sent)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(&self.result, Ok(result) if !result.sent)
    }

    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }
}

impl Dispatcher {
    /// Dispatch one object to every destination concurrently.
    ///
    /// Destinations are grouped by kind; all groups and all members start
    /// without waiting on each other. A failing destination is reported in
    /// its own outcome and does not affect its siblings.
    pub async fn dispatch_to_all(
        &self,
        request: &DispatchRequest,
        destinations: &[DestinationConfig],
        dry_run: bool,
    ) -> Vec<DispatchOutcome> {
        if destinations.is_empty() {
            return Vec::new();
        }

        let mut by_kind: BTreeMap<DestinationKind, Vec<&DestinationConfig>> = BTreeMap::new();
        for destination in destinations {
            by_kind.entry(destination.kind()).or_default().push(destination);
        }

        let groups = by_kind.into_values().map(move |group| {
            join_all(
                group
                    .into_iter()
                    .map(move |destination| self.dispatch_outcome(destination, request, dry_run)),
            )
        });

        join_all(groups).await.into_iter().flatten().collect()
    }

    async fn dispatch_outcome(
        &self,
        destination: &DestinationConfig,
        request: &DispatchRequest,
        dry_run: bool,
    ) -> DispatchOutcome {
        let result = self.dispatch(destination, request, dry_run).await;

        if let Err(e) = &result {
            warn!(
                "Failed to dispatch {} for {} to {}: {}",
                request.event_type,
                request.object.key,
                destination.target(),
                e
            );
        }

        DispatchOutcome {
            kind: destination.kind(),
            target: destination.target().to_string(),
            result,
        }
    }
}
