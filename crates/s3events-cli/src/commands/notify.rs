//! notify-* commands - replay events for existing objects

use super::CommandContext;
use crate::aws::AwsClients;
use crate::progress::{create_spinner, scan_message};
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::ProgressBar;
use s3events_core::types::{DestinationConfig, DestinationKind, EventType};
use s3events_dispatch::{
    DispatchOutcome, DispatchRequest, Dispatcher, ReplayObserver, ReplayOptions, Replayer,
    RunSummary,
};
use serde::Serialize;
use std::sync::Arc;

/// Where a replay sends its events
pub enum NotifyTarget {
    /// Every destination of the bucket's notification configuration
    All,
    /// One destination, optionally restricted to a key suffix
    One {
        destination: DestinationConfig,
        suffix: Option<String>,
    },
}

pub async fn execute(
    ctx: &CommandContext,
    event_type: EventType,
    target: NotifyTarget,
    s3_path: &str,
    dry_run: bool,
) -> Result<()> {
    ctx.config.validate()?;

    let aws = AwsClients::load(&ctx.config).await;
    let dispatcher = Dispatcher::new(aws.destination_clients())
        .with_semantics(ctx.config.filter_semantics);
    let replayer = Replayer::new(aws.lister(), Arc::new(dispatcher)).with_options(ReplayOptions {
        batch_size: ctx.config.batch_size,
        fail_fast: ctx.config.fail_fast,
    });

    let mut observer = ConsoleObserver::new(ctx, dry_run);

    let result = match target {
        NotifyTarget::All => {
            let source = aws.config_source();
            replayer
                .notify_all(&source, event_type, s3_path, dry_run, &mut observer)
                .await
        }
        NotifyTarget::One {
            destination,
            suffix,
        } => {
            replayer
                .notify_one(
                    event_type,
                    destination,
                    s3_path,
                    suffix.as_deref(),
                    dry_run,
                    &mut observer,
                )
                .await
        }
    };

    observer.finish();
    let summary = result.with_context(|| format!("Failed to replay {} for {}", event_type, s3_path))?;

    if ctx.is_json() {
        let report = JsonReport {
            event: event_type,
            path: s3_path,
            dry_run,
            summary,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        ctx.info(&format!(
            "Done. Scanned {} objects in prefix.",
            summary.objects_scanned
        ));
    }

    if summary.failed > 0 {
        anyhow::bail!("{} dispatch(es) failed", summary.failed);
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    event: EventType,
    path: &'a str,
    dry_run: bool,
    #[serde(flatten)]
    summary: RunSummary,
}

/// `[(dryrun) ]SNS: "<key>" -> "<target>"`
pub fn report_line(dry_run: bool, kind: DestinationKind, key: &str, target: &str) -> String {
    let line = format!("{}: \"{}\" -> \"{}\"", kind.service(), key, target);
    if dry_run {
        format!("(dryrun) {}", line)
    } else {
        line
    }
}

/// Prints one line per sent event and keeps a spinner going between batches
struct ConsoleObserver {
    dry_run: bool,
    print_lines: bool,
    spinner: Option<ProgressBar>,
}

impl ConsoleObserver {
    fn new(ctx: &CommandContext, dry_run: bool) -> Self {
        let print_lines = !ctx.quiet && !ctx.is_json();
        Self {
            dry_run,
            print_lines,
            spinner: print_lines.then(|| create_spinner("Listing objects...")),
        }
    }

    fn print(&self, line: String, to_stderr: bool) {
        let emit = || {
            if to_stderr {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        };

        match &self.spinner {
            Some(spinner) => spinner.suspend(emit),
            None => emit(),
        }
    }

    fn finish(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl ReplayObserver for ConsoleObserver {
    fn on_object(&mut self, request: &DispatchRequest, outcomes: &[DispatchOutcome]) {
        for outcome in outcomes {
            match &outcome.result {
                Ok(result) if result.sent && self.print_lines => {
                    let line = report_line(self.dry_run, outcome.kind, &request.object.key, &outcome.target);
                    self.print(line, false);
                }
                Ok(_) => {}
                Err(e) => {
                    let line = format!(
                        "{} {}: {}",
                        "failed:".red(),
                        report_line(false, outcome.kind, &request.object.key, &outcome.target),
                        e
                    );
                    self.print(line, true);
                }
            }
        }
    }

    fn on_batch(&mut self, summary: &RunSummary) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(scan_message(
                summary.objects_scanned,
                summary.sent,
                summary.failed,
            ));
        }
    }
}
