//! show-config command - print a bucket's notification destinations

use super::CommandContext;
use crate::aws::AwsClients;
use anyhow::{Context, Result};
use colored::Colorize;
use s3events_core::types::{DestinationKind, NotificationConfiguration, S3Path};
use s3events_dispatch::NotificationConfigSource;

pub async fn execute(ctx: &CommandContext, bucket: &str) -> Result<()> {
    let path = S3Path::parse(bucket)?;

    let aws = AwsClients::load(&ctx.config).await;
    let config = aws
        .config_source()
        .load(&path.bucket)
        .await
        .with_context(|| format!("Failed to load notification configuration of {}", path.bucket))?;

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    for line in render(&config) {
        println!("{}", line);
    }

    Ok(())
}

/// Destinations grouped by service, one `- <arn> <rules>` line each.
/// Services without destinations are left out.
pub fn render(config: &NotificationConfiguration) -> Vec<String> {
    let destinations = config.destinations();
    let mut lines = Vec::new();

    for kind in [
        DestinationKind::Topic,
        DestinationKind::Queue,
        DestinationKind::Function,
    ] {
        let group: Vec<_> = destinations.iter().filter(|d| d.kind() == kind).collect();
        if group.is_empty() {
            continue;
        }

        lines.push(format!("{}:", kind.service()).bold().to_string());

        for destination in group {
            let filter = destination.filter();
            if filter.is_empty() {
                lines.push(format!("  - {}", destination.target()));
            } else {
                lines.push(format!("  - {} {}", destination.target(), filter.to_string().cyan()));
            }
        }
    }

    lines
}
