//! s3events - replay S3 event notifications
//!
//! Sends `ObjectCreated`/`ObjectRemoved` events for objects that already
//! exist in a bucket to SNS topics, SQS queues and Lambda functions.

mod aws;
mod commands;
mod config;
mod progress;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use commands::notify::NotifyTarget;
use commands::CommandContext;
use config::{Config, LogFormat};
use s3events_core::types::{DestinationConfig, DirectTargetKind, EventType, FilterSemantics};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "s3events")]
#[command(version = s3events_core::VERSION)]
#[command(about = "Replay S3 event notifications for existing objects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration profile
    #[arg(long, global = true, env = "S3EVENTS_PROFILE")]
    profile: Option<String>,

    /// AWS region
    #[arg(long, global = true)]
    region: Option<String>,

    /// Custom endpoint URL (LocalStack, MinIO, ...)
    #[arg(long, global = true)]
    endpoint_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Objects dispatched concurrently per batch
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Keep going after failed dispatches
    #[arg(long, global = true)]
    no_fail_fast: bool,

    /// How multiple filter rules combine (all-rules, last-rule-wins)
    #[arg(long, global = true)]
    filter_semantics: Option<FilterSemantics>,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay to every destination configured on the bucket
    NotifyAll {
        /// ObjectCreated:*, ObjectRemoved:* or ReducedRedundancyLostObject
        event: EventType,
        /// s3://bucket/prefix or bucket/prefix
        s3_path: String,
        /// Report what would be sent without sending
        #[arg(long)]
        dryrun: bool,
    },

    /// Replay to an SNS topic, target ARN or phone number
    NotifySns {
        event: EventType,
        /// topicArn, targetArn or phoneNum
        target: DirectTargetKind,
        /// Topic ARN, target ARN or phone number
        destination: String,
        s3_path: String,
        /// Only objects whose key ends with this suffix
        #[arg(long)]
        suffix: Option<String>,
        #[arg(long)]
        dryrun: bool,
    },

    /// Replay to an SQS queue
    NotifySqs {
        event: EventType,
        queue_arn: String,
        s3_path: String,
        #[arg(long)]
        suffix: Option<String>,
        #[arg(long)]
        dryrun: bool,
    },

    /// Replay to a Lambda function
    NotifyLambda {
        event: EventType,
        function_arn: String,
        s3_path: String,
        #[arg(long)]
        suffix: Option<String>,
        #[arg(long)]
        dryrun: bool,
    },

    /// Show the notification configuration of a bucket
    ShowConfig {
        /// Bucket name or s3://bucket
        bucket: String,
    },

    /// Manage configuration
    Configure {
        #[command(subcommand)]
        action: Option<ConfigureAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigureAction {
    /// Set a configuration value
    Set { key: String, value: String },
    /// Get a configuration value
    Get { key: String },
    /// List all configuration values
    List,
    /// Add a new profile
    AddProfile { name: String },
    /// Remove a profile
    RemoveProfile { name: String },
}

impl Cli {
    /// Command-line flags win over the file and the environment
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(region) = &self.region {
            config.region = Some(region.clone());
        }
        if let Some(endpoint) = &self.endpoint_url {
            config.endpoint = Some(endpoint.clone());
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if self.no_fail_fast {
            config.fail_fast = false;
        }
        if let Some(semantics) = self.filter_semantics {
            config.filter_semantics = semantics;
        }
        if let Some(log_format) = self.log_format {
            config.log_format = log_format;
        }
        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone();
        } else if self.verbose {
            config.log_level = "debug".to_string();
        } else if self.quiet {
            config.log_level = "error".to_string();
        }
    }
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load(cli.profile.as_deref())?;
    cli.apply_overrides(&mut config);
    init_tracing(&config);

    let ctx = CommandContext {
        config,
        profile: cli.profile.clone(),
        output_format: cli.output,
        quiet: cli.quiet,
    };

    let result = run(&ctx, cli.command).await;
    if let Err(e) = &result {
        tracing::debug!("Command failed: {:?}", e);
    }
    result
}

async fn run(ctx: &CommandContext, command: Commands) -> Result<()> {
    match command {
        Commands::NotifyAll {
            event,
            s3_path,
            dryrun,
        } => commands::notify::execute(ctx, event, NotifyTarget::All, &s3_path, dryrun).await,

        Commands::NotifySns {
            event,
            target,
            destination,
            s3_path,
            suffix,
            dryrun,
        } => {
            let target = NotifyTarget::One {
                destination: DestinationConfig::direct(target, destination),
                suffix,
            };
            commands::notify::execute(ctx, event, target, &s3_path, dryrun).await
        }

        Commands::NotifySqs {
            event,
            queue_arn,
            s3_path,
            suffix,
            dryrun,
        } => {
            let target = NotifyTarget::One {
                destination: DestinationConfig::queue(queue_arn),
                suffix,
            };
            commands::notify::execute(ctx, event, target, &s3_path, dryrun).await
        }

        Commands::NotifyLambda {
            event,
            function_arn,
            s3_path,
            suffix,
            dryrun,
        } => {
            let target = NotifyTarget::One {
                destination: DestinationConfig::function(function_arn),
                suffix,
            };
            commands::notify::execute(ctx, event, target, &s3_path, dryrun).await
        }

        Commands::ShowConfig { bucket } => commands::show_config::execute(ctx, &bucket).await,

        Commands::Configure { action } => commands::configure::execute(ctx, action).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_notify_sns() {
        let cli = Cli::try_parse_from([
            "s3events",
            "notify-sns",
            "ObjectCreated:*",
            "phoneNum",
            "+15550100",
            "s3://bucket/logs/",
            "--suffix",
            ".json",
            "--dryrun",
        ])
        .unwrap();

        match cli.command {
            Commands::NotifySns {
                event,
                target,
                destination,
                suffix,
                dryrun,
                ..
            } => {
                assert_eq!(event, EventType::ObjectCreated);
                assert_eq!(target, DirectTargetKind::PhoneNumber);
                assert_eq!(destination, "+15550100");
                assert_eq!(suffix.as_deref(), Some(".json"));
                assert!(dryrun);
            }
            _ => panic!("expected notify-sns"),
        }
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let result = Cli::try_parse_from(["s3events", "notify-all", "ObjectTouched", "bucket"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "s3events",
            "--batch-size",
            "5",
            "--no-fail-fast",
            "--filter-semantics",
            "last-rule-wins",
            "--verbose",
            "show-config",
            "bucket",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.batch_size, 5);
        assert!(!config.fail_fast);
        assert_eq!(config.filter_semantics, FilterSemantics::LastRuleWins);
        assert_eq!(config.log_level, "debug");
    }
}
