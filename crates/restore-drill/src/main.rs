//! restore-drill: backup restoration drills for Aurora clusters
//!
//! `run` executes one drill and prints its response envelope; `sweep` finds
//! test clusters left behind by drills that were killed before cleanup.

use anyhow::Result;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};
use restore_drill::aws::{AwsContext, FromAwsContext, RdsClient};
use restore_drill::config::{
    self, AwsConfig, DrillConfig, IdentityConfig, ReportingConfig, RuntimeFlags, TargetConfig,
    TimingConfig, VerificationConfig,
};
use restore_drill::orchestrator::{
    AwsReportingSink, CleanupPolicy, RestoreDrill, SweepConfig, TriggerEvent,
    resolve_cluster_identifier, results, sweep_orphans,
};
use restore_drill::ConfigError;
use restore_drill_common::defaults::{
    CLEANUP_RETRY_COOLDOWN, CLEANUP_SETTLE_DELAY, DEFAULT_ENVIRONMENT,
    DEFAULT_INSTANCE_WAIT_MINUTES, DEFAULT_MAX_WAIT_MINUTES, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_PROJECT_NAME, DEFAULT_REGION_NAME, DEFAULT_TEST_INSTANCE_CLASS,
};
use restore_drill_common::metrics::DEFAULT_NAMESPACE;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "restore-drill")]
#[command(about = "End-to-end backup restoration drills for Aurora clusters")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Settings shared by every command, each readable from the environment
#[derive(clap::Args, Debug)]
struct DrillArgs {
    /// Project name used in identifiers, tags and metric dimensions
    #[arg(long, env = "PROJECT_NAME", default_value = DEFAULT_PROJECT_NAME)]
    project_name: String,

    /// Environment name
    #[arg(long, env = "ENVIRONMENT", default_value = DEFAULT_ENVIRONMENT)]
    environment: String,

    /// Region label (not the AWS region)
    #[arg(long, env = "REGION_NAME", default_value = DEFAULT_REGION_NAME)]
    region_name: String,

    /// AWS region (default: SDK resolution)
    #[arg(long, env = "AWS_REGION")]
    aws_region: Option<String>,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    aws_profile: Option<String>,

    /// Default source cluster to test
    #[arg(long, env = "RDS_CLUSTER_IDENTIFIER")]
    rds_cluster_identifier: Option<String>,

    /// DB subnet group for the restored cluster
    #[arg(long, env = "DB_SUBNET_GROUP_NAME", default_value = "")]
    db_subnet_group_name: String,

    /// Comma-separated VPC security group IDs for the restored cluster
    #[arg(long, env = "VPC_SECURITY_GROUP_IDS", default_value = "")]
    vpc_security_group_ids: String,

    /// SNS topic for result notifications (none: skip notifications)
    #[arg(long, env = "SNS_TOPIC_ARN")]
    sns_topic_arn: Option<String>,

    /// JSON array of integrity queries to record
    #[arg(long, env = "TEST_QUERIES", default_value = "[]")]
    test_queries: String,

    /// Delete the test cluster when the drill ends
    #[arg(
        long,
        env = "CLEANUP_AFTER_TEST",
        default_value = "true",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    cleanup_after_test: bool,

    /// Minutes to wait for the restored cluster
    #[arg(long, env = "MAX_WAIT_MINUTES", default_value_t = DEFAULT_MAX_WAIT_MINUTES)]
    max_wait_minutes: u64,

    /// Minutes to wait for the test instance
    #[arg(long, env = "INSTANCE_WAIT_MINUTES", default_value_t = DEFAULT_INSTANCE_WAIT_MINUTES)]
    instance_wait_minutes: u64,

    /// Instance class of the test instance
    #[arg(long, env = "TEST_INSTANCE_CLASS", default_value = DEFAULT_TEST_INSTANCE_CLASS)]
    test_instance_class: String,

    /// Seconds between availability polls
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    poll_interval_secs: u64,

    /// CloudWatch namespace for drill metrics
    #[arg(long, env = "METRICS_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    metrics_namespace: String,
}

impl TryFrom<DrillArgs> for DrillConfig {
    type Error = ConfigError;

    fn try_from(args: DrillArgs) -> Result<Self, Self::Error> {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Ok(Self {
            identity: IdentityConfig {
                project: args.project_name,
                environment: args.environment,
                region_name: args.region_name,
            },
            aws: AwsConfig {
                region: non_blank(args.aws_region),
                aws_profile: args.aws_profile,
            },
            target: TargetConfig {
                cluster_identifier: non_blank(args.rds_cluster_identifier),
                subnet_group: args.db_subnet_group_name,
                security_group_ids: config::parse_id_list(&args.vpc_security_group_ids),
                instance_class: args.test_instance_class,
            },
            verification: VerificationConfig {
                test_queries: config::parse_test_queries(&args.test_queries)?,
            },
            reporting: ReportingConfig {
                sns_topic_arn: non_blank(args.sns_topic_arn),
                metrics_namespace: args.metrics_namespace,
            },
            timing: TimingConfig {
                cluster_wait: config::minutes("MAX_WAIT_MINUTES", args.max_wait_minutes)?,
                instance_wait: config::minutes("INSTANCE_WAIT_MINUTES", args.instance_wait_minutes)?,
                poll_interval: Duration::from_secs(args.poll_interval_secs),
                cleanup_settle: CLEANUP_SETTLE_DELAY,
                cleanup_retry_cooldown: CLEANUP_RETRY_COOLDOWN,
            },
            flags: RuntimeFlags {
                cleanup_after_test: args.cleanup_after_test,
            },
        })
    }
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    settings: DrillArgs,

    /// Trigger event JSON file, or `-` for stdin
    #[arg(long)]
    event: Option<String>,

    /// Source cluster to test (overrides the event and RDS_CLUSTER_IDENTIFIER)
    #[arg(long)]
    cluster_identifier: Option<String>,

    /// Write the result record as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct SweepArgs {
    #[command(flatten)]
    settings: DrillArgs,

    /// Minimum age in minutes before a test cluster counts as orphaned
    /// (default: cluster wait + instance wait)
    #[arg(long)]
    min_age_minutes: Option<u64>,

    /// Actually delete clusters (default is dry-run)
    #[arg(long)]
    execute: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one backup restoration drill
    Run(Box<RunArgs>),

    /// Find and delete test clusters orphaned by killed drills
    Sweep(Box<SweepArgs>),
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        // Reduce noise from AWS SDK (show only warnings and errors)
        .add_directive("aws_config=warn".parse()?)
        .add_directive("aws_sdk_rds=warn".parse()?)
        .add_directive("aws_smithy_runtime=warn".parse()?);

    // stdout carries the response envelope
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Returns whether the command succeeded.
async fn run() -> Result<bool> {
    let args = Args::parse();
    init_tracing()?;

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    match args.command {
        Command::Run(run_args) => handle_run(*run_args, cancel).await,
        Command::Sweep(sweep_args) => handle_sweep(*sweep_args, cancel).await,
    }
}

/// Handle the run command
async fn handle_run(args: RunArgs, cancel: CancellationToken) -> Result<bool> {
    let event = match &args.event {
        Some(path) => TriggerEvent::load(path)?,
        None => TriggerEvent::default(),
    };
    let config = DrillConfig::try_from(args.settings)?;
    config.validate_for_run()?;

    let source_cluster = resolve_cluster_identifier(
        args.cluster_identifier.as_deref(),
        &event,
        config.target.cluster_identifier.as_deref(),
    );

    info!(
        cluster_id = ?source_cluster,
        source = ?event.source,
        test_type = ?event.test_type,
        project = %config.identity.project,
        environment = %config.identity.environment,
        cleanup = config.flags.cleanup_after_test,
        "Starting backup restoration test"
    );

    let aws = load_aws(&config).await;
    let rds = RdsClient::from_context(&aws);
    let sink = AwsReportingSink::new(&aws, &config.reporting);

    let result = RestoreDrill::new(&rds, &sink, &config)
        .with_cancellation(cancel)
        .run(source_cluster.as_deref())
        .await;

    results::print_response(&result)?;
    results::print_summary(&result);
    if let Some(path) = &args.output {
        results::write_results(path, &result)?;
    }

    Ok(result.success)
}

async fn load_aws(config: &DrillConfig) -> AwsContext {
    let aws = AwsContext::with_profile(
        config.aws.region.as_deref(),
        config.aws.aws_profile.as_deref(),
    )
    .await;
    debug!(region = %aws.region(), profile = ?config.aws.aws_profile, "Loaded AWS configuration");
    aws
}

/// Handle the sweep command
async fn handle_sweep(args: SweepArgs, cancel: CancellationToken) -> Result<bool> {
    let config = DrillConfig::try_from(args.settings)?;
    config.validate()?;

    let sweep = SweepConfig {
        min_age: match args.min_age_minutes {
            Some(m) => config::minutes("--min-age-minutes", m)?,
            None => config.orphan_age(),
        },
        dry_run: !args.execute,
    };
    info!(
        project = %config.identity.project,
        min_age_minutes = sweep.min_age.as_secs() / 60,
        dry_run = sweep.dry_run,
        "Sweeping orphaned test clusters"
    );

    let aws = load_aws(&config).await;
    let rds = RdsClient::from_context(&aws);
    let policy = CleanupPolicy {
        settle_delay: config.timing.cleanup_settle,
        retry_cooldown: config.timing.cleanup_retry_cooldown,
    };

    let report = sweep_orphans(&rds, &config.identity, &sweep, policy, Some(&cancel)).await?;
    results::print_sweep_report(&report, sweep.dry_run);

    Ok(report.failed == 0)
}

fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping waits (cleanup still runs)");
        token.cancel();
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
