//! AWS Lambda entrypoint for the bucketrun workflow.
//!
//! Each invocation resolves the storage configuration from the environment,
//! runs the workflow once against S3 and logs a summary. The event payload is
//! ignored.

mod settings;

use std::sync::Arc;

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use bucketrun_core::StorageConfig;
use bucketrun_storage::S3ClientFactory;
use bucketrun_workflow::{LogNotifier, Notifier, SesNotifier, Workflow};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::settings::AppSettings;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = AppSettings::from_env();
    init_tracing(&settings.log_level)?;

    info!(version = env!("CARGO_PKG_VERSION"), "starting bucketrun lambda");

    lambda_runtime::run(service_fn(handle)).await
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence over `LOG_LEVEL`. Output is JSON so CloudWatch
/// keeps structured fields.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

async fn handle(_event: LambdaEvent<serde_json::Value>) -> Result<(), Error> {
    let config = StorageConfig::from_env()?;
    let settings = AppSettings::from_env();

    info!(
        zone = %config.zone(),
        bucket = %config.bucket(),
        content_type = %config.content_type(),
        path = %config.path(),
        "storage configuration resolved",
    );

    let notifier = build_notifier(&settings).await;
    let workflow = Workflow::new(
        config,
        S3ClientFactory::new(settings.connect),
        notifier,
        settings.workflow,
    );

    let report = workflow.run().await?;

    for step in report.failures() {
        warn!(state = %step.state, outcome = %step.outcome, "step did not complete");
    }
    info!(
        steps = report.steps.len(),
        failures = report.failures().count(),
        buckets = report.buckets.len(),
        objects = report.object_keys.len(),
        fetched = report.fetched.is_some(),
        notified = report.notified,
        "invocation finished",
    );

    Ok(())
}

async fn build_notifier(settings: &AppSettings) -> Arc<dyn Notifier> {
    let Some(target) = &settings.notify else {
        return Arc::new(LogNotifier);
    };

    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let mut notifier = SesNotifier::new(
        aws_sdk_ses::Client::new(&sdk_config),
        target.from.clone(),
        target.to.clone(),
    );
    if let Some(subject) = &target.subject {
        notifier = notifier.with_subject(subject.clone());
    }
    Arc::new(notifier)
}
