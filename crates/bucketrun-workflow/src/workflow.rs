//! The bucket lifecycle and object exchange workflow.
//!
//! A run walks a fixed sequence of states:
//!
//! ```text
//! Init -> ClientReady -> BucketsListed -> BucketCreated -> ObjectWritten
//!      -> ObjectsListed -> ObjectRead -> [BucketTornDown] -> Done
//! ```
//!
//! Only client construction can abort a run. Every later step records a
//! [`StepReport`] and the run moves on, so one failed call never hides the
//! outcome of the steps after it.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use bucketrun_core::{BucketrunError, BucketrunResult, Guest, Record, StorageConfig};
use bucketrun_storage::{
    BucketSummary, ClientFactory, CreateOutcome, Fetched, Reclaim, StorageClient,
};
use tracing::{error, info, instrument, warn};
use typed_builder::TypedBuilder;

use crate::notify::{Notifier, load_payload};

/// Payload handed to the notifier when no other path is configured.
pub const DEFAULT_PAYLOAD_PATH: &str = "services/test.txt";

/// Position of a run in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    /// The run has started; no storage call has been made.
    Init,
    /// A storage client exists for the configured zone.
    ClientReady,
    /// Buckets were listed and a leftover target bucket reclaimed.
    BucketsListed,
    /// The target bucket was created or already owned.
    BucketCreated,
    /// The record was written.
    ObjectWritten,
    /// Objects under the configured path were listed.
    ObjectsListed,
    /// The record was read back.
    ObjectRead,
    /// The target bucket was emptied and deleted.
    BucketTornDown,
    /// The notifier received the payload.
    Done,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::ClientReady => "client_ready",
            Self::BucketsListed => "buckets_listed",
            Self::BucketCreated => "bucket_created",
            Self::ObjectWritten => "object_written",
            Self::ObjectsListed => "objects_listed",
            Self::ObjectRead => "object_read",
            Self::BucketTornDown => "bucket_torn_down",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// How a single step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step did what it set out to do.
    Succeeded,
    /// The backend reported a condition that leaves the desired state in place.
    Benign(String),
    /// The bucket or key the step needed does not exist.
    NotFound,
    /// The step failed; the run continued anyway.
    Failed(String),
}

impl StepOutcome {
    /// Whether the step failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    fn failed(err: &BucketrunError) -> Self {
        Self::Failed(err.to_string())
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("succeeded"),
            Self::Benign(msg) => write!(f, "benign: {msg}"),
            Self::NotFound => f.write_str("not found"),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// State the step was trying to reach.
    pub state: WorkflowState,
    /// How it ended.
    pub outcome: StepOutcome,
}

/// Everything a completed run observed.
#[derive(Debug, Clone, Default)]
pub struct WorkflowReport {
    /// Step outcomes in execution order.
    pub steps: Vec<StepReport>,
    /// Buckets seen by the listing step.
    pub buckets: Vec<BucketSummary>,
    /// Keys seen by the object listing step.
    pub object_keys: Vec<String>,
    /// Record read back from storage.
    pub fetched: Option<Guest>,
    /// Whether the payload was handed to the notifier.
    pub notified: bool,
}

impl WorkflowReport {
    /// Outcome recorded for `state`, if the step ran.
    #[must_use]
    pub fn outcome(&self, state: WorkflowState) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|step| step.state == state)
            .map(|step| &step.outcome)
    }

    /// Steps that failed.
    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|step| step.outcome.is_failure())
    }

    /// States visited, in order.
    #[must_use]
    pub fn states(&self) -> Vec<WorkflowState> {
        self.steps.iter().map(|step| step.state).collect()
    }

    fn record(&mut self, state: WorkflowState, outcome: StepOutcome) {
        match &outcome {
            StepOutcome::Failed(_) => warn!(%state, %outcome, "workflow step failed"),
            _ => info!(%state, %outcome, "workflow step finished"),
        }
        self.steps.push(StepReport { state, outcome });
    }
}

/// Run-time knobs for [`Workflow`].
///
/// # Examples
///
/// ```
/// use bucketrun_workflow::WorkflowSettings;
///
/// let settings = WorkflowSettings::builder().teardown(true).build();
/// assert!(settings.reclaim_existing);
/// assert_eq!(settings.record.name, "Solomon");
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct WorkflowSettings {
    /// Record written and read back.
    #[builder(default = default_guest())]
    pub record: Guest,

    /// Reclaim a leftover target bucket before creating it.
    #[builder(default = true)]
    pub reclaim_existing: bool,

    /// Empty and delete the target bucket after the read.
    #[builder(default = false)]
    pub teardown: bool,

    /// File whose content is handed to the notifier.
    #[builder(default = PathBuf::from(DEFAULT_PAYLOAD_PATH), setter(into))]
    pub payload_path: PathBuf,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_guest() -> Guest {
    Guest::new(
        "Solomon",
        true,
        "Phill's Cocktail",
        "100 Test Rd. Dothan, AL 36303",
        "Good Luck",
    )
}

/// Sequences bucket, object and notification steps for one configuration.
pub struct Workflow<F> {
    config: StorageConfig,
    factory: F,
    notifier: Arc<dyn Notifier>,
    settings: WorkflowSettings,
}

impl<F> fmt::Debug for Workflow<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("config", &self.config)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<F: ClientFactory> Workflow<F> {
    /// Assemble a workflow from its collaborators.
    pub fn new(
        config: StorageConfig,
        factory: F,
        notifier: Arc<dyn Notifier>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            config,
            factory,
            notifier,
            settings,
        }
    }

    /// Configuration the workflow runs against.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Run every step once.
    ///
    /// # Errors
    ///
    /// Returns the factory's error if no storage client can be built. Failures
    /// of later steps are recorded in the report instead.
    #[instrument(skip_all, fields(zone = %self.config.zone(), bucket = %self.config.bucket()))]
    pub async fn run(&self) -> BucketrunResult<WorkflowReport> {
        let mut report = WorkflowReport::default();
        report.record(WorkflowState::Init, StepOutcome::Succeeded);

        let client = self.factory.new_client(&self.config).await.inspect_err(|e| {
            error!(error = %e, "unable to build storage client, aborting");
        })?;
        report.record(WorkflowState::ClientReady, StepOutcome::Succeeded);

        self.list_buckets(&client, &mut report).await;
        self.create_bucket(&client, &mut report).await;
        self.write_object(&client, &mut report).await;
        self.list_objects(&client, &mut report).await;
        self.read_object(&client, &mut report).await;
        if self.settings.teardown {
            self.tear_down(&client, &mut report).await;
        }

        let content = load_payload(&self.settings.payload_path).await;
        self.notifier.notify(content).await;
        report.notified = true;
        report.record(WorkflowState::Done, StepOutcome::Succeeded);

        info!(failures = report.failures().count(), "workflow finished");
        Ok(report)
    }

    async fn list_buckets(&self, client: &StorageClient, report: &mut WorkflowReport) {
        let buckets = client.buckets();

        let outcome = if self.settings.reclaim_existing {
            match buckets.list_and_reclaim(self.config.bucket()).await {
                Ok(inventory) => {
                    report.buckets = inventory.buckets;
                    match inventory.reclaim {
                        Reclaim::Absent => StepOutcome::Succeeded,
                        Reclaim::Reclaimed { objects_removed } => {
                            info!(objects_removed, "leftover bucket reclaimed");
                            StepOutcome::Succeeded
                        }
                        Reclaim::Failed { error } => {
                            StepOutcome::Failed(format!("unable to reclaim bucket: {error}"))
                        }
                    }
                }
                Err(e) => StepOutcome::failed(&e),
            }
        } else {
            match buckets.list_buckets().await {
                Ok(listed) => {
                    report.buckets = listed;
                    StepOutcome::Succeeded
                }
                Err(e) => StepOutcome::failed(&e),
            }
        };

        report.record(WorkflowState::BucketsListed, outcome);
    }

    async fn create_bucket(&self, client: &StorageClient, report: &mut WorkflowReport) {
        let outcome = match client.buckets().create_bucket(self.config.bucket()).await {
            Ok(CreateOutcome::Created) => StepOutcome::Succeeded,
            Ok(CreateOutcome::AlreadyOwned) => {
                StepOutcome::Benign("bucket already owned by caller".to_owned())
            }
            Err(e) => StepOutcome::failed(&e),
        };
        report.record(WorkflowState::BucketCreated, outcome);
    }

    async fn write_object(&self, client: &StorageClient, report: &mut WorkflowReport) {
        let outcome = match client
            .objects()
            .put(self.config.bucket(), &self.settings.record)
            .await
        {
            Ok(_) => StepOutcome::Succeeded,
            Err(e) => StepOutcome::failed(&e),
        };
        report.record(WorkflowState::ObjectWritten, outcome);
    }

    async fn list_objects(&self, client: &StorageClient, report: &mut WorkflowReport) {
        let outcome = match client.objects().list(self.config.bucket()).await {
            Ok(Fetched::Found(objects)) => {
                report.object_keys = objects.into_iter().map(|o| o.key).collect();
                StepOutcome::Succeeded
            }
            Ok(Fetched::NotFound) => StepOutcome::NotFound,
            Err(e) => StepOutcome::failed(&e),
        };
        report.record(WorkflowState::ObjectsListed, outcome);
    }

    async fn read_object(&self, client: &StorageClient, report: &mut WorkflowReport) {
        let key = self.settings.record.key();
        let outcome = match client
            .objects()
            .get::<Guest>(self.config.bucket(), key)
            .await
        {
            Ok(Fetched::Found(guest)) => {
                info!(
                    name = %guest.name,
                    attending = guest.attending,
                    cocktail = %guest.cocktail,
                    "record read back",
                );
                report.fetched = Some(guest);
                StepOutcome::Succeeded
            }
            Ok(Fetched::NotFound) => StepOutcome::NotFound,
            Err(e) => StepOutcome::failed(&e),
        };
        report.record(WorkflowState::ObjectRead, outcome);
    }

    async fn tear_down(&self, client: &StorageClient, report: &mut WorkflowReport) {
        let outcome = match client.buckets().reclaim_bucket(self.config.bucket()).await {
            Ok(objects_removed) => {
                info!(objects_removed, "bucket torn down");
                StepOutcome::Succeeded
            }
            Err(e) if e.backend_kind().is_some_and(|kind| kind.is_not_found()) => {
                StepOutcome::NotFound
            }
            Err(e) => StepOutcome::failed(&e),
        };
        report.record(WorkflowState::BucketTornDown, outcome);
    }
}
