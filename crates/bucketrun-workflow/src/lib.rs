//! Workflow orchestration for bucketrun.
//!
//! [`Workflow`] drives one run against a storage backend: reclaim a leftover
//! bucket, create the target bucket, write a record, list and read it back,
//! then hand a payload to a [`Notifier`].

pub mod notify;
pub mod workflow;

pub use notify::{LogNotifier, Notifier, SesNotifier, load_payload};
pub use workflow::{
    DEFAULT_PAYLOAD_PATH, StepOutcome, StepReport, Workflow, WorkflowReport, WorkflowSettings,
    WorkflowState,
};
