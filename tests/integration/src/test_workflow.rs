//! End-to-end workflow runs against a live S3-compatible server.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bucketrun_core::Guest;
    use bucketrun_storage::S3ClientFactory;
    use bucketrun_workflow::{
        LogNotifier, Notifier, StepOutcome, Workflow, WorkflowSettings, WorkflowState,
    };

    use crate::{cleanup_bucket, local_factory, sdk_client, test_config, unique_bucket};

    fn workflow(bucket: &str, settings: WorkflowSettings) -> Workflow<S3ClientFactory> {
        Workflow::new(
            test_config(bucket, ""),
            local_factory(),
            Arc::new(LogNotifier) as Arc<dyn Notifier>,
            settings,
        )
    }

    fn solomon() -> Guest {
        Guest::new(
            "Solomon",
            true,
            "Phill's Cocktail",
            "100 Test Rd. Dothan, AL 36303",
            "Good Luck",
        )
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_run_workflow_end_to_end() {
        let bucket = unique_bucket("workflow");
        let report = workflow(&bucket, WorkflowSettings::default())
            .run()
            .await
            .expect("run");

        assert_eq!(report.failures().count(), 0, "{:?}", report.steps);
        assert_eq!(report.fetched, Some(solomon()));
        assert!(report.object_keys.contains(&"Solomon".to_owned()));
        assert!(report.notified);

        cleanup_bucket(&bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reach_same_state_when_rerun() {
        let bucket = unique_bucket("rerun");
        let workflow = workflow(&bucket, WorkflowSettings::default());

        let first = workflow.run().await.expect("first run");
        let second = workflow.run().await.expect("second run");

        assert!(second.buckets.iter().any(|b| b.name == bucket));
        assert_eq!(second.fetched, first.fetched);
        assert_eq!(second.object_keys, vec!["Solomon".to_owned()]);
        assert_eq!(
            second.outcome(WorkflowState::BucketCreated),
            Some(&StepOutcome::Succeeded)
        );

        cleanup_bucket(&bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_tear_down_after_run() {
        let bucket = unique_bucket("teardown");
        let settings = WorkflowSettings::builder().teardown(true).build();

        let report = workflow(&bucket, settings).run().await.expect("run");

        assert_eq!(
            report.outcome(WorkflowState::BucketTornDown),
            Some(&StepOutcome::Succeeded)
        );
        let head = sdk_client().head_bucket().bucket(&bucket).send().await;
        assert!(head.is_err(), "bucket should be gone after teardown");
    }
}
