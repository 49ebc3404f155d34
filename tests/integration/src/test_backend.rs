//! Storage layer integration tests against a live S3-compatible server.

#[cfg(test)]
mod tests {
    use bucketrun_core::{BackendErrorKind, Guest};
    use bucketrun_storage::{CreateOutcome, Fetched, ObjectAcl};

    use crate::{cleanup_bucket, connect, sdk_client, test_config, unique_bucket};

    fn guest(name: &str) -> Guest {
        Guest::new(name, true, "Phill's Cocktail", "100 Test Rd. Dothan, AL 36303", "Good Luck")
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_treat_second_create_as_already_owned() {
        let bucket = unique_bucket("create");
        let client = connect(&bucket, "").await;

        assert_eq!(
            client.buckets().create_bucket(&bucket).await.expect("create"),
            CreateOutcome::Created
        );
        assert_eq!(
            client.buckets().create_bucket(&bucket).await.expect("second create"),
            CreateOutcome::AlreadyOwned
        );

        cleanup_bucket(&bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_write_list_and_read_record() {
        let bucket = unique_bucket("object");
        let client = connect(&bucket, "rsvp/").await;
        client.buckets().create_bucket(&bucket).await.expect("create");

        client.objects().put(&bucket, &guest("Solomon")).await.expect("put");

        let listed = client
            .objects()
            .list(&bucket)
            .await
            .expect("list")
            .found()
            .expect("bucket exists");
        let keys: Vec<&str> = listed.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["rsvp/Solomon"]);

        let fetched: Fetched<Guest> = client.objects().get(&bucket, "Solomon").await.expect("get");
        assert_eq!(fetched, Fetched::Found(guest("Solomon")));

        let head = sdk_client()
            .head_object()
            .bucket(&bucket)
            .key("rsvp/Solomon")
            .send()
            .await
            .expect("head_object");
        assert_eq!(head.content_type(), Some("application/json"));

        cleanup_bucket(&bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_missing_key_as_not_found() {
        let bucket = unique_bucket("missing");
        let client = connect(&bucket, "").await;
        client.buckets().create_bucket(&bucket).await.expect("create");

        let fetched: Fetched<Guest> = client.objects().get(&bucket, "Nobody").await.expect("get");
        assert!(fetched.is_not_found());

        cleanup_bucket(&bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fail_delete_of_missing_bucket() {
        let bucket = unique_bucket("absent");
        let client = connect(&bucket, "").await;

        let err = client
            .buckets()
            .delete_bucket(&bucket)
            .await
            .expect_err("missing bucket");
        assert_eq!(err.backend_kind(), Some(BackendErrorKind::NoSuchBucket));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reclaim_bucket_with_objects() {
        let bucket = unique_bucket("reclaim");
        let client = connect(&bucket, "").await;
        client.buckets().create_bucket(&bucket).await.expect("create");
        client.objects().put(&bucket, &guest("Solomon")).await.expect("put");
        client.objects().put(&bucket, &guest("Ada")).await.expect("put");

        let removed = client.buckets().reclaim_bucket(&bucket).await.expect("reclaim");
        assert_eq!(removed, 2);

        let head = sdk_client().head_bucket().bucket(&bucket).send().await;
        assert!(head.is_err(), "head_bucket should fail after reclaim");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_write_objects_public_read() {
        let bucket = unique_bucket("acl");
        let client = connect(&bucket, "").await;
        client.buckets().create_bucket(&bucket).await.expect("create");
        client.objects().put(&bucket, &guest("Solomon")).await.expect("put");

        let acl = sdk_client()
            .get_object_acl()
            .bucket(&bucket)
            .key("Solomon")
            .send()
            .await
            .expect("get_object_acl");
        let public = acl.grants().iter().any(|grant| {
            grant
                .grantee()
                .and_then(|g| g.uri())
                .is_some_and(|uri| uri.ends_with("/global/AllUsers"))
        });
        assert!(public, "object should grant AllUsers read");
        assert_eq!(ObjectAcl::default(), ObjectAcl::PublicRead);

        cleanup_bucket(&bucket).await;
    }
}
