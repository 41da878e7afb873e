//! End-to-end provisioning tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
    use rustack_bootstrap_core::policy::PolicyDocument;
    use rustack_bootstrap_core::types::{AwsRegion, EncryptionSpec, EnsureDecision, Tag};
    use rustack_bootstrap_core::{BootstrapError, BucketName, ProvisionPlan, Step};

    use crate::{cleanup_bucket, provisioner, s3_client, test_bucket_name};

    fn plan(bucket: &str, region: &str) -> ProvisionPlan {
        ProvisionPlan {
            bucket: BucketName::parse(bucket).unwrap(),
            region: AwsRegion::new(region),
            encryption: EncryptionSpec::ServerManagedAes256,
            enforce_tls: true,
            tags: vec![Tag::new("env", "test")],
        }
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_and_harden_bucket() {
        let client = s3_client("us-east-1");
        let bucket = test_bucket_name("harden");
        let (provisioner, sink) = provisioner("us-east-1").await;

        let report = provisioner.provision(&plan(&bucket, "us-east-1")).await.unwrap();
        assert_eq!(report.decision, EnsureDecision::Created);
        assert_eq!(sink.steps().last(), Some(&Step::Ready));

        let encryption = client
            .get_bucket_encryption()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_encryption");
        let rules = encryption
            .server_side_encryption_configuration()
            .map(|c| c.rules().to_vec())
            .unwrap_or_default();
        assert_eq!(rules.len(), 1);

        let pab = client
            .get_public_access_block()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_public_access_block");
        let pab = pab.public_access_block_configuration().unwrap();
        assert_eq!(pab.block_public_acls(), Some(true));
        assert_eq!(pab.ignore_public_acls(), Some(true));
        assert_eq!(pab.block_public_policy(), Some(true));
        assert_eq!(pab.restrict_public_buckets(), Some(true));

        let policy = client
            .get_bucket_policy()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_policy");
        let doc: PolicyDocument = serde_json::from_str(policy.policy().unwrap()).unwrap();
        assert!(doc.is_tls_only());

        let tagging = client
            .get_bucket_tagging()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_tagging");
        let tags: Vec<(&str, &str)> = tagging
            .tag_set()
            .iter()
            .map(|t| (t.key(), t.value()))
            .collect();
        assert_eq!(tags, vec![("env", "test")]);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_be_idempotent_on_second_run() {
        let client = s3_client("us-east-1");
        let bucket = test_bucket_name("rerun");
        let (provisioner, _) = provisioner("us-east-1").await;
        let plan = plan(&bucket, "us-east-1");

        let first = provisioner.provision(&plan).await.unwrap();
        let second = provisioner.provision(&plan).await.unwrap();
        assert_eq!(first.decision, EnsureDecision::Created);
        assert_eq!(second.decision, EnsureDecision::AlreadyOwnedSameRegion);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_bucket_in_other_region() {
        let client = s3_client("us-west-2");
        let bucket = test_bucket_name("region");
        client
            .create_bucket()
            .bucket(&bucket)
            .create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::UsWest2)
                    .build(),
            )
            .send()
            .await
            .expect("create_bucket");

        let (provisioner, _) = provisioner("us-east-1").await;
        let failure = provisioner
            .provision(&plan(&bucket, "us-east-1"))
            .await
            .unwrap_err();
        assert_eq!(failure.step, Step::EnsureBucket);
        assert!(matches!(
            failure.error,
            BootstrapError::RegionConflict { .. }
        ));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_leave_policy_absent_when_tls_skipped() {
        let client = s3_client("us-east-1");
        let bucket = test_bucket_name("notls");
        let (provisioner, _) = provisioner("us-east-1").await;

        let mut plan = plan(&bucket, "us-east-1");
        plan.enforce_tls = false;
        plan.tags.clear();
        provisioner.provision(&plan).await.unwrap();

        let policy = client.get_bucket_policy().bucket(&bucket).send().await;
        assert!(policy.is_err(), "no policy should have been written");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_replace_tags_on_rerun() {
        let client = s3_client("us-east-1");
        let bucket = test_bucket_name("retag");
        let (provisioner, _) = provisioner("us-east-1").await;

        let mut plan = plan(&bucket, "us-east-1");
        plan.tags = vec![Tag::new("a", "1"), Tag::new("b", "2")];
        provisioner.provision(&plan).await.unwrap();
        plan.tags = vec![Tag::new("c", "3")];
        provisioner.provision(&plan).await.unwrap();

        let tagging = client
            .get_bucket_tagging()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_tagging");
        let keys: Vec<&str> = tagging.tag_set().iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec!["c"]);

        cleanup_bucket(&client, &bucket).await;
    }
}
