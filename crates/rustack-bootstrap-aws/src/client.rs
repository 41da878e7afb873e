//! [`BucketApi`] over the AWS SDK.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, OwnershipControls, OwnershipControlsRule,
    PublicAccessBlockConfiguration, ServerSideEncryption, ServerSideEncryptionByDefault,
    ServerSideEncryptionConfiguration, ServerSideEncryptionRule, Tagging,
};
use rustack_bootstrap_core::types::{
    AccountId, CallerIdentity, EncryptionSpec, ObjectOwnership, PublicAccessBlock, Tag,
};
use rustack_bootstrap_core::{BootstrapConfig, BucketApi, ProviderError};
use tracing::debug;

use crate::error::{from_build_error, from_sdk_error};

/// S3 and STS clients sharing one resolved SDK configuration.
#[derive(Debug, Clone)]
pub struct AwsBucketApi {
    s3: aws_sdk_s3::Client,
    sts: aws_sdk_sts::Client,
}

impl AwsBucketApi {
    /// Resolve credentials and build clients for `config`.
    ///
    /// Credentials come from the default provider chain, restricted to the
    /// named profile when one is set. A custom endpoint switches S3 to
    /// path-style addressing, which S3-compatible servers expect.
    pub async fn from_config(config: &BootstrapConfig) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint_url.is_some())
            .build();

        debug!(
            region = %config.region,
            profile = ?config.profile,
            endpoint = ?config.endpoint_url,
            "AWS clients configured"
        );

        Self::from_clients(
            aws_sdk_s3::Client::from_conf(s3_config),
            aws_sdk_sts::Client::new(&sdk_config),
        )
    }

    /// Wrap already-built clients.
    #[must_use]
    pub fn from_clients(s3: aws_sdk_s3::Client, sts: aws_sdk_sts::Client) -> Self {
        Self { s3, sts }
    }
}

fn encryption_configuration(
    encryption: &EncryptionSpec,
) -> Result<ServerSideEncryptionConfiguration, ProviderError> {
    let by_default = ServerSideEncryptionByDefault::builder()
        .sse_algorithm(ServerSideEncryption::from(encryption.sse_algorithm()))
        .set_kms_master_key_id(encryption.kms_key_id().map(str::to_owned))
        .build()
        .map_err(|e| from_build_error(&e))?;

    let rule = ServerSideEncryptionRule::builder()
        .apply_server_side_encryption_by_default(by_default)
        .bucket_key_enabled(encryption.bucket_key_enabled())
        .build();

    ServerSideEncryptionConfiguration::builder()
        .rules(rule)
        .build()
        .map_err(|e| from_build_error(&e))
}

fn tagging(tags: &[Tag]) -> Result<Tagging, ProviderError> {
    let tag_set = tags
        .iter()
        .map(|tag| {
            aws_sdk_s3::types::Tag::builder()
                .key(&tag.key)
                .value(&tag.value)
                .build()
                .map_err(|e| from_build_error(&e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Tagging::builder()
        .set_tag_set(Some(tag_set))
        .build()
        .map_err(|e| from_build_error(&e))
}

#[async_trait]
impl BucketApi for AwsBucketApi {
    async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;

        let account = output
            .account()
            .ok_or_else(|| ProviderError::new("GetCallerIdentity returned no account"))?;
        let account = AccountId::new(account).map_err(|e| ProviderError::new(e.to_string()))?;

        Ok(CallerIdentity {
            account,
            arn: output.arn().map(str::to_owned),
            user_id: output.user_id().map(str::to_owned),
        })
    }

    async fn head_bucket(&self, bucket: &str) -> Result<(), ProviderError> {
        self.s3
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;
        Ok(())
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
    ) -> Result<(), ProviderError> {
        let configuration = location_constraint.map(|constraint| {
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(constraint))
                .build()
        });

        self.s3
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(configuration)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;
        Ok(())
    }

    async fn get_bucket_location(&self, bucket: &str) -> Result<Option<String>, ProviderError> {
        let output = self
            .s3
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;
        Ok(output
            .location_constraint()
            .map(|constraint| constraint.as_str().to_owned()))
    }

    async fn put_bucket_encryption(
        &self,
        bucket: &str,
        encryption: &EncryptionSpec,
    ) -> Result<(), ProviderError> {
        self.s3
            .put_bucket_encryption()
            .bucket(bucket)
            .server_side_encryption_configuration(encryption_configuration(encryption)?)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;
        Ok(())
    }

    async fn put_public_access_block(
        &self,
        bucket: &str,
        config: PublicAccessBlock,
    ) -> Result<(), ProviderError> {
        let configuration = PublicAccessBlockConfiguration::builder()
            .block_public_acls(config.block_public_acls)
            .ignore_public_acls(config.ignore_public_acls)
            .block_public_policy(config.block_public_policy)
            .restrict_public_buckets(config.restrict_public_buckets)
            .build();

        self.s3
            .put_public_access_block()
            .bucket(bucket)
            .public_access_block_configuration(configuration)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;
        Ok(())
    }

    async fn put_bucket_ownership_controls(
        &self,
        bucket: &str,
        ownership: ObjectOwnership,
    ) -> Result<(), ProviderError> {
        let rule = OwnershipControlsRule::builder()
            .object_ownership(aws_sdk_s3::types::ObjectOwnership::from(ownership.as_str()))
            .build()
            .map_err(|e| from_build_error(&e))?;
        let controls = OwnershipControls::builder()
            .rules(rule)
            .build()
            .map_err(|e| from_build_error(&e))?;

        self.s3
            .put_bucket_ownership_controls()
            .bucket(bucket)
            .ownership_controls(controls)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;
        Ok(())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), ProviderError> {
        self.s3
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;
        Ok(())
    }

    async fn put_bucket_tagging(&self, bucket: &str, tags: &[Tag]) -> Result<(), ProviderError> {
        self.s3
            .put_bucket_tagging()
            .bucket(bucket)
            .tagging(tagging(tags)?)
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;
        Ok(())
    }
}
