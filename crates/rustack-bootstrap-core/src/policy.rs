//! Bucket policy documents.
//!
//! Only one document is ever written: a single statement denying every
//! action to every principal on requests that did not use TLS. Writing it
//! replaces the whole bucket policy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::AwsRegion;

/// IAM policy language version.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Statement id of the TLS-only statement.
pub const DENY_INSECURE_TRANSPORT_SID: &str = "DenyInsecureTransport";

/// An IAM-shaped resource policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// Policy language version.
    pub version: String,
    /// Policy statements.
    pub statement: Vec<PolicyStatement>,
}

/// A single policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    /// Statement id.
    pub sid: String,
    /// `Allow` or `Deny`.
    pub effect: String,
    /// Principal the statement applies to.
    pub principal: String,
    /// Action pattern.
    pub action: String,
    /// Resource ARNs.
    pub resource: Vec<String>,
    /// Condition operator -> condition key -> value.
    pub condition: BTreeMap<String, BTreeMap<String, String>>,
}

impl PolicyDocument {
    /// Build the TLS-only policy for a bucket.
    ///
    /// # Examples
    ///
    /// ```
    /// use rustack_bootstrap_core::policy::PolicyDocument;
    /// use rustack_bootstrap_core::types::AwsRegion;
    ///
    /// let doc = PolicyDocument::deny_insecure_transport("tf-state", &AwsRegion::default());
    /// assert_eq!(doc.statement.len(), 1);
    /// assert_eq!(doc.statement[0].resource[0], "arn:aws:s3:::tf-state");
    /// ```
    #[must_use]
    pub fn deny_insecure_transport(bucket: &str, region: &AwsRegion) -> Self {
        let partition = region.partition();
        let condition = BTreeMap::from([(
            "Bool".to_owned(),
            BTreeMap::from([("aws:SecureTransport".to_owned(), "false".to_owned())]),
        )]);

        Self {
            version: POLICY_VERSION.to_owned(),
            statement: vec![PolicyStatement {
                sid: DENY_INSECURE_TRANSPORT_SID.to_owned(),
                effect: "Deny".to_owned(),
                principal: "*".to_owned(),
                action: "s3:*".to_owned(),
                resource: vec![
                    format!("arn:{partition}:s3:::{bucket}"),
                    format!("arn:{partition}:s3:::{bucket}/*"),
                ],
                condition,
            }],
        }
    }

    /// Serialize to the JSON text sent to the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Whether this document is exactly the TLS-only policy: one `Deny`
    /// statement conditioned on `aws:SecureTransport = false`.
    #[must_use]
    pub fn is_tls_only(&self) -> bool {
        let [statement] = self.statement.as_slice() else {
            return false;
        };
        statement.effect == "Deny"
            && statement.principal == "*"
            && statement.action == "s3:*"
            && statement
                .condition
                .get("Bool")
                .and_then(|keys| keys.get("aws:SecureTransport"))
                .is_some_and(|value| value == "false")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_serialize_tls_policy_in_iam_shape() {
        let doc = PolicyDocument::deny_insecure_transport("tf-state", &AwsRegion::default());
        let value: serde_json::Value =
            serde_json::from_str(&doc.to_json().expect("serialize")).expect("parse");

        assert_eq!(value["Version"], "2012-10-17");
        let statement = &value["Statement"][0];
        assert_eq!(statement["Sid"], "DenyInsecureTransport");
        assert_eq!(statement["Effect"], "Deny");
        assert_eq!(statement["Principal"], "*");
        assert_eq!(statement["Action"], "s3:*");
        assert_eq!(statement["Resource"][0], "arn:aws:s3:::tf-state");
        assert_eq!(statement["Resource"][1], "arn:aws:s3:::tf-state/*");
        assert_eq!(statement["Condition"]["Bool"]["aws:SecureTransport"], "false");
    }

    #[test]
    fn test_should_use_region_partition_in_arns() {
        let doc = PolicyDocument::deny_insecure_transport("b1", &AwsRegion::new("cn-north-1"));
        assert_eq!(doc.statement[0].resource[0], "arn:aws-cn:s3:::b1");
    }

    #[test]
    fn test_should_recognize_tls_only_policy() {
        let doc = PolicyDocument::deny_insecure_transport("b1", &AwsRegion::default());
        assert!(doc.is_tls_only());

        let mut widened = doc.clone();
        widened.statement.push(doc.statement[0].clone());
        assert!(!widened.is_tls_only());
    }
}
