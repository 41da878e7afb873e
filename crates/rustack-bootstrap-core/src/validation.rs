//! Input validation that runs before any provider call.
//!
//! Provides bucket-name validation following the
//! [Amazon S3 naming rules](https://docs.aws.amazon.com/AmazonS3/latest/userguide/bucketnamingrules.html)
//! and parsing of `key=value` tag arguments.

use std::fmt;

use serde::Serialize;

use crate::error::BootstrapError;
use crate::types::Tag;

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum bucket name length.
const MAX_BUCKET_NAME_LEN: usize = 63;

/// Maximum number of tags on a bucket.
const MAX_BUCKET_TAGS: usize = 50;

/// Maximum length of a tag key in characters.
const MAX_TAG_KEY_LEN: usize = 128;

/// Maximum length of a tag value in characters.
const MAX_TAG_VALUE_LEN: usize = 256;

/// Tag key prefix reserved for the provider.
const RESERVED_TAG_PREFIX: &str = "aws:";

/// Message used for tag arguments that are not `key=value`.
const TAG_FORMAT_HINT: &str = "Use key=value format.";

/// Validate a bucket name.
///
/// Rules:
/// - 3-63 characters long
/// - Only lowercase letters, numbers, hyphens, and dots
/// - Must start and end with a letter or number
/// - No `..`, `.-` or `-.` sequences
/// - Not formatted as an IPv4 address (e.g. `192.168.0.1`)
///
/// # Errors
///
/// Returns [`BootstrapError::InvalidBucketName`] naming the first violated rule.
///
/// # Examples
///
/// ```
/// use rustack_bootstrap_core::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("my-tf-state").is_ok());
/// assert!(validate_bucket_name("AB").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> Result<(), BootstrapError> {
    let invalid = |reason: &str| BootstrapError::InvalidBucketName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };

    let len = name.len();
    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&len) {
        return Err(invalid(&format!(
            "Bucket name must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters."
        )));
    }

    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return Err(invalid(
            "Bucket name must use lowercase letters, numbers, dots, or hyphens.",
        ));
    }

    let first = name.as_bytes()[0];
    let last = name.as_bytes()[len - 1];
    if !(first.is_ascii_lowercase() || first.is_ascii_digit())
        || !(last.is_ascii_lowercase() || last.is_ascii_digit())
    {
        return Err(invalid("Bucket name must start and end with a letter or number."));
    }

    if name.contains("..") || name.contains(".-") || name.contains("-.") {
        return Err(invalid("Bucket name cannot contain '..', '.-', or '-.'."));
    }

    if is_ipv4_shaped(name) {
        return Err(invalid("Bucket name must not be formatted like an IP address."));
    }

    Ok(())
}

/// Whether `name` is four dot-separated decimal segments, each in 0-255.
fn is_ipv4_shaped(name: &str) -> bool {
    let segments: Vec<&str> = name.split('.').collect();
    segments.len() == 4
        && segments.iter().all(|segment| {
            !segment.is_empty()
                && segment.bytes().all(|b| b.is_ascii_digit())
                && segment.parse::<u8>().is_ok()
        })
}

/// A bucket name that passed [`validate_bucket_name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BucketName(String);

impl BucketName {
    /// Validate and wrap a bucket name.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::InvalidBucketName`] if the name breaks a
    /// naming rule.
    pub fn parse(name: impl Into<String>) -> Result<Self, BootstrapError> {
        let name = name.into();
        validate_bucket_name(&name)?;
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BucketName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parse `key=value` tag arguments.
///
/// Each entry is split on its first `=`, so values may themselves contain
/// `=`. A repeated key keeps its first position and takes the last value.
///
/// # Errors
///
/// Returns [`BootstrapError::InvalidTag`] when an entry has no `=`, has an
/// empty key or value, exceeds a tag limit, or uses the reserved `aws:` prefix.
///
/// # Examples
///
/// ```
/// use rustack_bootstrap_core::types::Tag;
/// use rustack_bootstrap_core::validation::parse_tags;
///
/// let tags = parse_tags(&["env=dev", "owner=platform"]).unwrap();
/// assert_eq!(tags, vec![Tag::new("env", "dev"), Tag::new("owner", "platform")]);
/// assert!(parse_tags(&["noequals"]).is_err());
/// ```
pub fn parse_tags<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Tag>, BootstrapError> {
    let mut tags: Vec<Tag> = Vec::with_capacity(raw.len());

    for item in raw {
        let item = item.as_ref();
        let invalid = |reason: String| BootstrapError::InvalidTag {
            tag: item.to_owned(),
            reason,
        };

        let Some((key, value)) = item.split_once('=') else {
            return Err(invalid(TAG_FORMAT_HINT.to_owned()));
        };
        if key.is_empty() || value.is_empty() {
            return Err(invalid(TAG_FORMAT_HINT.to_owned()));
        }
        if key.chars().count() > MAX_TAG_KEY_LEN {
            return Err(invalid(format!(
                "Tag key must not exceed {MAX_TAG_KEY_LEN} characters."
            )));
        }
        if value.chars().count() > MAX_TAG_VALUE_LEN {
            return Err(invalid(format!(
                "Tag value must not exceed {MAX_TAG_VALUE_LEN} characters."
            )));
        }
        if key.starts_with(RESERVED_TAG_PREFIX) {
            return Err(invalid(format!(
                "Tag keys starting with '{RESERVED_TAG_PREFIX}' are reserved."
            )));
        }

        match tags.iter_mut().find(|tag| tag.key == key) {
            Some(existing) => value.clone_into(&mut existing.value),
            None => tags.push(Tag::new(key, value)),
        }
    }

    if tags.len() > MAX_BUCKET_TAGS {
        return Err(BootstrapError::InvalidTag {
            tag: format!("{} tags", tags.len()),
            reason: format!("A bucket cannot have more than {MAX_BUCKET_TAGS} tags."),
        });
    }

    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    // -----------------------------------------------------------------------
    // Bucket name validation
    // -----------------------------------------------------------------------

    fn rejection_reason(name: &str) -> String {
        match validate_bucket_name(name) {
            Err(BootstrapError::InvalidBucketName { reason, .. }) => reason,
            other => panic!("expected InvalidBucketName for {name:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_should_accept_valid_bucket_names() {
        let long_name = "a".repeat(63);
        let valid = [
            "my-bucket",
            "abc",
            "a-b-c",
            "bucket.with.dots",
            "123bucket",
            "bucket123",
            "1.2.3",
            "1.2.3.4.5",
            "256.1.1.1",
            long_name.as_str(),
        ];
        for name in valid {
            assert!(validate_bucket_name(name).is_ok(), "expected valid: {name}");
        }
    }

    #[test]
    fn test_should_reject_names_outside_length_bounds() {
        for name in ["", "a", "ab"] {
            assert!(rejection_reason(name).contains("between 3 and 63"));
        }
        assert!(rejection_reason(&"a".repeat(64)).contains("between 3 and 63"));
        assert!(rejection_reason(&"b".repeat(200)).contains("between 3 and 63"));
    }

    #[test]
    fn test_should_reject_uppercase_and_underscores() {
        for name in ["MyBucket", "my_bucket", "bucket!", "buck et"] {
            assert!(
                rejection_reason(name).contains("lowercase letters"),
                "expected charset rejection: {name}"
            );
        }
    }

    #[test]
    fn test_should_reject_bad_first_or_last_character() {
        for name in ["-bucket", "bucket-", ".bucket", "bucket."] {
            assert!(
                rejection_reason(name).contains("start and end"),
                "expected edge rejection: {name}"
            );
        }
    }

    #[test]
    fn test_should_reject_adjacent_dot_and_hyphen_sequences() {
        for name in ["my..bucket", "my.-bucket", "my-.bucket"] {
            assert!(
                rejection_reason(name).contains("cannot contain"),
                "expected sequence rejection: {name}"
            );
        }
    }

    #[test]
    fn test_should_reject_ip_address_bucket_name() {
        for name in ["192.168.1.1", "0.0.0.0", "255.255.255.255", "10.0.0.01"] {
            assert!(
                rejection_reason(name).contains("IP address"),
                "expected ip rejection: {name}"
            );
        }
    }

    #[test]
    fn test_should_build_bucket_name_only_when_valid() {
        let name = BucketName::parse("tf-state-prod").unwrap();
        assert_eq!(name.as_str(), "tf-state-prod");
        assert_eq!(name.to_string(), "tf-state-prod");

        let err = BucketName::parse("Nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidName);
    }

    // -----------------------------------------------------------------------
    // Tag parsing
    // -----------------------------------------------------------------------

    #[test]
    fn test_should_parse_key_value_tags() {
        let tags = parse_tags(&["a=b", "c=d"]).unwrap();
        assert_eq!(tags, vec![Tag::new("a", "b"), Tag::new("c", "d")]);
    }

    #[test]
    fn test_should_return_empty_set_for_no_tags() {
        let none: [&str; 0] = [];
        assert!(parse_tags(&none).unwrap().is_empty());
    }

    #[test]
    fn test_should_split_on_first_equals_only() {
        let tags = parse_tags(&["query=a=b"]).unwrap();
        assert_eq!(tags, vec![Tag::new("query", "a=b")]);
    }

    #[test]
    fn test_should_reject_malformed_tags() {
        for raw in ["noequals", "=v", "k=", "="] {
            let err = parse_tags(&[raw]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTag, "expected rejection: {raw}");
            assert_eq!(
                err.to_string(),
                format!("Invalid tag '{raw}'. Use key=value format.")
            );
        }
    }

    #[test]
    fn test_should_keep_last_value_for_duplicate_keys() {
        let tags = parse_tags(&["env=dev", "owner=team", "env=prod"]).unwrap();
        assert_eq!(tags, vec![Tag::new("env", "prod"), Tag::new("owner", "team")]);
    }

    #[test]
    fn test_should_enforce_tag_limits() {
        let long_key = format!("{}=v", "k".repeat(129));
        assert!(parse_tags(&[long_key]).is_err());

        let long_value = format!("k={}", "v".repeat(257));
        assert!(parse_tags(&[long_value]).is_err());

        assert!(parse_tags(&["aws:createdBy=me"]).is_err());

        let too_many: Vec<String> = (0..51).map(|i| format!("key{i}=val{i}")).collect();
        assert!(parse_tags(too_many.as_slice()).is_err());

        let at_limit: Vec<String> = (0..50).map(|i| format!("key{i}=val{i}")).collect();
        assert_eq!(parse_tags(at_limit.as_slice()).unwrap().len(), 50);
    }
}
