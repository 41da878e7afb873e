//! Conversion of AWS SDK failures into [`ProviderError`].
//!
//! The error code comes from the modeled error metadata and the status from
//! the raw HTTP response. `HeadBucket` responses carry no body, so for them the
//! status is usually the only signal.

use aws_sdk_s3::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata};
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_runtime_api::client::result::SdkError;
use rustack_bootstrap_core::ProviderError;

/// Convert an SDK operation failure.
pub(crate) fn from_sdk_error<E>(err: &SdkError<E, HttpResponse>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let message = err
        .message()
        .map_or_else(|| DisplayErrorContext(err).to_string(), str::to_owned);
    let mut converted = ProviderError::new(message);
    if let Some(code) = err.code() {
        converted = converted.with_code(code);
    }
    if let Some(response) = err.raw_response() {
        converted = converted.with_status(response.status().as_u16());
    }
    converted
}

/// Convert a request-builder failure (a required field was missing).
pub(crate) fn from_build_error(err: &BuildError) -> ProviderError {
    ProviderError::new(format!("invalid request: {err}"))
}
