//! `freshcart pincode check`.

use freshcart_core::Pincode;
use freshcart_storefront::backend::BackendClient;

use super::{CommandError, emit};

/// Validate a pincode locally, then ask the backend how it is served.
///
/// # Errors
///
/// Returns an error for a malformed pincode (before any request) or a
/// backend failure.
pub async fn check(backend: &BackendClient, raw: &str) -> Result<(), CommandError> {
    let pincode =
        Pincode::parse(raw).map_err(|e| CommandError::Invalid(format!("{raw}: {e}")))?;

    let result = backend.check_pincode(&pincode).await?;
    tracing::info!(pincode = %pincode, mode = result.mode.as_str(), "Pincode checked");
    emit(&result)
}
