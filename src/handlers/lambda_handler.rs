//! Lambda runtime entry point.

use crate::{models::response::UploadResponse, services::upload_service::UploadContext};
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::debug;

/// Handle one Lambda invocation.
///
/// The payload is taken as raw JSON so that a malformed event still produces
/// an error response instead of a runtime-level invocation failure. This
/// function never returns `Err`.
pub async fn function_handler(
    ctx: &UploadContext,
    event: LambdaEvent<Value>,
) -> Result<UploadResponse, Error> {
    debug!("invocation {}", event.context.request_id);
    Ok(ctx.handle_payload(event.payload).await)
}
