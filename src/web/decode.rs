//! Request body decoding.

use axum::body::to_bytes;
use axum::extract::Request;
use sales_core::AppError;
use serde::de::DeserializeOwned;

/// Upper bound on a JSON request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Reads the whole body and decodes it as JSON.
///
/// Failures are client errors: the message names the offending field when
/// the decoder reports one. Validation is left to the caller.
pub async fn decode<T: DeserializeOwned>(req: Request) -> Result<T, AppError> {
    let bytes = to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|_| AppError::bad_request("unable to read request body"))?;

    serde_json::from_slice(&bytes).map_err(|err| {
        let message = err.to_string();
        if let Some(field) = message
            .split("missing field `")
            .nth(1)
            .and_then(|rest| rest.split('`').next())
        {
            return AppError::bad_request(format!("{field} is required"));
        }
        AppError::bad_request(format!("unable to decode payload: {message}"))
    })
}
