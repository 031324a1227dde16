//! Shared HTTP response helpers.

use dr_stream::{BoxFrameStream, FramingKind, decode};

use crate::error::ClientError;

/// Check an HTTP response status.
///
/// Returns the response unchanged on success; any other status becomes
/// [`ClientError::Api`] carrying the response body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status,
            message: message.trim().to_string(),
        });
    }
    Ok(resp)
}

/// Turn a streaming response body into frames.
pub fn frames(resp: reqwest::Response, kind: FramingKind) -> BoxFrameStream {
    Box::pin(decode(Box::pin(resp.bytes_stream()), kind))
}
