//! Shared reqwest plumbing for the webhook clients.

use reqwest::{Response, StatusCode};

use hookchat_core::gateway::GatewayError;

/// Longest error body kept in a `GatewayError`.
const MAX_ERROR_BODY: usize = 500;

pub(crate) fn map_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Network(format!("request timed out: {err}"))
    } else {
        GatewayError::Network(err.to_string())
    }
}

pub(crate) fn map_http_error(status: StatusCode, body: String) -> GatewayError {
    let body = if body.chars().count() > MAX_ERROR_BODY {
        body.chars().take(MAX_ERROR_BODY).collect()
    } else {
        body
    };
    GatewayError::from_status(status.as_u16(), body)
}

/// Reads the body of a successful response, or maps the failure status.
pub(crate) async fn read_body(response: Response) -> Result<String, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        return Err(map_http_error(status, body_text));
    }

    response
        .text()
        .await
        .map_err(|err| GatewayError::Malformed(format!("Failed to read response body: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_is_truncated() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, "x".repeat(2000));
        match err {
            GatewayError::Server { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body.len(), MAX_ERROR_BODY);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
