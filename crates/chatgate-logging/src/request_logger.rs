use reqwest::StatusCode;
use serde_json::Value;

use crate::{mask_secret, safe_truncate};

const MAX_LOGGED_BODY_CHARS: usize = 2000;

/// Log an outgoing provider request at debug level.
///
/// The credential is masked and the body truncated.
pub fn log_upstream_request(provider: &str, url: &str, body: &Value, credential: &str) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let host = reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());

    let body = match serde_json::to_string(body) {
        Ok(json) => safe_truncate(&json, MAX_LOGGED_BODY_CHARS),
        Err(e) => format!("<unserializable request: {e}>"),
    };

    tracing::debug!(
        provider,
        url,
        host = %host,
        credential = %mask_secret(credential),
        body = %body,
        "upstream request"
    );
}

/// Log the status of a provider response; failures are logged at warn
pub fn log_upstream_response(provider: &str, status: StatusCode, error_body: Option<&str>) {
    match error_body {
        Some(body) => tracing::warn!(
            provider,
            status = status.as_u16(),
            body = %safe_truncate(body, MAX_LOGGED_BODY_CHARS),
            "upstream request failed"
        ),
        None => tracing::debug!(provider, status = status.as_u16(), "upstream stream opened"),
    }
}

/// Log one raw stream payload at trace level
pub fn log_stream_chunk(provider: &str, chunk_number: usize, data: &str) {
    tracing::trace!(
        provider,
        chunk = chunk_number,
        data = %safe_truncate(data, 500),
        "upstream chunk"
    );
}
