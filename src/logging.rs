//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// The maximum number of bytes of a body logged at the `info` level.
const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The JSON fields whose values never appear in the logs.
const REDACTED_FIELDS: &[&str] = &["password", "publicToken", "token"];

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Passwords and tokens in JSON bodies and the `Authorization` header are redacted.
/// The client still receives the unredacted response.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    log_message(
        "Received request",
        &format!(
            "{} {} {:#?}",
            parts.method,
            parts.uri,
            redact_headers(&parts.headers)
        ),
        &display_body(&parts.headers, &body_bytes),
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_message(
        "Sending response",
        &format!("{} {:#?}", parts.status, parts.headers),
        &display_body(&parts.headers, &body_bytes),
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

/// The body as it should appear in the logs.
fn display_body(headers: &HeaderMap, body_bytes: &[u8]) -> String {
    let body_text = String::from_utf8_lossy(body_bytes);

    if is_json(headers) {
        redact_json_fields(&body_text)
    } else {
        body_text.into_owned()
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Replace the values of [REDACTED_FIELDS] in a JSON object.
///
/// Text that is not a JSON object is returned unchanged.
fn redact_json_fields(body_text: &str) -> String {
    let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(body_text) else {
        return body_text.to_owned();
    };

    let mut redacted_any = false;
    for field in REDACTED_FIELDS {
        if let Some(value) = object.get_mut(*field) {
            *value = Value::String(REDACTED.to_owned());
            redacted_any = true;
        }
    }

    if redacted_any {
        Value::Object(object).to_string()
    } else {
        body_text.to_owned()
    }
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();
    if headers.contains_key(AUTHORIZATION) {
        headers.insert(AUTHORIZATION, HeaderValue::from_static(REDACTED));
    }

    headers
}

fn log_message(label: &str, head: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        let cut = floor_char_boundary(body, LOG_BODY_LENGTH_LIMIT);
        tracing::info!("{label}: {head}\nbody: {:}...", &body[..cut]);
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{label}: {head}\nbody: {body:?}");
    }
}

/// The largest index no greater than `index` that falls on a char boundary of `text`.
fn floor_char_boundary(text: &str, index: usize) -> usize {
    (0..=index)
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0)
}
