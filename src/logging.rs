//! Middleware for logging requests and responses.

use axum::{
    body::Bytes,
    extract::Request,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Bodies longer than this many characters are truncated in the `info` log.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values are never written to the log.
const REDACTED_FIELDS: [&str; 2] = ["password", "token"];

/// Headers whose values are never written to the log.
const REDACTED_HEADERS: [axum::http::HeaderName; 3] = [AUTHORIZATION, COOKIE, SET_COOKIE];

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and logged in full at the `debug` level.
/// Passwords and tokens in JSON bodies are redacted, as are the `Authorization`
/// and cookie headers. Bodies that are not text, e.g. uploaded images or
/// spreadsheets, are logged by size only.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    log_body(
        &format!(
            "Received request: {} {} {:?}\nheaders: {:#?}",
            parts.method,
            parts.uri,
            parts.version,
            redact_headers(&parts.headers)
        ),
        &display_body(&parts.headers, &body_bytes),
    );

    let request = Request::from_parts(parts, body_bytes.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log_body(
        &format!(
            "Sending response: {} {:?}\nheaders: {:#?}",
            parts.status,
            parts.version,
            redact_headers(&parts.headers)
        ),
        &display_body(&parts.headers, &body_bytes),
    );

    Response::from_parts(parts, body_bytes.into())
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    for name in REDACTED_HEADERS {
        if headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(REDACTED));
        }
    }

    headers
}

fn display_body(headers: &HeaderMap, body: &Bytes) -> String {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/json") {
        return match serde_json::from_slice::<Value>(body) {
            Ok(mut json) => {
                redact_json(&mut json);
                json.to_string()
            }
            Err(_) => String::from_utf8_lossy(body).to_string(),
        };
    }

    if body.is_empty() || content_type.is_empty() || content_type.starts_with("text/") {
        return String::from_utf8_lossy(body).to_string();
    }

    format!("<{} bytes of {content_type}>", body.len())
}

fn redact_json(json: &mut Value) {
    match json {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *value = Value::String(REDACTED.to_owned());
                } else {
                    redact_json(value);
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(redact_json),
        _ => {}
    }
}

fn log_body(message: &str, body: &str) {
    match body.char_indices().nth(LOG_BODY_LENGTH_LIMIT) {
        Some((cut, _)) => {
            tracing::info!("{message}\nbody: {:}...", &body[..cut]);
            tracing::debug!("Full body: {body:?}");
        }
        None => tracing::info!("{message}\nbody: {body:?}"),
    }
}
