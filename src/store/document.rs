//! Top-level JSON:API document handling.
//!
//! Every response body goes through the same checks before the store looks
//! at `data`:
//!
//! 1. The body must be a JSON object ([`ResourceError::InvalidJson`]).
//! 2. It must contain at least one of `data`, `errors` or `meta`, and must
//!    not contain both `data` and `errors` ([`ResourceError::InvalidData`]).
//! 3. A body with `errors` is turned into [`ResourceError::NotFound`] or
//!    [`ResourceError::ErrorResponse`] based on its first error object.
//!
//! A non-2xx status without a JSON:API error body becomes
//! [`ResourceError::Http`].

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::clients::{HttpError, HttpResponse, HttpResponseError};
use crate::resource::{parse_date, ResourceError};

const UNKNOWN_ERROR_MESSAGE: &str = "The server reported an error without details.";

/// Checks the top-level shape of a JSON:API document.
///
/// # Errors
///
/// Returns [`ResourceError::InvalidJson`] when `body` is not an object and
/// [`ResourceError::InvalidData`] when it has none of `data`, `errors` and
/// `meta`, or has both `data` and `errors`.
///
/// # Example
///
/// ```rust
/// use jsonapi_store::store::validate_top_level_json_response;
/// use serde_json::json;
///
/// assert!(validate_top_level_json_response(&json!({"meta": {}})).is_ok());
/// assert!(validate_top_level_json_response(&json!({"links": {}})).is_err());
/// assert!(validate_top_level_json_response(&json!([1, 2])).is_err());
/// ```
pub fn validate_top_level_json_response(body: &Value) -> Result<(), ResourceError> {
    let Some(object) = body.as_object() else {
        return Err(ResourceError::InvalidJson {
            message: "Response body is not a JSON object.".to_string(),
        });
    };

    let has_data = object.contains_key("data");
    let has_errors = object.contains_key("errors");
    let has_meta = object.contains_key("meta");

    if !has_data && !has_errors && !has_meta {
        return Err(ResourceError::invalid_data(
            "A JSON:API document must contain at least one of \"data\", \"errors\" or \"meta\".",
            body,
        ));
    }

    if has_data && has_errors {
        return Err(ResourceError::invalid_data(
            "A JSON:API document must not contain both \"data\" and \"errors\".",
            body,
        ));
    }

    Ok(())
}

/// Classifies the first error object of an `errors` document.
///
/// A `status` of `"404"` becomes [`ResourceError::NotFound`]; anything else
/// becomes [`ResourceError::ErrorResponse`]. The message is taken from
/// `detail` when it is a string, from `detail[0].message` when `detail` is a
/// list of messages, then from `title`.
///
/// # Example
///
/// ```rust
/// use jsonapi_store::store::handle_top_level_error_response;
/// use serde_json::json;
///
/// let error = handle_top_level_error_response(&json!({
///     "errors": [{"status": "422", "detail": "Title can't be blank"}]
/// }));
/// assert_eq!(error.to_string(), "Title can't be blank");
/// ```
#[must_use]
pub fn handle_top_level_error_response(body: &Value) -> ResourceError {
    let Some(error) = body
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    else {
        return ResourceError::invalid_data("Error document contains no error objects.", body);
    };

    let message = error_message(error);
    let status = match error.get("status") {
        Some(Value::String(status)) => status.clone(),
        Some(Value::Number(status)) => status.to_string(),
        _ => String::new(),
    };

    if status == "404" {
        ResourceError::NotFound {
            message,
            error: error.clone(),
        }
    } else {
        ResourceError::ErrorResponse {
            message,
            error: error.clone(),
        }
    }
}

fn error_message(error: &Value) -> String {
    let detail = match error.get("detail") {
        Some(Value::String(detail)) => Some(detail.clone()),
        Some(Value::Array(details)) => details
            .first()
            .and_then(|first| first.get("message"))
            .and_then(Value::as_str)
            .map(ToString::to_string),
        _ => None,
    };

    detail
        .filter(|message| !message.is_empty())
        .or_else(|| {
            error
                .get("title")
                .and_then(Value::as_str)
                .filter(|title| !title.is_empty())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string())
}

/// Turns a transport response into a validated document.
///
/// Returns `Ok(None)` for a successful response without a body.
pub(crate) fn parse_response(response: &HttpResponse) -> Result<Option<Value>, ResourceError> {
    let parsed = match response.json_body() {
        None if response.is_ok() => return Ok(None),
        None => return Err(http_error(response)),
        Some(parsed) => parsed,
    };

    let body = match parsed {
        Ok(body) => body,
        Err(_) if !response.is_ok() => return Err(http_error(response)),
        Err(e) => {
            return Err(ResourceError::InvalidJson {
                message: e.to_string(),
            })
        }
    };

    if !response.is_ok() {
        return match body.get("errors").and_then(Value::as_array) {
            Some(errors) if !errors.is_empty() => Err(handle_top_level_error_response(&body)),
            _ => Err(http_error(response)),
        };
    }

    validate_top_level_json_response(&body)?;
    if body.get("errors").is_some() {
        return Err(handle_top_level_error_response(&body));
    }

    Ok(Some(body))
}

/// Returns the body's top-level `data`.
pub(crate) fn primary_data(body: &Value) -> Result<&Value, ResourceError> {
    body.get("data").ok_or_else(|| {
        ResourceError::invalid_data("Response document is missing top-level \"data\".", body)
    })
}

/// Reads `meta.timeStamp` as either an ISO-8601 string or a unix timestamp.
pub(crate) fn fetched_date(body: &Value) -> Option<DateTime<Utc>> {
    match body.get("meta")?.get("timeStamp")? {
        Value::String(timestamp) => {
            parse_date(timestamp).map(|date| date.with_timezone(&Utc))
        }
        Value::Number(seconds) => seconds
            .as_i64()
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single()),
        _ => None,
    }
}

fn http_error(response: &HttpResponse) -> ResourceError {
    let message = if response.is_empty() {
        format!("Request failed with status {}", response.code)
    } else {
        response.body.clone()
    };

    ResourceError::Http(HttpError::Response(HttpResponseError {
        code: response.code,
        message,
    }))
}
