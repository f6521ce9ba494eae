//! Facilities for classifying responses from the cluster.

use reqwest::{header::CONTENT_TYPE, Method, Response, StatusCode};
use serde_json::Value;

use crate::error::SessionError;

/// Outcome of a successful REST call.
#[derive(Debug)]
pub enum RestResponse {
    /// The cluster declared `application/json` and the payload decoded.
    Json(Value),
    /// Any other payload; the body has not been consumed.
    Raw(Response),
}

impl RestResponse {
    /// Returns the decoded JSON payload, if the response carried one.
    pub fn into_json(self) -> Option<Value> {
        match self {
            RestResponse::Json(value) => Some(value),
            RestResponse::Raw(_) => None,
        }
    }
}

pub(crate) fn content_type(response: &Response) -> &str {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// Whether a response signals that the session cookie has lapsed.
///
/// The gateway either rejects the request outright or substitutes its HTML
/// login page for the expected payload.
pub(crate) fn is_expired(response: &Response) -> bool {
    let status = response.status();
    status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || content_type(response).contains("text/html")
}

pub(crate) async fn from_response(
    method: Method,
    url: String,
    response: Response,
) -> Result<RestResponse, SessionError> {
    let status = response.status();
    if status != StatusCode::OK && status != StatusCode::CREATED {
        // A failure body that is not JSON is reported as empty rather than
        // as a second error.
        let body = response
            .json()
            .await
            .unwrap_or_else(|_| Value::String(String::new()));
        return Err(SessionError::RequestFailed {
            method,
            url,
            body,
            status,
        });
    }
    if content_type(&response) == "application/json" {
        Ok(RestResponse::Json(response.json().await?))
    } else {
        Ok(RestResponse::Raw(response))
    }
}
