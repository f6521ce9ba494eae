//! Facilities for describing REST request payloads.

use reqwest::multipart::{Form, Part};
use serde_json::Value;

/// The payload kinds accepted by the dispatcher, each mapped to a fixed
/// `Content-Type`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentKind {
    Json,
    Jpeg,
    Multipart,
    Zip,
    None,
}

impl ContentKind {
    /// The `Content-Type` to send, or `None` for kinds where the header is
    /// omitted and the encoder picks its own.
    pub(crate) fn content_type(self) -> Option<&'static str> {
        match self {
            ContentKind::Json => Some("application/json"),
            ContentKind::Jpeg => Some("image/jpeg"),
            ContentKind::Zip => Some("application/zip"),
            ContentKind::Multipart | ContentKind::None => Option::None,
        }
    }
}

/// A request body.
///
/// Bodies are owned by the caller's request description rather than by the
/// HTTP client so that the dispatcher can rebuild the identical request for
/// its re-authentication resend.
#[derive(Clone, Debug)]
pub enum RequestBody {
    /// Sent as a JSON document.
    Json(Value),
    /// Sent as raw bytes, or as a single `file` part when the kind is
    /// [`ContentKind::Multipart`].
    File(Vec<u8>),
}

impl RequestBody {
    pub(crate) fn apply(
        &self,
        kind: ContentKind,
        request: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        match self {
            RequestBody::Json(value) => request.json(value),
            RequestBody::File(bytes) => match kind {
                ContentKind::Multipart => {
                    let part = Part::bytes(bytes.clone()).file_name("file");
                    request.multipart(Form::new().part("file", part))
                }
                _ => request.body(bytes.clone()),
            },
        }
    }
}
