//! Cookie-based session management for REST services behind an
//! oauth2-proxy authentication gateway.
//!
//! [`ClusterSession`] establishes a login session by chasing the gateway's
//! redirect chain and submitting credentials, re-authenticates transparently
//! when the session lapses, and dispatches generic REST requests through the
//! authenticated session.

mod authentication;
mod client;
mod config;
mod cookies;
mod error;
mod requests;
mod responses;

pub use client::{ClusterSession, SessionBuilder};
pub use config::{ClusterConfig, Scheme, API_PATTERN};
pub use cookies::{SessionCookies, CSRF_COOKIE_NAME, PROXY_COOKIE_NAME};
pub use error::SessionError;
pub use requests::{ContentKind, RequestBody};
pub use responses::RestResponse;
