//! The two well-known cookies issued by the authentication gateway.

use reqwest::header::{HeaderMap, SET_COOKIE};

/// Short-lived token issued during the pre-login redirect chase.
pub const CSRF_COOKIE_NAME: &str = "_oauth2_proxy_csrf";

/// Long-lived cookie whose presence represents an authenticated session.
pub const PROXY_COOKIE_NAME: &str = "_oauth2_proxy";

/// Cookie state shared between the login flow and the dispatcher.
///
/// Only [`ClusterSession::authenticate`](crate::ClusterSession::authenticate)
/// mutates these; requests read them at build time.
#[derive(Clone, Debug, Default)]
pub struct SessionCookies {
    pub(crate) csrf: Option<String>,
    pub(crate) proxy: Option<String>,
}

impl SessionCookies {
    /// The CSRF token captured while chasing the login redirects.
    pub fn csrf(&self) -> Option<&str> {
        self.csrf.as_deref()
    }

    /// The value of the proxy session cookie, if one has been issued.
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// Renders the cookies set so far into a `Cookie` header value.
    pub(crate) fn header_value(&self) -> Option<String> {
        let mut pairs = Vec::new();
        if let Some(csrf) = self.csrf.as_deref() {
            pairs.push(format!("{CSRF_COOKIE_NAME}={csrf}"));
        }
        if let Some(proxy) = self.proxy.as_deref() {
            pairs.push(format!("{PROXY_COOKIE_NAME}={proxy}"));
        }
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}

/// Finds the value of the cookie named `name` among the `Set-Cookie` headers
/// of a response, ignoring attributes after the first `;`.
pub(crate) fn match_set_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(SET_COOKIE) {
        let Ok(header) = header.to_str() else {
            continue;
        };
        let pair = header.split(';').next().unwrap_or(header);
        if let Some((key, value)) = pair.split_once('=') {
            if key.trim() == name {
                return Some(value.to_string());
            }
        }
    }
    None
}
