use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The host string cannot be used to reach a cluster.
    #[error("invalid cluster configuration: {0}")]
    Config(String),

    /// The cluster could not be reached and the configuration looks like it
    /// was never filled in.
    #[error("connection to the cluster failed, {advice}")]
    Connection {
        advice: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The gateway answered the credential submission without redirecting.
    #[error("the cluster responded to the request, but authentication failed, please verify the provided credentials")]
    LoginRejected,

    /// The login redirect chain did not terminate within the hop budget.
    #[error("login flow exceeded {0} redirects")]
    TooManyRedirects(usize),

    /// A REST call came back with a status other than 200 or 201, after the
    /// one re-authentication the session performs on its own.
    #[error("{method} {url} failed with status {status}")]
    RequestFailed {
        method: Method,
        url: String,
        body: Value,
        status: StatusCode,
    },
}
