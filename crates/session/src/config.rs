//! Connection parameters for a cluster behind the authentication gateway.

use std::env;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Path prefix under which the cluster serves its REST API.
pub const API_PATTERN: &str = "/api/v1.0";

/// Parameters needed to reach and log in to a cluster.
///
/// The host must be scheme-qualified. Plain HTTP hosts must also spell out
/// the port, for example `http://10.0.0.1:5001`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClusterConfig {
    pub host: String,
    pub username: String,
    pub password: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scheme {
    /// HTTPS; the gateway requires a login session.
    Secure,
    /// HTTP; the host must carry an explicit port.
    Plain,
}

impl ClusterConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reads connection details from `CLUSTER_HOST`, `CLUSTER_USER` and
    /// `CLUSTER_PASS`.
    ///
    /// Returns `None` when `CLUSTER_HOST` is unset so that callers can skip
    /// work that needs a live cluster.
    pub fn from_env() -> anyhow::Result<Option<Self>> {
        let Some(host) = env::var_os("CLUSTER_HOST") else {
            return Ok(None);
        };
        let host = host.to_string_lossy().into_owned();
        let username = env::var("CLUSTER_USER")?;
        let password = env::var("CLUSTER_PASS")?;
        debug!("Using cluster at {host} with username {username} from env");
        Ok(Some(Self {
            host,
            username,
            password,
        }))
    }

    /// The root under which REST paths are resolved.
    pub fn base_url(&self) -> String {
        format!("{}{API_PATTERN}", self.host)
    }

    /// Validates the host string and returns the scheme it uses.
    pub fn scheme(&self) -> Result<Scheme, SessionError> {
        if self.host.starts_with("https://") {
            Ok(Scheme::Secure)
        } else if self.host.starts_with("http://") {
            if self.host.matches(':').count() == 2 {
                Ok(Scheme::Plain)
            } else {
                Err(SessionError::Config(format!(
                    "please add a port number to the hostname, for example: http://10.0.0.1:5001 (got {:?})",
                    self.host
                )))
            }
        } else {
            Err(SessionError::Config(format!(
                "please use a full hostname, including the protocol, for example: https://10.0.0.1 (got {:?})",
                self.host
            )))
        }
    }
}
