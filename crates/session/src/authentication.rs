//! Facilities for establishing a login session with the gateway.
//!
//! The flow mirrors what a browser does against the gateway's login page and
//! is not based on a public API. As such it may be prone to breaking in more
//! or less obvious ways.

use log::{debug, info};
use reqwest::{
    header::{COOKIE, LOCATION},
    Response, StatusCode,
};
use url::Url;

use crate::{
    client::ClusterSession,
    cookies::{match_set_cookie, CSRF_COOKIE_NAME, PROXY_COOKIE_NAME},
    error::SessionError,
};

/// Upper bound on redirect hops in either login phase.
pub(crate) const MAX_REDIRECT_HOPS: usize = 10;

const LOGIN_PROBE_PATH: &str = "/user/login";

fn is_login_redirect(response: &Response) -> bool {
    let status = response.status();
    status == StatusCode::FOUND || status == StatusCode::SEE_OTHER
}

/// Resolves the `Location` header against the URL it was served from.
///
/// A redirect without a usable target ends the chase; there is nowhere left
/// to go.
fn redirect_target(response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    Url::parse(location)
        .or_else(|_| response.url().join(location))
        .ok()
}

impl ClusterSession {
    /// Gets a new authentication cookie from the gateway.
    pub async fn authenticate(&mut self) -> Result<(), SessionError> {
        info!("Authenticating on host {}", self.config.host);
        let login_url = self.chase_login_redirects().await?;
        self.submit_credentials(login_url).await?;
        info!("Authentication successful, cookie received");
        Ok(())
    }

    /// Probes the login page and follows the gateway's redirects to the real
    /// submission endpoint, capturing the CSRF cookie on the way.
    async fn chase_login_redirects(&mut self) -> Result<Url, SessionError> {
        let probe_url = format!("{}{LOGIN_PROBE_PATH}", self.config.host);
        let mut response = self.probe(&probe_url).await?;
        let mut hops = 0;
        while is_login_redirect(&response) {
            hops += 1;
            if hops > MAX_REDIRECT_HOPS {
                return Err(SessionError::TooManyRedirects(MAX_REDIRECT_HOPS));
            }
            let Some(target) = redirect_target(&response) else {
                break;
            };
            debug!("Following login redirect to {target}");
            response = self.probe(target.as_str()).await?;
            if let Some(csrf) = match_set_cookie(response.headers(), CSRF_COOKIE_NAME) {
                self.cookies.csrf = Some(csrf);
            }
        }
        Ok(response.url().clone())
    }

    /// Submits the login form and extracts the proxy cookie from the
    /// redirect history.
    async fn submit_credentials(&mut self, login_url: Url) -> Result<(), SessionError> {
        debug!("Submitting credentials to {login_url}");
        let form = [
            ("login", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];
        let mut request = self.client.post(login_url).form(&form);
        if let Some(csrf) = self.cookies.csrf() {
            request = request.header(COOKIE, format!("{CSRF_COOKIE_NAME}={csrf}"));
            // The legacy gateway also reads the bare token from a second
            // Cookie header.
            request = request.header(COOKIE, csrf.to_string());
        }
        let mut response = request.send().await.map_err(|e| self.connect_advice(e))?;

        // This request's redirects are chased by hand as well, so that every
        // hop stays observable.
        let mut history = Vec::new();
        while is_login_redirect(&response) {
            if history.len() >= MAX_REDIRECT_HOPS {
                return Err(SessionError::TooManyRedirects(MAX_REDIRECT_HOPS));
            }
            let Some(target) = redirect_target(&response) else {
                break;
            };
            history.push(response);
            response = self.probe(target.as_str()).await?;
        }

        // A gateway that rejects the credentials answers directly instead of
        // redirecting back into the cluster.
        let Some(previous) = history.last() else {
            return Err(SessionError::LoginRejected);
        };
        // The refreshed cookie rides on the hop immediately preceding the
        // final redirect target, not on the final response itself.
        self.cookies.proxy = match_set_cookie(previous.headers(), PROXY_COOKIE_NAME);
        Ok(())
    }

    /// GET with redirects disabled and the current cookies attached.
    async fn probe(&self, url: &str) -> Result<Response, SessionError> {
        let mut request = self.client.get(url);
        if let Some(cookies) = self.cookies.header_value() {
            request = request.header(COOKIE, cookies);
        }
        request.send().await.map_err(|e| self.connect_advice(e))
    }

    /// Translates an outright connection failure into a configuration hint
    /// when the parameters look like unset placeholders.
    fn connect_advice(&self, error: reqwest::Error) -> SessionError {
        if error.is_connect() {
            if self.config.host.contains("0.0.0.0") {
                return SessionError::Connection {
                    advice: "please provide a valid cluster hostname or ip address",
                    source: error,
                };
            }
            if self.config.username.contains("dummy") || self.config.password.contains("dummy") {
                return SessionError::Connection {
                    advice: "please make sure to update the user login information for the cluster",
                    source: error,
                };
            }
        }
        SessionError::Transport(error)
    }
}
