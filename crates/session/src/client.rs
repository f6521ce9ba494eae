//! The session through which all REST calls are dispatched.

use std::time::Duration;

use log::info;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONNECTION, CONTENT_TYPE, COOKIE},
    Method,
};

use crate::{
    config::{ClusterConfig, Scheme, API_PATTERN},
    cookies::SessionCookies,
    error::SessionError,
    requests::{ContentKind, RequestBody},
    responses::{self, RestResponse},
};

pub struct SessionBuilder {
    config: ClusterConfig,
    timeout: Option<Duration>,
    accept_invalid_certs: bool,
    inner: reqwest::ClientBuilder,
}

impl SessionBuilder {
    fn new(config: ClusterConfig) -> Self {
        Self {
            config,
            timeout: None,
            accept_invalid_certs: true,
            inner: reqwest::Client::builder(),
        }
    }

    /// Overall deadline applied to every request on the session.
    ///
    /// There is none by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether to accept certificates that cannot be verified.
    ///
    /// Defaults to `true`; clusters commonly sit behind a gateway with a
    /// self-signed certificate.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn with_inner(
        mut self,
        f: impl FnOnce(reqwest::ClientBuilder) -> reqwest::ClientBuilder,
    ) -> Self {
        self.inner = f(self.inner);
        self
    }

    /// Validates the configuration, builds the HTTP client and, on encrypted
    /// hosts, authenticates eagerly.
    pub async fn connect(self) -> Result<ClusterSession, SessionError> {
        let Self {
            config,
            timeout,
            accept_invalid_certs,
            inner,
        } = self;
        let scheme = config.scheme()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        // Redirects are never followed automatically; the login flow chases
        // them by hand to observe cookies on intermediate hops.
        let mut inner = inner
            .default_headers(headers)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = timeout {
            inner = inner.timeout(timeout);
        }
        let client = inner.build()?;

        let mut session = ClusterSession {
            config,
            client,
            cookies: SessionCookies::default(),
        };
        if scheme == Scheme::Secure {
            session.authenticate().await?;
        }
        Ok(session)
    }
}

/// An authenticated HTTP session with a cluster.
///
/// One session serves one logical caller; every operation takes `&mut self`,
/// so re-authentication can never race a concurrent request on the same
/// session.
pub struct ClusterSession {
    pub(crate) config: ClusterConfig,
    pub(crate) client: reqwest::Client,
    pub(crate) cookies: SessionCookies,
}

impl ClusterSession {
    pub fn builder(config: ClusterConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    /// Connects with default settings.
    pub async fn connect(config: ClusterConfig) -> Result<Self, SessionError> {
        Self::builder(config).connect().await
    }

    /// The cookies currently held by the session.
    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }

    /// Dispatches a REST request through the session.
    ///
    /// `path` is resolved under the configured [`API_PATTERN`] root; a
    /// leading `API_PATTERN` is stripped so callers may pass either form.
    /// When the response signals an expired session, the session
    /// re-authenticates and resends the identical request exactly once.
    pub async fn send(
        &mut self,
        path: &str,
        method: Method,
        kind: ContentKind,
        body: Option<RequestBody>,
    ) -> Result<RestResponse, SessionError> {
        let url = self.rest_url(path);
        let response = self.dispatch(&method, &url, kind, body.as_ref()).await?;
        let response = if responses::is_expired(&response) {
            info!("Authorization expired, re-authenticating");
            self.authenticate().await?;
            self.dispatch(&method, &url, kind, body.as_ref()).await?
        } else {
            response
        };
        responses::from_response(method, url, response).await
    }

    fn rest_url(&self, path: &str) -> String {
        let path = path.strip_prefix(API_PATTERN).unwrap_or(path);
        format!("{}{path}", self.config.base_url())
    }

    // Request construction is pure: everything is derived from session state
    // at call time, authenticate() being the only mutation point.
    fn build_request(
        &self,
        method: &Method,
        url: &str,
        kind: ContentKind,
        body: Option<&RequestBody>,
    ) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method.clone(), url);
        if let Some(content_type) = kind.content_type() {
            request = request.header(CONTENT_TYPE, content_type);
        }
        if let Some(cookies) = self.cookies.header_value() {
            request = request.header(COOKIE, cookies);
        }
        if let Some(body) = body {
            request = body.apply(kind, request);
        }
        request
    }

    async fn dispatch(
        &self,
        method: &Method,
        url: &str,
        kind: ContentKind,
        body: Option<&RequestBody>,
    ) -> Result<reqwest::Response, SessionError> {
        Ok(self.build_request(method, url, kind, body).send().await?)
    }
}
