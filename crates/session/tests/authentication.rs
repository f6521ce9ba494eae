//! Login-flow tests against a mock gateway.

use oauth2_proxy_session::{ClusterConfig, ClusterSession, SessionError};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ClusterConfig {
    ClusterConfig::new(server.uri(), "user@example.com", "secret")
}

/// The mock server only speaks plain HTTP, so construction never
/// authenticates eagerly and the tests drive `authenticate` themselves.
async fn plain_session(server: &MockServer) -> ClusterSession {
    ClusterSession::connect(config_for(server)).await.unwrap()
}

#[tokio::test]
async fn authenticate_follows_redirects_and_stores_both_cookies() {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/user/login"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{uri}/oauth2/start").as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    // A relative redirect target, resolved against the hop it came from.
    Mock::given(method("GET"))
        .and(path("/oauth2/start"))
        .respond_with(
            ResponseTemplate::new(303)
                .insert_header("Location", "/dex/auth")
                .insert_header("Set-Cookie", "_oauth2_proxy_csrf=csrf-token; Path=/; HttpOnly"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dex/auth"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/dex/auth"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string("login=user%40example.com&password=secret"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/welcome")
                .insert_header("Set-Cookie", "_oauth2_proxy=proxy-token; Path=/; HttpOnly"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/welcome"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = plain_session(&server).await;
    session.authenticate().await.unwrap();

    assert_eq!(session.cookies().csrf(), Some("csrf-token"));
    assert_eq!(session.cookies().proxy(), Some("proxy-token"));
}

#[tokio::test]
async fn csrf_cookie_equals_the_value_set_on_the_last_hop_that_set_it() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/first"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/first"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/second")
                .insert_header("Set-Cookie", "_oauth2_proxy_csrf=stale; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/second"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/login-page")
                .insert_header("Set-Cookie", "_oauth2_proxy_csrf=fresh; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login-page"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    // The flow still runs to completion after the chase.
    Mock::given(method("POST"))
        .and(path("/login-page"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/welcome")
                .insert_header("Set-Cookie", "_oauth2_proxy=proxy-token; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/welcome"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut session = plain_session(&server).await;
    session.authenticate().await.unwrap();

    assert_eq!(session.cookies().csrf(), Some("fresh"));
}

#[tokio::test]
async fn rejected_credentials_fail_with_login_rejected_and_leave_cookies_unset() {
    let server = MockServer::start().await;

    // The probe lands on the submission endpoint directly.
    Mock::given(method("GET"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    // Rejection: the gateway answers the POST without redirecting.
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = plain_session(&server).await;
    let error = session.authenticate().await.unwrap_err();

    assert!(matches!(error, SessionError::LoginRejected));
    assert!(session.cookies().proxy().is_none());
}

#[tokio::test]
async fn redirect_loop_fails_with_too_many_redirects() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
        .expect(10)
        .mount(&server)
        .await;

    let mut session = plain_session(&server).await;
    let error = session.authenticate().await.unwrap_err();

    assert!(matches!(error, SessionError::TooManyRedirects(_)));
}

#[tokio::test]
async fn proxy_cookie_is_read_from_the_second_to_last_hop() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    // Submission chain of three responses; the cookie must come from the
    // middle one, not the first and not the final.
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/hop")
                .insert_header("Set-Cookie", "_oauth2_proxy=from-first-hop; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hop"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/done")
                .insert_header("Set-Cookie", "_oauth2_proxy=from-middle-hop; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/done"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "_oauth2_proxy=from-final-response; Path=/"),
        )
        .mount(&server)
        .await;

    let mut session = plain_session(&server).await;
    session.authenticate().await.unwrap();

    assert_eq!(session.cookies().proxy(), Some("from-middle-hop"));
}

#[tokio::test]
async fn authenticate_twice_yields_the_same_proxy_cookie() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/welcome")
                .insert_header("Set-Cookie", "_oauth2_proxy=stable-token; Path=/"),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/welcome"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let mut session = plain_session(&server).await;

    session.authenticate().await.unwrap();
    let first = session.cookies().proxy().map(str::to_string);
    session.authenticate().await.unwrap();

    assert_eq!(session.cookies().proxy(), first.as_deref());
    assert_eq!(session.cookies().proxy(), Some("stable-token"));
}

#[tokio::test]
async fn placeholder_host_gets_a_configuration_hint_on_connect_failure() {
    let config = ClusterConfig::new("http://0.0.0.0:2", "user", "secret");
    let mut session = ClusterSession::connect(config).await.unwrap();

    let error = session.authenticate().await.unwrap_err();

    assert!(matches!(error, SessionError::Connection { .. }));
    assert!(error.to_string().contains("valid cluster hostname"));
}

#[tokio::test]
async fn placeholder_credentials_get_a_configuration_hint_on_connect_failure() {
    let config = ClusterConfig::new("http://127.0.0.1:2", "dummy_user", "dummy_password");
    let mut session = ClusterSession::connect(config).await.unwrap();

    let error = session.authenticate().await.unwrap_err();

    assert!(matches!(error, SessionError::Connection { .. }));
    assert!(error.to_string().contains("login information"));
}

#[tokio::test]
async fn other_connect_failures_pass_through_unchanged() {
    let config = ClusterConfig::new("http://127.0.0.1:2", "user", "secret");
    let mut session = ClusterSession::connect(config).await.unwrap();

    let error = session.authenticate().await.unwrap_err();

    assert!(matches!(error, SessionError::Transport(_)));
}

#[tokio::test]
async fn host_without_scheme_fails_construction() {
    let config = ClusterConfig::new("10.0.0.1", "user", "secret");

    assert!(matches!(
        ClusterSession::connect(config).await,
        Err(SessionError::Config(_))
    ));
}

#[tokio::test]
async fn plain_host_without_port_fails_construction() {
    let config = ClusterConfig::new("http://10.0.0.1", "user", "secret");

    assert!(matches!(
        ClusterSession::connect(config).await,
        Err(SessionError::Config(_))
    ));
}
