mod common;

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::FromRequestParts,
    http::{HeaderMap, Request, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use cms_portal::{
    auth::{
        CurrentSession, JwtSessionProvider, RemoteSessionProvider, SessionProvider,
        clear_session_cookie, extract_token,
    },
    error::SessionError,
    models::{Permission, Session, SessionState},
};
use common::{MockBackend, SECRET, StaticSessions, app_state, jwt_state, token, token_with};
use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

// --- JWT Session Provider ---

#[tokio::test]
async fn test_jwt_provider_resolves_claims() {
    let provider = JwtSessionProvider::new(SECRET);
    let token = token_with(SECRET, &["users:read", "users:write"], &["admin"], 3600);

    let session = provider
        .get_session(&token)
        .await
        .expect("provider never errors")
        .expect("valid token yields a session");

    assert!(session.has_permission(&Permission::new("users:read")));
    assert!(session.has_permission(&Permission::new("users:write")));
    assert!(!session.has_permission(&Permission::new("posts:read")));
    assert!(session.has_role("admin"));
    assert_eq!(session.email.as_deref(), Some("admin@example.com"));
    assert!(session.expires_at.is_some());
}

#[tokio::test]
async fn test_jwt_provider_treats_expired_token_as_no_session() {
    let provider = JwtSessionProvider::new(SECRET);
    let expired = token_with(SECRET, &["users:read"], &[], -3600);
    assert_eq!(provider.get_session(&expired).await, Ok(None));
}

#[tokio::test]
async fn test_jwt_provider_rejects_foreign_signature() {
    let provider = JwtSessionProvider::new(SECRET);
    let forged = token_with("some-other-secret", &["users:read"], &[], 3600);
    assert_eq!(provider.get_session(&forged).await, Ok(None));
    assert_eq!(provider.get_session("not-a-jwt").await, Ok(None));
}

// --- Remote Session Provider ---

async fn spawn_auth_service() -> String {
    let user_id = Uuid::new_v4();
    let router = Router::new()
        .route(
            "/session",
            get(move |headers: HeaderMap| async move {
                let bearer = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|value| value.to_str().ok());
                if bearer != Some("Bearer good-token") {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                Json(json!({
                    "user": { "id": user_id, "email": "editor@example.com" },
                    "permissions": ["posts:read", "posts:write"],
                    "roles": [{ "name": "editor" }],
                    "expires": null
                }))
                .into_response()
            }),
        )
        .route("/null", get(|| async { Json(serde_json::Value::Null) }))
        .route("/forbidden", get(|| async { StatusCode::FORBIDDEN }))
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/garbage", get(|| async { "definitely not json" }))
        .route(
            "/stalled",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    address
}

#[tokio::test]
async fn test_remote_provider_resolves_payload() {
    let base = spawn_auth_service().await;
    let provider = RemoteSessionProvider::new(&format!("{}/session", base)).unwrap();

    let session = provider
        .get_session("good-token")
        .await
        .unwrap()
        .expect("session");
    assert!(session.has_permission(&Permission::new("posts:write")));
    assert!(session.has_role("editor"));
    assert_eq!(session.email.as_deref(), Some("editor@example.com"));
    assert!(session.expires_at.is_none());

    // The same endpoint refuses other tokens with 401: a clean "no session".
    assert_eq!(provider.get_session("bad-token").await, Ok(None));
}

#[tokio::test]
async fn test_remote_provider_clean_absence() {
    let base = spawn_auth_service().await;
    for path in ["/null", "/forbidden"] {
        let provider = RemoteSessionProvider::new(&format!("{}{}", base, path)).unwrap();
        assert_eq!(provider.get_session("any").await, Ok(None), "{path}");
    }
}

#[tokio::test]
async fn test_remote_provider_failures_are_errors() {
    let base = spawn_auth_service().await;

    let broken = RemoteSessionProvider::new(&format!("{}/broken", base)).unwrap();
    assert_eq!(
        broken.get_session("any").await,
        Err(SessionError::UpstreamStatus(500))
    );

    let garbage = RemoteSessionProvider::new(&format!("{}/garbage", base)).unwrap();
    assert!(matches!(
        garbage.get_session("any").await,
        Err(SessionError::Payload(_))
    ));
}

#[tokio::test]
async fn test_remote_provider_unreachable_is_transport_error() {
    // Bind then drop, leaving a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let provider = RemoteSessionProvider::new(&format!("http://{}/session", address)).unwrap();
    assert!(matches!(
        provider.get_session("any").await,
        Err(SessionError::Transport(_))
    ));
}

#[tokio::test]
async fn test_remote_provider_stalled_service_times_out() {
    let base = spawn_auth_service().await;
    let provider = RemoteSessionProvider::with_timeout(
        &format!("{}/stalled", base),
        Duration::from_millis(200),
    )
    .unwrap();

    let started = std::time::Instant::now();
    assert!(matches!(
        provider.get_session("any").await,
        Err(SessionError::Transport(_))
    ));
    assert!(started.elapsed() < Duration::from_secs(5));
}

// --- Token extraction ---

#[test]
fn test_extract_token_prefers_bearer_over_cookie() {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, "theme=dark; session=from-cookie".parse().unwrap());
    assert_eq!(
        extract_token(&headers, "session").as_deref(),
        Some("from-cookie")
    );

    headers.insert(header::AUTHORIZATION, "Bearer from-header".parse().unwrap());
    assert_eq!(
        extract_token(&headers, "session").as_deref(),
        Some("from-header")
    );
}

#[test]
fn test_extract_token_ignores_empty_and_unrelated_values() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
    headers.insert(header::COOKIE, "session=; sessionid=abc".parse().unwrap());
    assert_eq!(extract_token(&headers, "session"), None);
}

#[test]
fn test_clear_session_cookie() {
    let cookie = clear_session_cookie("session");
    assert!(cookie.starts_with("session=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(cookie.contains("Path=/"));
}

// --- CurrentSession extractor ---

async fn extract(state: &cms_portal::AppState, request: Request<()>) -> CurrentSession {
    let (mut parts, _) = request.into_parts();
    match CurrentSession::from_request_parts(&mut parts, state).await {
        Ok(session) => session,
        Err(never) => match never {},
    }
}

#[tokio::test]
async fn test_extractor_without_token_is_anonymous() {
    let state = jwt_state(MockBackend::default());
    let session = extract(&state, Request::builder().uri("/").body(()).unwrap()).await;
    assert!(matches!(session.state, SessionState::Unauthenticated));
    assert!(session.token.is_none());
}

#[tokio::test]
async fn test_extractor_reads_cookie_and_bearer() {
    let state = jwt_state(MockBackend::default());

    let cookie = token(&["users:read"]);
    let session = extract(
        &state,
        Request::builder()
            .header(header::COOKIE, format!("session={}", cookie))
            .body(())
            .unwrap(),
    )
    .await;
    let resolved = session.state.session().expect("authenticated");
    assert!(resolved.has_permission(&Permission::new("users:read")));
    assert_eq!(session.token.as_deref(), Some(cookie.as_str()));

    let bearer = token(&["posts:read"]);
    let session = extract(
        &state,
        Request::builder()
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
            .body(())
            .unwrap(),
    )
    .await;
    assert!(
        session
            .state
            .session()
            .is_some_and(|s| s.has_permission(&Permission::new("posts:read")))
    );
}

#[tokio::test]
async fn test_extractor_drops_expired_snapshot() {
    let mut stale = Session::new(Uuid::new_v4()).with_permissions(["users:read"]);
    stale.expires_at = Some(chrono::Utc::now() - chrono::Duration::minutes(5));
    let state = app_state(Arc::new(StaticSessions(Ok(Some(stale)))), MockBackend::default());

    let session = extract(
        &state,
        Request::builder()
            .header(header::AUTHORIZATION, "Bearer whatever")
            .body(())
            .unwrap(),
    )
    .await;
    assert!(matches!(session.state, SessionState::Unauthenticated));
}

#[tokio::test]
async fn test_extractor_surfaces_provider_failure() {
    let state = app_state(
        Arc::new(StaticSessions(Err(SessionError::Transport("refused".into())))),
        MockBackend::default(),
    );
    let session = extract(
        &state,
        Request::builder()
            .header(header::AUTHORIZATION, "Bearer whatever")
            .body(())
            .unwrap(),
    )
    .await;
    assert!(matches!(
        session.state,
        SessionState::Failed(SessionError::Transport(_))
    ));
}
