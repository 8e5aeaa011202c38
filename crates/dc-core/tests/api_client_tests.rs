//! REST client behaviour against an in-process backend.

use dc_core::{
    ApiClient, ApiError, ClientConfig, Preferences, SessionClient, SettingsClient,
};
use serde_json::json;
use warp::http::StatusCode;
use warp::Filter;

async fn spawn_backend() -> String {
    let me = warp::path!("api" / "v1" / "auth" / "me")
        .and(warp::get())
        .and(warp::header::optional::<String>("authorization"))
        .map(|auth: Option<String>| {
            if auth.as_deref() == Some("Bearer secret") {
                warp::reply::with_status(
                    warp::reply::json(&json!({
                        "success": true,
                        "data": {
                            "id": "user-1",
                            "email": "ops@acme.test",
                            "roles": ["admin"],
                            "organizationId": "org-1"
                        }
                    })),
                    StatusCode::OK,
                )
            } else {
                warp::reply::with_status(
                    warp::reply::json(&json!({"success": false, "error": "unauthorized"})),
                    StatusCode::UNAUTHORIZED,
                )
            }
        });

    let org = warp::path!("api" / "v1" / "organizations" / "current")
        .and(warp::get())
        .map(|| {
            warp::reply::json(&json!({
                "success": true,
                "data": {"id": "org-1", "name": "Acme Logistics", "verticalId": "logistics"}
            }))
        });

    let rejected = warp::path!("api" / "v1" / "settings" / "users")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({"success": false, "error": "forbidden by policy"})));

    let prefs = warp::path!("api" / "v1" / "settings" / "preferences")
        .and(warp::patch())
        .and(warp::body::json())
        .map(|body: serde_json::Value| warp::reply::json(&json!({"success": true, "data": body})));

    let broken = warp::path!("api" / "v1" / "broken")
        .map(|| warp::reply::with_status("boom", StatusCode::INTERNAL_SERVER_ERROR));

    let text = warp::path!("api" / "v1" / "text").map(|| "not json");

    let routes = me.or(org).or(rejected).or(prefs).or(broken).or(text);
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{addr}/api/v1")
}

fn client(base: &str, token: Option<&str>) -> ApiClient {
    let mut config = ClientConfig::new().with_base_url(base).with_timeout_secs(5);
    if let Some(token) = token {
        config = config.with_auth_token(token);
    }
    ApiClient::new(config).expect("client should build")
}

#[tokio::test]
async fn bootstrap_sends_bearer_token() {
    let base = spawn_backend().await;
    let session = SessionClient::new(client(&base, Some("secret")))
        .bootstrap()
        .await
        .expect("bootstrap should succeed");

    assert_eq!(session.user.email, "ops@acme.test");
    assert_eq!(session.organization.vertical_id.as_deref(), Some("logistics"));
}

#[tokio::test]
async fn missing_token_maps_to_status_error() {
    let base = spawn_backend().await;
    let err = SessionClient::new(client(&base, None))
        .me()
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn envelope_rejection_surfaces_backend_message() {
    let base = spawn_backend().await;
    let err = SettingsClient::new(client(&base, Some("secret")))
        .users()
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Rejected(ref m) if m == "forbidden by policy"));
}

#[tokio::test]
async fn patch_round_trips_body() {
    let base = spawn_backend().await;
    let prefs = Preferences {
        theme: "dark".to_string(),
        ..Preferences::default()
    };
    let saved = SettingsClient::new(client(&base, Some("secret")))
        .update_preferences(&prefs)
        .await
        .expect("patch should succeed");

    assert_eq!(saved, prefs);
}

#[tokio::test]
async fn server_error_is_retryable() {
    let base = spawn_backend().await;
    let err = client(&base, None)
        .get::<serde_json::Value>("/broken")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 500, ref body, .. } if body == "boom"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn non_json_body_is_decode_error() {
    let base = spawn_backend().await;
    let err = client(&base, None)
        .get::<serde_json::Value>("/text")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Decode { ref path, .. } if path == "/text"));
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let err = client("http://127.0.0.1:9/api/v1", None)
        .get::<serde_json::Value>("/auth/me")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Network(_)));
}
