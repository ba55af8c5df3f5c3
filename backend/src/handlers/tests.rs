use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use super::create_router;
use crate::testing::{drain, event_names, TestApp};

const BOUNDARY: &str = "lif-test-boundary";

fn router(app: &TestApp) -> Router {
    create_router(app.state.clone())
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// `parts` are (field name, file name, content)
fn multipart_request(uri: &str, token: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, file_name, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/jpeg\r\n\r\n",
                    name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn uuid_at(body: &Value, pointer: &str) -> Uuid {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("no uuid at {} in {}", pointer, body))
}

async fn register_and_login(app: &TestApp, router: &Router, email: &str, name: &str) -> (Uuid, String) {
    let (status, body) = send(
        router,
        json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({"email": email, "password": "secret123", "name": name, "age": 27, "gender": "female"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let user_id = uuid_at(&body, "/data/id");

    let mail = app
        .mailer
        .sent()
        .await
        .into_iter()
        .rev()
        .find(|m| m.to == email)
        .unwrap();
    let token = mail.text.rsplit("/api/auth/verify/").next().unwrap().trim().to_string();

    let (status, _) = send(router, empty_request(Method::GET, &format!("/api/auth/verify/{}", token), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        router,
        json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"email": email.to_uppercase(), "password": "secret123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    (user_id, body["data"]["token"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let response = router(&app)
        .oneshot(empty_request(Method::GET, "/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new().await;
    let (status, body) = send(&router(&app), empty_request(Method::GET, "/api/users/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &router(&app),
        empty_request(Method::GET, "/api/users/me", Some("not-a-jwt")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_json_gets_error_envelope() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&router(&app), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_unverified_login_is_forbidden() {
    let app = TestApp::new().await;
    let router = router(&app);
    send(
        &router,
        json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({"email": "new@example.com", "password": "secret123", "name": "New", "age": 30, "gender": "male"}),
        ),
    )
    .await;

    let (status, _) = send(
        &router,
        json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({"email": "new@example.com", "password": "secret123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_swipe_direction_is_rejected() {
    let app = TestApp::new().await;
    let a = app.user("Ada").await;
    let b = app.user("Bob").await;
    let token = app.token_for(a.id);

    let (status, body) = send(
        &router(&app),
        json_request(
            Method::POST,
            "/api/swipes",
            Some(&token),
            json!({"targetId": b.id, "direction": "sideways"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_photo_upload_via_multipart() {
    let app = TestApp::new().await;
    let a = app.user("Ada").await;
    let token = app.token_for(a.id);

    let (status, body) = send(
        &router(&app),
        multipart_request(
            "/api/users/photos",
            &token,
            &[("caption", None, b"beach"), ("photo", Some("beach.jpg"), b"\xff\xd8jpeg")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["caption"], "beach");
    assert!(body["data"]["url"].as_str().unwrap().ends_with("beach.jpg"));

    let (status, _) = send(
        &router(&app),
        multipart_request("/api/users/photos", &token, &[("caption", None, b"nothing")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_without_multipart_body_gets_error_envelope() {
    let app = TestApp::new().await;
    let a = app.user("Ada").await;
    let token = app.token_for(a.id);

    let (status, body) = send(
        &router(&app),
        json_request(Method::POST, "/api/verify/selfie", Some(&token), json!({"selfie": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_image_message_via_multipart() {
    let app = TestApp::new().await;
    let (a, _, m) = app.matched_pair().await;
    let token = app.token_for(a.id);
    let match_id = m.id.to_string();

    let (status, body) = send(
        &router(&app),
        multipart_request(
            "/api/chats/image-message",
            &token,
            &[("matchId", None, match_id.as_bytes()), ("image", Some("pic.png"), b"png")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["isImage"], true);
}

#[tokio::test]
async fn test_safety_guidelines_are_public() {
    let app = TestApp::new().await;
    let (status, body) = send(&router(&app), empty_request(Method::GET, "/api/safety/guidelines", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_notifications_listing_and_clear() {
    let app = TestApp::new().await;
    let (a, b, m) = app.matched_pair().await;
    crate::services::conversations::send_message(&app.state, m.id, a.id, "hi")
        .await
        .unwrap();
    let token = app.token_for(b.id);
    let router = router(&app);

    let (status, body) = send(
        &router,
        empty_request(Method::GET, "/api/notifications?unreadOnly=true", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let notification_id = uuid_at(&body, "/data/0/id");

    let (status, _) = send(
        &router,
        empty_request(
            Method::PUT,
            &format!("/api/notifications/{}/read", notification_id),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &router,
        empty_request(Method::GET, "/api/notifications?unreadOnly=true", Some(&token)),
    )
    .await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) = send(&router, empty_request(Method::DELETE, "/api/notifications", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 1);
}

#[tokio::test]
async fn test_match_chat_and_call_flow() {
    let app = TestApp::new().await;
    let router = router(&app);
    let (ada, ada_token) = register_and_login(&app, &router, "ada@example.com", "Ada").await;
    let (bob, bob_token) = register_and_login(&app, &router, "bob@example.com", "Bob").await;
    let (_, mut bob_rx) = app.connect(bob).await;

    // Discovery lists the other verified user
    let (_, body) = send(&router, empty_request(Method::GET, "/api/potential-matches", Some(&ada_token))).await;
    assert_eq!(uuid_at(&body, "/data/0/id"), bob);

    let (_, body) = send(
        &router,
        json_request(Method::POST, "/api/swipes", Some(&ada_token), json!({"targetId": bob, "direction": "like"})),
    )
    .await;
    assert_eq!(body["data"]["matched"], false);

    let (status, body) = send(
        &router,
        json_request(Method::POST, "/api/swipes", Some(&bob_token), json!({"targetId": ada, "direction": "like"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["matched"], true);
    let match_id = uuid_at(&body, "/data/matchId");
    assert!(event_names(&drain(&mut bob_rx)).contains(&"new_match"));

    // Chat
    let (status, _) = send(
        &router,
        json_request(
            Method::POST,
            "/api/chats/message",
            Some(&ada_token),
            json!({"matchId": match_id, "content": "hello bob"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&router, empty_request(Method::GET, "/api/chats", Some(&bob_token))).await;
    assert_eq!(body["data"][0]["unreadCount"], 1);

    let (_, body) = send(
        &router,
        empty_request(
            Method::GET,
            &format!("/api/chats/{}/messages?page=1&limit=10", match_id),
            Some(&bob_token),
        ),
    )
    .await;
    assert_eq!(body["data"][0]["content"], "hello bob");

    let (_, body) = send(&router, empty_request(Method::GET, "/api/chats", Some(&bob_token))).await;
    assert_eq!(body["data"][0]["unreadCount"], 0);

    // Video call
    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            "/api/calls/initiate",
            Some(&ada_token),
            json!({"matchId": match_id, "type": "video"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let call_id = uuid_at(&body, "/data/id");

    let (status, _) = send(
        &router,
        json_request(
            Method::POST,
            "/api/calls/initiate",
            Some(&bob_token),
            json!({"matchId": match_id, "type": "audio"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(
        &router,
        json_request(Method::POST, "/api/calls/accept", Some(&bob_token), json!({"callId": call_id})),
    )
    .await;
    assert_eq!(body["data"]["status"], "active");

    let (_, body) = send(
        &router,
        empty_request(Method::POST, &format!("/api/calls/end/{}", call_id), Some(&ada_token)),
    )
    .await;
    assert_eq!(body["data"]["status"], "ended");

    let (_, body) = send(
        &router,
        empty_request(Method::GET, &format!("/api/calls/status/{}", match_id), Some(&bob_token)),
    )
    .await;
    assert_eq!(uuid_at(&body, "/data/id"), call_id);

    // Chat deletion ends the conversation
    let (status, _) = send(
        &router,
        empty_request(Method::DELETE, &format!("/api/chats/{}", match_id), Some(&bob_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &router,
        json_request(
            Method::POST,
            "/api/chats/message",
            Some(&ada_token),
            json!({"matchId": match_id, "content": "still there?"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
