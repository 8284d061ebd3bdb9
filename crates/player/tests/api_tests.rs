//! HTTP surface tests: routes, error mapping and middleware.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, build_test_app, get, menu_docs, post, post_json};
use serde_json::json;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Test: GET /health reports a healthy menu and version
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn health_check_returns_ok_with_json() {
    let app = build_test_app(menu_docs("Main")).await;
    let response = get(&app.router, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().get("x-request-id").is_some(),
        "Response must contain an x-request-id header"
    );

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["menu"]["state"], "ready");
}

// ---------------------------------------------------------------------------
// Test: unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn unknown_route_returns_404() {
    let app = build_test_app(menu_docs("Main")).await;
    let response = get(&app.router, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: GET /api/v1/menu returns the board grouped into columns
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn menu_returns_board_view() {
    let app = build_test_app(menu_docs("Main")).await;
    let response = get(&app.router, "/api/v1/menu").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];

    assert_eq!(data["status"]["state"], "ready");
    assert_eq!(data["sequence"], 1);
    assert_eq!(data["board"]["title"], "Main");
    assert_eq!(data["board"]["announcement"], "Happy hour 4-6");

    let drinks = &data["board"]["columns"][0];
    assert_eq!(drinks["label"], "DRINK ME");
    let latte = &drinks["sections"][0]["items"][0];
    assert_eq!(latte["price"], "$4.50");
    assert_eq!(latte["sold_out"], true);
    assert_eq!(latte["linked_screen_id"], "coffee-info");

    let food = &data["board"]["columns"][1];
    assert_eq!(food["label"], "EAT ME");
    assert_eq!(food["sections"][0]["items"][0]["price"], "$4.25");
}

// ---------------------------------------------------------------------------
// Test: key presses drive the screen mode
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn key_press_shows_and_escape_returns() {
    let app = build_test_app(menu_docs("Main")).await;

    let response = post_json(&app.router, "/api/v1/input/key", json!({ "key": "c" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["consumed"], true);
    assert_eq!(json["data"]["state"]["mode"], "secondary");
    assert_eq!(json["data"]["state"]["active_screen"]["_id"], "coffee-info");
    assert_eq!(json["data"]["state"]["timeout_remaining"], 5);

    let response = get(&app.router, "/api/v1/screen").await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["mode"], "secondary");

    let response = post_json(
        &app.router,
        "/api/v1/input/key",
        json!({ "key": "Escape", "target": "text_entry" }),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["consumed"], false);
    assert_eq!(json["data"]["state"]["mode"], "secondary");

    let response = post_json(&app.router, "/api/v1/input/key", json!({ "key": "Escape" })).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["consumed"], true);
    assert_eq!(json["data"]["state"]["mode"], "primary");
}

// ---------------------------------------------------------------------------
// Test: tap path, countdown endpoints and sleep toggle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn screen_and_timeout_endpoints() {
    let app = build_test_app(menu_docs("Main")).await;

    let response = post_json(
        &app.router,
        "/api/v1/screen/show",
        json!({ "screen_id": "specials" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["timeout_remaining"], 10);

    let json = body_json(post(&app.router, "/api/v1/timeout/pause").await).await;
    assert_eq!(json["data"]["timeout_running"], false);

    let response = post_json(&app.router, "/api/v1/timeout/extend", json!({ "seconds": 20 })).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["timeout_remaining"], 30);

    let json = body_json(post(&app.router, "/api/v1/timeout/reset").await).await;
    assert_eq!(json["data"]["timeout_remaining"], 10);

    let json = body_json(post(&app.router, "/api/v1/screen/return").await).await;
    assert_eq!(json["data"]["mode"], "primary");
    assert!(json["data"]["timeout_remaining"].is_null());

    let json = body_json(post(&app.router, "/api/v1/sleep/toggle").await).await;
    assert_eq!(json["data"]["sleep_mode"], true);
}

// ---------------------------------------------------------------------------
// Test: errors map to status codes and the JSON error body
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn errors_use_status_codes_and_json_body() {
    let app = build_test_app(menu_docs("Main")).await;

    let response = post_json(
        &app.router,
        "/api/v1/screen/show",
        json!({ "screen_id": "missing" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert!(json["error"].as_str().unwrap().contains("missing"));

    let response = post_json(&app.router, "/api/v1/screen/show", json!({ "screen_id": "" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = post_json(&app.router, "/api/v1/timeout/extend", json!({ "seconds": 0 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(&app.router, "/api/v1/input/key", json!({ "key": "" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");

    let response = post(&app.router, "/api/v1/timeout/pause").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");
}

// ---------------------------------------------------------------------------
// Test: malformed request bodies get a 400 with the JSON error body
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn malformed_bodies_return_bad_request() {
    let app = build_test_app(menu_docs("Main")).await;

    for (body, expected) in [
        (json!({}), "missing field `seconds`"),
        (json!({ "seconds": -1 }), "invalid value"),
        (json!({ "seconds": "ten" }), "invalid type"),
    ] {
        let response = post_json(&app.router, "/api/v1/timeout/extend", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "BAD_REQUEST");
        assert!(json["error"].as_str().unwrap().contains(expected));
    }

    let response = post_json(
        &app.router,
        "/api/v1/input/key",
        json!({ "key": "c", "target": "keyboard" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");

    // No JSON content type at all.
    let response = post(&app.router, "/api/v1/screen/show").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Test: a stopped controller answers 503
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn stopped_controller_returns_503() {
    let app = build_test_app(menu_docs("Main")).await;
    app.player.shutdown().await;

    let response = get(&app.router, "/api/v1/screen").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ---------------------------------------------------------------------------
// Test: CORS preflight OPTIONS request returns correct headers
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cors_preflight_returns_correct_headers() {
    let app = build_test_app(menu_docs("Main")).await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/menu")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
}
