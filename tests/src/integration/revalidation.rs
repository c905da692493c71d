//! `/api/revalidate` through the full middleware stack.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use site_telemetry::REVALIDATIONS_TOTAL;

use super::fixtures::{body_json, Harness, PurgeCall, SECRET};

// =============================================================================
// Authorization and target selection
// =============================================================================

#[tokio::test]
async fn test_tag_revalidation_purges_exactly_once() {
    let (h, recorder) = Harness::recording(30);

    let response = h
        .post_json(
            "/api/revalidate",
            &json!({"token": SECRET, "tag": "collections:festival", "type": "tag"}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "29");
    assert_eq!(
        body_json(response).await,
        json!({"revalidated": true, "type": "tag"})
    );
    assert_eq!(
        recorder.calls(),
        vec![PurgeCall::Tag("collections:festival".into())]
    );
    assert_eq!(
        h.state
            .metrics
            .get(REVALIDATIONS_TOTAL, &[("outcome", "ok"), ("type", "tag")]),
        1
    );
}

#[tokio::test]
async fn test_token_is_trimmed_and_query_secret_wins() {
    let (h, recorder) = Harness::recording(30);

    let padded = h
        .post_json(
            "/api/revalidate",
            &json!({"token": format!("  {SECRET}\n"), "path": "festival"}),
        )
        .await;
    assert_eq!(padded.status(), StatusCode::OK);

    let overridden = h
        .post_json(
            "/api/revalidate?secret=wrong",
            &json!({"token": SECRET, "path": "/festival"}),
        )
        .await;
    assert_eq!(overridden.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(recorder.calls(), vec![PurgeCall::Path("/festival".into())]);
}

#[tokio::test]
async fn test_bad_secret_is_unauthorized() {
    let (h, recorder) = Harness::recording(30);

    let response = h
        .post_json("/api/revalidate", &json!({"token": "nope", "tag": "news"}))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({"revalidated": false, "message": "Invalid token"})
    );
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn test_empty_secret_never_authorizes() {
    let (h, recorder) = Harness::recording(30);

    let response = h.get("/api/revalidate?secret=&tag=news").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn test_traversal_path_is_rejected_without_purge() {
    let (h, recorder) = Harness::recording(30);

    let response = h
        .post_json(
            "/api/revalidate",
            &json!({"token": SECRET, "path": "/festival/../admin"}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["revalidated"], false);
    assert!(recorder.calls().is_empty());
    assert_eq!(
        h.state
            .metrics
            .get(REVALIDATIONS_TOTAL, &[("outcome", "invalid")]),
        1
    );
}

#[tokio::test]
async fn test_missing_target_is_bad_request() {
    let (h, recorder) = Harness::recording(30);

    let response = h.post_json("/api/revalidate", &json!({"token": SECRET})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let malformed = h
        .send(
            Request::post(format!("/api/revalidate?secret={SECRET}"))
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn test_get_prefers_tag_over_path() {
    let (h, recorder) = Harness::recording(30);

    let response = h
        .get(&format!("/api/revalidate?secret={SECRET}&tag=brands&path=/brands"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["type"], "tag");
    assert_eq!(recorder.calls(), vec![PurgeCall::Tag("brands".into())]);
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn test_second_request_in_window_is_rate_limited() {
    let (h, recorder) = Harness::recording(1);
    let uri = format!("/api/revalidate?secret={SECRET}&tag=news");

    let first = h.get(&uri).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-ratelimit-remaining"], "0");

    let second = h.get(&uri).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = second.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1);
    assert_eq!(second.headers()["x-ratelimit-remaining"], "0");

    assert_eq!(recorder.calls().len(), 1);
}

#[tokio::test]
async fn test_rate_limit_runs_before_the_secret_check() {
    let (h, recorder) = Harness::recording(1);

    let bad = h.get("/api/revalidate?secret=wrong&tag=news").await;
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);

    let good = h
        .get(&format!("/api/revalidate?secret={SECRET}&tag=news"))
        .await;
    assert_eq!(good.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn test_window_resets_after_expiry() {
    let (h, _recorder) = Harness::recording(1);
    let uri = format!("/api/revalidate?secret={SECRET}&tag=news");

    assert_eq!(h.get(&uri).await.status(), StatusCode::OK);
    assert_eq!(h.get(&uri).await.status(), StatusCode::TOO_MANY_REQUESTS);

    h.clock.advance(h.state.config.revalidate.window_ms);
    assert_eq!(h.get(&uri).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_clients_are_limited_independently() {
    let (h, _recorder) = Harness::recording(1);
    let request = |client: &str| {
        Request::get(format!("/api/revalidate?secret={SECRET}&tag=news"))
            .header("x-forwarded-for", format!("{client}, 10.0.0.1"))
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(h.send(request("203.0.113.7")).await.status(), StatusCode::OK);
    assert_eq!(h.send(request("198.51.100.2")).await.status(), StatusCode::OK);
    assert_eq!(
        h.send(request("203.0.113.7")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_other_routes_are_not_rate_limited() {
    let (h, _recorder) = Harness::recording(1);

    for _ in 0..3 {
        assert_eq!(h.get("/api/health").await.status(), StatusCode::OK);
    }
}
