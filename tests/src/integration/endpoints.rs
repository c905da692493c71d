//! Operational endpoints, SEO files and the middleware stack.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use site_telemetry::HTTP_REQUESTS_TOTAL;

use super::fixtures::{body_bytes, body_json, body_text, Harness, BASE};

// =============================================================================
// Health and metrics
// =============================================================================

#[tokio::test]
async fn test_health_reports_build_and_region() {
    let h = Harness::development();

    let response = h
        .send(
            Request::get("/api/health")
                .header("cf-ipcountry", "SG")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["buildId"], "build-42");
    assert_eq!(body["region"], "SG");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_metrics_exposes_counters() {
    let h = Harness::development();
    h.stub.respond(&format!("{BASE}/sport"), 503, "");
    h.get("/sports").await;

    let response = h
        .send(
            Request::get("/api/metrics")
                .header("x-forwarded-for", "203.0.113.7")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; version=0.0.4"
    );
    let text = body_text(response).await;
    assert!(text.contains("http_requests_total{client=\"203.0.113.7\"} 1"));
    assert!(text.contains("upstream_errors_total{"));
    assert_eq!(
        h.state
            .metrics
            .get(HTTP_REQUESTS_TOTAL, &[("client", "203.0.113.7")]),
        1
    );
}

// =============================================================================
// Media proxy
// =============================================================================

const UPLOADS: &str = "http://cms.test/wp-content/uploads";

#[tokio::test]
async fn test_media_is_proxied_with_long_lived_headers() {
    let h = Harness::development();
    h.stub.respond_asset(
        &format!("{UPLOADS}/2026/01/poster.jpg"),
        Some("image/jpeg"),
        vec![0xFF, 0xD8, 0xFF],
    );

    let response = h
        .send(
            Request::get("/api/media/2026/01/poster.jpg")
                .header(header::USER_AGENT, "Mozilla/5.0 (X11)")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=86400, immutable");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers["cross-origin-resource-policy"], "cross-origin");
    assert_eq!(body_bytes(response).await, vec![0xFF, 0xD8, 0xFF]);
    assert_eq!(h.stub.user_agents(), vec!["Mozilla/5.0 (X11)".to_string()]);
}

#[tokio::test]
async fn test_media_without_type_or_agent_falls_back() {
    let h = Harness::development();
    h.stub
        .respond_asset(&format!("{UPLOADS}/doc.bin"), None, b"raw".to_vec());

    let response = h.get("/api/media/doc.bin").await;

    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(h.stub.user_agents(), vec![String::new()]);
}

#[tokio::test]
async fn test_missing_media_is_not_found() {
    let h = Harness::development();

    let response = h.get("/api/media/2026/01/missing.png").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Not Found");
    assert_eq!(
        h.stub.requests(),
        vec![format!("{UPLOADS}/2026/01/missing.png")]
    );
}

#[tokio::test]
async fn test_media_transport_failure_is_server_error() {
    let h = Harness::development();
    h.stub.fail(&format!("{UPLOADS}/broken.png"));

    let response = h.get("/api/media/broken.png").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Internal Server Error");
}

// =============================================================================
// SEO files
// =============================================================================

#[tokio::test]
async fn test_robots_blocks_everything_outside_production() {
    let h = Harness::development();

    let response = h.get("/robots.txt").await;

    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_text(response).await, "User-Agent: *\nDisallow: /\n");
}

#[tokio::test]
async fn test_robots_in_production_points_at_sitemap() {
    let h = Harness::production();

    let text = body_text(h.get("/robots.txt").await).await;

    assert!(text.contains("User-Agent: Googlebot\nAllow: /\nDisallow: /api/"));
    assert!(text.ends_with("Sitemap: https://19sixtyfive.com.sg/sitemap.xml\n"));
}

#[tokio::test]
async fn test_sitemap_lists_content_and_survives_outages() {
    let h = Harness::development();
    h.serve_festivals();
    h.stub.respond_json(
        &format!("{BASE}/brand"),
        &json!({"items": [{"id": 9, "slug": "acme"}]}),
    );
    h.stub.respond_json(
        &format!("{BASE}/brand-detail"),
        &json!({"items": [{"id": 3, "slug": "launch", "brand_id": 9}]}),
    );

    let response = h.get("/sitemap.xml").await;
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/xml; charset=utf-8"
    );
    let xml = body_text(response).await;
    assert!(xml.contains("<loc>https://19sixtyfive.com.sg/festival/neon-nights</loc>"));
    assert!(xml.contains("<loc>https://19sixtyfive.com.sg/brands/acme/launch</loc>"));
    // Other collections are unserved and fall back to base routes only.
    assert!(xml.contains("<loc>https://19sixtyfive.com.sg/sports</loc>"));

    let empty = Harness::development();
    let xml = body_text(empty.get("/sitemap.xml").await).await;
    assert_eq!(xml.matches("<url>").count(), 7);
}

// =============================================================================
// Middleware
// =============================================================================

#[tokio::test]
async fn test_every_response_carries_security_headers() {
    let h = Harness::development();

    let response = h.get("/api/health").await;
    let headers = response.headers();

    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    let csp = headers[header::CONTENT_SECURITY_POLICY].to_str().unwrap();
    assert!(csp.contains("'nonce-"));
    assert!(csp.contains("connect-src 'self' http://cms.test"));
    assert!(!headers.contains_key("x-robots-tag"));
}

#[tokio::test]
async fn test_noindex_only_outside_production() {
    let dev = Harness::development();
    dev.serve_festivals();
    let response = dev.get("/festival").await;
    assert_eq!(
        response.headers()["x-robots-tag"],
        "noindex, nofollow, noarchive"
    );

    let prod = Harness::production();
    prod.serve_festivals();
    let response = prod.get("/festival").await;
    assert!(!response.headers().contains_key("x-robots-tag"));
    let csp = response.headers()[header::CONTENT_SECURITY_POLICY]
        .to_str()
        .unwrap();
    assert!(!csp.contains("'unsafe-eval'"));
}

#[tokio::test]
async fn test_nonce_differs_per_request() {
    let h = Harness::development();

    let a = h.get("/api/health").await;
    let b = h.get("/api/health").await;

    assert_ne!(
        a.headers()[header::CONTENT_SECURITY_POLICY],
        b.headers()[header::CONTENT_SECURITY_POLICY]
    );
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let h = Harness::development();

    let echoed = h
        .send(
            Request::get("/api/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(echoed.headers()["x-request-id"], "req-123");

    let generated = h.get("/api/health").await;
    let id = generated.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(id.len(), 36);
    assert_ne!(id, "req-123");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let h = Harness::development();
    let limit = h.state.config.limits.max_body_bytes;

    let response = h
        .send(
            Request::post("/api/revalidate")
                .header("content-type", "application/json")
                .header(header::CONTENT_LENGTH, limit + 1)
                .body(Body::from(vec![b' '; limit + 1]))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response.headers().contains_key(header::CONTENT_SECURITY_POLICY));
}

#[tokio::test]
async fn test_unmatched_route_is_not_found() {
    let h = Harness::development();

    let response = h.get("/a/b/c").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key("x-request-id"));
}
