//! Page-data routes end to end, including the production page cache.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use site_content_client::NEWS_TIMEOUT;

use super::fixtures::{body_json, Harness, BASE, SECRET};

// =============================================================================
// Collections
// =============================================================================

#[tokio::test]
async fn test_detail_page_resolves_derived_slug() {
    let h = Harness::development();
    h.serve_festivals();

    let response = h.get("/festival/neon-nights").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;

    assert_eq!(page["kind"], "festival");
    assert_eq!(page["canonical"], "/festival/neon-nights");
    assert_eq!(page["breadcrumbs"][1]["url"], "/festival");
    assert_eq!(page["breadcrumbs"][2]["name"], "Neon Nights");

    let item = &page["item"];
    assert_eq!(item["id"], "1");
    assert_eq!(item["image_1"], "https://cdn.test/n1.jpg");
    assert!(!item["summary"].as_str().unwrap().contains('<'));
    assert_eq!(item["navigation"]["prev"], "/festival/arc-sessions");
    assert_eq!(item["navigation"]["next"], "/festival/arc-sessions");

    assert!(h
        .stub
        .requests()
        .contains(&format!("{BASE}/festival/1?device=desktop")));
}

#[tokio::test]
async fn test_mobile_agents_get_mobile_images() {
    let h = Harness::development();
    h.serve_festivals();

    let response = h
        .send(
            Request::get("/festival/neon-nights")
                .header(header::USER_AGENT, "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    let page = body_json(response).await;
    assert_eq!(page["item"]["image_1"], "https://cdn.test/n1-m.jpg");
    assert!(h
        .stub
        .requests()
        .iter()
        .all(|url| url.ends_with("device=mobile")));
}

#[tokio::test]
async fn test_detail_falls_back_to_listed_record_when_view_fetch_fails() {
    let h = Harness::development();
    h.stub
        .respond_json(&format!("{BASE}/festival"), &super::fixtures::festival_listing());
    h.stub.respond(&format!("{BASE}/festival/1"), 502, "");

    let response = h.get("/festival/neon-nights").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["item"]["title"], "Neon Nights");
}

#[tokio::test]
async fn test_upstream_error_renders_empty_listing() {
    let h = Harness::development();
    h.stub.respond(&format!("{BASE}/festival"), 500, "boom");

    let response = h.get("/festival").await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["items"], json!([]));
    assert_eq!(page["label"], "Festivals");
}

#[tokio::test]
async fn test_unknown_collection_and_slug_are_not_found() {
    let h = Harness::development();
    h.serve_festivals();

    assert_eq!(h.get("/concerts").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        h.get("/festival/does-not-exist").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_route_segment_aliases() {
    let h = Harness::development();
    h.stub
        .respond_json(&format!("{BASE}/artist"), &json!({"items": [{"id": "5", "title": "Mira"}]}));

    let page = body_json(h.get("/artist-spotlight").await).await;

    assert_eq!(page["canonical"], "/artist-spotlight");
    assert_eq!(page["items"][0]["href"], "/artist-spotlight/mira");
}

// =============================================================================
// Brands
// =============================================================================

fn serve_brands(h: &Harness) {
    h.stub.respond_json(
        &format!("{BASE}/brand"),
        &json!({"items": [{"id": 9, "title": "Acme", "slug": "acme"}]}),
    );
    h.stub.respond_json(
        &format!("{BASE}/brand-detail"),
        &json!({"items": [
            {"id": 3, "title": "Launch", "slug": "launch", "brand_id": 9, "display_order": 1},
            {"id": 4, "title": "Encore", "brand_id": 9, "display_order": 2},
            {"id": 7, "title": "Elsewhere", "brand_id": 11}
        ]}),
    );
}

#[tokio::test]
async fn test_brand_page_lists_only_its_projects() {
    let h = Harness::development();
    serve_brands(&h);

    let page = body_json(h.get("/brands/acme").await).await;

    let hrefs: Vec<&str> = page["projects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|card| card["href"].as_str().unwrap())
        .collect();
    assert_eq!(hrefs, vec!["/brands/acme/launch", "/brands/acme/encore"]);
}

#[tokio::test]
async fn test_project_page_navigates_within_brand() {
    let h = Harness::development();
    serve_brands(&h);

    let response = h.get("/brands/acme/launch").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;

    assert_eq!(page["canonical"], "/brands/acme/launch");
    assert_eq!(page["project"]["navigation"]["next"], "/brands/acme/encore");

    assert_eq!(
        h.get("/brands/acme/elsewhere").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(h.get("/brands/nobody").await.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// News
// =============================================================================

#[tokio::test]
async fn test_news_filters_group_by_category() {
    let h = Harness::development();
    h.stub.respond_json(
        &format!("{BASE}/news"),
        &json!({"items": [
            {"id": "n1", "title": "One", "category_slug": "Events", "category_name": "Events"},
            {"id": "n2", "title": "Two", "category_slug": "events", "category_name": "Events"},
            {"id": "n3", "title": "Three", "category_slug": "press", "category_name": "Press"},
            {"id": "n4", "title": "Four"}
        ]}),
    );

    let page = body_json(h.get("/news").await).await;

    assert_eq!(page["items"].as_array().unwrap().len(), 4);
    assert_eq!(page["items"][3]["category"], "all");
    assert_eq!(
        page["filters"],
        json!([
            {"slug": "all", "name": "All", "count": 4},
            {"slug": "events", "name": "Events", "count": 2},
            {"slug": "press", "name": "Press", "count": 1}
        ])
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_news_upstream_renders_empty() {
    let h = Harness::development();
    h.stub
        .respond_json(&format!("{BASE}/news"), &json!({"items": [{"id": "n1"}]}));
    h.stub.set_delay(NEWS_TIMEOUT * 2);

    let page = body_json(h.get("/news").await).await;

    assert_eq!(page["items"], json!([]));
    assert_eq!(page["filters"][0]["count"], 0);
}

// =============================================================================
// Production page cache
// =============================================================================

#[tokio::test]
async fn test_page_cache_serves_repeat_requests() {
    let h = Harness::production();
    h.serve_festivals();

    let first = body_json(h.get("/festival").await).await;
    let fetches = h.stub.request_count();
    let second = body_json(h.get("/festival?utm_source=mail").await).await;

    assert_eq!(first, second);
    assert_eq!(h.stub.request_count(), fetches);
    assert_eq!(h.state.pages.len(), 1);
}

#[tokio::test]
async fn test_development_never_caches_pages() {
    let h = Harness::development();
    h.serve_festivals();

    h.get("/festival").await;
    h.get("/festival").await;

    assert_eq!(h.stub.request_count(), 2);
    assert!(h.state.pages.is_empty());
}

#[tokio::test]
async fn test_tag_revalidation_refetches_content() {
    let h = Harness::production();
    h.serve_festivals();

    h.get("/festival").await;
    let fetches = h.stub.request_count();

    let response = h
        .post_json(
            "/api/revalidate",
            &json!({"token": SECRET, "tag": "collections:festival"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(h.state.pages.is_empty());

    h.get("/festival").await;
    assert_eq!(h.stub.request_count(), fetches + 1);
}

#[tokio::test]
async fn test_path_revalidation_refetches_content() {
    let h = Harness::production();
    let listing = |title: &str| json!({"items": [{"id": "1", "title": title}]});
    h.stub.respond_json(&format!("{BASE}/festival"), &listing("Old"));

    let before = body_json(h.get("/festival").await).await;
    assert_eq!(before["items"][0]["title"], "Old");
    let fetches = h.stub.request_count();

    h.stub.respond_json(&format!("{BASE}/festival"), &listing("New"));
    let response = h
        .get(&format!("/api/revalidate?secret={SECRET}&path=/festival"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(h.state.pages.is_empty());

    let after = body_json(h.get("/festival").await).await;
    assert_eq!(after["items"][0]["title"], "New");
    assert_eq!(h.stub.request_count(), fetches + 1);
    assert_eq!(h.state.pages.len(), 1);
}

#[tokio::test]
async fn test_brand_tag_revalidation_reaches_every_brand_sharing_the_listing() {
    let h = Harness::production();
    let projects = |title: &str| {
        json!({"items": [
            {"id": 3, "title": "Launch", "brand_id": 7},
            {"id": 4, "title": title, "brand_id": 8}
        ]})
    };
    h.stub.respond_json(
        &format!("{BASE}/brand"),
        &json!({"items": [
            {"id": 7, "title": "Acme", "slug": "acme"},
            {"id": 8, "title": "Bolt", "slug": "bolt"}
        ]}),
    );
    h.stub
        .respond_json(&format!("{BASE}/brand-detail"), &projects("Tour"));

    h.get("/brands/acme").await;
    h.get("/brands/bolt").await;

    h.stub
        .respond_json(&format!("{BASE}/brand-detail"), &projects("Tour 2026"));
    let response = h
        .post_json("/api/revalidate", &json!({"token": SECRET, "tag": "brand:8"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_json(h.get("/brands/bolt").await).await;
    assert_eq!(page["projects"][0]["title"], "Tour 2026");
}
