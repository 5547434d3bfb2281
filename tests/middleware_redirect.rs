mod common;

use axum_test::TestServer;
use chrono::{Duration, Utc};
use common::{TestAppBuilder, rule, rule_with_status};
use redirect_engine::domain::entities::RuleRecord;

fn server(app: &common::TestApp) -> TestServer {
    TestServer::new(app.router.clone()).unwrap()
}

#[tokio::test]
async fn test_placeholder_redirect() {
    let app = TestAppBuilder::new(vec![rule(1, "placeholder", "/blog/{slug}", "/articles/{slug}")])
        .build()
        .await;
    let server = server(&app);

    let response = server.get("/blog/hello-world").await;

    assert_eq!(response.status_code(), 301);
    assert_eq!(response.header("location"), "/articles/hello-world");
}

#[tokio::test]
async fn test_regex_redirect_with_status() {
    let app = TestAppBuilder::new(vec![rule_with_status(
        2,
        "regex",
        r"^/old/(\d+)$",
        "/new/$1",
        302,
    )])
    .build()
    .await;
    let server = server(&app);

    let response = server.get("/old/42").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "/new/42");
}

#[tokio::test]
async fn test_gone_has_no_location() {
    let app = TestAppBuilder::new(vec![rule_with_status(3, "exact", "/retired", "", 410)])
        .build()
        .await;
    let server = server(&app);

    let response = server.get("/retired").await;

    assert_eq!(response.status_code(), 410);
    assert!(response.headers().get("location").is_none());
}

#[tokio::test]
async fn test_exact_beats_placeholder_and_trailing_slash_is_ignored() {
    let app = TestAppBuilder::new(vec![
        rule(1, "placeholder", "/blog/{slug}", "/articles/{slug}"),
        rule(2, "exact", "/blog/about", "/about"),
    ])
    .build()
    .await;
    let server = server(&app);

    let response = server.get("/blog/about/").await;

    assert_eq!(response.header("location"), "/about");
}

#[tokio::test]
async fn test_lowest_id_wins_among_equal_rules() {
    let app = TestAppBuilder::new(vec![
        rule(9, "exact", "/dup", "/nine"),
        rule(4, "exact", "/dup", "/four"),
    ])
    .build()
    .await;
    let server = server(&app);

    for _ in 0..3 {
        let response = server.get("/dup").await;
        assert_eq!(response.header("location"), "/four");
    }
}

#[tokio::test]
async fn test_no_match_passes_through() {
    let app = TestAppBuilder::new(vec![rule(1, "exact", "/old", "/new")])
        .build()
        .await;
    let server = server(&app);

    let response = server.get("/landing").await;

    response.assert_status_ok();
    response.assert_text("landing");
}

#[tokio::test]
async fn test_only_get_post_head_are_redirected() {
    let app = TestAppBuilder::new(vec![rule(1, "exact", "/landing", "/elsewhere")])
        .build()
        .await;
    let server = server(&app);

    assert_eq!(server.get("/landing").await.status_code(), 301);
    assert_eq!(server.post("/landing").await.status_code(), 301);

    let response = server.put("/landing").await;
    response.assert_status_ok();
    response.assert_text("put");
}

#[tokio::test]
async fn test_scheme_constraint_uses_forwarded_proto() {
    let https_only = RuleRecord {
        scheme: "https".to_string(),
        ..rule(1, "exact", "/secure", "/secure-landing")
    };
    let app = TestAppBuilder::new(vec![https_only]).build().await;
    let server = server(&app);

    let plain = server.get("/secure").await;
    assert_eq!(plain.status_code(), 404);

    let forwarded = server
        .get("/secure")
        .add_header("X-Forwarded-Proto", "https")
        .await;
    assert_eq!(forwarded.status_code(), 301);
    assert_eq!(forwarded.header("location"), "/secure-landing");
}

#[tokio::test]
async fn test_disabled_and_expired_rules_never_match() {
    let disabled = RuleRecord {
        enabled: false,
        ..rule(1, "exact", "/off", "/x")
    };
    let expired = RuleRecord {
        to_date: Some(Utc::now() - Duration::hours(1)),
        ..rule(2, "exact", "/expired", "/x")
    };
    let upcoming = RuleRecord {
        from_date: Some(Utc::now() + Duration::hours(1)),
        ..rule(3, "exact", "/upcoming", "/x")
    };
    let app = TestAppBuilder::new(vec![disabled, expired, upcoming])
        .build()
        .await;
    let server = server(&app);

    for path in ["/off", "/expired", "/upcoming"] {
        assert_eq!(server.get(path).await.status_code(), 404, "{path}");
    }
}

#[tokio::test]
async fn test_base_path_is_stripped() {
    let app = TestAppBuilder::new(vec![rule(1, "exact", "/promo", "/shop/sale")])
        .base_path("/shop")
        .build()
        .await;
    let server = server(&app);

    let response = server.get("/shop/promo").await;

    assert_eq!(response.header("location"), "/shop/sale");
}

#[tokio::test]
async fn test_query_string_is_dropped_unless_preserved() {
    let rules = vec![rule(1, "exact", "/old", "/new?ref=redirect")];

    let app = TestAppBuilder::new(rules.clone()).build().await;
    let response = server(&app).get("/old?utm=mail").await;
    assert_eq!(response.header("location"), "/new?ref=redirect");

    let app = TestAppBuilder::new(rules).preserve_query_string().build().await;
    let response = server(&app).get("/old?utm=mail").await;
    assert_eq!(response.header("location"), "/new?ref=redirect&utm=mail");
}

#[tokio::test]
async fn test_unrepresentable_location_fails_open() {
    let app = TestAppBuilder::new(vec![rule(1, "exact", "/landing", "/bad\nline")])
        .build()
        .await;
    let server = server(&app);

    let response = server.get("/landing").await;

    response.assert_status_ok();
    response.assert_text("landing");
}

#[tokio::test]
async fn test_condition_veto_passes_through() {
    let app = TestAppBuilder::new(vec![rule(1, "exact", "/landing", "/landing/")])
        .conditions(&["no-self-redirect"])
        .build()
        .await;
    let server = server(&app);

    let response = server.get("/landing").await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_dry_run_describes_redirect_and_passes_through() {
    let app = TestAppBuilder::new(vec![rule(1, "exact", "/landing", "/elsewhere")])
        .build()
        .await;
    let server = server(&app);

    let response = server
        .get("/landing")
        .add_header("X-Redirect-Tester", "Tester")
        .await;

    response.assert_status_ok();
    response.assert_text("landing");
    assert_eq!(response.header("x-redirect-match"), "1");
    assert_eq!(response.header("x-redirect-location"), "/elsewhere");
    assert_eq!(response.header("x-redirect-status"), "301");
    assert!(app.cache.is_empty());
}

#[tokio::test]
async fn test_dry_run_reports_no_match() {
    let app = TestAppBuilder::new(Vec::new()).build().await;
    let server = server(&app);

    let response = server
        .get("/nothing")
        .add_header("X-Redirect-Tester", "Tester")
        .await;

    assert_eq!(response.status_code(), 404);
    assert_eq!(response.header("x-redirect-match"), "none");
}

#[tokio::test]
async fn test_custom_tester_header_and_wrong_value() {
    let app = TestAppBuilder::new(vec![rule(1, "exact", "/landing", "/elsewhere")])
        .tester_header("x-qa", "yes")
        .build()
        .await;
    let server = server(&app);

    let wrong = server.get("/landing").add_header("x-qa", "no").await;
    assert_eq!(wrong.status_code(), 301);

    let tester = server.get("/landing").add_header("x-qa", "yes").await;
    tester.assert_status_ok();
    assert_eq!(tester.header("x-redirect-location"), "/elsewhere");
}

#[tokio::test]
async fn test_publish_replaces_cached_no_match() {
    let app = TestAppBuilder::new(Vec::new()).build().await;
    let server = server(&app);

    assert_eq!(server.get("/promo").await.status_code(), 404);

    app.rules.push(rule(5, "exact", "/promo", "/sale"));
    let published = server
        .post("/_redirect/publish")
        .add_header("Authorization", format!("Bearer {}", common::ADMIN_TOKEN))
        .await;
    published.assert_status_ok();

    let response = server.get("/promo").await;
    assert_eq!(response.status_code(), 301);
    assert_eq!(response.header("location"), "/sale");
}

#[tokio::test]
async fn test_engine_endpoints_are_not_redirected() {
    let app = TestAppBuilder::new(vec![rule(1, "regex", "^/.*$", "/maintenance")])
        .build()
        .await;
    let server = server(&app);

    server.get("/health").await.assert_status_ok();
    assert_eq!(server.get("/anything").await.status_code(), 301);
}
