//! HTTP API tests
//!
//! Exercises `/visit`, `/visitor` and `/health` through actix-web's test
//! harness with an in-memory store.

use std::sync::Arc;

use actix_web::cookie::{Cookie, SameSite};
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::Value;

use visitrack::api::services::{AppStartTime, AppState};
use visitrack::config::{SameSitePolicy, StaticConfig};
use visitrack::runtime::modes::server::configure_app;
use visitrack::storage::MemoryStorage;
use visitrack::visitor::{RequestContext, VisitorStore};

const BROWSER: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0)";

fn test_config() -> StaticConfig {
    let mut config = StaticConfig::default();
    config.visitor.hashids_key = "HashidsKey".to_string();
    config
}

fn app_state(config: &StaticConfig) -> (AppState, Arc<MemoryStorage>) {
    let store = Arc::new(MemoryStorage::new());
    let state = AppState::from_config(config, store.clone()).unwrap();
    (state, store)
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .app_data(web::Data::new(AppStartTime::now()))
                .configure(configure_app),
        )
        .await
    };
}

#[actix_web::test]
async fn test_first_visit_sets_cookie() {
    let (state, store) = app_state(&test_config());
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/visit")
        .insert_header(("user-agent", BROWSER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "visitor")
        .expect("visitor cookie")
        .into_owned();
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.max_age(), Some(CookieDuration::days(3650)));
    assert_eq!(cookie.same_site(), None);
    assert_eq!(cookie.http_only(), None);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["is_new"], true);
    assert_eq!(body["data"]["is_bot"], false);
    assert_eq!(body["data"]["token"], cookie.value());
    assert_eq!(body["data"]["visitor_id"], 1);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[actix_web::test]
async fn test_returning_visitor_is_recognised() {
    let (state, store) = app_state(&test_config());
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/visit")
        .insert_header(("user-agent", BROWSER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let token = resp
        .response()
        .cookies()
        .find(|c| c.name() == "visitor")
        .map(|c| c.value().to_string())
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/visit")
        .insert_header(("user-agent", BROWSER))
        .cookie(Cookie::new("visitor", token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let refreshed = resp
        .response()
        .cookies()
        .find(|c| c.name() == "visitor")
        .map(|c| c.value().to_string());
    assert_eq!(refreshed.as_deref(), Some(token.as_str()));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["is_new"], false);
    assert_eq!(body["data"]["visitor_id"], 1);
    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.snapshot()[0].visits_count, 2);
}

#[actix_web::test]
async fn test_curl_gets_no_cookie() {
    let (state, store) = app_state(&test_config());
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/visit?utm_source=cli")
        .insert_header(("user-agent", "curl/7.68.0"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("set-cookie").is_none());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["is_bot"], true);
    assert_eq!(body["data"]["visitor_id"], Value::Null);
    assert_eq!(body["data"]["token"], Value::Null);
    assert!(body["data"]["first_visit"].is_string());
    assert_eq!(store.count().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_visitor_endpoint_returns_404_for_bots() {
    let (state, _store) = app_state(&test_config());
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/visitor")
        .insert_header(("user-agent", "Mozilla/5.0 (compatible; bingbot/2.0)"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 2000);
}

#[actix_web::test]
async fn test_utm_parameters_are_attributed() {
    let (state, store) = app_state(&test_config());
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/visitor?utm_source=newsletter&utm_medium=email")
        .insert_header(("user-agent", BROWSER))
        .insert_header(("referer", "https://mail.example.com/"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.response().cookies().any(|c| c.name() == "utm"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["is_new"], true);
    assert_eq!(body["data"]["visitor"]["utm_source"], "newsletter");
    assert_eq!(body["data"]["visitor"]["utm_medium"], "email");
    assert_eq!(
        body["data"]["visitor"]["http_referer"],
        "https://mail.example.com/"
    );

    let record = &store.snapshot()[0];
    assert_eq!(record.attribution.utm_source.as_deref(), Some("newsletter"));
    assert_eq!(
        record.request_uri.as_deref(),
        Some("/visitor?utm_source=newsletter&utm_medium=email")
    );
}

#[actix_web::test]
async fn test_configured_cookie_attributes() {
    let mut config = test_config();
    config.visitor.cookie.name = "my_visitor".to_string();
    config.visitor.cookie.validity = "1y".to_string();
    config.visitor.cookie.secure = true;
    config.visitor.cookie.http_only = true;
    config.visitor.cookie.same_site = Some(SameSitePolicy::Strict);
    config.visitor.cookie.domain = Some("example.com".to_string());
    let (state, _store) = app_state(&config);
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/visit")
        .insert_header(("user-agent", BROWSER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "my_visitor")
        .expect("configured cookie name")
        .into_owned();
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.domain(), Some("example.com"));
    assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    assert_eq!(cookie.max_age(), Some(CookieDuration::days(365)));
}

#[actix_web::test]
async fn test_health_reports_visitor_count() {
    let (state, store) = app_state(&test_config());
    let app = init_app!(state);

    let new = RequestContext::http().new_visitor(Default::default(), chrono::Utc::now());
    store.insert(&new).await.unwrap();

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["checks"]["storage"]["backend"], "memory");
    assert_eq!(body["data"]["checks"]["storage"]["visitors_count"], 1);

    let req = test::TestRequest::get().uri("/health/live").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}
