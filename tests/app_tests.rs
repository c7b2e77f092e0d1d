#![cfg(feature = "web")]

mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode, header};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use common::{Fixture, THREE_RECORDS};
use fashion_explorer::AppConfig;
use fashion_explorer::app::{AppState, router};

const ALL_PRODUCTS: &str = "applied=1&category=Tops&category=Shoes&min_rating=0&price_low=0&price_high=1000";

// Router wrapper holding the on-disk fixture alive
struct TestApp {
    router: Router,
    state: Arc<AppState>,
    _fixture: Fixture,
}

impl TestApp {
    fn new() -> Self {
        let fixture = Fixture::new(THREE_RECORDS, &["1.jpg", "3.jpg"]);
        let mut config = AppConfig::default();
        config.data.catalog_path = fixture.catalog_path().display().to_string();
        config.data.images_dir = fixture.images_dir().display().to_string();
        config.data.static_dir = fixture.dir.path().display().to_string();

        let state = Arc::new(AppState::new(config).expect("templates register"));
        TestApp {
            router: router(state.clone()),
            state,
            _fixture: fixture,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    /// Logs in as admin and returns the `session=...` cookie pair
    async fn login(&self) -> String {
        let response = self
            .post_form("/login", "username=admin&password=admin123", None)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard?welcome=1");

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect location")
        .to_str()
        .unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn login_page_is_public() {
    let app = TestApp::new();
    let response = app.get("/", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Enable Camera"));
    assert!(page.contains("name=\"password\""));
}

#[tokio::test]
async fn protected_routes_redirect_to_login() {
    let app = TestApp::new();
    for uri in ["/dashboard", "/api/view", "/chart", "/image/1", "/download/csv"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), "/");
    }

    let response = app.get("/dashboard", Some("session=not-a-session")).await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::new();
    let response = app
        .post_form("/login", "username=admin&password=letmein", None)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(body_text(response).await.contains("Invalid credentials!"));
}

#[tokio::test]
async fn dashboard_after_login() {
    let app = TestApp::new();
    let cookie = app.login().await;

    let response = app.get("/", Some(&cookie)).await;
    assert_eq!(location(&response), "/dashboard");

    let response = app.get("/dashboard?welcome=1", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Login successful!"));
    assert!(page.contains("₹ 150.00"));
    assert!(page.contains("4.00 ⭐"));
    assert!(page.contains("<svg"));
    assert!(page.contains("/image/1?effect"));
    assert!(page.contains("Your wishlist is empty."));
}

#[tokio::test]
async fn empty_selection_shows_warning() {
    let app = TestApp::new();
    let cookie = app.login().await;

    let page = body_text(app.get("/dashboard?applied=1", Some(&cookie)).await).await;
    assert!(page.contains("No products available in selected categories."));
    assert!(page.contains("no data"));
}

#[tokio::test]
async fn api_view_reflects_query() {
    let app = TestApp::new();
    let cookie = app.login().await;

    let uri = format!("/api/view?{}&search=3&effect=Blur", ALL_PRODUCTS);
    let response = app.get(&uri, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let view: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    let ids: Vec<&str> = view["filtered"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["product_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["3"]);
    assert_eq!(view["summary"]["avg_price"], 300.0);
    assert_eq!(view["request"]["effect"], "Blur");
    assert_eq!(view["image"]["status"], "available");
}

#[tokio::test]
async fn images_are_served_with_effects() {
    let app = TestApp::new();
    let cookie = app.login().await;

    let response = app.get("/image/1?effect=Grayscale", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let image = image::load_from_memory(&body_bytes(response).await).unwrap();
    assert!(matches!(image, image::DynamicImage::ImageLuma8(_)));

    let response = app.get("/image/2", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.starts_with("Image not found: "));

    let response = app.get("/image/99", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wishlist_add_redirects_once() {
    let app = TestApp::new();
    let cookie = app.login().await;
    let form = "product_id=1&return_to=applied%3D1%26category%3DTops";

    let response = app.post_form("/wishlist", form, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard?applied=1&category=Tops&wishlisted=1");

    let response = app.post_form("/wishlist", form, Some(&cookie)).await;
    assert_eq!(location(&response), "/dashboard?applied=1&category=Tops");

    let wishlist: Value = serde_json::from_slice(
        &body_bytes(app.get("/api/wishlist", Some(&cookie)).await).await,
    )
    .unwrap();
    assert_eq!(wishlist.as_array().unwrap().len(), 1);
    assert_eq!(wishlist[0]["product_id"], "1");

    let response = app
        .post_form("/wishlist", "product_id=99&return_to=", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn downloads_match_the_filtered_view() {
    let app = TestApp::new();
    let cookie = app.login().await;

    let response = app.get("/download/csv", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"filtered_data.csv\""
    );
    assert_eq!(
        body_text(response).await,
        "product_id,category,price,rating,image_name\n1,Tops,150,4,1.jpg\n"
    );

    let uri = format!("/download/xlsx?{}", ALL_PRODUCTS);
    let bytes = body_bytes(app.get(&uri, Some(&cookie)).await).await;
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn chart_endpoint_serves_svg() {
    let app = TestApp::new();
    let cookie = app.login().await;

    let uri = format!("/chart?{}&chart=Pie+Chart+%28Category+Distribution%29", ALL_PRODUCTS);
    let response = app.get(&uri, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
    assert!(body_text(response).await.contains("%"));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new();
    let cookie = app.login().await;
    app.post_form("/wishlist", "product_id=1&return_to=", Some(&cookie))
        .await;

    let response = app.post_form("/logout", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app.get("/api/wishlist", Some(&cookie)).await;
    assert_eq!(location(&response), "/");

    let fresh = app.login().await;
    let wishlist: Value =
        serde_json::from_slice(&body_bytes(app.get("/api/wishlist", Some(&fresh)).await).await)
            .unwrap();
    assert!(wishlist.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn wishlist_redirect_drops_unsafe_return_to() {
    let app = TestApp::new();
    let cookie = app.login().await;

    let response = app
        .post_form("/wishlist", "product_id=1&return_to=a%0Ab", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard?wishlisted=1");

    let response = app
        .post_form("/wishlist", "product_id=1&return_to=applied%3D1%26search%3D%01", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard?applied=1");
}

#[tokio::test]
async fn logging_in_again_replaces_the_old_session() {
    let app = TestApp::new();
    let first = app.login().await;
    assert_eq!(app.state.sessions.len(), 1);

    let response = app
        .post_form("/login", "username=admin&password=admin123", Some(&first))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.state.sessions.len(), 1);

    let response = app.get("/dashboard", Some(&first)).await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn missing_image_hides_wishlist_button() {
    let app = TestApp::new();
    let cookie = app.login().await;

    let uri = format!("/dashboard?{}&product=2", ALL_PRODUCTS);
    let page = body_text(app.get(&uri, Some(&cookie)).await).await;
    assert!(page.contains("Image not found: "));
    assert!(!page.contains("Add to Wishlist"));

    let uri = format!("/dashboard?{}&product=1", ALL_PRODUCTS);
    let page = body_text(app.get(&uri, Some(&cookie)).await).await;
    assert!(page.contains("Add to Wishlist"));
}
