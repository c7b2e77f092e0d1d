use axum::{
    Extension, Form, Json, Router,
    extract::{Path, RawQuery, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::Query;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use handlebars::Handlebars;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use uuid::Uuid;

use crate::assets::{AssetStore, ImageStatus};
use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::dashboard::{self, DashboardQuery, DashboardView};
use crate::downloader::{self, CSV_FILENAME, XLSX_FILENAME};
use crate::effects::{self, Effect};
use crate::error::DashboardError;
use crate::filter;
use crate::graph::{self, ChartKind};
use crate::login::{Credentials, LoginForm, Session};
use crate::product::{Product, ProductId};
use crate::wishlist::Wishlist;

const SESSION_COOKIE: &str = "session";

/// A live session with the catalog it loaded at login
pub struct SessionEntry {
    pub session: Session,
    pub catalog: Arc<Catalog>,
    pub expires_at: SystemTime,
}

/// Sessions keyed by the value of the session cookie
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Stores a logged-in session and returns its id
    ///
    /// Expired sessions are purged first so the map cannot grow without bound.
    pub fn create(&self, session: Session, catalog: Arc<Catalog>) -> String {
        let session_id = Uuid::new_v4().to_string();
        let now = SystemTime::now();
        let entry = SessionEntry {
            session,
            catalog,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        if sessions.len() < before {
            log::info!("Purged {} expired sessions", before - sessions.len());
        }
        sessions.insert(session_id.clone(), entry);
        session_id
    }

    /// Runs `f` on a live session; expired sessions are dropped on the way
    pub fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut SessionEntry) -> R) -> Option<R> {
        let mut sessions = self.sessions.write();
        let expired = sessions
            .get(session_id)
            .is_some_and(|entry| entry.expires_at <= SystemTime::now());
        if expired {
            sessions.remove(session_id);
            log::info!("Session {} expired", session_id);
            return None;
        }
        sessions.get_mut(session_id).map(f)
    }

    pub fn is_active(&self, session_id: &str) -> bool {
        self.with_session(session_id, |entry| entry.session.is_logged_in())
            .unwrap_or(false)
    }

    pub fn remove(&self, session_id: &str) -> Option<SessionEntry> {
        self.sessions.write().remove(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub credentials: Credentials,
    pub sessions: SessionStore,
    pub assets: AssetStore,
    templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, DashboardError> {
        let mut templates = Handlebars::new();
        for (name, source) in [
            ("login", include_str!("./static/login.hbs")),
            ("dashboard", include_str!("./static/dashboard.hbs")),
        ] {
            templates
                .register_template_string(name, source)
                .map_err(|e| DashboardError::Template(e.to_string()))?;
        }

        Ok(AppState {
            credentials: config.credentials(),
            sessions: SessionStore::new(config.session_ttl()),
            assets: AssetStore::new(&config.data.images_dir),
            templates,
            config,
        })
    }

    fn render(&self, template: &str, context: &serde_json::Value) -> Result<Html<String>, DashboardError> {
        self.templates
            .render(template, context)
            .map(Html)
            .map_err(|e| DashboardError::Template(e.to_string()))
    }
}

/// Session id of an authenticated request, inserted by [`require_auth`]
#[derive(Clone, Debug)]
pub struct SessionId(pub String);

#[derive(Deserialize)]
struct Notices {
    welcome: Option<String>,
    wishlisted: Option<String>,
}

#[derive(Deserialize)]
struct ImageQuery {
    effect: Option<String>,
}

#[derive(Deserialize)]
struct WishlistForm {
    product_id: String,
    #[serde(default)]
    return_to: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/dashboard", get(serve_dashboard))
        .route("/api/view", get(api_view))
        .route("/api/wishlist", get(api_wishlist))
        .route("/chart", get(serve_chart))
        .route("/image/:product_id", get(serve_image))
        .route("/wishlist", post(add_to_wishlist))
        .route("/download/csv", get(download_csv))
        .route("/download/xlsx", get(download_xlsx))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(serve_login_page))
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .merge(protected)
        .nest_service("/static", ServeDir::new(&state.config.data.static_dir))
        .with_state(state)
}

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let bind_address = config.server_address();
    let state = Arc::new(AppState::new(config)?);

    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Listening on http://{}", bind_address);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashboardError::AuthFailure => StatusCode::UNAUTHORIZED,
            DashboardError::AssetNotFound { .. } | DashboardError::UnknownProduct(_) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("{}", self);
        }
        (status, self.to_string()).into_response()
    }
}

/// Authentication middleware
///
/// Lets the request through when the session cookie names a live session,
/// otherwise redirects to the login page.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if state.sessions.is_active(cookie.value()) {
            request
                .extensions_mut()
                .insert(SessionId(cookie.value().to_string()));
            return next.run(request).await;
        }
    }

    Redirect::to("/").into_response()
}

async fn serve_login_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let logged_in = jar
        .get(SESSION_COOKIE)
        .is_some_and(|cookie| state.sessions.is_active(cookie.value()));
    if logged_in {
        return Redirect::to("/dashboard").into_response();
    }

    state.render("login", &json!({})).into_response()
}

/// Handle login requests
///
/// Checks the credentials, loads the catalog for the new session and sets
/// the session cookie. A failed attempt re-renders the form with a 401.
async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut session = Session::new();
    if let Err(e) = session.login(&state.credentials, &form.username, &form.password) {
        log::warn!("Failed login attempt for '{}'", form.username);
        let page = state.render(
            "login",
            &json!({
                "error": e.to_string(),
                "username": form.username,
                "camera_enabled": form.camera_enabled(),
            }),
        );
        return (StatusCode::UNAUTHORIZED, page).into_response();
    }

    let catalog = match Catalog::from_csv(&state.config.data.catalog_path) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => return e.into_response(),
    };

    log::info!(
        "User '{}' logged in (camera: {}, photo: {}), {} products loaded",
        form.username,
        form.camera_enabled(),
        form.has_photo(),
        catalog.len()
    );

    if let Some(previous) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(previous.value());
    }
    let session_id = state.sessions.create(session, catalog);
    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true);
    (jar.add(cookie), Redirect::to("/dashboard?welcome=1")).into_response()
}

/// Handle logout
///
/// Ends the session (discarding its wishlist) and clears the cookie.
async fn handle_logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(mut entry) = state.sessions.remove(cookie.value()) {
            log::info!("User '{}' logged out", entry.session.username().unwrap_or("?"));
            entry.session.logout();
        }
    }

    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/"),
    )
}

struct SessionData {
    username: String,
    catalog: Arc<Catalog>,
    wishlist: Wishlist,
}

fn session_data(state: &AppState, session_id: &SessionId) -> Result<SessionData, DashboardError> {
    state
        .sessions
        .with_session(&session_id.0, |entry| SessionData {
            username: entry.session.username().unwrap_or_default().to_string(),
            catalog: entry.catalog.clone(),
            wishlist: entry.session.wishlist().clone(),
        })
        .ok_or(DashboardError::AuthFailure)
}

fn build_view(state: &AppState, data: &SessionData, query: &DashboardQuery) -> Result<DashboardView, DashboardError> {
    let request = query.to_request(&data.catalog);
    dashboard::build_view(
        &data.catalog,
        &data.wishlist,
        &state.assets,
        &request,
        &state.config.chart,
    )
}

async fn serve_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Query(query): Query<DashboardQuery>,
    Query(notices): Query<Notices>,
    RawQuery(raw_query): RawQuery,
) -> Result<Html<String>, DashboardError> {
    let data = session_data(&state, &session_id)?;
    let view = build_view(&state, &data, &query)?;
    let query_string = strip_notices(raw_query.as_deref());

    let context = dashboard_context(&view, &data.username, &query_string, &notices);
    state.render("dashboard", &context)
}

async fn api_view(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardView>, DashboardError> {
    let data = session_data(&state, &session_id)?;
    Ok(Json(build_view(&state, &data, &query)?))
}

async fn api_wishlist(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
) -> Result<Json<Vec<Product>>, DashboardError> {
    let data = session_data(&state, &session_id)?;
    Ok(Json(data.wishlist.products(&data.catalog)))
}

async fn serve_chart(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, DashboardError> {
    let data = session_data(&state, &session_id)?;
    let request = query.to_request(&data.catalog);
    let view = filter::filter(&data.catalog, &request.filter);
    let chart = graph::render_chart(&view, request.chart, &state.config.chart)?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], chart.svg).into_response())
}

/// Product image with an effect applied, as PNG
async fn serve_image(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Path(product_id): Path<String>,
    Query(params): Query<ImageQuery>,
) -> Result<Response, DashboardError> {
    let data = session_data(&state, &session_id)?;
    let product_id = ProductId::from(product_id);
    let product = data
        .catalog
        .get(&product_id)
        .ok_or_else(|| DashboardError::UnknownProduct(product_id.clone()))?;

    let image = state.assets.open(product).inspect_err(|e| log::warn!("{}", e))?;
    let effect = params.effect.as_deref().map(Effect::from_label).unwrap_or_default();
    let png = effects::encode_png(&effects::apply_effect(&image, effect))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn add_to_wishlist(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Form(form): Form<WishlistForm>,
) -> Result<Redirect, DashboardError> {
    let product_id = ProductId::from(form.product_id);
    let added = state
        .sessions
        .with_session(&session_id.0, |entry| {
            if entry.catalog.get(&product_id).is_none() {
                return Err(DashboardError::UnknownProduct(product_id.clone()));
            }
            Ok(entry.session.wishlist_mut().add(product_id.clone()))
        })
        .ok_or(DashboardError::AuthFailure)??;

    let mut target = format!("/dashboard?{}", strip_notices(Some(form.return_to.as_str())));
    if added {
        log::info!("Product {} added to wishlist", product_id);
        if !target.ends_with('?') {
            target.push('&');
        }
        target.push_str(&format!("wishlisted={}", urlencoding::encode(product_id.as_str())));
    }
    Ok(Redirect::to(&target))
}

async fn download_csv(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, DashboardError> {
    let data = session_data(&state, &session_id)?;
    let view = filter::filter(&data.catalog, &query.to_request(&data.catalog).filter);
    let body = downloader::to_csv(view.records());

    Ok(attachment("text/csv", CSV_FILENAME, body.into_bytes()))
}

async fn download_xlsx(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, DashboardError> {
    let data = session_data(&state, &session_id)?;
    let view = filter::filter(&data.catalog, &query.to_request(&data.catalog).filter);
    let body = downloader::to_xlsx(view.records())?;

    Ok(attachment(
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        XLSX_FILENAME,
        body,
    ))
}

fn attachment(content_type: &str, filename: &str, body: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", filename);
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

// Query string of the current view without one-off notices. Pairs with
// anything but visible ASCII are dropped so the result is a valid header value.
fn strip_notices(raw_query: Option<&str>) -> String {
    raw_query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| {
            !pair.is_empty()
                && pair.bytes().all(|b| b.is_ascii_graphic())
                && !pair.starts_with("welcome=")
                && !pair.starts_with("wishlisted=")
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn product_row(product: &Product) -> serde_json::Value {
    json!({
        "product_id": product.product_id,
        "category": product.category,
        "price": product.price,
        "rating": product.rating,
        "image_name": product.image_name,
    })
}

fn dashboard_context(
    view: &DashboardView,
    username: &str,
    query_string: &str,
    notices: &Notices,
) -> serde_json::Value {
    let request = &view.request;
    let filter = &request.filter;
    let (price_min, price_max) = view.price_bounds.unwrap_or((0.0, 0.0));

    let selected = view.selected.as_ref().map(|product| {
        let id = urlencoding::encode(product.product_id.as_str()).into_owned();
        json!({
            "id": product.product_id,
            "original_src": format!("/image/{}", id),
            "effect_src": format!(
                "/image/{}?effect={}",
                id,
                urlencoding::encode(request.effect.label())
            ),
            "effect_label": request.effect.label(),
            "on_wishlist": view.wishlist.iter().any(|p| p.product_id == product.product_id),
        })
    });
    let image_missing = match &view.image {
        Some(ImageStatus::Missing { message, .. }) => Some(message.clone()),
        _ => None,
    };

    json!({
        "username": username,
        "welcome": notices.welcome.is_some(),
        "wishlisted": notices.wishlisted,
        "categories": view.categories.iter().map(|name| json!({
            "name": name,
            "selected": filter.categories.contains(name),
        })).collect::<Vec<_>>(),
        "min_rating": filter.min_rating,
        "price_low": filter.price_range.low(),
        "price_high": filter.price_range.high(),
        "price_min": price_min,
        "price_max": price_max,
        "search": filter.search_text.clone().unwrap_or_default(),
        "rows": view.filtered.iter().map(product_row).collect::<Vec<_>>(),
        "row_count": view.filtered.len(),
        "avg_price": view.summary.price_label(),
        "avg_rating": view.summary.rating_label(),
        "csv_href": format!("/download/csv?{}", query_string),
        "xlsx_href": format!("/download/xlsx?{}", query_string),
        "products": view.filtered.iter().map(|p| json!({
            "id": p.product_id,
            "selected": view.selected.as_ref().is_some_and(|s| s.product_id == p.product_id),
        })).collect::<Vec<_>>(),
        "selected": selected,
        "image_missing": image_missing,
        "effects": Effect::ALL.iter().map(|e| json!({
            "label": e.label(),
            "selected": *e == request.effect,
        })).collect::<Vec<_>>(),
        "charts": ChartKind::ALL.iter().map(|k| json!({
            "label": k.label(),
            "selected": *k == request.chart,
        })).collect::<Vec<_>>(),
        "chart_svg": view.chart.svg,
        "wishlist": view.wishlist.iter().map(product_row).collect::<Vec<_>>(),
        "return_to": query_string,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_notices_keeps_only_header_safe_pairs() {
        assert_eq!(
            strip_notices(Some("applied=1&welcome=1&category=Tops&wishlisted=3")),
            "applied=1&category=Tops"
        );
        assert_eq!(strip_notices(Some("a\nb&search=x y&min_rating=3")), "min_rating=3");
        assert_eq!(strip_notices(None), "");
    }

    #[test]
    fn create_purges_expired_sessions() {
        let store = SessionStore::new(Duration::ZERO);
        for _ in 0..100 {
            store.create(Session::new(), Arc::new(Catalog::default()));
        }
        std::thread::sleep(Duration::from_millis(5));
        let last = store.create(Session::new(), Arc::new(Catalog::default()));

        assert_eq!(store.len(), 1);
        assert!(store.remove(&last).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn live_sessions_survive_purge() {
        let store = SessionStore::new(Duration::from_secs(60));
        let first = store.create(Session::new(), Arc::new(Catalog::default()));
        store.create(Session::new(), Arc::new(Catalog::default()));

        assert_eq!(store.len(), 2);
        assert!(store.with_session(&first, |_| ()).is_some());
    }
}
