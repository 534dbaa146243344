//! HTTP surface of the dashboard
//!
//! - GET  /             — dashboard page
//! - POST /predict      — run a forecast for the session, then redirect to `/`
//! - GET  /download     — CSV export of the current table
//! - GET  /api/forecast — table and chart payload as JSON
//! - GET  /health       — liveness

use crate::error::Result;
use crate::page::PageRenderer;
use crate::presentation::{
    parse_horizon, render, DisplayTable, View, EXPORT_FILE_NAME, EXPORT_MIME, NO_FORECAST_PROMPT,
};
use crate::session::{SessionStore, SharedSession};
use axum::extract::{Form, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use prophet_forecast::ProphetModel;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "ozone_session";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    model: Arc<ProphetModel>,
    sessions: Arc<SessionStore>,
    pages: Arc<PageRenderer>,
    seed: u64,
}

impl AppState {
    /// The model is shared read-only; every session gets its own state
    pub fn new(model: ProphetModel, seed: u64) -> Result<Self> {
        Ok(Self {
            model: Arc::new(model),
            sessions: Arc::new(SessionStore::default()),
            pages: Arc::new(PageRenderer::new()?),
            seed,
        })
    }

    /// Replace the session store, e.g. with configured expiry limits
    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = Arc::new(sessions);
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

/// Session id from the request cookies, if any
fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find_map(|id| Uuid::parse_str(id).ok())
}

async fn session_for(app: &AppState, headers: &HeaderMap) -> (Uuid, SharedSession, bool) {
    app.sessions.resolve(session_id(headers)).await
}

/// Attach the session cookie to responses that started a session
fn with_session_cookie(mut response: Response, id: Uuid, created: bool) -> Response {
    if created {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    response
}

async fn index(State(app): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let (id, session, created) = session_for(&app, &headers).await;
    let mut state = session.lock().await;

    // Errors are shown once, on the render that follows the failed action
    let error = state.take_error();
    let view = render(&app.model, &state)?;
    let page = app.pages.render(&app.model, &state, &view, error.as_deref())?;

    Ok(with_session_cookie(Html(page).into_response(), id, created))
}

#[derive(Debug, Deserialize)]
struct PredictForm {
    days: String,
}

async fn predict(
    State(app): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<PredictForm>,
) -> Response {
    let (id, session, created) = session_for(&app, &headers).await;
    let mut state = session.lock().await;

    match parse_horizon(&form.days) {
        Ok(horizon) => {
            state.predict(&app.model, horizon, app.seed);
        }
        Err(err) => {
            tracing::debug!(session = %id, input = %form.days, "rejected horizon input");
            state.report_input_error(err.to_string());
        }
    }

    with_session_cookie(Redirect::to("/").into_response(), id, created)
}

async fn download(State(app): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let (id, session, created) = session_for(&app, &headers).await;
    let state = session.lock().await;

    let Some(forecast) = state.valid_forecast() else {
        return Ok(with_session_cookie(
            (StatusCode::NOT_FOUND, NO_FORECAST_PROMPT).into_response(),
            id,
            created,
        ));
    };

    let csv = DisplayTable::from_forecast(forecast).to_csv()?;
    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME);
    let response = (
        [(CONTENT_TYPE, EXPORT_MIME.to_string()), (CONTENT_DISPOSITION, disposition)],
        csv,
    )
        .into_response();

    Ok(with_session_cookie(response, id, created))
}

async fn forecast_json(State(app): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let (id, session, created) = session_for(&app, &headers).await;
    let state = session.lock().await;

    let response = match render(&app.model, &state)? {
        View::Forecast(view) => Json(serde_json::json!({
            "horizon": view.horizon,
            "table": view.table,
            "chart": view.chart,
        }))
        .into_response(),
        View::Prompt(message) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response(),
    };

    Ok(with_session_cookie(response, id, created))
}

/// Liveness check
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Build the router with request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .route("/download", get(download))
        .route("/api/forecast", get(forecast_json))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the dashboard until the process is stopped
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "dashboard listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_from_cookie_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, id)).unwrap(),
        );
        assert_eq!(session_id(&headers), Some(id));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("ozone_session=garbage"));
        assert_eq!(session_id(&headers), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }
}
