use crate::config::Listener as ListenerConfig;
use crate::errors::{GamepassError, ServeError};
use crate::forward::UniverseListingQuery;
use crate::ownership::OwnershipVerdict;
use crate::service::GamepassService;
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;

pub fn router(service: GamepassService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/created-gamepasses/{user_id}", get(created_gamepasses))
        .route("/api/v1/check-ownership", get(check_ownership_query))
        .route("/api/owns/{user_id}/{game_pass_id}", get(check_ownership_path))
        .route("/api/v1/list-gamepasses", get(list_gamepasses))
        .route("/api/v1/proxy", get(proxy))
        .fallback(not_found)
        .with_state(service)
}

pub async fn serve(listener: ListenerConfig, service: GamepassService) -> Result<(), ServeError> {
    if !service.has_api_key() {
        tracing::warn!(
            "No API key configured; key-authenticated endpoints will answer with 500 until GAMEPASS_API_KEY is set"
        );
    }

    let app = router(service);
    let addr = format!("{}:{}", listener.host, listener.port);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    status: &'static str,
}

#[derive(Serialize)]
struct CreatedGamepassesResponse {
    ok: bool,
    count: usize,
    results: Vec<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OwnershipResponse {
    ok: bool,
    user_id: String,
    game_pass_id: String,
    #[serde(flatten)]
    verdict: OwnershipVerdict,
}

#[derive(Serialize)]
struct DataResponse {
    ok: bool,
    data: Value,
}

#[derive(Serialize)]
struct ProxyResponse {
    ok: bool,
    status: u16,
    data: Value,
}

#[derive(Serialize)]
struct ApiErrorResponse {
    ok: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct OwnershipParams {
    user_id: Option<String>,
    game_pass_id: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ProxyParams {
    url: Option<String>,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        status: "healthy",
    })
}

async fn created_gamepasses(
    State(service): State<GamepassService>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<CreatedGamepassesResponse>, GamepassError> {
    let Path(user_id) = path?;
    let results = service.created_gamepasses(&user_id).await?;

    Ok(Json(CreatedGamepassesResponse {
        ok: true,
        count: results.len(),
        results,
    }))
}

async fn check_ownership_query(
    State(service): State<GamepassService>,
    query: Result<Query<OwnershipParams>, QueryRejection>,
) -> Result<Json<OwnershipResponse>, GamepassError> {
    let Query(params) = query?;
    let user_id = required(params.user_id, "userId")?;
    let game_pass_id = required(params.game_pass_id, "gamePassId")?;
    ownership_response(&service, user_id, game_pass_id).await
}

async fn check_ownership_path(
    State(service): State<GamepassService>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<Json<OwnershipResponse>, GamepassError> {
    let Path((user_id, game_pass_id)) = path?;
    ownership_response(&service, user_id, game_pass_id).await
}

async fn ownership_response(
    service: &GamepassService,
    user_id: String,
    game_pass_id: String,
) -> Result<Json<OwnershipResponse>, GamepassError> {
    let verdict = service.check_ownership(&user_id, &game_pass_id).await?;

    Ok(Json(OwnershipResponse {
        ok: true,
        user_id,
        game_pass_id,
        verdict,
    }))
}

async fn list_gamepasses(
    State(service): State<GamepassService>,
    query: Result<Query<UniverseListingQuery>, QueryRejection>,
) -> Result<Json<DataResponse>, GamepassError> {
    let Query(query) = query?;
    let data = service.universe_gamepasses(&query).await?;
    Ok(Json(DataResponse { ok: true, data }))
}

async fn proxy(
    State(service): State<GamepassService>,
    query: Result<Query<ProxyParams>, QueryRejection>,
) -> Result<Json<ProxyResponse>, GamepassError> {
    let Query(params) = query?;
    let response = service.forward(params.url.as_deref()).await?;

    Ok(Json(ProxyResponse {
        ok: true,
        status: response.status.as_u16(),
        data: response.json(),
    }))
}

async fn not_found() -> Response {
    let body = Json(ApiErrorResponse {
        ok: false,
        error: "not found".into(),
        status: None,
        details: None,
    });
    (StatusCode::NOT_FOUND, body).into_response()
}

fn required(value: Option<String>, field: &str) -> Result<String, GamepassError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GamepassError::invalid_input(format!("{field} is required")))
}

// Extractor rejections still answer with the JSON error envelope
impl From<PathRejection> for GamepassError {
    fn from(rejection: PathRejection) -> Self {
        GamepassError::invalid_input(rejection.body_text())
    }
}

impl From<QueryRejection> for GamepassError {
    fn from(rejection: QueryRejection) -> Self {
        GamepassError::invalid_input(rejection.body_text())
    }
}

impl IntoResponse for GamepassError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            GamepassError::InvalidInput(message) => {
                tracing::debug!(%message, "Rejected request");
            }
            GamepassError::Upstream { status, .. } => {
                tracing::warn!(upstream_status = %status, "Forwarding upstream error");
            }
            GamepassError::Network(e) => {
                tracing::error!(error = %e, "Upstream unreachable");
            }
            GamepassError::MissingApiKey => {
                tracing::error!("Request needs an API key but none is configured");
            }
        }

        let (upstream_status, details) = match &self {
            GamepassError::Upstream { status, body } => (Some(status.as_u16()), Some(body.clone())),
            _ => (None, None),
        };

        let body = Json(ApiErrorResponse {
            ok: false,
            error: self.to_string(),
            status: upstream_status,
            details,
        });

        (status, body).into_response()
    }
}
