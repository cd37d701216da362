use crate::core::{Entity, EntityRequest, IdGenerator, ScribeError, WriteBehindCache};
use crate::metrics::MetricsRegistry;
use crate::persistence::{EntityStore, StoreError};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Header carrying the id of the user creating an entity
pub const USER_HEADER: &str = "x-user-id";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<WriteBehindCache>,
    pub ids: Arc<dyn IdGenerator>,
    pub metrics: MetricsRegistry,
    /// Creating user when the request names none
    pub default_user: String,
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: String,
}

/// Run a store call on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T, ScribeError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ScribeError::InternalError(format!("Store task failed: {}", e)))?
        .map_err(ScribeError::from)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let cache = Arc::clone(&state.cache);
    let store_status = blocking(move || cache.health_check()).await;

    let (status, health) = match store_status {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    (
        status,
        Json(json!({
            "status": health,
            "service": "scribe",
            "version": env!("CARGO_PKG_VERSION"),
            "pending": state.cache.pending_count(),
            "draining": state.cache.draining_count(),
        })),
    )
}

/// POST /entity - accept a new entity
pub async fn create_entity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<EntityRequest>,
) -> Result<impl IntoResponse, ScribeError> {
    let violations = request.validate();
    if !violations.is_empty() {
        return Err(ScribeError::Validation(violations));
    }

    let create_user = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(&state.default_user);

    let entity = Entity::new(state.ids.generate(), request.content, create_user);
    let violations = entity.validate();
    if !violations.is_empty() {
        return Err(ScribeError::Validation(violations));
    }

    debug!("REST CREATE id={}", entity.id());
    // Only touches the in-memory active set
    state.cache.create(&entity)?;

    let id = entity.id().to_string();
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, id.clone())],
        Json(CreateResponse { id }),
    ))
}

/// GET /entity - list every entity
pub async fn list_entities(State(state): State<AppState>) -> Result<Json<Vec<Entity>>, ScribeError> {
    debug!("REST LIST");
    let cache = Arc::clone(&state.cache);
    let entities = blocking(move || cache.get_all()).await?;
    Ok(Json(entities))
}

/// GET /entity/{id} - fetch one entity
pub async fn get_entity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Entity>, ScribeError> {
    debug!("REST GET id={}", id);
    let cache = Arc::clone(&state.cache);
    let lookup = id.clone();
    blocking(move || cache.get(&lookup))
        .await?
        .map(Json)
        .ok_or(ScribeError::NotFound(id))
}

/// DELETE /entity/{id} - remove an entity (idempotent)
pub async fn delete_entity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ScribeError> {
    debug!("REST DELETE id={}", id);
    let cache = Arc::clone(&state.cache);
    let target = id.clone();
    blocking(move || cache.delete(&target)).await?;
    Ok(Json(DeleteResponse { deleted: true, id }))
}
