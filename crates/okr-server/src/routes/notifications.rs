use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use okr_core::access::Action;
use okr_core::notification;

use crate::error::AppError;
use crate::routes::authorize;
use crate::state::{request_user, AppState};

#[derive(serde::Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread: bool,
}

/// GET /api/notifications: notifications addressed to the caller or to everyone.
pub async fn list_notifications(
    State(app): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        let items = notification::load_notifications(&root)?;
        let visible = notification::for_user(&items, user.as_deref(), query.unread);
        Ok::<_, okr_core::OkrError>(serde_json::to_value(&visible)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// POST /api/notifications/:id/read: mark one notification read.
pub async fn mark_read(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let n = notification::mark_read(&root, &id)?;
        Ok::<_, okr_core::OkrError>(serde_json::to_value(&n)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// POST /api/notifications/remind: store reminders for every due active cycle.
pub async fn remind(
    State(app): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let today = app.today();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        let config = authorize(&root, user.as_deref(), Action::ManageCycles)?;
        let created = notification::remind(&root, &config, today)?;
        Ok::<_, okr_core::OkrError>(serde_json::to_value(&created)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
