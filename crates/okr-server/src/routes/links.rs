use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use okr_core::access::Action;
use okr_core::link;
use okr_core::state::{log_activity, ActivityKind};

use crate::error::AppError;
use crate::routes::authorize;
use crate::state::{request_user, AppState};

/// GET /api/cycles/:slug/links: stored link rows in storage order.
pub async fn list_links(
    State(app): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        okr_core::cycle::Cycle::load(&root, &slug)?;
        let links = link::load_links(&root, &slug)?;
        Ok::<_, okr_core::OkrError>(serde_json::to_value(&links)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct LinkBody {
    pub source: String,
    pub target: String,
}

/// POST /api/cycles/:slug/links: add a link in the configured convention.
pub async fn add_link(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Json(body): Json<LinkBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        let config = authorize(&root, user.as_deref(), Action::EditObjectives)?;
        let created = link::add_link(&root, &slug, &body.source, &body.target, config.links.convention)?;
        log_activity(
            &root,
            ActivityKind::LinkCreated,
            &slug,
            user.as_deref(),
            format!("{} -> {}", created.source, created.target),
        )?;
        Ok::<_, okr_core::OkrError>(serde_json::to_value(&created)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct LinkQuery {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

/// DELETE /api/cycles/:slug/links?source=<id>&target=<id>: remove one link.
pub async fn delete_link(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Query(query): Query<LinkQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (Some(source), Some(target)) = (query.source, query.target) else {
        return Err(AppError::bad_request(
            "query parameters 'source' and 'target' are required",
        ));
    };
    let root = app.root.clone();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        authorize(&root, user.as_deref(), Action::EditObjectives)?;
        let removed = link::remove_link(&root, &slug, &source, &target)?;
        log_activity(
            &root,
            ActivityKind::LinkDeleted,
            &slug,
            user.as_deref(),
            format!("{} -> {}", removed.source, removed.target),
        )?;
        Ok::<_, okr_core::OkrError>(serde_json::to_value(&removed)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
