use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use okr_core::access::Action;
use okr_core::draft;

use crate::error::AppError;
use crate::routes::authorize;
use crate::state::{request_user, AppState};

#[derive(serde::Deserialize)]
pub struct ParseBody {
    /// Raw assistant response: JSON, fenced JSON or a labelled outline.
    pub text: String,
}

/// POST /api/draft/parse: parse a draft without touching the store.
pub async fn parse_draft(Json(body): Json<ParseBody>) -> Result<Json<serde_json::Value>, AppError> {
    let parsed = draft::parse_ai_response(&body.text)?;
    Ok(Json(serde_json::to_value(&parsed)?))
}

#[derive(serde::Deserialize)]
pub struct ImportBody {
    pub text: String,
    /// Slug of the cycle to create.
    pub slug: String,
}

/// POST /api/draft/import: parse a draft and persist it as a new cycle.
pub async fn import_draft(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ImportBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        let config = authorize(&root, user.as_deref(), Action::ManageCycles)?;
        let parsed = draft::parse_ai_response(&body.text)?;
        let m = draft::import_draft(
            &root,
            &parsed,
            &body.slug,
            config.links.convention,
            user.as_deref(),
        )?;
        tracing::info!(
            cycle = %m.cycle.slug,
            objectives = m.objectives.len(),
            links = m.links.len(),
            "draft imported"
        );
        Ok::<_, okr_core::OkrError>(serde_json::to_value(&m)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
