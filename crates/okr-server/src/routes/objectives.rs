use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use okr_core::access::Action;
use okr_core::objective::{self, KeyResultUpdate, NewKeyResult, Objective};
use okr_core::progress::{key_result_progress, objective_average};
use okr_core::state::{log_activity, ActivityKind};
use okr_core::types::ObjectiveType;

use crate::error::AppError;
use crate::routes::authorize;
use crate::state::{request_user, AppState};

fn objective_json(o: &Objective) -> serde_json::Value {
    let key_results: Vec<serde_json::Value> = o
        .key_results
        .iter()
        .map(|kr| {
            let mut json = serde_json::to_value(kr).unwrap_or_default();
            json["progress"] = serde_json::json!(key_result_progress(kr));
            json
        })
        .collect();
    serde_json::json!({
        "id": o.id,
        "statement": o.statement,
        "type": o.objective_type,
        "status": o.status,
        "cycle": o.cycle,
        "average": objective_average(o),
        "key_results": key_results,
        "created_at": o.created_at,
        "updated_at": o.updated_at,
    })
}

/// GET /api/cycles/:slug/objectives: objectives with key results and progress.
pub async fn list_objectives(
    State(app): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        okr_core::cycle::Cycle::load(&root, &slug)?;
        let objectives = objective::load_objectives(&root, &slug)?;
        let list: Vec<serde_json::Value> = objectives.iter().map(objective_json).collect();
        Ok::<_, okr_core::OkrError>(serde_json::json!(list))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct CreateObjectiveBody {
    /// Slug id; derived from the statement when omitted.
    #[serde(default)]
    pub id: Option<String>,
    pub statement: String,
    #[serde(rename = "type")]
    pub objective_type: String,
    #[serde(default)]
    pub key_results: Vec<NewKeyResult>,
}

/// POST /api/cycles/:slug/objectives: add an objective with optional key results.
pub async fn create_objective(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Json(body): Json<CreateObjectiveBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        authorize(&root, user.as_deref(), Action::EditObjectives)?;
        let objective_type: ObjectiveType = body.objective_type.trim().parse()?;
        let existing = objective::load_objectives(&root, &slug)?;
        let id = match body.id {
            Some(id) => id,
            None => objective::unique_id(&existing, &okr_core::paths::slugify(&body.statement)),
        };

        let mut o = Objective::new(id, body.statement.trim(), objective_type, slug.as_str());
        for kr in body.key_results {
            o.add_key_result(kr);
        }
        let o = objective::create_objective(&root, o)?;
        log_activity(&root, ActivityKind::ObjectiveCreated, &o.id, user.as_deref(), &o.statement)?;
        Ok::<_, okr_core::OkrError>(objective_json(&o))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct UpdateObjectiveBody {
    #[serde(default)]
    pub statement: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

/// PUT /api/cycles/:slug/objectives/:id: rename and/or archive an objective.
pub async fn update_objective(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path((slug, id)): Path<(String, String)>,
    Json(body): Json<UpdateObjectiveBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        authorize(&root, user.as_deref(), Action::EditObjectives)?;
        let mut o = objective::find(&objective::load_objectives(&root, &slug)?, &id)?.clone();
        if let Some(statement) = body.statement.filter(|s| !s.trim().is_empty()) {
            o = objective::rename_objective(&root, &slug, &id, statement.trim())?;
            log_activity(&root, ActivityKind::ObjectiveUpdated, &id, user.as_deref(), &o.statement)?;
        }
        if body.archived {
            o = objective::archive_objective(&root, &slug, &id)?;
            log_activity(&root, ActivityKind::ObjectiveArchived, &id, user.as_deref(), "")?;
        }
        Ok::<_, okr_core::OkrError>(objective_json(&o))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// DELETE /api/cycles/:slug/objectives/:id: delete with its key results and links.
pub async fn delete_objective(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        authorize(&root, user.as_deref(), Action::EditObjectives)?;
        let removed = objective::delete_objective(&root, &slug, &id)?;
        log_activity(&root, ActivityKind::ObjectiveDeleted, &id, user.as_deref(), "")?;
        Ok::<_, okr_core::OkrError>(serde_json::json!({
            "deleted": removed.id,
            "key_results": removed.key_results.len(),
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// POST /api/cycles/:slug/objectives/:id/key-results: add a key result.
pub async fn add_key_result(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path((slug, id)): Path<(String, String)>,
    Json(body): Json<NewKeyResult>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        authorize(&root, user.as_deref(), Action::EditObjectives)?;
        let kr = objective::add_key_result(&root, &slug, &id, body)?;
        log_activity(&root, ActivityKind::KeyResultCreated, &kr.id, user.as_deref(), &kr.text)?;
        let mut json = serde_json::to_value(&kr)?;
        json["progress"] = serde_json::json!(key_result_progress(&kr));
        Ok::<_, okr_core::OkrError>(json)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// PUT /api/cycles/:slug/key-results/:kr: partial update of a key result.
pub async fn update_key_result(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path((slug, kr_id)): Path<(String, String)>,
    Json(body): Json<KeyResultUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        authorize(&root, user.as_deref(), Action::EditObjectives)?;
        let kr = objective::update_key_result(&root, &slug, &kr_id, body)?;
        log_activity(&root, ActivityKind::KeyResultUpdated, &kr.id, user.as_deref(), "")?;
        let mut json = serde_json::to_value(&kr)?;
        json["progress"] = serde_json::json!(key_result_progress(&kr));
        Ok::<_, okr_core::OkrError>(json)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// DELETE /api/cycles/:slug/key-results/:kr: remove a key result, keeping its history.
pub async fn delete_key_result(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path((slug, kr_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        authorize(&root, user.as_deref(), Action::EditObjectives)?;
        objective::delete_key_result(&root, &slug, &kr_id)?;
        log_activity(&root, ActivityKind::KeyResultDeleted, &kr_id, user.as_deref(), "")?;
        Ok::<_, okr_core::OkrError>(serde_json::json!({ "deleted": kr_id }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
