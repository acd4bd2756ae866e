use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use okr_core::access::Action;
use okr_core::state::{log_activity, ActivityKind};
use okr_core::team::{self, Team};

use crate::error::AppError;
use crate::routes::authorize;
use crate::state::{request_user, AppState};

/// GET /api/teams: all teams with their assigned key results.
pub async fn list_teams(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let teams = team::load_teams(&root)?;
        Ok::<_, okr_core::OkrError>(serde_json::to_value(&teams)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct CreateTeamBody {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// POST /api/teams: create a team.
pub async fn create_team(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateTeamBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        authorize(&root, user.as_deref(), Action::ManageTeams)?;
        let mut t = team::create_team(&root, Team::new(body.slug, body.name))?;
        for member in &body.members {
            t = team::add_member(&root, &t.slug, member)?;
        }
        log_activity(&root, ActivityKind::TeamUpdated, &t.slug, user.as_deref(), "created")?;
        Ok::<_, okr_core::OkrError>(serde_json::to_value(&t)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct AssignBody {
    pub key_result: String,
    /// Remove the assignment instead of adding it.
    #[serde(default)]
    pub remove: bool,
}

/// POST /api/teams/:slug/assign: assign or unassign a key result.
pub async fn assign(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Json(body): Json<AssignBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        authorize(&root, user.as_deref(), Action::ManageTeams)?;
        let t = if body.remove {
            team::unassign(&root, &slug, &body.key_result)?
        } else {
            let all = okr_core::objective::load_all(&root)?;
            if okr_core::objective::find_key_result(&all, &body.key_result).is_none() {
                return Err(okr_core::OkrError::KeyResultNotFound(body.key_result));
            }
            team::assign(&root, &slug, &body.key_result)?
        };
        let verb = if body.remove { "unassigned" } else { "assigned" };
        log_activity(
            &root,
            ActivityKind::TeamUpdated,
            &slug,
            user.as_deref(),
            format!("{verb} {}", body.key_result),
        )?;
        Ok::<_, okr_core::OkrError>(serde_json::to_value(&t)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
