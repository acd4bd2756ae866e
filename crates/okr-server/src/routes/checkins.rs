use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use okr_core::access::Action;
use okr_core::checkin::{self, CheckinEntry};
use okr_core::cycle::Cycle;

use crate::error::AppError;
use crate::routes::{authorize, parse_opt_date};
use crate::state::{request_user, AppState};

/// GET /api/cycles/:slug/checkins/due: whether a check-in is owed today.
pub async fn get_due(
    State(app): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let today = app.today();
    let result = tokio::task::spawn_blocking(move || {
        let config = okr_core::config::Config::load(&root)?;
        let c = Cycle::load(&root, &slug)?;
        let objectives = okr_core::objective::load_objectives(&root, &slug)?;
        let checkins = checkin::load_checkins(&root, &slug)?;

        let due = checkin::checkin_due(&c.checkin_dates, &checkins, today);
        let missing: Vec<&str> = match due.last_due_date {
            Some(date) if due.due => checkin::missing_on(&objectives, &checkins, date),
            _ => Vec::new(),
        };
        let reminder =
            checkin::reminder_message(&c.name, &due, &config.checkins.reminder_template);
        Ok::<_, okr_core::OkrError>(serde_json::json!({
            "due": due.due,
            "overdue": due.overdue,
            "last_due_date": due.last_due_date,
            "missing_key_results": missing,
            "reminder": reminder,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct SubmitBody {
    /// Check-in date; today when omitted.
    #[serde(default)]
    pub date: Option<String>,
    pub entries: Vec<CheckinEntry>,
}

/// POST /api/cycles/:slug/checkins: record confidence and values for a date.
pub async fn submit(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Json(body): Json<SubmitBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let today = app.today();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        authorize(&root, user.as_deref(), Action::CheckIn)?;
        let date = parse_opt_date(body.date.as_deref())?.unwrap_or(today);
        let outcome = checkin::submit_checkins(&root, &slug, &body.entries, date, user.as_deref())?;
        tracing::info!(
            cycle = %slug,
            %date,
            inserted = outcome.inserted.len(),
            skipped = outcome.skipped.len(),
            "check-in submitted"
        );
        Ok::<_, okr_core::OkrError>(serde_json::to_value(&outcome)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub kr: Option<String>,
}

/// GET /api/cycles/:slug/checkins?kr=<id>: check-in history of one key result.
pub async fn history(
    State(app): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let kr = query
        .kr
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("query parameter 'kr' is required"))?;
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let objectives = okr_core::objective::load_objectives(&root, &slug)?;
        if okr_core::objective::find_key_result(&objectives, &kr).is_none() {
            Cycle::load(&root, &slug)?;
            return Err(okr_core::OkrError::KeyResultNotFound(kr));
        }
        let checkins = checkin::load_checkins(&root, &slug)?;
        let rows = checkin::history(&checkins, &kr);
        let latest = checkin::latest_checkin(&checkins, &kr);
        Ok::<_, okr_core::OkrError>(serde_json::json!({
            "key_result": kr,
            "history": rows,
            "latest": latest,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
