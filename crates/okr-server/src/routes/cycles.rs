use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use okr_core::access::Action;
use okr_core::cycle::{self, Cycle};
use okr_core::state::{log_activity, ActivityKind};

use crate::error::AppError;
use crate::routes::{authorize, parse_opt_date};
use crate::state::{request_user, AppState};

fn cycle_json(c: &Cycle, today: chrono::NaiveDate) -> serde_json::Value {
    serde_json::json!({
        "slug": c.slug,
        "name": c.name,
        "organization": c.organization,
        "status": c.status(today),
        "start_date": c.start_date,
        "end_date": c.end_date,
        "theme": c.theme,
        "checkin_dates": c.checkin_dates,
        "created_at": c.created_at,
        "updated_at": c.updated_at,
    })
}

/// GET /api/cycles: list all cycles.
pub async fn list_cycles(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let today = app.today();
    let result = tokio::task::spawn_blocking(move || {
        let cycles = Cycle::list(&root)?;
        let list: Vec<serde_json::Value> = cycles.iter().map(|c| cycle_json(c, today)).collect();
        Ok::<_, okr_core::OkrError>(serde_json::json!(list))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct CreateCycleBody {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub checkin_dates: Vec<String>,
}

/// POST /api/cycles: create and register a cycle with its check-in schedule.
pub async fn create_cycle(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateCycleBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let today = app.today();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        authorize(&root, user.as_deref(), Action::ManageCycles)?;
        let state = okr_core::state::State::load(&root)?;

        let mut c = Cycle::new(body.slug, body.name, state.organization);
        c.start_date = parse_opt_date(body.start_date.as_deref())?;
        c.end_date = parse_opt_date(body.end_date.as_deref())?;
        c.set_theme(body.theme);
        let dates = body
            .checkin_dates
            .iter()
            .map(|d| cycle::parse_date(d))
            .collect::<okr_core::Result<Vec<_>>>()?;
        c.schedule_checkins(&dates);

        let c = cycle::register(&root, c, user.as_deref())?;
        Ok::<_, okr_core::OkrError>(cycle_json(&c, today))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// GET /api/cycles/:slug: cycle detail with check-in status.
pub async fn get_cycle(
    State(app): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let today = app.today();
    let result = tokio::task::spawn_blocking(move || {
        let c = Cycle::load(&root, &slug)?;
        let objectives = okr_core::objective::load_objectives(&root, &slug)?;
        let checkins = okr_core::checkin::load_checkins(&root, &slug)?;
        let due = okr_core::checkin::checkin_due(&c.checkin_dates, &checkins, today);

        let mut json = cycle_json(&c, today);
        json["objective_count"] = serde_json::json!(objectives.len());
        json["average"] = serde_json::json!(okr_core::progress::cycle_average(&slug, &objectives));
        json["checkin"] = serde_json::json!(due);
        Ok::<_, okr_core::OkrError>(json)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct UpdateCycleBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    /// Dates to add to the check-in schedule.
    #[serde(default)]
    pub schedule: Vec<String>,
    /// Dates to drop from the check-in schedule.
    #[serde(default)]
    pub unschedule: Vec<String>,
}

/// PUT /api/cycles/:slug: rename, re-date, re-theme or reschedule a cycle.
pub async fn update_cycle(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Json(body): Json<UpdateCycleBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let today = app.today();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        authorize(&root, user.as_deref(), Action::ManageCycles)?;
        let mut c = Cycle::load(&root, &slug)?;

        if let Some(name) = body.name.filter(|n| !n.trim().is_empty()) {
            c.rename(name.trim());
        }
        let start = parse_opt_date(body.start_date.as_deref())?.or(c.start_date);
        let end = parse_opt_date(body.end_date.as_deref())?.or(c.end_date);
        c.set_dates(start, end)?;
        if body.theme.is_some() {
            c.set_theme(body.theme);
        }
        for raw in &body.unschedule {
            c.unschedule_checkin(cycle::parse_date(raw)?);
        }
        let added = body
            .schedule
            .iter()
            .map(|d| cycle::parse_date(d))
            .collect::<okr_core::Result<Vec<_>>>()?;
        c.schedule_checkins(&added);

        c.save(&root)?;
        log_activity(&root, ActivityKind::CycleUpdated, &slug, user.as_deref(), "")?;
        Ok::<_, okr_core::OkrError>(cycle_json(&c, today))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// DELETE /api/cycles/:slug: delete a cycle and everything it owns.
pub async fn delete_cycle(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user = request_user(&headers);
    let result = tokio::task::spawn_blocking(move || {
        authorize(&root, user.as_deref(), Action::ManageCycles)?;
        cycle::delete(&root, &slug, user.as_deref())?;
        Ok::<_, okr_core::OkrError>(serde_json::json!({ "deleted": slug }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// GET /api/cycles/:slug/hierarchy: strategic → tactical → operational tree.
pub async fn get_hierarchy(
    State(app): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let config = okr_core::config::Config::load(&root)?;
        Cycle::load(&root, &slug)?;
        let objectives = okr_core::objective::load_objectives(&root, &slug)?;
        let links = okr_core::link::load_links(&root, &slug)?;
        let tree = okr_core::hierarchy::build_hierarchy(
            &objectives,
            &links,
            config.links.convention,
            config.links.duplicate_parent,
        );
        Ok::<_, okr_core::OkrError>(serde_json::to_value(&tree)?)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// GET /api/cycles/:slug/dashboard: progress aggregates for the cycle.
pub async fn get_dashboard(
    State(app): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let today = app.today();
    let result = tokio::task::spawn_blocking(move || {
        let c = Cycle::load(&root, &slug)?;
        let objectives = okr_core::objective::load_objectives(&root, &slug)?;
        let checkins = okr_core::checkin::load_checkins(&root, &slug)?;
        let dashboard = okr_core::progress::cycle_dashboard(&slug, &objectives);
        let due = okr_core::checkin::checkin_due(&c.checkin_dates, &checkins, today);
        Ok::<_, okr_core::OkrError>(serde_json::json!({
            "name": c.name,
            "status": c.status(today),
            "dashboard": dashboard,
            "checkin": due,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// GET /api/cycles/:slug/scoreboard: confidence per key result per scheduled date.
pub async fn get_scoreboard(
    State(app): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let c = Cycle::load(&root, &slug)?;
        let objectives = okr_core::objective::load_objectives(&root, &slug)?;
        let checkins = okr_core::checkin::load_checkins(&root, &slug)?;
        let rows = okr_core::scoreboard::build_scoreboard(&objectives, &checkins, &c.checkin_dates);
        Ok::<_, okr_core::OkrError>(serde_json::json!({
            "dates": c.checkin_dates,
            "rows": rows,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
