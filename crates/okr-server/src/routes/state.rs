use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/state: organization, cycles with their status, recent activity.
pub async fn get_state(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let today = app.today();
    let result = tokio::task::spawn_blocking(move || {
        let state = okr_core::state::State::load(&root)?;
        let cycles = okr_core::cycle::Cycle::list(&root)?;

        let cycle_summaries: Vec<serde_json::Value> = cycles
            .iter()
            .map(|c| {
                serde_json::json!({
                    "slug": c.slug,
                    "name": c.name,
                    "status": c.status(today),
                    "start_date": c.start_date,
                    "end_date": c.end_date,
                })
            })
            .collect();

        let recent: Vec<_> = state.history.iter().rev().take(20).collect();
        Ok::<_, okr_core::OkrError>(serde_json::json!({
            "organization": state.organization,
            "today": today,
            "cycles": cycle_summaries,
            "last_updated": state.last_updated,
            "recent_activity": recent,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
