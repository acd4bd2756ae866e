use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/config: read-only view of `.okr/config.yaml` with validation warnings.
///
/// There is no write endpoint; the file is edited directly or via the CLI.
pub async fn get_config(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let config = okr_core::config::Config::load(&root)?;
        let warnings = config.validate();
        Ok::<_, okr_core::OkrError>(serde_json::json!({
            "config": config,
            "warnings": warnings,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
