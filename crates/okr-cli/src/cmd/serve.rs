use anyhow::Context;
use chrono::NaiveDate;
use okr_server::state::AppState;
use std::path::Path;

/// Run the JSON API until interrupted.
pub fn run(root: &Path, port: u16, no_open: bool, today: Option<NaiveDate>) -> anyhow::Result<()> {
    okr_core::state::State::load(root).context("failed to load state")?;
    let app_state = AppState::new(root.to_path_buf()).with_today(today);

    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
            .await
            .with_context(|| format!("failed to bind port {port}"))?;
        okr_server::serve_on(app_state, listener, !no_open).await
    })
}
