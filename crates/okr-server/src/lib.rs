pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(root: PathBuf) -> Router {
    build_router_with_state(state::AppState::new(root))
}

/// Same as [`build_router`] but with caller-supplied state, e.g. a fixed today.
pub fn build_router_with_state(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // State
        .route("/api/state", get(routes::state::get_state))
        // Cycles
        .route(
            "/api/cycles",
            get(routes::cycles::list_cycles).post(routes::cycles::create_cycle),
        )
        .route(
            "/api/cycles/{slug}",
            get(routes::cycles::get_cycle)
                .put(routes::cycles::update_cycle)
                .delete(routes::cycles::delete_cycle),
        )
        .route(
            "/api/cycles/{slug}/hierarchy",
            get(routes::cycles::get_hierarchy),
        )
        .route(
            "/api/cycles/{slug}/dashboard",
            get(routes::cycles::get_dashboard),
        )
        .route(
            "/api/cycles/{slug}/scoreboard",
            get(routes::cycles::get_scoreboard),
        )
        // Check-ins
        .route(
            "/api/cycles/{slug}/checkins",
            get(routes::checkins::history).post(routes::checkins::submit),
        )
        .route(
            "/api/cycles/{slug}/checkins/due",
            get(routes::checkins::get_due),
        )
        // Objectives and key results
        .route(
            "/api/cycles/{slug}/objectives",
            get(routes::objectives::list_objectives).post(routes::objectives::create_objective),
        )
        .route(
            "/api/cycles/{slug}/objectives/{id}",
            put(routes::objectives::update_objective).delete(routes::objectives::delete_objective),
        )
        .route(
            "/api/cycles/{slug}/objectives/{id}/key-results",
            post(routes::objectives::add_key_result),
        )
        .route(
            "/api/cycles/{slug}/key-results/{kr}",
            put(routes::objectives::update_key_result)
                .delete(routes::objectives::delete_key_result),
        )
        // Links
        .route(
            "/api/cycles/{slug}/links",
            get(routes::links::list_links)
                .post(routes::links::add_link)
                .delete(routes::links::delete_link),
        )
        // Teams
        .route(
            "/api/teams",
            get(routes::teams::list_teams).post(routes::teams::create_team),
        )
        .route("/api/teams/{slug}/assign", post(routes::teams::assign))
        // Notifications
        .route(
            "/api/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/api/notifications/remind",
            post(routes::notifications::remind),
        )
        .route(
            "/api/notifications/{id}/read",
            post(routes::notifications::mark_read),
        )
        // Drafts
        .route("/api/draft/parse", post(routes::drafts::parse_draft))
        .route("/api/draft/import", post(routes::drafts::import_draft))
        // Config
        .route("/api/config", get(routes::config::get_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the API server on `0.0.0.0:<port>`.
pub async fn serve(root: PathBuf, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(state::AppState::new(root), listener, open_browser).await
}

/// Start the API server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    app_state: state::AppState,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router_with_state(app_state);

    tracing::info!("OKR API listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}/api/state");
        if let Err(e) = open::that(&url) {
            tracing::warn!(error = %e, "could not open browser");
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
