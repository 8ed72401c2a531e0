pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use missionfit_core::config::Config;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Tasks
        .route(
            "/api/tasks",
            get(routes::tasks::list_tasks)
                .post(routes::tasks::create_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        // Plans
        .route("/api/motivate", post(routes::plans::motivate))
        .route("/api/mealprep", post(routes::plans::mealprep))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Start the MissionFit API server on a pre-bound listener.
///
/// The listener is bound by the caller so it can read the actual port before
/// starting (useful when `port = 0` and the OS picks a free port).
pub async fn serve_on(root: PathBuf, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let config = Config::load(&root)?;
    let actual_port = listener.local_addr()?.port();
    let app_state = state::AppState::from_config(root, &config)?;

    tracing::info!(
        backend = %app_state.store.backend(),
        "MissionFit API listening on http://localhost:{actual_port}"
    );

    axum::serve(listener, build_router(app_state)).await?;
    Ok(())
}
