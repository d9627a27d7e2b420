pub mod error;
pub mod landing;
pub mod redirect;
pub mod routes;
pub mod state;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/api/rotate", post(routes::rotate::rotate))
        .route("/api/status", get(routes::status::get_status))
        .route("/api/rotation", post(routes::update::update_rotation));

    // Pass-through requests: the public directory if there is one.
    let public_dir = &app_state.config.redirect.public_dir;
    let router = if public_dir.is_dir() {
        tracing::debug!(dir = %public_dir.display(), "serving local content");
        router.fallback_service(ServeDir::new(public_dir))
    } else {
        router.fallback(landing::landing_page)
    };

    router
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            redirect::redirect_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the rotation server on `0.0.0.0:{port}`.
pub async fn serve(app_state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(app_state, listener).await
}

/// Start the rotation server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    app_state: AppState,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(app_state);

    tracing::info!("rotor server listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
