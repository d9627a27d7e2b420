use axum::extract::State;
use axum::Json;
use chrono::Utc;
use rotor_core::state::RotationState;
use rotor_core::status::StatusReport;

use crate::state::AppState;

/// GET /api/status: current site, last and next rotation.
///
/// An unreadable store degrades to the configured seed values.
pub async fn get_status(State(app): State<AppState>) -> Json<StatusReport> {
    let loaded = RotationState::load_or_initial(app.store.as_ref(), &app.config.initial).await;
    let state = match loaded {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(
                error = %e,
                store = %app.store.describe(),
                "could not read rotation state, reporting seed values"
            );
            RotationState::from_initial(&app.config.initial)
        }
    };
    Json(StatusReport::build(
        &state,
        app.config.rotation.interval(),
        Utc::now(),
        app.store.describe(),
    ))
}
