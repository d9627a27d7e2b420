use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use rotor_core::rotation::{Orchestrator, RotationOutcome};
use rotor_core::state::format_timestamp;
use rotor_core::RotorError;

use crate::error::status_for;
use crate::state::AppState;

/// POST /api/rotate: run one rotation and report the result.
///
/// Failures are reported in the same `{success, ...}` envelope as successes
/// so triggers can relay them verbatim. The rotation runs on its own task
/// holding the lock, so it completes even if the caller hangs up.
pub async fn rotate(State(app): State<AppState>, headers: HeaderMap) -> Response {
    let request_id = request_id(&headers);

    let Ok(guard) = app.rotation_lock.clone().try_lock_owned() else {
        tracing::warn!(%request_id, "rotation requested while another is running");
        return rotor_failure(&app, &RotorError::RotationInProgress, &request_id);
    };

    let task_app = app.clone();
    let task_id = request_id.clone();
    let handle = tokio::spawn(async move {
        let _guard = guard;
        run(&task_app, &task_id).await
    });

    match handle.await {
        Ok(Ok(outcome)) => Json(success_body(&outcome)).into_response(),
        Ok(Err(e)) => {
            tracing::error!(%request_id, error = %e, "site rotation failed");
            rotor_failure(&app, &e, &request_id)
        }
        Err(e) => {
            tracing::error!(%request_id, error = %e, "rotation task aborted");
            failure(
                &app,
                StatusCode::INTERNAL_SERVER_ERROR,
                "rotation task aborted".to_string(),
                format!("{e:?}"),
                &request_id,
            )
        }
    }
}

async fn run(app: &AppState, request_id: &str) -> Result<RotationOutcome, RotorError> {
    let client = app.client()?;
    Orchestrator::new(
        &client,
        app.store.as_ref(),
        &app.config.rotation,
        &app.config.source,
    )
    .with_initial(&app.config.initial)
    .rotate(request_id)
    .await
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("req_{}", uuid::Uuid::new_v4().simple()))
}

fn success_body(outcome: &RotationOutcome) -> serde_json::Value {
    let mut body = serde_json::json!({
        "success": true,
        "message": "Site rotation completed successfully",
        "newSite": outcome.new_site,
        "oldSiteId": outcome.old_site.id(),
        "oldSiteDeleted": outcome.old_site.was_deleted(),
        "timestamp": format_timestamp(outcome.completed_at),
        "requestId": outcome.request_id,
    });
    if let Some(err) = outcome.old_site.error() {
        body["oldSiteError"] = serde_json::Value::String(err.to_string());
    }
    body
}

fn rotor_failure(app: &AppState, err: &RotorError, request_id: &str) -> Response {
    failure(app, status_for(err), err.to_string(), format!("{err:?}"), request_id)
}

fn failure(
    app: &AppState,
    status: StatusCode,
    message: String,
    details: String,
    request_id: &str,
) -> Response {
    let mut body = serde_json::json!({
        "success": false,
        "error": message,
        "timestamp": format_timestamp(Utc::now()),
        "requestId": request_id,
    });
    if app.config.environment.is_development() {
        body["details"] = serde_json::Value::String(details);
    }
    (status, Json(body)).into_response()
}
