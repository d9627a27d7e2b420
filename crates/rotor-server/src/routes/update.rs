use axum::extract::State;
use axum::Json;
use chrono::Utc;
use rotor_core::state::{apply_update, format_timestamp};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRotationBody {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    site_id: Option<String>,
}

/// POST /api/rotation: repoint the record at an operator-supplied URL.
pub async fn update_rotation(
    State(app): State<AppState>,
    Json(body): Json<UpdateRotationBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome = apply_update(
        app.store.as_ref(),
        body.url.as_deref(),
        body.site_id.as_deref(),
        Utc::now(),
    )
    .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Rotation state updated",
        "url": outcome.url,
        "siteId": outcome.site_id.as_deref().unwrap_or("not-provided"),
        "lastRotation": format_timestamp(outcome.last_rotation),
    })))
}
