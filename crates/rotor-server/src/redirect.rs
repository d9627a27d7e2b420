use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rotor_core::store::CURRENT_SITE_URL;

use crate::state::AppState;

/// Send visitors to the currently active site.
///
/// Evaluated in order:
/// 1. Path matches an excluded prefix or looks like a file → passthrough
/// 2. Store holds a current site URL → 302 to it
/// 3. Configured initial URL, then `redirect.fallback_url` → 302 to it
/// 4. Nothing known, or the store read failed → passthrough
pub async fn redirect_middleware(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if is_excluded(path, &app.config.redirect.excluded_prefixes) {
        return next.run(req).await;
    }

    let stored = match app.store.get(CURRENT_SITE_URL).await {
        Ok(v) => v.filter(|u| !u.trim().is_empty()),
        Err(e) => {
            tracing::warn!(path, error = %e, "could not read current site, serving locally");
            return next.run(req).await;
        }
    };

    let target = stored
        .or_else(|| app.config.initial.current_site_url.clone())
        .or_else(|| app.config.redirect.fallback_url.clone());
    match target {
        Some(url) => {
            tracing::debug!(path, target = %url, "redirecting");
            found(url.trim())
        }
        None => next.run(req).await,
    }
}

fn is_excluded(path: &str, prefixes: &[String]) -> bool {
    path.contains('.') || prefixes.iter().any(|p| path.starts_with(p.as_str()))
}

fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, location.to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
