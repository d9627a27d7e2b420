use axum::response::Html;

/// Served for pass-through requests when no public directory exists.
pub async fn landing_page() -> Html<&'static str> {
    Html(concat!(
        "<!DOCTYPE html><html><head><title>rotor</title></head>",
        "<body style=\"font-family:sans-serif;padding:2rem\">",
        "<h1>No active site</h1>",
        "<p>No rotation has completed yet. Check <code>/api/status</code>.</p>",
        "</body></html>",
    ))
}
