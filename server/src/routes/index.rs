//! Root route serving the drawing page.

use axum::response::Html;

/// GET / - the canvas drawing page
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}
