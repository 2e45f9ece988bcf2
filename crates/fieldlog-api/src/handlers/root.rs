//! Landing page.

use axum::response::Html;

pub async fn root() -> Html<&'static str> {
    Html(
        "<h3>Fieldlog server</h3><p>Upload to POST /upload</p>\
         <p><a href='/gallery'>Gallery</a></p>",
    )
}
