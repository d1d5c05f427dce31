//! Public photo route.
//!
//! `/image/{id}` streams the stored file of a submission. Unknown ids and
//! missing files redirect to the front page instead of failing.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use heirloom_common::paths::content_type_for;
use heirloom_common::SubmissionId;
use tokio_util::io::ReaderStream;

use super::{blocking, AppContext};

/// Create image routes.
pub fn image_routes() -> Router<AppContext> {
    Router::new().route("/image/:id", get(serve_image))
}

fn redirect_home() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

async fn serve_image(State(ctx): State<AppContext>, Path(raw_id): Path<String>) -> Response {
    let Ok(id) = raw_id.parse::<SubmissionId>() else {
        return redirect_home();
    };

    let workflow = ctx.workflow.clone();
    let path = match blocking(move || workflow.resolve_image_path(id)).await {
        Ok(Some(path)) => path,
        Ok(None) => return redirect_home(),
        Err(e) => return e.into_response(),
    };

    // The file can vanish between the check and the open
    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!("Failed to open {}: {}", path, e);
            return redirect_home();
        }
    };

    let content_type = content_type_for(std::path::Path::new(&path));
    let body = Body::from_stream(ReaderStream::new(file));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}
