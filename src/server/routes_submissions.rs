//! Submission API routes.
//!
//! Create and edit take `multipart/form-data` with an optional `photo` file
//! part and the text parts `title`, `description`, `submitted_by`, and
//! `approximate_date`.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use heirloom_common::SubmissionId;

use super::error::ApiError;
use super::{blocking, AppContext};
use crate::archive::{SubmissionFields, Upload};

/// Create submission routes.
pub fn submission_routes() -> Router<AppContext> {
    Router::new()
        .route(
            "/submissions",
            get(list_submissions).post(create_submission),
        )
        .route(
            "/submissions/:id",
            get(get_submission).post(edit_submission),
        )
        .route("/submissions/:id/history", get(get_photo_history))
}

/// Parsed submission form.
#[derive(Debug, Default)]
struct SubmissionForm {
    photo: Option<Upload>,
    fields: SubmissionFields,
}

async fn read_form(mut multipart: Multipart) -> Result<SubmissionForm, ApiError> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "photo" => {
                let filename = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                form.photo = Some(Upload::new(filename, data));
            }
            "title" => form.fields.title = Some(field.text().await?),
            "description" => form.fields.description = Some(field.text().await?),
            "submitted_by" => form.fields.submitted_by = Some(field.text().await?),
            "approximate_date" => form.fields.approximate_date = Some(field.text().await?),
            other => tracing::debug!("Ignoring form field {:?}", other),
        }
    }

    Ok(form)
}

fn parse_id(raw: &str) -> Result<SubmissionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid submission id: {}", raw)))
}

async fn list_submissions(State(ctx): State<AppContext>) -> Result<impl IntoResponse, ApiError> {
    let workflow = ctx.workflow.clone();
    let views = blocking(move || workflow.list_for_display()).await?;
    Ok(Json(views))
}

async fn create_submission(
    State(ctx): State<AppContext>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_form(multipart).await?;
    let photo = form
        .photo
        .filter(|upload| !upload.is_empty())
        .ok_or_else(|| ApiError::bad_request("A photo is required"))?;

    let workflow = ctx.workflow.clone();
    let fields = form.fields;
    let id = blocking(move || workflow.create(&photo, &fields)).await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

async fn get_submission(
    State(ctx): State<AppContext>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;
    let workflow = ctx.workflow.clone();

    match blocking(move || workflow.get_for_display(Some(id))).await? {
        Some(view) => Ok(Json(view)),
        None => Err(ApiError::NotFound(format!("Not found: submission {}", id))),
    }
}

async fn get_photo_history(
    State(ctx): State<AppContext>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;
    let workflow = ctx.workflow.clone();
    let history = blocking(move || workflow.photo_history(id)).await?;
    Ok(Json(history))
}

async fn edit_submission(
    State(ctx): State<AppContext>,
    Path(raw_id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;
    let form = read_form(multipart).await?;

    let workflow = ctx.workflow.clone();
    let report = blocking(move || workflow.edit(id, &form.fields, form.photo.as_ref())).await?;

    Ok(Json(report))
}
