//! Project image endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::get,
};
use pitchboard_common::{AppError, AppResult};
use pitchboard_core::{UpdateImageInput, UploadImageInput};
use pitchboard_db::entities::project_image;

use crate::{
    extractors::CurrentCaller,
    middleware::AppState,
    response::{Created, no_content},
};

/// List a project's images.
async fn list_images(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<Json<Vec<project_image::Model>>> {
    let images = state.image_service.list(&project_id, &caller).await?;
    Ok(Json(images))
}

/// Upload an image (`multipart/form-data` with `image`, `caption`, `order`).
async fn upload_image(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Created<project_image::Model>> {
    let mut data: Option<Vec<u8>> = None;
    let mut content_type: Option<String> = None;
    let mut caption: Option<String> = None;
    let mut order = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "image" => {
                content_type = field.content_type().map(ToString::to_string);
                data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?
                        .to_vec(),
                );
            }
            "caption" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !text.is_empty() {
                    caption = Some(text);
                }
            }
            "order" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                order = text
                    .trim()
                    .parse()
                    .map_err(|_| AppError::BadRequest(format!("Invalid order: {text}")))?;
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| AppError::BadRequest("Missing image field".to_string()))?;
    let content_type = content_type
        .ok_or_else(|| AppError::BadRequest("Missing image content type".to_string()))?;

    let image = state
        .image_service
        .upload(
            &project_id,
            &caller,
            UploadImageInput {
                data,
                content_type,
                caption,
                order,
            },
        )
        .await?;
    Ok(Created(image))
}

/// Get one image.
async fn get_image(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path((project_id, image_id)): Path<(String, String)>,
) -> AppResult<Json<project_image::Model>> {
    let image = state
        .image_service
        .get(&project_id, &image_id, &caller)
        .await?;
    Ok(Json(image))
}

/// Edit caption or order.
async fn update_image(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path((project_id, image_id)): Path<(String, String)>,
    Json(input): Json<UpdateImageInput>,
) -> AppResult<Json<project_image::Model>> {
    let image = state
        .image_service
        .update(&project_id, &image_id, &caller, input)
        .await?;
    Ok(Json(image))
}

/// Delete an image.
async fn delete_image(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path((project_id, image_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state
        .image_service
        .delete(&project_id, &image_id, &caller)
        .await?;
    Ok(no_content())
}

/// Create the images router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/images", get(list_images).post(upload_image))
        .route(
            "/{id}/images/{image_id}",
            get(get_image).patch(update_image).delete(delete_image),
        )
}
