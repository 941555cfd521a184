use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::form::read_form;
use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::{sort_newest_first, GalleryCategory, GalleryItem, MessageResponse};
use crate::state::AppState;
use crate::storage::Collection;
use crate::uploads::UploadKind;

pub async fn list_gallery(State(state): State<Arc<AppState>>) -> Json<Vec<GalleryItem>> {
    let mut gallery: Vec<GalleryItem> = state.records.read(Collection::Gallery).await;
    sort_newest_first(&mut gallery, |item| item.date);
    Json(gallery)
}

pub async fn create_gallery_item(
    State(state): State<Arc<AppState>>,
    Auth(claims): Auth,
    request: Request,
) -> Result<(StatusCode, Json<GalleryItem>), ApiError> {
    let mut form = read_form(&state, request).await?;

    let staged = form
        .take_image()
        .ok_or_else(|| ApiError::validation("Image is required"))?;
    let image = staged.commit(&state.uploads, UploadKind::Gallery).await?;

    let item = GalleryItem::new(
        form.text("title"),
        form.text("description"),
        GalleryCategory::from_submitted(form.text("category").as_deref()),
        image.clone(),
        claims.username,
    );

    let saved = state
        .records
        .update(Collection::Gallery, |gallery: &mut Vec<GalleryItem>| {
            gallery.push(item.clone());
            Ok::<_, ApiError>(item)
        })
        .await;

    match saved {
        Ok(item) => {
            tracing::info!(id = %item.id, by = %item.uploaded_by, "Added gallery photo");
            Ok((StatusCode::CREATED, Json(item)))
        }
        Err(e) => {
            state.uploads.remove(&image).await;
            Err(e)
        }
    }
}

pub async fn delete_gallery_item(
    State(state): State<Arc<AppState>>,
    Auth(claims): Auth,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = state
        .records
        .update(Collection::Gallery, |gallery: &mut Vec<GalleryItem>| {
            let index = gallery
                .iter()
                .position(|item| item.id == id)
                .ok_or_else(|| ApiError::not_found("Photo not found"))?;
            Ok::<_, ApiError>(gallery.remove(index))
        })
        .await?;

    state.uploads.remove(&removed.image).await;

    tracing::info!(id = %removed.id, by = %claims.username, "Deleted gallery photo");
    Ok(Json(MessageResponse::new("Photo deleted")))
}
