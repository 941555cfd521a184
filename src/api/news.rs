use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::form::read_form;
use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::{sort_newest_first, MessageResponse, NewsChanges, NewsItem};
use crate::state::AppState;
use crate::storage::Collection;
use crate::uploads::UploadKind;

const NOT_FOUND: &str = "News item not found";

pub async fn list_news(State(state): State<Arc<AppState>>) -> Json<Vec<NewsItem>> {
    let mut news: Vec<NewsItem> = state.records.read(Collection::News).await;
    sort_newest_first(&mut news, |item| item.date);
    Json(news)
}

pub async fn get_news(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<NewsItem>, ApiError> {
    state
        .records
        .read::<NewsItem>(Collection::News)
        .await
        .into_iter()
        .find(|item| item.id == id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

pub async fn create_news(
    State(state): State<Arc<AppState>>,
    Auth(claims): Auth,
    request: Request,
) -> Result<(StatusCode, Json<NewsItem>), ApiError> {
    let mut form = read_form(&state, request).await?;

    let (Some(title), Some(description)) = (form.text("title"), form.text("description")) else {
        return Err(ApiError::validation("Title and description are required"));
    };

    let image = match form.take_image() {
        Some(staged) => {
            let kind = UploadKind::resolve(UploadKind::News, form.text("type").as_deref());
            Some(staged.commit(&state.uploads, kind).await?)
        }
        None => None,
    };

    let item = NewsItem::new(
        title,
        description,
        form.text("link"),
        image.clone(),
        claims.username,
    );

    let saved = state
        .records
        .update(Collection::News, |news: &mut Vec<NewsItem>| {
            news.push(item.clone());
            Ok::<_, ApiError>(item)
        })
        .await;

    match saved {
        Ok(item) => {
            tracing::info!(id = %item.id, by = %item.created_by, "Created news item");
            Ok((StatusCode::CREATED, Json(item)))
        }
        Err(e) => {
            if let Some(image) = &image {
                state.uploads.remove(image).await;
            }
            Err(e)
        }
    }
}

pub async fn update_news(
    State(state): State<Arc<AppState>>,
    Auth(claims): Auth,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<NewsItem>, ApiError> {
    let exists = state
        .records
        .read::<NewsItem>(Collection::News)
        .await
        .iter()
        .any(|item| item.id == id);
    if !exists {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    let mut form = read_form(&state, request).await?;

    let image = match form.take_image() {
        Some(staged) => {
            let kind = UploadKind::resolve(UploadKind::News, form.text("type").as_deref());
            Some(staged.commit(&state.uploads, kind).await?)
        }
        None => None,
    };

    let changes = NewsChanges {
        title: form.text("title"),
        description: form.text("description"),
        link: form.text("link"),
        image: image.clone(),
    };

    let updated = state
        .records
        .update(Collection::News, |news: &mut Vec<NewsItem>| {
            let item = news
                .iter_mut()
                .find(|item| item.id == id)
                .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
            let previous_image = item.image.clone();
            item.apply(changes);
            Ok::<_, ApiError>((item.clone(), previous_image))
        })
        .await;

    match updated {
        Ok((item, previous_image)) => {
            // A new image replaces the old file.
            if let (Some(_), Some(previous)) = (&image, previous_image) {
                state.uploads.remove(&previous).await;
            }
            tracing::info!(id = %item.id, by = %claims.username, "Updated news item");
            Ok(Json(item))
        }
        Err(e) => {
            if let Some(image) = &image {
                state.uploads.remove(image).await;
            }
            Err(e)
        }
    }
}

pub async fn delete_news(
    State(state): State<Arc<AppState>>,
    Auth(claims): Auth,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = state
        .records
        .update(Collection::News, |news: &mut Vec<NewsItem>| {
            let index = news
                .iter()
                .position(|item| item.id == id)
                .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
            Ok::<_, ApiError>(news.remove(index))
        })
        .await?;

    if let Some(image) = &removed.image {
        state.uploads.remove(image).await;
    }

    tracing::info!(id = %removed.id, by = %claims.username, "Deleted news item");
    Ok(Json(MessageResponse::new("News item deleted")))
}
