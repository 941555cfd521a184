//! HTTP surface: public reads, token-gated writes and static files.

mod auth;
mod form;
mod gallery;
mod news;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::state::AppState;
use crate::uploads::{UploadKind, MAX_UPLOAD_BYTES, PUBLIC_PREFIX};

/// Room for the multipart framing and text fields around a full-size image.
const BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/news", get(news::list_news).post(news::create_news))
        .route(
            "/news/:id",
            get(news::get_news)
                .put(news::update_news)
                .delete(news::delete_news),
        )
        .route(
            "/gallery",
            get(gallery::list_gallery).post(gallery::create_gallery_item),
        )
        .route("/gallery/:id", delete(gallery::delete_gallery_item));

    // Only committed images are public; the staging directory is not served.
    let news_images = format!("{}/{}", PUBLIC_PREFIX, UploadKind::News.dir_name());
    let gallery_images = format!("{}/{}", PUBLIC_PREFIX, UploadKind::Gallery.dir_name());

    Router::new()
        .nest("/api", api)
        .nest_service(
            &news_images,
            ServeDir::new(state.uploads.directory(UploadKind::News)),
        )
        .nest_service(
            &gallery_images,
            ServeDir::new(state.uploads.directory(UploadKind::Gallery)),
        )
        .fallback_service(ServeDir::new(&state.public_dir))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
