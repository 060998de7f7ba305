use crate::storage::{Backend, StorageError};
use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

pub mod books;
pub mod health;
pub mod search;


use books::{create_book, delete_book, get_book, list_books, update_book};
use health::health_check;
use search::search_books;

pub fn router(backend: Backend) -> Router {
    Router::new()
        .route("/status", get(health_check))
        .route("/books", get(list_books).post(create_book))
        .route("/books/search", post(search_books))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(backend)
}

/// Logs a store failure and picks the response status for it.
fn storage_failure(action: &str, e: StorageError) -> StatusCode {
    error!("Failed to {}: {}", action, e);
    match e {
        StorageError::Duplicate(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
