use super::storage_failure;
use crate::models::book::{Book, BookId};
use crate::storage::Backend;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

fn default_limit() -> i64 {
    100
}

/// `offset` here counts records, unlike the page index used by search.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

pub async fn list_books(
    Query(params): Query<ListParams>,
    State(backend): State<Backend>,
) -> Result<Json<Vec<Book>>, StatusCode> {
    backend
        .list(params.limit, params.offset)
        .await
        .map(Json)
        .map_err(|e| storage_failure("list books", e))
}

pub async fn get_book(
    Path(id): Path<BookId>,
    State(backend): State<Backend>,
) -> Result<Json<Book>, StatusCode> {
    match backend.get_by_id(id).await {
        Ok(Some(book)) => Ok(Json(book)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(storage_failure("get book", e)),
    }
}

pub async fn create_book(
    State(backend): State<Backend>,
    body: Option<Json<Book>>,
) -> Result<Response, StatusCode> {
    let Some(Json(book)) = body else {
        warn!("Rejected create request without a valid book body");
        return Err(StatusCode::BAD_REQUEST);
    };

    let created = backend
        .insert(book)
        .await
        .map_err(|e| storage_failure("create book", e))?;

    let location = created
        .id
        .map(|id| format!("/books/{}", id))
        .unwrap_or_default();
    info!("Created book {}", location);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    )
        .into_response())
}

pub async fn update_book(
    Path(id): Path<BookId>,
    State(backend): State<Backend>,
    body: Option<Json<Book>>,
) -> Result<Json<Book>, StatusCode> {
    let Some(Json(book)) = body else {
        warn!("Rejected update of book {} without a valid body", id);
        return Err(StatusCode::BAD_REQUEST);
    };

    match backend.replace(id, book).await {
        Ok(Some(updated)) => Ok(Json(updated)),
        Ok(None) => {
            warn!("Cannot update unknown book {}", id);
            Err(StatusCode::BAD_REQUEST)
        }
        Err(e) => Err(storage_failure("update book", e)),
    }
}

pub async fn delete_book(
    Path(id): Path<BookId>,
    State(backend): State<Backend>,
) -> Result<StatusCode, StatusCode> {
    let removed = backend
        .delete(id)
        .await
        .map_err(|e| storage_failure("delete book", e))?;

    if removed {
        info!("Deleted book {}", id);
    }
    Ok(StatusCode::OK)
}
