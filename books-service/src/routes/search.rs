use super::storage_failure;
use crate::models::search::{SearchCriteria, SearchResult};
use crate::services::resolver::resolve;
use crate::storage::Backend;
use axum::{body::Bytes, extract::State, http::StatusCode, response::Json};
use tracing::{info, warn};

/// An empty body means absent criteria. A body that does not parse is a 400.
pub async fn search_books(
    State(backend): State<Backend>,
    body: Bytes,
) -> Result<Json<SearchResult>, StatusCode> {
    let criteria = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        let criteria: SearchCriteria = serde_json::from_slice(&body).map_err(|e| {
            warn!("Rejected search body: {}", e);
            StatusCode::BAD_REQUEST
        })?;
        Some(criteria)
    };
    info!("Search criteria: {:?}", criteria);

    let result = resolve(backend.as_ref(), criteria.as_ref())
        .await
        .map_err(|e| storage_failure("search books", e))?;

    info!(
        "Search matched {} books, returning {}",
        result.total_books,
        result.books.len()
    );
    Ok(Json(result))
}
