use crate::config::BackendKind;
use crate::models::book::{Book, BookId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub mod filter;
pub mod memory;
pub mod postgres_store;
pub mod redis_store;

pub use filter::BookFilter;
pub use memory::MemoryBackend;
pub use postgres_store::PostgresBackend;
pub use redis_store::RedisBackend;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Book {0} already exists")]
    Duplicate(BookId),
}

/// Document store holding books, in insertion order.
#[async_trait]
pub trait BookStore {
    async fn count_matching(&self, filter: &BookFilter) -> Result<i64, StorageError>;
    /// Skips `page_index * page_size` matches and returns the next `page_size`.
    async fn find_matching(
        &self,
        filter: &BookFilter,
        page_index: i64,
        page_size: i64,
    ) -> Result<Vec<Book>, StorageError>;
    /// Raw skip/take over every stored book.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Book>, StorageError>;
    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>, StorageError>;
    async fn insert(&self, book: Book) -> Result<Book, StorageError>;
    /// Returns `None` when no book is stored under `id`.
    async fn replace(&self, id: BookId, book: Book) -> Result<Option<Book>, StorageError>;
    async fn delete(&self, id: BookId) -> Result<bool, StorageError>;
    async fn test_connection(&self) -> Result<(), StorageError>;
}

pub type Backend = Arc<dyn BookStore + Send + Sync>;

/// Converts a raw `(offset, limit)` pair into `(skip, take)`.
///
/// Returns `None` for an empty window: non-positive limit or negative offset.
pub fn offset_window(offset: i64, limit: i64) -> Option<(usize, usize)> {
    if limit <= 0 || offset < 0 {
        return None;
    }
    Some((usize::try_from(offset).ok()?, usize::try_from(limit).ok()?))
}

/// Page semantics: page `page_index` of size `page_size` starts at
/// `page_index * page_size`.
pub fn page_window(page_index: i64, page_size: i64) -> Option<(usize, usize)> {
    if page_index < 0 {
        return None;
    }
    offset_window(page_index.checked_mul(page_size)?, page_size)
}

pub async fn connect(kind: &BackendKind) -> Result<Backend, StorageError> {
    let backend: Backend = match kind {
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
        BackendKind::Redis { url } => Arc::new(RedisBackend::new(url)?),
        BackendKind::Postgres { url } => Arc::new(PostgresBackend::new(url).await?),
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_multiplies_offset_by_limit() {
        assert_eq!(page_window(0, 10), Some((0, 10)));
        assert_eq!(page_window(2, 10), Some((20, 10)));
        assert_eq!(page_window(3, 7), Some((21, 7)));
    }

    #[test]
    fn test_offset_window_is_raw_skip() {
        assert_eq!(offset_window(0, 100), Some((0, 100)));
        assert_eq!(offset_window(2, 10), Some((2, 10)));
    }

    #[test]
    fn test_zero_or_negative_size_is_empty() {
        assert_eq!(page_window(0, 0), None);
        assert_eq!(page_window(1, -5), None);
        assert_eq!(page_window(-1, -5), None);
        assert_eq!(offset_window(0, 0), None);
        assert_eq!(offset_window(3, -1), None);
    }

    #[test]
    fn test_negative_offset_is_empty() {
        assert_eq!(page_window(-1, 10), None);
        assert_eq!(offset_window(-4, 10), None);
    }

    #[test]
    fn test_overflowing_page_is_empty() {
        assert_eq!(page_window(i64::MAX, 2), None);
    }
}
