use super::{offset_window, page_window, BookFilter, BookStore, StorageError};
use crate::models::book::{Book, BookId};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process store. Books are kept in insertion order.
#[derive(Default)]
pub struct MemoryBackend {
    books: RwLock<Vec<Book>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store, assigning ids to books that have none.
    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        let books = books
            .into_iter()
            .map(|book| match book.id {
                Some(_) => book,
                None => book.with_id(Uuid::new_v4()),
            })
            .collect();

        Self {
            books: RwLock::new(books),
        }
    }
}

#[async_trait]
impl BookStore for MemoryBackend {
    async fn count_matching(&self, filter: &BookFilter) -> Result<i64, StorageError> {
        let books = self.books.read().await;
        Ok(books.iter().filter(|book| filter.matches(book)).count() as i64)
    }

    async fn find_matching(
        &self,
        filter: &BookFilter,
        page_index: i64,
        page_size: i64,
    ) -> Result<Vec<Book>, StorageError> {
        let Some((skip, take)) = page_window(page_index, page_size) else {
            return Ok(Vec::new());
        };

        let books = self.books.read().await;
        Ok(books
            .iter()
            .filter(|book| filter.matches(book))
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Book>, StorageError> {
        let Some((skip, take)) = offset_window(offset, limit) else {
            return Ok(Vec::new());
        };

        let books = self.books.read().await;
        Ok(books.iter().skip(skip).take(take).cloned().collect())
    }

    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>, StorageError> {
        let books = self.books.read().await;
        Ok(books.iter().find(|book| book.id == Some(id)).cloned())
    }

    async fn insert(&self, book: Book) -> Result<Book, StorageError> {
        let id = book.id.unwrap_or_else(Uuid::new_v4);
        let book = book.with_id(id);

        let mut books = self.books.write().await;
        if books.iter().any(|stored| stored.id == Some(id)) {
            return Err(StorageError::Duplicate(id));
        }
        books.push(book.clone());

        Ok(book)
    }

    async fn replace(&self, id: BookId, book: Book) -> Result<Option<Book>, StorageError> {
        let mut books = self.books.write().await;

        match books.iter_mut().find(|stored| stored.id == Some(id)) {
            Some(stored) => {
                *stored = book.with_id(id);
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: BookId) -> Result<bool, StorageError> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|book| book.id != Some(id));
        Ok(books.len() != before)
    }

    async fn test_connection(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(title: &str) -> Book {
        Book {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    fn numbered(count: usize) -> MemoryBackend {
        MemoryBackend::with_books((0..count).map(|i| titled(&format!("Book {}", i))))
    }

    fn titles(books: &[Book]) -> Vec<String> {
        books.iter().filter_map(|b| b.title.clone()).collect()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_keeps_order() {
        let store = MemoryBackend::new();

        let first = store.insert(titled("First")).await.unwrap();
        let second = store.insert(titled("Second")).await.unwrap();

        assert!(first.id.is_some());
        assert_ne!(first.id, second.id);

        let listed = store.list(100, 0).await.unwrap();
        assert_eq!(titles(&listed), vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = MemoryBackend::new();
        let stored = store.insert(titled("First")).await.unwrap();

        let result = store.insert(titled("Again").with_id(stored.id.unwrap())).await;

        assert!(matches!(result, Err(StorageError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_get_replace_delete() {
        let store = MemoryBackend::new();
        let id = store.insert(titled("Draft")).await.unwrap().id.unwrap();

        let replaced = store.replace(id, titled("Final")).await.unwrap().unwrap();
        assert_eq!(replaced.id, Some(id));
        assert_eq!(
            store.get_by_id(id).await.unwrap().unwrap().title.as_deref(),
            Some("Final")
        );

        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert_eq!(store.get_by_id(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_replace_unknown_returns_none() {
        let store = MemoryBackend::new();

        let result = store.replace(Uuid::new_v4(), titled("Ghost")).await.unwrap();

        assert_eq!(result, None);
        assert_eq!(store.list(100, 0).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_list_uses_raw_offset() {
        let store = numbered(10);

        let page = store.list(3, 2).await.unwrap();

        assert_eq!(titles(&page), vec!["Book 2", "Book 3", "Book 4"]);
    }

    #[tokio::test]
    async fn test_find_matching_uses_page_index() {
        let store = numbered(10);
        let filter = BookFilter::TitleContains("Book".to_string());

        let page = store.find_matching(&filter, 1, 3).await.unwrap();

        assert_eq!(titles(&page), vec!["Book 3", "Book 4", "Book 5"]);
        assert_eq!(store.count_matching(&filter).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_find_matching_past_the_end_is_empty() {
        let store = numbered(5);
        let filter = BookFilter::TitleContains("Book".to_string());

        assert!(store.find_matching(&filter, 5, 1).await.unwrap().is_empty());

        let last = store.find_matching(&filter, 1, 3).await.unwrap();
        assert_eq!(titles(&last), vec!["Book 3", "Book 4"]);
    }

    #[tokio::test]
    async fn test_non_positive_page_size_is_empty() {
        let store = numbered(5);
        let filter = BookFilter::TitleContains("Book".to_string());

        assert!(store.find_matching(&filter, 0, 0).await.unwrap().is_empty());
        assert!(store.find_matching(&filter, 0, -3).await.unwrap().is_empty());
        assert!(store.list(0, 0).await.unwrap().is_empty());
    }
}
