use crate::models::search::{SearchCriteria, SearchResult};
use crate::storage::{BookFilter, BookStore, StorageError};
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryIntent {
    ExactIsbn(String),
    TitleAndAuthors { title: String, authors: Vec<String> },
    TitleOnly(String),
    AuthorsOnly(Vec<String>),
    Empty,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl QueryIntent {
    pub fn from_criteria(criteria: Option<&SearchCriteria>) -> Self {
        let Some(criteria) = criteria else {
            return QueryIntent::Empty;
        };

        if let Some(isbn) = present(&criteria.isbn) {
            return QueryIntent::ExactIsbn(isbn.to_string());
        }

        let authors = &criteria.authors;
        match present(&criteria.title) {
            Some(title) if !authors.is_empty() => QueryIntent::TitleAndAuthors {
                title: title.to_string(),
                authors: authors.clone(),
            },
            Some(title) => QueryIntent::TitleOnly(title.to_string()),
            None if !authors.is_empty() => QueryIntent::AuthorsOnly(authors.clone()),
            None => QueryIntent::Empty,
        }
    }

    pub fn filter(&self) -> Option<BookFilter> {
        match self {
            QueryIntent::ExactIsbn(isbn) => Some(BookFilter::IsbnEquals(isbn.clone())),
            QueryIntent::TitleAndAuthors { title, authors } => Some(BookFilter::All(vec![
                BookFilter::TitleContains(title.clone()),
                BookFilter::AuthorsAnyOf(authors.clone()),
            ])),
            QueryIntent::TitleOnly(title) => Some(BookFilter::TitleContains(title.clone())),
            QueryIntent::AuthorsOnly(authors) => Some(BookFilter::AuthorsAnyOf(authors.clone())),
            QueryIntent::Empty => None,
        }
    }
}

/// Counts every match, then fetches one page. `offset` is a page index.
pub async fn resolve(
    store: &(dyn BookStore + Send + Sync),
    criteria: Option<&SearchCriteria>,
) -> Result<SearchResult, StorageError> {
    let (Some(criteria), Some(filter)) = (criteria, QueryIntent::from_criteria(criteria).filter())
    else {
        return Ok(SearchResult::default());
    };

    let total_books = store.count_matching(&filter).await?;
    let books = store
        .find_matching(&filter, criteria.offset, criteria.limit)
        .await?;

    Ok(SearchResult { books, total_books })
}

/// Like [`resolve`], but gives up with `Ok(None)` as soon as `cancel` completes.
/// The in-flight query is dropped; nothing is written either way.
pub async fn resolve_until<F>(
    store: &(dyn BookStore + Send + Sync),
    criteria: Option<&SearchCriteria>,
    cancel: F,
) -> Result<Option<SearchResult>, StorageError>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = cancel => Ok(None),
        result = resolve(store, criteria) => result.map(Some),
    }
}
