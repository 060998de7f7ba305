use crate::models::book::Book;

/// Predicate over stored books. Every backend must agree with [`BookFilter::matches`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    /// Exact ISBN equality.
    IsbnEquals(String),
    /// Case-sensitive substring of the title.
    TitleContains(String),
    /// At least one author of the book is in the list.
    AuthorsAnyOf(Vec<String>),
    /// Conjunction.
    All(Vec<BookFilter>),
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            BookFilter::IsbnEquals(isbn) => book.isbn.as_deref() == Some(isbn.as_str()),
            BookFilter::TitleContains(fragment) => book
                .title
                .as_deref()
                .map_or(false, |title| title.contains(fragment.as_str())),
            BookFilter::AuthorsAnyOf(authors) => {
                book.authors.iter().any(|author| authors.contains(author))
            }
            BookFilter::All(filters) => filters.iter().all(|filter| filter.matches(book)),
        }
    }
}
