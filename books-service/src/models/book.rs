use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BookId = Uuid;

/// A book document as stored and served over HTTP.
///
/// `id` is assigned by the store on insert; every other field is optional on
/// the wire and falls back to its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Book {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<BookId>,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub average_rating: f64,
    pub isbn: Option<String>,
    pub isbn13: Option<String>,
    pub language_code: Option<String>,
    pub num_pages: Option<i32>,
    pub ratings_count: i32,
    pub text_reviews_count: i32,
    pub publication_date: Option<NaiveDate>,
    pub publisher: Option<String>,
}

impl Book {
    pub fn with_id(mut self, id: BookId) -> Self {
        self.id = Some(id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_json_uses_camel_case() {
        let book = Book {
            title: Some("Dune".to_string()),
            average_rating: 4.25,
            num_pages: Some(412),
            publication_date: NaiveDate::from_ymd_opt(1965, 8, 1),
            ..Default::default()
        };

        let json = serde_json::to_value(&book).unwrap();

        assert_eq!(json["averageRating"], 4.25);
        assert_eq!(json["numPages"], 412);
        assert_eq!(json["publicationDate"], "1965-08-01");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_book_missing_fields_fall_back_to_defaults() {
        let book: Book = serde_json::from_str(r#"{"title": "Emma"}"#).unwrap();

        assert_eq!(book.title.as_deref(), Some("Emma"));
        assert!(book.authors.is_empty());
        assert_eq!(book.ratings_count, 0);
        assert_eq!(book.id, None);
    }
}
