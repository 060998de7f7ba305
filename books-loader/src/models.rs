use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Book payload accepted by `POST /books`. The service assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Book {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
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

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub service: String,
    pub status: String,
}
