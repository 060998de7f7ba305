use crate::models::book::Book;
use serde::{Deserialize, Deserializer, Serialize};

/// Partially filled search request. Offset is a page index, not a row offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchCriteria {
    pub isbn: Option<String>,
    pub title: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub authors: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub offset: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub limit: i64,
}

// An explicit `null` reads the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub books: Vec<Book>,
    pub total_books: i64,
}
