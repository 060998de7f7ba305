// Goodreads-style `books.csv`: empty cells are dropped, then rows need exactly `EXPECTED_FIELDS` values.

use crate::models::Book;
use chrono::NaiveDate;
use std::io::Read;
use thiserror::Error;
use tracing::warn;

pub const EXPECTED_FIELDS: usize = 12;

mod column {
    pub const TITLE: usize = 1;
    pub const AUTHORS: usize = 2;
    pub const AVERAGE_RATING: usize = 3;
    pub const ISBN: usize = 4;
    pub const ISBN13: usize = 5;
    pub const LANGUAGE_CODE: usize = 6;
    pub const NUM_PAGES: usize = 7;
    pub const RATINGS_COUNT: usize = 8;
    pub const TEXT_REVIEWS: usize = 9;
    pub const PUBLICATION_DATE: usize = 10;
    pub const PUBLISHER: usize = 11;
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid {field}: '{value}'")]
    InvalidField { field: &'static str, value: String },
}

#[derive(Debug, Default)]
pub struct ParsedBooks {
    pub books: Vec<Book>,
    pub skipped: usize,
}

fn parse_field<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, LoadError> {
    value.trim().parse().map_err(|_| LoadError::InvalidField {
        field,
        value: value.to_string(),
    })
}

/// `day/month/year`; anything else yields `None`.
pub fn parse_publication_date(value: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = value.split('/').filter(|p| !p.is_empty()).collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };

    NaiveDate::from_ymd_opt(
        year.trim().parse().ok()?,
        month.trim().parse().ok()?,
        day.trim().parse().ok()?,
    )
}

/// Builds a book from the non-empty fields of one row. `Ok(None)` means the
/// row has the wrong shape.
pub fn build_book(fields: &[&str]) -> Result<Option<Book>, LoadError> {
    if fields.len() != EXPECTED_FIELDS {
        return Ok(None);
    }

    let authors = fields[column::AUTHORS]
        .split('/')
        .filter(|author| !author.is_empty())
        .map(str::to_string)
        .collect();

    Ok(Some(Book {
        id: None,
        title: Some(fields[column::TITLE].to_string()),
        authors,
        average_rating: parse_field("average rating", fields[column::AVERAGE_RATING])?,
        isbn: Some(fields[column::ISBN].to_string()),
        isbn13: Some(fields[column::ISBN13].to_string()),
        language_code: Some(fields[column::LANGUAGE_CODE].to_string()),
        num_pages: Some(parse_field("page count", fields[column::NUM_PAGES])?),
        ratings_count: parse_field("ratings count", fields[column::RATINGS_COUNT])?,
        text_reviews_count: parse_field("text reviews count", fields[column::TEXT_REVIEWS])?,
        publication_date: parse_publication_date(fields[column::PUBLICATION_DATE]),
        publisher: Some(fields[column::PUBLISHER].to_string()),
    }))
}

/// Reads at most `max_records` data rows after the header.
pub fn read_books<R: Read>(reader: R, max_records: usize) -> Result<ParsedBooks, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut parsed = ParsedBooks::default();

    for (row, record) in csv_reader.records().take(max_records).enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                warn!("Skipping unreadable row {}: {}", row + 1, e);
                parsed.skipped += 1;
                continue;
            }
        };

        let fields: Vec<&str> = record.iter().filter(|f| !f.is_empty()).collect();
        match build_book(&fields) {
            Ok(Some(book)) => parsed.books.push(book),
            Ok(None) => {
                warn!(
                    "Skipping row {}: expected {} fields, found {}",
                    row + 1,
                    EXPECTED_FIELDS,
                    fields.len()
                );
                parsed.skipped += 1;
            }
            Err(e) => {
                warn!("Skipping row {}: {}", row + 1, e);
                parsed.skipped += 1;
            }
        }
    }

    Ok(parsed)
}
