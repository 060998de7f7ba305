use super::{offset_window, page_window, BookFilter, BookStore, StorageError};
use crate::models::book::{Book, BookId};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

/// Books live as JSONB documents; `seq` keeps insertion order.
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPool::connect(database_url).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                seq BIGSERIAL,
                id UUID PRIMARY KEY,
                doc JSONB NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_books_isbn ON books ((doc->>'isbn'))")
            .execute(&pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_books_seq ON books (seq)")
            .execute(&pool)
            .await?;

        Ok(Self { pool })
    }
}

/// Appends the SQL predicate for `filter` to `builder`.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    match filter {
        BookFilter::IsbnEquals(isbn) => {
            builder.push("doc->>'isbn' = ").push_bind(isbn.clone());
        }
        BookFilter::TitleContains(fragment) => {
            // strpos is case-sensitive and treats the fragment literally, unlike LIKE.
            builder
                .push("strpos(doc->>'title', ")
                .push_bind(fragment.clone())
                .push(") > 0");
        }
        BookFilter::AuthorsAnyOf(authors) => {
            builder.push("doc->'authors' ?| ").push_bind(authors.clone());
        }
        BookFilter::All(filters) if filters.is_empty() => {
            builder.push("TRUE");
        }
        BookFilter::All(filters) => {
            builder.push("(");
            for (i, inner) in filters.iter().enumerate() {
                if i > 0 {
                    builder.push(" AND ");
                }
                push_filter(builder, inner);
            }
            builder.push(")");
        }
    }
}

fn book_from_row(row: &sqlx::postgres::PgRow) -> Result<Book, StorageError> {
    let Json(book): Json<Book> = row.try_get("doc")?;
    Ok(book)
}

#[async_trait]
impl BookStore for PostgresBackend {
    async fn count_matching(&self, filter: &BookFilter) -> Result<i64, StorageError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS count FROM books WHERE ");
        push_filter(&mut builder, filter);

        let row = builder.build().fetch_one(&self.pool).await?;
        Ok(row.try_get::<i64, _>("count")?)
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

        let mut builder = QueryBuilder::<Postgres>::new("SELECT doc FROM books WHERE ");
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY seq LIMIT ")
            .push_bind(take as i64)
            .push(" OFFSET ")
            .push_bind(skip as i64);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(book_from_row).collect()
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Book>, StorageError> {
        let Some((skip, take)) = offset_window(offset, limit) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query("SELECT doc FROM books ORDER BY seq LIMIT $1 OFFSET $2")
            .bind(take as i64)
            .bind(skip as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(book_from_row).collect()
    }

    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>, StorageError> {
        let row = sqlx::query("SELECT doc FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(book_from_row).transpose()
    }

    async fn insert(&self, book: Book) -> Result<Book, StorageError> {
        let id = book.id.unwrap_or_else(Uuid::new_v4);
        let book = book.with_id(id);

        let result = sqlx::query("INSERT INTO books (id, doc) VALUES ($1, $2)")
            .bind(id)
            .bind(Json(&book))
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(book),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StorageError::Duplicate(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(&self, id: BookId, book: Book) -> Result<Option<Book>, StorageError> {
        let book = book.with_id(id);

        let result = sqlx::query("UPDATE books SET doc = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(&book))
            .execute(&self.pool)
            .await?;

        Ok((result.rows_affected() > 0).then_some(book))
    }

    async fn delete(&self, id: BookId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn test_connection(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_for(filter: &BookFilter) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT doc FROM books WHERE ");
        push_filter(&mut builder, filter);
        builder.sql().to_string()
    }

    #[test]
    fn test_isbn_filter_sql() {
        let sql = sql_for(&BookFilter::IsbnEquals("123".to_string()));
        assert_eq!(sql, "SELECT doc FROM books WHERE doc->>'isbn' = $1");
    }

    #[test]
    fn test_title_and_authors_filter_sql() {
        let sql = sql_for(&BookFilter::All(vec![
            BookFilter::TitleContains("Foo".to_string()),
            BookFilter::AuthorsAnyOf(vec!["A".to_string()]),
        ]));

        assert_eq!(
            sql,
            "SELECT doc FROM books WHERE (strpos(doc->>'title', $1) > 0 AND doc->'authors' ?| $2)"
        );
    }

    #[test]
    fn test_empty_conjunction_matches_everything() {
        let sql = sql_for(&BookFilter::All(Vec::new()));
        assert_eq!(sql, "SELECT doc FROM books WHERE TRUE");
    }
}
