use super::{offset_window, page_window, BookFilter, BookStore, StorageError};
use crate::models::book::{Book, BookId};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::fmt::Display;
use uuid::Uuid;

/// Inclusive LRANGE bounds for `take` ids starting at `skip`.
fn lrange_bounds(skip: usize, take: usize) -> Option<(isize, isize)> {
    let last = skip.checked_add(take.checked_sub(1)?)?;
    Some((isize::try_from(skip).ok()?, isize::try_from(last).ok()?))
}

/// Books are JSON strings under `{prefix}book:{id}`; `{prefix}books:order`
/// holds ids in insertion order. Filters are evaluated client side.
pub struct RedisBackend {
    client: redis::Client,
    prefix: String,
}

impl RedisBackend {
    pub fn new(redis_url: &str) -> Result<Self, StorageError> {
        Self::with_prefix(redis_url, "")
    }

    pub fn with_prefix(redis_url: &str, prefix: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            prefix: prefix.to_string(),
        })
    }

    pub async fn get_connection(&self) -> Result<MultiplexedConnection, StorageError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    fn book_key(&self, id: impl Display) -> String {
        format!("{}book:{}", self.prefix, id)
    }

    fn order_key(&self) -> String {
        format!("{}books:order", self.prefix)
    }

    async fn load(
        &self,
        conn: &mut MultiplexedConnection,
        ids: &[String],
    ) -> Result<Vec<Book>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in ids {
            pipe.get(self.book_key(id));
        }
        let values: Vec<Option<String>> = pipe.query_async(conn).await?;

        let mut books = Vec::with_capacity(values.len());
        for json_str in values.into_iter().flatten() {
            books.push(serde_json::from_str(&json_str)?);
        }
        Ok(books)
    }

    async fn load_all(&self) -> Result<Vec<Book>, StorageError> {
        let mut conn = self.get_connection().await?;
        let ids: Vec<String> = conn.lrange(self.order_key(), 0, -1).await?;
        self.load(&mut conn, &ids).await
    }
}

#[async_trait]
impl BookStore for RedisBackend {
    async fn count_matching(&self, filter: &BookFilter) -> Result<i64, StorageError> {
        let books = self.load_all().await?;
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

        let books = self.load_all().await?;
        Ok(books
            .into_iter()
            .filter(|book| filter.matches(book))
            .skip(skip)
            .take(take)
            .collect())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Book>, StorageError> {
        let Some((start, stop)) =
            offset_window(offset, limit).and_then(|(skip, take)| lrange_bounds(skip, take))
        else {
            return Ok(Vec::new());
        };

        let mut conn = self.get_connection().await?;
        let ids: Vec<String> = conn.lrange(self.order_key(), start, stop).await?;
        self.load(&mut conn, &ids).await
    }

    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>, StorageError> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(self.book_key(id)).await?;

        match value {
            Some(json_str) => Ok(Some(serde_json::from_str(&json_str)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, book: Book) -> Result<Book, StorageError> {
        let id = book.id.unwrap_or_else(Uuid::new_v4);
        let book = book.with_id(id);
        let value = serde_json::to_string(&book)?;

        let mut conn = self.get_connection().await?;
        let created: bool = conn.set_nx(self.book_key(id), &value).await?;
        if !created {
            return Err(StorageError::Duplicate(id));
        }
        conn.rpush::<_, _, ()>(self.order_key(), id.to_string()).await?;

        Ok(book)
    }

    async fn replace(&self, id: BookId, book: Book) -> Result<Option<Book>, StorageError> {
        let book = book.with_id(id);
        let value = serde_json::to_string(&book)?;

        let mut conn = self.get_connection().await?;
        // SET XX only writes when the key is already present.
        let updated: Option<String> = redis::cmd("SET")
            .arg(self.book_key(id))
            .arg(&value)
            .arg("XX")
            .query_async(&mut conn)
            .await?;

        Ok(updated.map(|_| book))
    }

    async fn delete(&self, id: BookId) -> Result<bool, StorageError> {
        let mut conn = self.get_connection().await?;
        let removed: i64 = conn.del(self.book_key(id)).await?;
        conn.lrem::<_, _, ()>(self.order_key(), 0, id.to_string())
            .await?;
        Ok(removed > 0)
    }

    async fn test_connection(&self) -> Result<(), StorageError> {
        let mut conn = self.get_connection().await?;
        let _: Option<String> = conn.get("__connection_test__").await?;
        Ok(())
    }
}
