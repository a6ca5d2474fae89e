use crate::{
    dialect::{CurrentDialect, CurrentRow, Dialect},
    photo::{Photo, PhotoDraft, PhotoPatch, join_tags, split_tags},
};
use chrono::{DateTime, SecondsFormat, Utc};
pub use sqlx::Pool;
use sqlx::{FromRow, Row};
use thiserror::Error;

pub use crate::dialect::Db;

/// Formats a creation timestamp for storage.
///
/// Fixed-width RFC 3339 with nanosecond precision, so the text comparison
/// the list statement relies on matches chronological order exactly.
fn format_created_at(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

impl FromRow<'_, CurrentRow> for Photo {
    fn from_row(row: &CurrentRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let title: String = row.try_get("title")?;
        let image: String = row.try_get("image")?;
        let tags: String = row.try_get("tags")?;
        let created_at: String = row.try_get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "created_at".to_string(),
                source: Box::new(e),
            })?
            .with_timezone(&Utc);

        Ok(Photo {
            id,
            title,
            image,
            tags: split_tags(&tags),
            created_at,
        })
    }
}

/// A database abstraction for storing and querying photo records.
///
/// This struct wraps an SQLx connection pool and provides high-level methods
/// for the photo CRUD operations. The implementation is SQL dialect agnostic
/// and delegates syntax to `Dialect`.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Db>,
}

impl Database {
    /// Runs the (idempotent) schema migration and wraps the pool.
    pub async fn with_migration(pool: sqlx::Pool<Db>) -> Result<Self, sqlx::Error> {
        CurrentDialect::migration(&pool).await?;

        Ok(Self { pool })
    }

    /// Inserts a validated draft and returns the stored record.
    ///
    /// The store assigns the id; `created_at` is set here, once.
    pub async fn insert_photo(&self, draft: &PhotoDraft) -> Result<Photo, DatabaseError> {
        let created_at = Utc::now();
        let stmt = CurrentDialect::insert_photo_statement();

        let id: i64 = sqlx::query_scalar(&stmt)
            .bind(&draft.title)
            .bind(&draft.image)
            .bind(join_tags(&draft.tags))
            .bind(format_created_at(&created_at))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryFailed {
                operation: DbOperation::InsertPhoto,
                sql: stmt.clone(),
                source: e,
            })?;

        Ok(Photo {
            id,
            title: draft.title.clone(),
            image: draft.image.clone(),
            tags: draft.tags.clone(),
            created_at,
        })
    }

    /// Fetches one photo by id, or `None` if no such record exists.
    pub async fn get_photo(&self, id: i64) -> Result<Option<Photo>, DatabaseError> {
        let stmt = CurrentDialect::select_photo_statement();

        sqlx::query_as(&stmt)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryFailed {
                operation: DbOperation::QueryPhoto { id },
                sql: stmt.clone(),
                source: e,
            })
    }

    /// Returns all photos ordered by creation time, newest first.
    pub async fn list_photos(&self) -> Result<Vec<Photo>, DatabaseError> {
        let stmt = CurrentDialect::list_photos_statement();

        sqlx::query_as(&stmt)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryFailed {
                operation: DbOperation::ListPhotos,
                sql: stmt.clone(),
                source: e,
            })
    }

    /// Applies the fields present in `patch` to the photo with the given id.
    ///
    /// Returns whether a record was touched; `false` means no such id. An
    /// empty patch degenerates to an existence check.
    pub async fn update_photo(&self, id: i64, patch: &PhotoPatch) -> Result<bool, DatabaseError> {
        let mut columns: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(title) = &patch.title {
            columns.push("title");
            values.push(title.clone());
        }
        if let Some(image) = &patch.image {
            columns.push("image");
            values.push(image.clone());
        }
        if let Some(tags) = &patch.tags {
            columns.push("tags");
            values.push(join_tags(tags));
        }

        if columns.is_empty() {
            return Ok(self.get_photo(id).await?.is_some());
        }

        let stmt = CurrentDialect::update_photo_statement(&columns);

        let mut query = sqlx::query(&stmt);
        for value in &values {
            query = query.bind(value);
        }

        let result = query.bind(id).execute(&self.pool).await.map_err(|e| {
            DatabaseError::QueryFailed {
                operation: DbOperation::UpdatePhoto { id },
                sql: stmt.clone(),
                source: e,
            }
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrites only the tags column, as the retag workflow requires.
    ///
    /// Returns whether a record was touched; `false` means no such id.
    pub async fn update_tags(&self, id: i64, tags: &[String]) -> Result<bool, DatabaseError> {
        let stmt = CurrentDialect::update_tags_statement();

        let result = sqlx::query(&stmt)
            .bind(join_tags(tags))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryFailed {
                operation: DbOperation::UpdateTags { id },
                sql: stmt.clone(),
                source: e,
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes the photo with the given id.
    ///
    /// Returns whether a record was removed; `false` means no such id.
    pub async fn delete_photo(&self, id: i64) -> Result<bool, DatabaseError> {
        let stmt = CurrentDialect::delete_photo_statement();

        let result = sqlx::query(&stmt)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryFailed {
                operation: DbOperation::DeletePhoto { id },
                sql: stmt.clone(),
                source: e,
            })?;

        Ok(result.rows_affected() > 0)
    }
}

/// Represents errors that can occur during database operations.
///
/// Each variant includes contextual information to assist with debugging and
/// error handling.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A general SQL query failure, with full context including operation and SQL.
    #[error("Query failed during {operation:?}: sql={sql}")]
    QueryFailed {
        operation: DbOperation,
        sql: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Enum representing the kind of database operation being performed,
/// used for attaching context to [`DatabaseError::QueryFailed`].
#[derive(Debug)]
pub enum DbOperation {
    /// INSERT INTO photos
    InsertPhoto,
    /// SELECT ... FROM photos WHERE id = ...
    QueryPhoto { id: i64 },
    /// SELECT ... FROM photos ORDER BY created_at DESC
    ListPhotos,
    /// UPDATE photos SET ... WHERE id = ...
    UpdatePhoto { id: i64 },
    /// UPDATE photos SET tags = ... WHERE id = ...
    UpdateTags { id: i64 },
    /// DELETE FROM photos WHERE id = ...
    DeletePhoto { id: i64 },
}

#[cfg(test)]
mod tests {
    use crate::{
        database::{Database, Db, Pool},
        photo::{PhotoDraft, PhotoPatch},
    };

    /// Returns an in-memory SQLite connection pool for testing.
    async fn get_pool() -> Pool<Db> {
        Pool::connect(":memory:").await.unwrap()
    }

    fn draft(title: &str) -> PhotoDraft {
        PhotoDraft {
            title: title.to_string(),
            image: format!("https://blobs.example/photos/{title}.jpg"),
            tags: vec!["beach".to_string(), "sky".to_string()],
        }
    }

    /// Verifies that `Database::with_migration` can be called multiple times
    /// on the same pool without error.
    ///
    /// This confirms that migrations are idempotent — i.e., calling them again
    /// does not fail or break schema assumptions.
    #[tokio::test]
    async fn test_migration_idempotency() {
        let pool = get_pool().await;

        Database::with_migration(pool.clone()).await.unwrap();
        Database::with_migration(pool.clone()).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_get_photo() {
        let pool = get_pool().await;
        let db = Database::with_migration(pool.clone()).await.unwrap();

        let created = db.insert_photo(&draft("Sunset")).await.unwrap();

        let fetched = db.get_photo(created.id).await.unwrap().unwrap();
        assert_eq!(created, fetched);
        assert_eq!("Sunset", fetched.title);
        assert_eq!(vec!["beach".to_string(), "sky".to_string()], fetched.tags);
    }

    #[tokio::test]
    async fn test_get_photo_unknown_id() {
        let pool = get_pool().await;
        let db = Database::with_migration(pool.clone()).await.unwrap();

        assert!(db.get_photo(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_photos_newest_first() {
        let pool = get_pool().await;
        let db = Database::with_migration(pool.clone()).await.unwrap();

        let first = db.insert_photo(&draft("first")).await.unwrap();
        let second = db.insert_photo(&draft("second")).await.unwrap();
        let third = db.insert_photo(&draft("third")).await.unwrap();

        let listed = db.list_photos().await.unwrap();
        assert_eq!(vec![third, second, first], listed);
    }

    #[tokio::test]
    async fn test_update_photo_touches_only_patched_fields() {
        let pool = get_pool().await;
        let db = Database::with_migration(pool.clone()).await.unwrap();

        let created = db.insert_photo(&draft("Sunset")).await.unwrap();

        let patch = PhotoPatch {
            title: Some("New".to_string()),
            ..PhotoPatch::default()
        };
        assert!(db.update_photo(created.id, &patch).await.unwrap());

        let updated = db.get_photo(created.id).await.unwrap().unwrap();
        assert_eq!("New", updated.title);
        assert_eq!(created.image, updated.image);
        assert_eq!(created.tags, updated.tags);
        assert_eq!(created.created_at, updated.created_at);
    }

    #[tokio::test]
    async fn test_update_photo_empty_patch_reports_existence() {
        let pool = get_pool().await;
        let db = Database::with_migration(pool.clone()).await.unwrap();

        let created = db.insert_photo(&draft("Sunset")).await.unwrap();

        assert!(db.update_photo(created.id, &PhotoPatch::default()).await.unwrap());
        assert!(!db.update_photo(created.id + 1, &PhotoPatch::default()).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_tags_overwrites_tags_only() {
        let pool = get_pool().await;
        let db = Database::with_migration(pool.clone()).await.unwrap();

        let created = db.insert_photo(&draft("Sunset")).await.unwrap();

        let new_tags = vec!["mountain".to_string()];
        assert!(db.update_tags(created.id, &new_tags).await.unwrap());

        let updated = db.get_photo(created.id).await.unwrap().unwrap();
        assert_eq!(new_tags, updated.tags);
        assert_eq!(created.title, updated.title);
        assert_eq!(created.image, updated.image);
        assert_eq!(created.created_at, updated.created_at);

        assert!(!db.update_tags(created.id + 1, &new_tags).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_photo() {
        let pool = get_pool().await;
        let db = Database::with_migration(pool.clone()).await.unwrap();

        let created = db.insert_photo(&draft("Sunset")).await.unwrap();

        assert!(db.delete_photo(created.id).await.unwrap());
        assert!(db.get_photo(created.id).await.unwrap().is_none());
        assert!(!db.delete_photo(created.id).await.unwrap());
    }
}
