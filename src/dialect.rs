//! # SQL Dialect Module
//!
//! This module defines the `Dialect` trait, which abstracts over the
//! differences in SQL syntax across the supported database systems. The
//! trait provides methods for generating the statements used against the
//! photos table so that `Database` can remain dialect agnostic.
//!
//! The dialect in effect is determined at compile time by feature flags:
//! with the `sqlite` feature (the default) `CurrentDialect` aliases
//! `sqlite::SqliteDialect`, with only the `postgres` feature it aliases
//! `postgres::PostgresDialect`.

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

/// The current SQL dialect used at compile time, determined by feature flags.
#[cfg(feature = "sqlite")]
pub type CurrentDialect = sqlite::SqliteDialect;

#[cfg(feature = "sqlite")]
pub type Db = sqlx::Sqlite;

#[cfg(feature = "sqlite")]
pub type CurrentRow = sqlx::sqlite::SqliteRow;

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
pub type CurrentDialect = postgres::PostgresDialect;

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
pub type Db = sqlx::Postgres;

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
pub type CurrentRow = sqlx::postgres::PgRow;

/// A trait for SQL dialects to support database-specific query generation.
///
/// This trait provides methods that return SQL strings compatible with the
/// target database. The goal is to abstract away differences in placeholder
/// syntax and schema DDL so that higher-level logic can remain
/// dialect-agnostic.
pub trait Dialect {
    /// Returns the SQL placeholder syntax for the given parameter index.
    ///
    /// - SQLite: `?`
    /// - PostgreSQL: `$1`, `$2`, ...
    ///
    /// # Parameters
    /// - `idx`: The 1-based parameter index (used in dialects that number placeholders).
    fn placeholder(idx: usize) -> String;

    /// Returns the statement that inserts a photo and yields its new id.
    fn insert_photo_statement() -> String {
        format!(
            "INSERT INTO photos (title, image, tags, created_at) VALUES ({}, {}, {}, {}) RETURNING id",
            Self::placeholder(1),
            Self::placeholder(2),
            Self::placeholder(3),
            Self::placeholder(4),
        )
    }

    /// Returns the statement that fetches one photo by id.
    fn select_photo_statement() -> String {
        format!(
            "SELECT id, title, image, tags, created_at FROM photos WHERE id = {}",
            Self::placeholder(1)
        )
    }

    /// Returns the statement that lists all photos, newest first.
    ///
    /// `created_at` is stored as fixed-width RFC 3339 text, so text ordering
    /// is chronological ordering. `id` breaks ties deterministically.
    fn list_photos_statement() -> String {
        "SELECT id, title, image, tags, created_at FROM photos ORDER BY created_at DESC, id DESC"
            .to_string()
    }

    /// Returns an UPDATE statement assigning exactly `columns`, in order,
    /// with the id as the final parameter.
    ///
    /// # Parameters
    /// - `columns`: The column names to assign; placeholders are numbered
    ///   in the same order.
    fn update_photo_statement(columns: &[&str]) -> String {
        let assignments = columns
            .iter()
            .enumerate()
            .map(|(idx, column)| format!("{} = {}", column, Self::placeholder(idx + 1)))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "UPDATE photos SET {} WHERE id = {}",
            assignments,
            Self::placeholder(columns.len() + 1)
        )
    }

    /// Returns the statement the retag workflow uses to overwrite tags only.
    fn update_tags_statement() -> String {
        Self::update_photo_statement(&["tags"])
    }

    /// Returns the statement that deletes one photo by id.
    fn delete_photo_statement() -> String {
        format!("DELETE FROM photos WHERE id = {}", Self::placeholder(1))
    }

    /// Applies the schema migration. Must be idempotent.
    async fn migration(pool: &sqlx::Pool<Db>) -> Result<(), sqlx::Error>;
}
