use super::{Db, Dialect};

/// Postgres dialect implementation of the `Dialect` trait.
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn placeholder(idx: usize) -> String {
        format!("${idx}")
    }

    async fn migration(pool: &sqlx::Pool<Db>) -> Result<(), sqlx::Error> {
        let stmts = vec![
            r#"CREATE TABLE IF NOT EXISTS photos (
                id BIGSERIAL PRIMARY KEY,
                title VARCHAR(200) NOT NULL,
                image VARCHAR(500) NOT NULL,
                tags VARCHAR(500) NOT NULL,
                created_at TEXT NOT NULL
            );"#,
            r#"CREATE INDEX IF NOT EXISTS idx_photos_created_at
                ON photos (created_at);"#,
        ];

        for stmt in stmts {
            sqlx::query(stmt).execute(pool).await?;
        }

        Ok(())
    }
}
