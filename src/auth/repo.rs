use crate::auth::{dto::ValidAccount, repo_types::Account};
use crate::db::Database;

impl Account {
    /// Number of accounts registered under `name` (0 or 1 given the unique index).
    pub async fn count_by_name(db: &Database, name: &str) -> Result<i64, sqlx::Error> {
        db.query_count(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE name = $1").bind(name),
        )
        .await
    }

    /// Find an account by its exact, case-sensitive name.
    pub async fn find_by_name(db: &Database, name: &str) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, surname, barcode, email, password
            FROM users
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(db.pool())
        .await
    }

    /// Insert a validated account whose password has already been hashed.
    pub async fn insert(
        db: &Database,
        account: &ValidAccount,
        password_hash: &str,
    ) -> Result<i32, sqlx::Error> {
        db.insert_returning_id(
            sqlx::query_scalar::<_, i32>(
                r#"
                INSERT INTO users (name, surname, barcode, email, password)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(&account.name)
            .bind(&account.surname)
            .bind(account.barcode)
            .bind(&account.email)
            .bind(password_hash),
        )
        .await
    }
}
