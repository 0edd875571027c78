use crate::db::Database;

/// Row of the `submitted_code` table. Submissions are anonymous.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubmittedCode {
    pub id: i32,
    pub code: String,
}

impl SubmittedCode {
    /// Store the submitted text exactly as received.
    pub async fn insert(db: &Database, code: &str) -> Result<i32, sqlx::Error> {
        db.insert_returning_id(
            sqlx::query_scalar::<_, i32>(
                r#"
                INSERT INTO submitted_code (code)
                VALUES ($1)
                RETURNING id
                "#,
            )
            .bind(code),
        )
        .await
    }
}
