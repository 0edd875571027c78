use sqlx::FromRow;

/// Row of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i32,
    pub name: String,
    pub surname: String,
    pub barcode: i32,
    pub email: String,
    /// Argon2 PHC string, never the plain password.
    pub password: String,
}
