use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::auth::{
    dto::{NewAccount, ValidAccount},
    repo_types::Account,
};
use crate::db::Database;

const MAX_FIELD_CHARS: usize = 50;
const MAX_PASSWORD_CHARS: usize = 128;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("name is already taken")]
    NameTaken,
    #[error("barcode is already taken")]
    BarcodeTaken,
    #[error("email is already taken")]
    EmailTaken,
    #[error(transparent)]
    Persistence(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Blank input is rejected, but accepted values are stored verbatim so that
/// login compares against exactly what was typed at registration.
fn required(field: &str, value: String) -> Result<String, AccountError> {
    if value.trim().is_empty() {
        return Err(AccountError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_FIELD_CHARS {
        return Err(AccountError::Validation(format!(
            "{field} must be at most {MAX_FIELD_CHARS} characters"
        )));
    }
    Ok(value)
}

/// Checks a registration form without touching the database.
pub fn validate_new_account(input: NewAccount) -> Result<ValidAccount, AccountError> {
    let barcode = input
        .barcode
        .parse::<i32>()
        .map_err(|_| AccountError::Validation("barcode must be a number".into()))?;

    let name = required("name", input.name)?;
    let surname = required("surname", input.surname)?;
    let email = required("email", input.email)?;
    if !is_valid_email(&email) {
        return Err(AccountError::Validation("email is not a valid address".into()));
    }

    if input.password.is_empty() {
        return Err(AccountError::Validation("password is required".into()));
    }
    if input.password.chars().count() > MAX_PASSWORD_CHARS {
        return Err(AccountError::Validation(format!(
            "password must be at most {MAX_PASSWORD_CHARS} characters"
        )));
    }

    Ok(ValidAccount {
        name,
        surname,
        barcode,
        email,
        password: input.password,
    })
}

/// Maps a unique-index name from the `users` table to the conflict it means.
fn conflict_for(constraint: Option<&str>) -> Option<AccountError> {
    match constraint? {
        "users_name_key" => Some(AccountError::NameTaken),
        "users_barcode_key" => Some(AccountError::BarcodeTaken),
        "users_email_key" => Some(AccountError::EmailTaken),
        _ => None,
    }
}

fn classify_insert_error(err: sqlx::Error) -> AccountError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if let Some(conflict) = conflict_for(db_err.constraint()) {
                return conflict;
            }
        }
    }
    AccountError::Persistence(err)
}

/// True iff an account with exactly this name exists.
pub async fn account_exists(db: &Database, name: &str) -> Result<bool, AccountError> {
    let count = Account::count_by_name(db, name).await?;
    Ok(count > 0)
}

/// Validates, hashes and stores a new account, returning its id.
///
/// Name, barcode and email uniqueness are all enforced by the `users`
/// indexes, so concurrent registrations cannot both win.
pub async fn create_account(db: &Database, input: NewAccount) -> Result<i32, AccountError> {
    let account = validate_new_account(input)?;
    let hash = hash_password(&account.password).map_err(|e| AccountError::Hash(e.to_string()))?;

    let id = Account::insert(db, &account, &hash)
        .await
        .map_err(classify_insert_error)?;
    debug!(account_id = id, "account row inserted");
    Ok(id)
}

/// Looks the account up by name and checks the password against its hash.
pub async fn authenticate(
    db: &Database,
    name: &str,
    password: &str,
) -> Result<Option<Account>, AccountError> {
    let Some(account) = Account::find_by_name(db, name).await? else {
        warn!(name = %name, "login unknown name");
        return Ok(None);
    };

    let ok = verify_password(password, &account.password)
        .map_err(|e| AccountError::Hash(e.to_string()))?;
    if !ok {
        warn!(account_id = account.id, "login invalid password");
        return Ok(None);
    }
    Ok(Some(account))
}

/// True iff `name` and `password` identify a stored account. Case-sensitive.
pub async fn validate_credentials(
    db: &Database,
    name: &str,
    password: &str,
) -> Result<bool, AccountError> {
    Ok(authenticate(db, name, password).await?.is_some())
}
