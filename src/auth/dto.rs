use serde::Deserialize;

/// Registration form. Missing fields arrive as empty strings and are
/// rejected by validation rather than by the extractor.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewAccount {
    pub name: String,
    pub surname: String,
    pub barcode: String,
    pub email: String,
    pub password: String,
}

/// Registration input after validation; safe to insert.
#[derive(Debug)]
pub struct ValidAccount {
    pub name: String,
    pub surname: String,
    pub barcode: i32,
    pub email: String,
    pub password: String,
}

/// Login form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub name: String,
    pub password: String,
}
