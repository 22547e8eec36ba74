use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Login identity: roll, staff code or admin username
    pub uid: i32,    // Row ID in the role's table
    pub name: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub exp: usize, // Expiration timestamp
}

/// Identity to put into a freshly signed token.
pub struct TokenSubject<'a> {
    pub uid: i32,
    pub login: &'a str,
    pub name: &'a str,
    pub role: &'a str,
    pub permissions: Vec<String>,
}

/// Sign a new JWT token valid for `ttl_hours`.
pub fn sign(subject: TokenSubject<'_>, secret: &str, ttl_hours: i64) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .context("token expiry out of range")?
        .timestamp();

    let claims = Claims {
        sub: subject.login.to_owned(),
        uid: subject.uid,
        name: subject.name.to_owned(),
        role: subject.role.to_owned(),
        permissions: subject.permissions,
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a JWT token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
