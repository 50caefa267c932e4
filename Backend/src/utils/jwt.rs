use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use chrono::{Utc, Duration};

use crate::config::JwtConfig;
use crate::errors::{AppError, AppResult};
use crate::models::users;

/// Claims du token d'accès (courte durée)
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: i32,        // user_id
    pub roles: Vec<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: String,
    pub iat: i64,
    pub exp: i64,        // expiration timestamp
}

/// Claims du token de renouvellement (longue durée, clé distincte)
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: i32,
    pub iat: i64,
    pub exp: i64,
}

fn expiration(lifetime: Duration) -> AppResult<(i64, i64)> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(lifetime)
        .ok_or_else(|| AppError::Internal("Failed to calculate expiration".to_string()))?;
    Ok((now.timestamp(), exp.timestamp()))
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T, jsonwebtoken::errors::Error> {
    decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
        .map(|data| data.claims)
}

/// Génère un token d'accès pour un utilisateur (rôles + champs d'affichage)
pub fn generate_access_token(user: &users::Model, config: &JwtConfig) -> AppResult<String> {
    let (iat, exp) = expiration(Duration::minutes(config.access_ttl_minutes))?;

    let claims = AccessClaims {
        sub: user.id,
        roles: user.role_list().iter().map(|r| r.as_str().to_string()).collect(),
        firstname: user.firstname.clone(),
        lastname: user.lastname.clone(),
        email: user.email.clone(),
        iat,
        exp,
    };

    sign(&claims, &config.access_secret)
}

/// Génère un token de renouvellement (contient uniquement l'id)
pub fn generate_refresh_token(user_id: i32, config: &JwtConfig) -> AppResult<String> {
    let (iat, exp) = expiration(Duration::days(config.refresh_ttl_days))?;

    sign(&RefreshClaims { sub: user_id, iat, exp }, &config.refresh_secret)
}

/// Vérifie et décode un token d'accès
pub fn verify_access_token(token: &str, config: &JwtConfig) -> AppResult<AccessClaims> {
    verify(token, &config.access_secret)
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

/// Vérifie et décode un token de renouvellement
pub fn verify_refresh_token(token: &str, config: &JwtConfig) -> AppResult<RefreshClaims> {
    verify(token, &config.refresh_secret)
        .map_err(|_| AppError::Forbidden("Invalid or expired token".to_string()))
}
