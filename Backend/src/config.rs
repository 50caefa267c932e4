// ============================================================================
// CONFIGURATION
// ============================================================================
//
// Description:
//   Configuration de l'application chargée une seule fois au démarrage
//   (.env + variables d'environnement), puis partagée via AppState.
//
// Variables obligatoires:
//   - DATABASE_URL
//   - JWT_SECRET / JWT_REFRESH_SECRET (deux clés distinctes)
//
// Points d'attention:
//   - Les intégrations externes (mail, Cloudinary, OpenRouter) sont optionnelles
//   - Sans MAIL_API_KEY, les emails sont seulement loggés
//
// ============================================================================

use std::env;

use crate::errors::{AppError, AppResult};

const DEFAULT_MAIL_API_URL: &str = "https://api.brevo.com/v3/smtp/email";
const DEFAULT_OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_CHAT_MODEL: &str = "tngtech/tng-r1t-chimera:free";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub sender: String,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub auto_migrate: bool,
    pub jwt: JwtConfig,
    pub otp_ttl_minutes: i64,
    pub mail: MailConfig,
    pub cloudinary: Option<CloudinaryConfig>,
    pub chat: ChatConfig,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let cloudinary = match (
            optional("CLOUDINARY_CLOUD_NAME"),
            optional("CLOUDINARY_API_KEY"),
            optional("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        let config = Self {
            server_host: optional("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parsed("SERVER_PORT", 8080)?,
            database_url: required("DATABASE_URL")?,
            auto_migrate: parsed("DB_AUTO_MIGRATE", false)?,
            jwt: JwtConfig {
                access_secret: required("JWT_SECRET")?,
                refresh_secret: required("JWT_REFRESH_SECRET")?,
                access_ttl_minutes: parsed("ACCESS_TOKEN_TTL_MINUTES", 30)?,
                refresh_ttl_days: parsed("REFRESH_TOKEN_TTL_DAYS", 7)?,
            },
            otp_ttl_minutes: parsed("OTP_TTL_MINUTES", 15)?,
            mail: MailConfig {
                api_url: optional("MAIL_API_URL").unwrap_or_else(|| DEFAULT_MAIL_API_URL.to_string()),
                api_key: optional("MAIL_API_KEY"),
                sender: optional("MAIL_SENDER").unwrap_or_else(|| "noreply@example.com".to_string()),
            },
            cloudinary,
            chat: ChatConfig {
                api_url: optional("OPENROUTER_API_URL")
                    .unwrap_or_else(|| DEFAULT_OPENROUTER_API_URL.to_string()),
                api_key: optional("OPENROUTER_API_KEY"),
                model: optional("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
                max_tokens: parsed("CHAT_MAX_TOKENS", 500)?,
            },
            http_timeout_secs: parsed("HTTP_CLIENT_TIMEOUT_SECS", 15)?,
        };

        config.validate()?;
        tracing::info!("Application configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.jwt.access_secret == self.jwt.refresh_secret {
            return Err(AppError::Config(
                "JWT_SECRET and JWT_REFRESH_SECRET must differ".to_string(),
            ));
        }
        if self.jwt.access_ttl_minutes <= 0 || self.jwt.refresh_ttl_days <= 0 || self.otp_ttl_minutes <= 0 {
            return Err(AppError::Config("Token and OTP lifetimes must be positive".to_string()));
        }
        Ok(())
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &str) -> AppResult<String> {
    optional(name).ok_or_else(|| AppError::Config(format!("{} must be set in .env file", name)))
}

fn parsed<T>(name: &str, default: T) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
        None => Ok(default),
    }
}
