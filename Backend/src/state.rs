use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::services::chat_service::{ChatCompleter, OpenRouterClient};
use crate::services::mailer::{HttpMailer, LogMailer, Mailer};
use crate::services::uploader::{CloudinaryUploader, DisabledUploader, ImageUploader};

/// État partagé par tous les handlers (via web::Data)
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn Mailer>,
    pub uploader: Arc<dyn ImageUploader>,
    pub chat: Arc<dyn ChatCompleter>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Construit les clients externes réels à partir de la configuration
    pub fn from_config(db: DatabaseConnection, config: AppConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let mailer: Arc<dyn Mailer> = match config.mail.api_key.clone() {
            Some(api_key) => Arc::new(HttpMailer::new(client.clone(), &config.mail, api_key)),
            None => {
                tracing::warn!("MAIL_API_KEY not set, OTP emails will only be logged");
                Arc::new(LogMailer { sender: config.mail.sender.clone() })
            }
        };

        let uploader: Arc<dyn ImageUploader> = match config.cloudinary.clone() {
            Some(cloudinary) => Arc::new(CloudinaryUploader::new(client.clone(), cloudinary)),
            None => {
                tracing::warn!("Cloudinary not configured, image uploads are disabled");
                Arc::new(DisabledUploader)
            }
        };

        let chat: Arc<dyn ChatCompleter> = Arc::new(OpenRouterClient::new(client, &config.chat));

        Ok(Self::new(db, config, mailer, uploader, chat))
    }

    pub fn new(
        db: DatabaseConnection,
        config: AppConfig,
        mailer: Arc<dyn Mailer>,
        uploader: Arc<dyn ImageUploader>,
        chat: Arc<dyn ChatCompleter>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
            uploader,
            chat,
            started_at: Utc::now(),
        }
    }
}
