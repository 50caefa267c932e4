// Outils partagés par les tests (BD SQLite en mémoire, faux services externes)

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use crate::config::{AppConfig, ChatConfig, JwtConfig, MailConfig};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::{course, instructor, payment, users};
use crate::services::chat_service::{ChatCompleter, ChatPrompt};
use crate::services::mailer::Mailer;
use crate::services::uploader::ImageUploader;
use crate::state::AppState;
use crate::utils::data_uri::ImageDataUri;
use crate::utils::{jwt, password};

/// Service actix complet (routes + état) pour les tests HTTP
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state.clone()))
                .configure(crate::routes::configure_routes),
        )
        .await
    };
}

pub const TEST_PASSWORD: &str = "secret123";
pub const PNG_BYTES: &[u8] = b"\x89PNG fake image";
const BOUNDARY: &str = "lms-test-boundary";

pub fn png_image() -> ImageDataUri {
    ImageDataUri::from_upload(Some("image/png"), PNG_BYTES).expect("png image")
}

/// Corps `multipart/form-data`: champs texte + fichier optionnel (champ, type MIME, contenu)
pub fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> ((&'static str, String), Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\nContent-Type: text/plain\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"upload.bin\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (("Content-Type", format!("multipart/form-data; boundary={BOUNDARY}")), body)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_url: "sqlite::memory:".to_string(),
        auto_migrate: true,
        jwt: JwtConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_ttl_minutes: 30,
            refresh_ttl_days: 7,
        },
        otp_ttl_minutes: 15,
        mail: MailConfig {
            api_url: "http://mail.test/send".to_string(),
            api_key: None,
            sender: "noreply@test.local".to_string(),
        },
        cloudinary: None,
        chat: ChatConfig {
            api_url: "http://chat.test/completions".to_string(),
            api_key: None,
            model: "test-model".to_string(),
            max_tokens: 500,
        },
        http_timeout_secs: 5,
    }
}

/// Modèle utilisateur en mémoire (sans BD)
pub fn user_model(id: i32, email: &str, roles: &str) -> users::Model {
    let now = Utc::now().naive_utc();
    users::Model {
        id,
        firstname: Some("Test".to_string()),
        lastname: Some("User".to_string()),
        email: email.to_string(),
        password_hash: String::new(),
        roles: roles.to_string(),
        mobile: None,
        profile_pic_link: None,
        address: None,
        is_active: true,
        status: users::UserStatus::Pending,
        created_at: now,
        updated_at: now,
    }
}

pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await.expect("sqlite connection");
    db::create_schema(&db).await.expect("schema creation");
    db
}

pub async fn insert_user(db: &DatabaseConnection, email: &str, roles: &str) -> users::Model {
    let now = Utc::now().naive_utc();
    users::ActiveModel {
        firstname: Set(Some("Test".to_string())),
        lastname: Set(Some("User".to_string())),
        email: Set(email.to_string()),
        password_hash: Set(password::hash_password(TEST_PASSWORD).expect("hash")),
        roles: Set(roles.to_string()),
        is_active: Set(true),
        status: Set(users::UserStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
}

pub async fn insert_instructor(db: &DatabaseConnection, name: &str) -> instructor::Model {
    instructor::ActiveModel {
        name: Set(name.to_string()),
        role: Set(Some("Developer".to_string())),
        experience: Set(Some(5)),
        students: Set(0),
        courses: Set(0),
        is_active: Set(true),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert instructor")
}

pub async fn insert_course(
    db: &DatabaseConnection,
    title: &str,
    price: i64,
    instructor_id: i32,
) -> course::Model {
    let now = Utc::now().naive_utc();
    course::ActiveModel {
        title: Set(title.to_string()),
        level: Set(course::DEFAULT_LEVEL.to_string()),
        category: Set(course::DEFAULT_CATEGORY.to_string()),
        students: Set(0),
        instructor_id: Set(instructor_id),
        price: Set(Decimal::from(price)),
        lessons: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert course")
}

pub async fn insert_payment(db: &DatabaseConnection, user_id: i32, amount: i64) -> payment::Model {
    payment::ActiveModel {
        user_id: Set(user_id),
        order_id: Set(None),
        transaction_id: Set(format!("tx-{}-{}", user_id, amount)),
        payment_status: Set(payment::PaymentStatus::Completed),
        amount: Set(Decimal::from(amount)),
        payment_method: Set(payment::PaymentMethod::CreditCard.as_str().to_string()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert payment")
}

pub async fn insert_otp(db: &DatabaseConnection, email: &str, code: &str, ttl_minutes: i64) {
    let now = Utc::now().naive_utc();
    crate::models::otp::ActiveModel {
        email: Set(email.to_string()),
        code: Set(code.to_string()),
        expires_at: Set(now + Duration::minutes(ttl_minutes)),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert otp");
}

/// Header `Authorization` pour un utilisateur de test
pub fn bearer(user: &users::Model) -> (&'static str, String) {
    let token = jwt::generate_access_token(user, &test_config().jwt).expect("access token");
    ("Authorization", format!("Bearer {}", token))
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AppResult<()> {
        self.sent.lock().expect("mailer lock").push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        Ok(())
    }
}

pub struct FakeUploader;

#[async_trait]
impl ImageUploader for FakeUploader {
    async fn upload(&self, image: &ImageDataUri, folder: &str) -> AppResult<String> {
        let extension = image.mime_type.trim_start_matches("image/");
        Ok(format!("https://cdn.test/{}/image.{}", folder, extension))
    }
}

#[derive(Default)]
pub struct FakeChat {
    pub prompts: Mutex<Vec<ChatPrompt>>,
    pub failure: Option<String>,
}

impl FakeChat {
    pub fn failing(message: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl ChatCompleter for FakeChat {
    async fn complete(&self, prompt: &ChatPrompt) -> AppResult<String> {
        self.prompts.lock().expect("chat lock").push(prompt.clone());
        match &self.failure {
            Some(message) => Err(AppError::Upstream(message.clone())),
            None => Ok(format!("echo: {}", prompt.user)),
        }
    }
}

/// État complet branché sur des faux services, avec accès au mailer
pub async fn test_state() -> (AppState, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(
        test_db().await,
        test_config(),
        mailer.clone(),
        Arc::new(FakeUploader),
        Arc::new(FakeChat::default()),
    );
    (state, mailer)
}
