pub mod auth;
pub mod cart;
pub mod chat;
pub mod course;
pub mod health;
pub mod instructor;
pub mod order;
pub mod payment;
pub mod student;

use actix_multipart::form::MultipartFormConfig;
use actix_web::web;

use crate::errors::AppError;
use crate::utils::data_uri::MAX_IMAGE_BYTES;

const JSON_LIMIT: usize = 256 * 1024;
// Image + champs texte du formulaire
const MULTIPART_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// Corps JSON, erreurs au format `{code, message}`
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| AppError::Validation(format!("Invalid JSON body: {}", err)).into())
}

/// Formulaires multipart (images gardées en mémoire, pas de fichier temporaire)
pub fn multipart_config() -> MultipartFormConfig {
    MultipartFormConfig::default()
        .total_limit(MULTIPART_LIMIT)
        .memory_limit(MULTIPART_LIMIT)
        .error_handler(|err, _req| AppError::Validation(format!("Invalid form data: {}", err)).into())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(multipart_config())
        .service(health::health_check)
        .service(
            web::scope("/api/v1")
                .configure(auth::auth_routes)
                .configure(student::student_routes)
                .configure(instructor::instructor_routes)
                .configure(course::course_routes)
                .configure(cart::cart_routes)
                .configure(payment::payment_routes)
                .configure(order::order_routes)
                .configure(chat::chat_routes),
        );
}
