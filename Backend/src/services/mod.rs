pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod chat_service;
pub mod checkout_service;
pub mod instructor_service;
pub mod mailer;
pub mod payment_service;
pub mod student_service;
pub mod uploader;
