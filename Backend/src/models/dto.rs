// DTO des requêtes et réponses de l'API
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{course, course_resource, course_video, instructor};
use crate::utils::data_uri::ImageDataUri;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(rename = "userID")]
    pub user_id: i32,
    pub email: String,
    pub roles: Vec<String>,
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckOtpRequest {
    pub email: String,
    #[serde(alias = "code")]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub email: String,
    #[serde(alias = "code")]
    pub otp: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub mobile: Option<String>,
    pub address: Option<String>,
    pub profile_pic_link: Option<String>,
}

// ---------------------------------------------------------------------------
// Students
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateStudentRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

/// Construit depuis le formulaire multipart (champ fichier `profilePic`)
#[derive(Debug, Default)]
pub struct StudentProfileRequest {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub profile_pic: Option<ImageDataUri>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

// ---------------------------------------------------------------------------
// Instructors
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Validate)]
pub struct InstructorRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub role: Option<String>,
    #[validate(range(min = 0))]
    pub experience: Option<i32>,
    #[validate(range(min = 0))]
    pub students: Option<i32>,
    #[validate(range(min = 0))]
    pub courses: Option<i32>,
    pub bio: Option<String>,
    pub image: Option<ImageDataUri>,
}

#[derive(Debug, Serialize)]
pub struct InstructorSummary {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
    pub role: Option<String>,
    pub experience: Option<i32>,
}

impl From<&instructor::Model> for InstructorSummary {
    fn from(model: &instructor::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            image: model.image.clone(),
            role: model.role.clone(),
            experience: model.experience,
        }
    }
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct VideoInput {
    pub video_title: Option<String>,
    pub video_url: Option<String>,
    pub video_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceInput {
    pub resource_title: Option<String>,
    pub resource_url: Option<String>,
    pub resource_order: Option<i32>,
}

#[derive(Debug, Default)]
pub struct CourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub level: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub instructor: Option<i32>,
    pub lessons: Option<i32>,
    pub duration: Option<i32>,
    pub image: Option<ImageDataUri>,
    /// Si présent, remplace entièrement la liste existante
    pub videos: Option<Vec<VideoInput>>,
    pub resources: Option<Vec<ResourceInput>>,
}

/// Cours + relations, tel que renvoyé par les listes du catalogue
#[derive(Debug, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: course::Model,
    pub instructor: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<course_video::Model>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<course_resource::Model>>,
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    #[serde(alias = "courseId", alias = "courseID")]
    pub course_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCartItemRequest {
    #[serde(alias = "cartItemId", alias = "courseId")]
    pub course_id: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CartCourse {
    pub id: i32,
    pub title: String,
    pub image: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub id: i32,
    pub user_id: i32,
    pub course_id: i32,
    /// `null` si le cours a disparu du catalogue
    pub course: Option<CartCourse>,
}

// ---------------------------------------------------------------------------
// Payments / orders
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(alias = "userId", alias = "user_id", rename = "userID")]
    pub user_id: Option<i32>,
    #[serde(alias = "transactionId", alias = "transaction_id", rename = "transactionID")]
    pub transaction_id: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    #[serde(alias = "payment_method", rename = "paymentMethod")]
    pub payment_method: Option<String>,
}

/// Corps de POST /order/create-order (plusieurs casses acceptées)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(rename = "userID", alias = "userId", alias = "user_id")]
    pub user_id: Option<i32>,
    #[serde(rename = "paymentID", alias = "paymentId", alias = "payment_id")]
    pub payment_id: Option<i32>,
    #[serde(rename = "courseIDs", alias = "courseIds", alias = "itemIds", alias = "item_ids")]
    pub course_ids: Option<Vec<i32>>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        alias = "totalAmount",
        alias = "total_amount"
    )]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub code: u16,
    pub message: String,
    #[serde(rename = "orderID")]
    pub order_id: i32,
    #[serde(rename = "paymentID")]
    pub payment_id: i32,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub content: String,
}

// ---------------------------------------------------------------------------
// Enveloppe de réponse commune
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: u16,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }
}
