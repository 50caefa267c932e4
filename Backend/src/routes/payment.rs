use actix_web::{get, post, web, HttpResponse};

use crate::errors::AppResult;
use crate::middleware::AuthUser;
use crate::models::dto::{ApiResponse, CreatePaymentRequest};
use crate::models::users::Role;
use crate::services::payment_service::PaymentService;
use crate::state::AppState;

#[get("/get-all-payment")]
pub async fn get_all_payment(auth_user: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    auth_user.require_any(&[Role::Admin, Role::User])?;

    let payments = PaymentService::list(&state.db, &auth_user).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Payments fetched successfully", payments)))
}

#[post("/create-payment")]
pub async fn create_payment(
    auth_user: AuthUser,
    body: web::Json<CreatePaymentRequest>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(&[Role::User])?;

    let payment = PaymentService::create(&state.db, auth_user.user_id, &body).await?;
    Ok(HttpResponse::Created().json(ApiResponse::new(201, "Payment created successfully", payment)))
}

pub fn payment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payment")
            .service(get_all_payment)
            .service(create_payment)
    );
}
