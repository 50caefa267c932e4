use actix_web::{post, web, HttpResponse};

use crate::errors::AppResult;
use crate::middleware::AuthUser;
use crate::models::dto::{CreateOrderRequest, CreateOrderResponse};
use crate::models::users::Role;
use crate::services::checkout_service::CheckoutService;
use crate::state::AppState;

/// POST /order/create-order - Finalise la commande d'un paiement existant
#[post("/create-order")]
pub async fn create_order(
    auth_user: AuthUser,
    body: web::Json<CreateOrderRequest>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(&[Role::User])?;

    let request = CheckoutService::validate(auth_user.user_id, &body)?;
    let receipt = CheckoutService::finalize_order(&state.db, &request).await?;

    Ok(HttpResponse::Ok().json(CreateOrderResponse {
        code: 200,
        message: "Order created successfully".to_string(),
        order_id: receipt.order_id,
        payment_id: receipt.payment_id,
    }))
}

pub fn order_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/order").service(create_order));
}
