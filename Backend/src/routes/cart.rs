use actix_web::{delete, get, post, web, HttpResponse};

use crate::errors::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::dto::{AddCartItemRequest, ApiResponse, DeleteCartItemRequest};
use crate::models::users::Role;
use crate::services::cart_service::CartService;
use crate::state::AppState;

/// GET /cart/get-all-cart-items/{userId} - Uniquement son propre panier
#[get("/get-all-cart-items/{user_id}")]
pub async fn get_all_cart_items(
    auth_user: AuthUser,
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(&[Role::User])?;
    if path.into_inner() != auth_user.user_id {
        return Err(AppError::Forbidden("Cannot read the cart of another user".to_string()));
    }

    let items = CartService::list(&state.db, auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Cart items fetched successfully", items)))
}

#[post("/add-cart-item")]
pub async fn add_cart_item(
    auth_user: AuthUser,
    body: web::Json<AddCartItemRequest>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(&[Role::User])?;
    let course_id = body
        .course_id
        .ok_or_else(|| AppError::Validation("course_id is required".to_string()))?;

    let item = CartService::add(&state.db, auth_user.user_id, course_id).await?;
    Ok(HttpResponse::Created().json(ApiResponse::new(201, "Course added to cart", item)))
}

/// DELETE /cart/delete-cart-item - `data: null` si rien à supprimer
#[delete("/delete-cart-item")]
pub async fn delete_cart_item(
    auth_user: AuthUser,
    body: web::Json<DeleteCartItemRequest>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(&[Role::User])?;
    let course_id = body
        .course_id
        .ok_or_else(|| AppError::Validation("cartItemId is required".to_string()))?;

    let removed = CartService::remove(&state.db, auth_user.user_id, course_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Cart item deleted successfully", removed)))
}

pub fn cart_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cart")
            .service(get_all_cart_items)
            .service(add_cart_item)
            .service(delete_cart_item)
    );
}
