use actix_web::{post, web, HttpResponse};

use crate::errors::AppResult;
use crate::middleware::AuthUser;
use crate::models::dto::{ApiResponse, ChatRequest, ChatResponse};
use crate::models::users::Role;
use crate::services::chat_service::ChatService;
use crate::state::AppState;

async fn answer(
    auth_user: &AuthUser,
    state: &AppState,
    body: Option<web::Json<ChatRequest>>,
    path_prompt: Option<&str>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(&[Role::User])?;

    let body_prompt = body.and_then(|b| b.into_inner().prompt);
    let content =
        ChatService::ask(state.chat.as_ref(), &state.config.chat, body_prompt.as_deref(), path_prompt).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Chat response", ChatResponse { content })))
}

/// POST /chat/post-chat - `{prompt}` dans le corps
#[post("/post-chat")]
pub async fn post_chat(
    auth_user: AuthUser,
    body: Option<web::Json<ChatRequest>>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    answer(&auth_user, &state, body, None).await
}

/// POST /chat/post-chat/{prompt}
#[post("/post-chat/{prompt}")]
pub async fn post_chat_with_path(
    auth_user: AuthUser,
    path: web::Path<String>,
    body: Option<web::Json<ChatRequest>>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    answer(&auth_user, &state, body, Some(path.as_str())).await
}

pub fn chat_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/chat")
            .service(post_chat)
            .service(post_chat_with_path)
    );
}
