use actix_web::{get, post, put, web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::errors::AppResult;
use crate::middleware::AuthUser;
use crate::models::dto::{
    ApiResponse, CheckOtpRequest, ForgotPasswordRequest, LoginRequest, RefreshRequest,
    RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
};
use crate::models::users::Role;
use crate::services::auth_service::AuthService;
use crate::state::AppState;

/// POST /auth/register - Créer un compte (PUBLIC)
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    body.validate()?;
    let user = AuthService::register(&state.db, &body).await?;

    Ok(HttpResponse::Created().json(ApiResponse::new(
        201,
        "User registered successfully",
        json!({ "email": user.email, "roles": user.role_list() }),
    )))
}

/// POST /auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let response = AuthService::login(&state.db, &state.config.jwt, &body.email, &body.password).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Login successful", response)))
}

/// POST /auth/refresh - Nouveau token d'accès (PUBLIC)
#[post("/refresh")]
pub async fn refresh(
    body: web::Json<RefreshRequest>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let access_token = AuthService::refresh(&state.db, &state.config.jwt, body.token.as_deref()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        200,
        "Token refreshed",
        json!({ "accessToken": access_token }),
    )))
}

/// POST /auth/forgot-password - Envoyer un OTP par email (PUBLIC)
#[post("/forgot-password")]
pub async fn forgot_password(
    body: web::Json<ForgotPasswordRequest>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    body.validate()?;
    AuthService::forgot_password(&state.db, state.mailer.as_ref(), state.config.otp_ttl_minutes, &body.email)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "OTP sent to your email", ())))
}

/// POST /auth/check-otp - Vérifier un OTP (PUBLIC)
#[post("/check-otp")]
pub async fn check_otp(
    body: web::Json<CheckOtpRequest>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    AuthService::check_otp(&state.db, &body.email, &body.otp).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "OTP verified", ())))
}

/// PUT /auth/reset-password - Nouveau mot de passe avec OTP (PUBLIC)
#[put("/reset-password")]
pub async fn reset_password(
    body: web::Json<ResetPasswordRequest>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    body.validate()?;
    AuthService::reset_password(&state.db, &body).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Password reset successfully", ())))
}

/// GET /auth/me - Profil de l'utilisateur connecté (PROTÉGÉE)
#[get("/me")]
pub async fn me(auth_user: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let user = AuthService::active_user(&state.db, auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "User profile", user)))
}

/// PUT /auth/update-profile - Modifier son profil (PROTÉGÉE)
#[put("/update-profile")]
pub async fn update_profile(
    auth_user: AuthUser,
    body: web::Json<UpdateProfileRequest>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let user = AuthService::update_profile(&state.db, auth_user.user_id, &body).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Profile updated successfully", user)))
}

/// GET /auth/get-all-students - Étudiants actifs (PROTÉGÉE)
#[get("/get-all-students")]
pub async fn get_all_students(_auth_user: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let students = AuthService::list_active_with_role(&state.db, Role::Student).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Students fetched successfully", students)))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(login)
            .service(refresh)
            .service(forgot_password)
            .service(check_otp)
            .service(reset_password)
            .service(me)
            .service(update_profile)
            .service(get_all_students)
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::test_support;


    #[actix_web::test]
    async fn test_register_then_login() {
        let (state, _) = test_support::test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({ "email": "Ada@Example.com", "password": "secret123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["email"], "ada@example.com");
        assert_eq!(body["data"]["roles"], json!(["USER"]));

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": "ada@example.com", "password": "secret123" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"]["accessToken"].is_string());
        assert!(body["data"]["refreshToken"].is_string());
        assert!(body["data"]["userID"].is_number());
    }

    #[actix_web::test]
    async fn test_register_rejects_invalid_email() {
        let (state, _) = test_support::test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({ "email": "not-an-email", "password": "secret123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 400);
        assert_eq!(body["message"], "Invalid fields: email");
    }

    #[actix_web::test]
    async fn test_me_requires_bearer_token() {
        let (state, _) = test_support::test_state().await;
        let user = test_support::insert_user(&state.db, "ada@example.com", "USER").await;
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/api/v1/auth/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/v1/auth/me")
            .insert_header(test_support::bearer(&user))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["email"], "ada@example.com");
        assert!(body["data"].get("passwordHash").is_none());
    }

    #[actix_web::test]
    async fn test_refresh_without_token_is_bad_request() {
        let (state, _) = test_support::test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/refresh")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_forgot_password_sends_email() {
        let (state, mailer) = test_support::test_state().await;
        test_support::insert_user(&state.db, "ada@example.com", "USER").await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/forgot-password")
            .set_json(json!({ "email": "ada@example.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, crate::services::mailer::OTP_SUBJECT);
    }

    #[actix_web::test]
    async fn test_malformed_json_uses_error_envelope() {
        let (state, _) = test_support::test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 400);
    }
}
