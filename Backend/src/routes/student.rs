use actix_multipart::form::MultipartForm;
use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::errors::AppResult;
use crate::middleware::AuthUser;
use crate::models::dto::{
    ApiResponse, ChangePasswordRequest, RegisterRequest, UpdateStudentRequest,
};
use crate::models::forms::StudentProfileForm;
use crate::models::users::Role;
use crate::services::auth_service::AuthService;
use crate::services::student_service::StudentService;
use crate::state::AppState;

const MANAGERS: &[Role] = &[Role::Admin, Role::User];
const PROFILE_OWNERS: &[Role] = &[Role::Admin, Role::User, Role::Student];

/// POST /student/add-student
#[post("/add-student")]
pub async fn add_student(
    auth_user: AuthUser,
    body: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(MANAGERS)?;
    body.validate()?;

    let user = AuthService::register(&state.db, &body).await?;
    Ok(HttpResponse::Created().json(ApiResponse::new(
        201,
        "Student created successfully",
        json!({ "id": user.id, "email": user.email, "roles": user.role_list() }),
    )))
}

/// GET /student/get-all-students - Comptes USER actifs
#[get("/get-all-students")]
pub async fn get_all_students(auth_user: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    auth_user.require_any(MANAGERS)?;

    let students = AuthService::list_active_with_role(&state.db, Role::User).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Students fetched successfully", students)))
}

/// PUT /student/update-student/{id}
#[put("/update-student/{id}")]
pub async fn update_student(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<UpdateStudentRequest>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(MANAGERS)?;
    body.validate()?;

    let student = StudentService::update_student(&state.db, path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Student updated successfully", student)))
}

/// DELETE /student/delete-student/{id} - Suppression logique
#[delete("/delete-student/{id}")]
pub async fn delete_student(
    auth_user: AuthUser,
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(MANAGERS)?;

    let student = StudentService::delete_student(&state.db, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Student deleted successfully", student)))
}

/// GET /student/profile
#[get("/profile")]
pub async fn get_profile(auth_user: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    auth_user.require_any(PROFILE_OWNERS)?;

    let student = AuthService::active_user(&state.db, auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Profile fetched successfully", student)))
}

/// PUT /student/profile - multipart, fichier optionnel `profilePic`
#[put("/profile")]
pub async fn update_profile(
    auth_user: AuthUser,
    MultipartForm(form): MultipartForm<StudentProfileForm>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(PROFILE_OWNERS)?;

    let request = form.into_request()?;
    let student =
        StudentService::update_profile(&state.db, state.uploader.as_ref(), auth_user.user_id, &request).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Profile updated successfully", student)))
}

/// PUT /student/change-password
#[put("/change-password")]
pub async fn change_password(
    auth_user: AuthUser,
    body: web::Json<ChangePasswordRequest>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(PROFILE_OWNERS)?;

    StudentService::change_password(&state.db, auth_user.user_id, &body).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Password changed successfully", ())))
}

pub fn student_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/student")
            .service(add_student)
            .service(get_all_students)
            .service(update_student)
            .service(delete_student)
            .service(get_profile)
            .service(update_profile)
            .service(change_password)
    );
}
