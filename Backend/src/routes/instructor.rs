use actix_multipart::form::MultipartForm;
use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::errors::AppResult;
use crate::middleware::AuthUser;
use crate::models::dto::ApiResponse;
use crate::models::forms::InstructorForm;
use crate::services::instructor_service::InstructorService;
use crate::state::AppState;

#[post("/add-instructor")]
pub async fn add_instructor(
    _auth_user: AuthUser,
    MultipartForm(form): MultipartForm<InstructorForm>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let request = form.into_request()?;
    let instructor = InstructorService::add_instructor(&state.db, state.uploader.as_ref(), &request).await?;
    Ok(HttpResponse::Created().json(ApiResponse::new(201, "Instructor created successfully", instructor)))
}

#[get("/get-all-instructors")]
pub async fn get_all_instructors(_auth_user: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let instructors = InstructorService::list_active(&state.db).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Instructors fetched successfully", instructors)))
}

#[put("/update-instructor/{id}")]
pub async fn update_instructor(
    _auth_user: AuthUser,
    path: web::Path<i32>,
    MultipartForm(form): MultipartForm<InstructorForm>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let request = form.into_request()?;
    let instructor =
        InstructorService::update_instructor(&state.db, state.uploader.as_ref(), path.into_inner(), &request)
            .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Instructor updated successfully", instructor)))
}

#[delete("/delete-instructor/{id}")]
pub async fn delete_instructor(
    _auth_user: AuthUser,
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let instructor = InstructorService::delete_instructor(&state.db, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Instructor deleted successfully", instructor)))
}

pub fn instructor_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/instructor")
            .service(add_instructor)
            .service(get_all_instructors)
            .service(update_instructor)
            .service(delete_instructor)
    );
}
