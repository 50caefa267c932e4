use actix_multipart::form::MultipartForm;
use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::errors::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::dto::ApiResponse;
use crate::models::forms::CourseForm;
use crate::models::users::Role;
use crate::services::catalog_service::CatalogService;
use crate::state::AppState;

const MANAGERS: &[Role] = &[Role::Admin, Role::User];

/// POST /course/add-course - multipart, fichier optionnel `image`
#[post("/add-course")]
pub async fn add_course(
    auth_user: AuthUser,
    MultipartForm(form): MultipartForm<CourseForm>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(MANAGERS)?;

    let request = form.into_request()?;
    let course = CatalogService::add_course(&state.db, state.uploader.as_ref(), &request).await?;
    Ok(HttpResponse::Created().json(ApiResponse::new(201, "Course created successfully", course)))
}

#[get("/get-all-courses")]
pub async fn get_all_courses(auth_user: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    auth_user.require_any(MANAGERS)?;

    let courses = CatalogService::list_courses(&state.db).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Courses fetched successfully", courses)))
}

#[put("/update-course/{id}")]
pub async fn update_course(
    auth_user: AuthUser,
    path: web::Path<i32>,
    MultipartForm(form): MultipartForm<CourseForm>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(&[Role::Admin])?;

    let request = form.into_request()?;
    let course =
        CatalogService::update_course(&state.db, state.uploader.as_ref(), path.into_inner(), &request).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Course updated successfully", course)))
}

/// DELETE /course/delete-course/{id} - `data: null` si le cours n'existe pas
#[delete("/delete-course/{id}")]
pub async fn delete_course(
    auth_user: AuthUser,
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(&[Role::Admin])?;

    let course = CatalogService::delete_course(&state.db, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Course deleted successfully", course)))
}

#[get("/get-all-courses-admin")]
pub async fn get_all_courses_admin(auth_user: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    auth_user.require_any(MANAGERS)?;

    let courses = CatalogService::list_courses_admin(&state.db).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Courses fetched successfully", courses)))
}

/// GET /course/get-courses-user/{userId} - Un USER ne voit que ses propres cours
#[get("/get-courses-user/{user_id}")]
pub async fn get_courses_user(
    auth_user: AuthUser,
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    auth_user.require_any(&[Role::User, Role::Admin])?;

    let user_id = path.into_inner();
    if !auth_user.has_role(Role::Admin) && user_id != auth_user.user_id {
        return Err(AppError::Forbidden("Cannot read courses of another user".to_string()));
    }

    let courses = CatalogService::list_user_courses(&state.db, user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(200, "Courses fetched successfully", courses)))
}

pub fn course_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/course")
            .service(add_course)
            .service(get_all_courses)
            .service(update_course)
            .service(delete_course)
            .service(get_all_courses_admin)
            .service(get_courses_user)
    );
}
