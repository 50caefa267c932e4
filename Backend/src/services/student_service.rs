use chrono::Utc;
use sea_orm::*;

use crate::errors::{AppError, AppResult};
use crate::models::dto::{ChangePasswordRequest, StudentProfileRequest, UpdateStudentRequest};
use crate::models::users::{self, UserStatus};
use crate::services::auth_service::{non_empty, normalize_email, AuthService};
use crate::services::uploader::{self, ImageUploader};
use crate::utils::password;

pub const STUDENTS_FOLDER: &str = "students";

pub struct StudentService;

impl StudentService {
    async fn find(db: &DatabaseConnection, id: i32) -> AppResult<users::Model> {
        users::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))
    }

    pub async fn update_student(
        db: &DatabaseConnection,
        id: i32,
        request: &UpdateStudentRequest,
    ) -> AppResult<users::Model> {
        let student = Self::find(db, id).await?;
        let mut active: users::ActiveModel = student.clone().into();

        if let Some(email) = non_empty(&request.email).map(|e| normalize_email(&e)) {
            if email != student.email {
                let taken = users::Entity::find()
                    .filter(users::Column::Email.eq(&email))
                    .one(db)
                    .await?;
                if taken.is_some() {
                    return Err(AppError::Conflict("Email already exists".to_string()));
                }
                active.email = Set(email);
            }
        }
        if let Some(new_password) = non_empty(&request.password) {
            active.password_hash = Set(password::hash_password(&new_password)?);
        }
        if let Some(firstname) = non_empty(&request.firstname) {
            active.firstname = Set(Some(firstname));
        }
        if let Some(lastname) = non_empty(&request.lastname) {
            active.lastname = Set(Some(lastname));
        }
        active.updated_at = Set(Utc::now().naive_utc());

        active
            .update(db)
            .await
            .map_err(|e| AppError::from_insert(e, "Email already exists"))
    }

    /// Suppression logique: le compte reste en base, désactivé
    pub async fn delete_student(db: &DatabaseConnection, id: i32) -> AppResult<users::Model> {
        let student = Self::find(db, id).await?;
        let mut active: users::ActiveModel = student.into();
        active.is_active = Set(false);
        active.status = Set(UserStatus::Inactive);
        active.updated_at = Set(Utc::now().naive_utc());

        let student = active.update(db).await?;
        tracing::info!(user_id = id, "Student deactivated");
        Ok(student)
    }

    pub async fn update_profile(
        db: &DatabaseConnection,
        uploader: &dyn ImageUploader,
        user_id: i32,
        request: &StudentProfileRequest,
    ) -> AppResult<users::Model> {
        let student = AuthService::active_user(db, user_id).await?;

        // upload avant toute écriture
        let picture =
            uploader::upload_optional(uploader, request.profile_pic.as_ref(), STUDENTS_FOLDER).await?;

        let mut active: users::ActiveModel = student.into();
        if let Some(firstname) = non_empty(&request.firstname) {
            active.firstname = Set(Some(firstname));
        }
        if let Some(lastname) = non_empty(&request.lastname) {
            active.lastname = Set(Some(lastname));
        }
        if let Some(url) = picture {
            active.profile_pic_link = Set(Some(url));
        }
        active.updated_at = Set(Utc::now().naive_utc());

        Ok(active.update(db).await?)
    }

    pub async fn change_password(
        db: &DatabaseConnection,
        user_id: i32,
        request: &ChangePasswordRequest,
    ) -> AppResult<()> {
        let (current, new_password) = match (non_empty(&request.current_password), non_empty(&request.new_password)) {
            (Some(current), Some(new_password)) => (current, new_password),
            _ => {
                return Err(AppError::Validation(
                    "Current password and new password are required".to_string(),
                ));
            }
        };

        let student = AuthService::active_user(db, user_id).await?;
        if !password::verify_password(&current, &student.password_hash)? {
            return Err(AppError::Validation("Current password is incorrect".to_string()));
        }

        let mut active: users::ActiveModel = student.into();
        active.password_hash = Set(password::hash_password(&new_password)?);
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(db).await?;

        tracing::info!(user_id, "Password changed");
        Ok(())
    }
}
