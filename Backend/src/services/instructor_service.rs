use chrono::Utc;
use sea_orm::*;
use validator::Validate;

use crate::errors::{AppError, AppResult};
use crate::models::dto::InstructorRequest;
use crate::models::instructor;
use crate::services::auth_service::non_empty;
use crate::services::uploader::{self, ImageUploader};

pub const INSTRUCTORS_FOLDER: &str = "instructors";

pub struct InstructorService;

impl InstructorService {
    pub async fn find(db: &DatabaseConnection, id: i32) -> AppResult<instructor::Model> {
        instructor::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Instructor not found".to_string()))
    }

    pub async fn add_instructor(
        db: &DatabaseConnection,
        uploader: &dyn ImageUploader,
        request: &InstructorRequest,
    ) -> AppResult<instructor::Model> {
        request.validate()?;
        let name = non_empty(&request.name)
            .ok_or_else(|| AppError::Validation("Instructor name is required".to_string()))?;

        let image =
            uploader::upload_optional(uploader, request.image.as_ref(), INSTRUCTORS_FOLDER).await?;

        let created = instructor::ActiveModel {
            name: Set(name),
            role: Set(non_empty(&request.role)),
            experience: Set(request.experience),
            students: Set(request.students.unwrap_or(0)),
            courses: Set(request.courses.unwrap_or(0)),
            image: Set(image),
            bio: Set(non_empty(&request.bio)),
            is_active: Set(true),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(instructor_id = created.id, "Instructor created");
        Ok(created)
    }

    pub async fn list_active(db: &DatabaseConnection) -> AppResult<Vec<instructor::Model>> {
        Ok(instructor::Entity::find()
            .filter(instructor::Column::IsActive.eq(true))
            .order_by_asc(instructor::Column::Id)
            .all(db)
            .await?)
    }

    /// Seuls les champs fournis sont modifiés
    pub async fn update_instructor(
        db: &DatabaseConnection,
        uploader: &dyn ImageUploader,
        id: i32,
        request: &InstructorRequest,
    ) -> AppResult<instructor::Model> {
        request.validate()?;
        let existing = Self::find(db, id).await?;

        let image =
            uploader::upload_optional(uploader, request.image.as_ref(), INSTRUCTORS_FOLDER).await?;

        let mut active: instructor::ActiveModel = existing.into();
        if let Some(name) = non_empty(&request.name) {
            active.name = Set(name);
        }
        if let Some(role) = non_empty(&request.role) {
            active.role = Set(Some(role));
        }
        if let Some(experience) = request.experience {
            active.experience = Set(Some(experience));
        }
        if let Some(students) = request.students {
            active.students = Set(students);
        }
        if let Some(courses) = request.courses {
            active.courses = Set(courses);
        }
        if let Some(bio) = non_empty(&request.bio) {
            active.bio = Set(Some(bio));
        }
        if let Some(url) = image {
            active.image = Set(Some(url));
        }

        Ok(active.update(db).await?)
    }

    pub async fn delete_instructor(db: &DatabaseConnection, id: i32) -> AppResult<instructor::Model> {
        let existing = Self::find(db, id).await?;
        let mut active: instructor::ActiveModel = existing.into();
        active.is_active = Set(false);

        let deleted = active.update(db).await?;
        tracing::info!(instructor_id = id, "Instructor deactivated");
        Ok(deleted)
    }
}
