// ============================================================================
// SERVICE : CATALOGUE DES COURS
// ============================================================================
//
// Description:
//   Création, modification, suppression et listes des cours avec leurs
//   vidéos, ressources et formateur.
//
// Compteurs:
//   - instructor.courses +1 à la création, -1 à la suppression (jamais < 0)
//   - changement de formateur: -1 sur l'ancien, +1 sur le nouveau
//
// Points d'attention:
//   - L'image est uploadée AVANT la transaction (pas d'upload orphelin
//     si la validation échoue)
//   - Une liste de vidéos/ressources fournie remplace entièrement l'existante
//
// ============================================================================

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::errors::{AppError, AppResult};
use crate::models::dto::{CourseDetail, CourseRequest, InstructorSummary, ResourceInput, VideoInput};
use crate::models::{cart_item, course, course_resource, course_video, instructor, student_course};
use crate::services::auth_service::non_empty;
use crate::services::uploader::{self, ImageUploader};

pub const COURSES_FOLDER: &str = "courses";

/// Niveau d'embarquement des relations dans les listes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Detail {
    Summary,
    Full,
}

pub struct CatalogService;

fn normalize_level(level: &Option<String>) -> AppResult<Option<String>> {
    match non_empty(level).map(|l| l.to_uppercase()) {
        Some(level) if course::is_valid_level(&level) => Ok(Some(level)),
        Some(level) => Err(AppError::Validation(format!("Invalid course level: {}", level))),
        None => Ok(None),
    }
}

fn normalize_category(category: &Option<String>) -> AppResult<Option<String>> {
    match non_empty(category).map(|c| c.to_uppercase()) {
        Some(category) if course::is_valid_category(&category) => Ok(Some(category)),
        Some(category) => Err(AppError::Validation(format!("Invalid course category: {}", category))),
        None => Ok(None),
    }
}

fn check_price(price: Option<Decimal>) -> AppResult<Option<Decimal>> {
    match price {
        Some(p) if p < Decimal::ZERO => Err(AppError::Validation("Price must be >= 0".to_string())),
        other => Ok(other),
    }
}

fn check_counter(name: &str, value: Option<i32>) -> AppResult<Option<i32>> {
    match value {
        Some(v) if v < 0 => Err(AppError::Validation(format!("{} must be >= 0", name))),
        other => Ok(other),
    }
}

async fn insert_videos(txn: &DatabaseTransaction, course_id: i32, videos: &[VideoInput]) -> AppResult<()> {
    for (position, video) in videos.iter().enumerate() {
        course_video::ActiveModel {
            course_id: Set(course_id),
            video_title: Set(non_empty(&video.video_title)),
            video_url: Set(non_empty(&video.video_url)),
            video_order: Set(video.video_order.unwrap_or(position as i32 + 1)),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

async fn insert_resources(txn: &DatabaseTransaction, course_id: i32, resources: &[ResourceInput]) -> AppResult<()> {
    for (position, resource) in resources.iter().enumerate() {
        course_resource::ActiveModel {
            course_id: Set(course_id),
            resource_title: Set(non_empty(&resource.resource_title)),
            resource_url: Set(non_empty(&resource.resource_url)),
            resource_order: Set(resource.resource_order.unwrap_or(position as i32 + 1)),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

async fn bump_instructor_courses(txn: &DatabaseTransaction, instructor_id: i32, delta: i32) -> AppResult<()> {
    let mut update = instructor::Entity::update_many().filter(instructor::Column::Id.eq(instructor_id));
    update = if delta >= 0 {
        update.col_expr(
            instructor::Column::Courses,
            Expr::col(instructor::Column::Courses).add(delta),
        )
    } else {
        update
            .col_expr(
                instructor::Column::Courses,
                Expr::col(instructor::Column::Courses).sub(-delta),
            )
            .filter(instructor::Column::Courses.gt(0))
    };
    update.exec(txn).await?;
    Ok(())
}

impl CatalogService {
    #[tracing::instrument(skip(db, uploader, request), fields(title = ?request.title))]
    pub async fn add_course(
        db: &DatabaseConnection,
        uploader: &dyn ImageUploader,
        request: &CourseRequest,
    ) -> AppResult<course::Model> {
        // 1. Validation des champs
        let title = non_empty(&request.title)
            .ok_or_else(|| AppError::Validation("Course title is required".to_string()))?;
        let price = check_price(request.price)?
            .ok_or_else(|| AppError::Validation("Course price is required".to_string()))?;
        let instructor_id = request
            .instructor
            .ok_or_else(|| AppError::Validation("Instructor is required".to_string()))?;
        let level = normalize_level(&request.level)?.unwrap_or_else(|| course::DEFAULT_LEVEL.to_string());
        let category =
            normalize_category(&request.category)?.unwrap_or_else(|| course::DEFAULT_CATEGORY.to_string());
        let lessons = check_counter("lessons", request.lessons)?.unwrap_or(0);
        let duration = check_counter("duration", request.duration)?;

        // 2. Le formateur doit exister
        instructor::Entity::find_by_id(instructor_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Instructor not found".to_string()))?;

        // 3. Upload de l'image
        let image = uploader::upload_optional(uploader, request.image.as_ref(), COURSES_FOLDER).await?;

        // 4. Écritures dans une seule transaction
        let now = Utc::now().naive_utc();
        let txn = db.begin().await?;

        let created = course::ActiveModel {
            title: Set(title),
            description: Set(non_empty(&request.description)),
            level: Set(level),
            category: Set(category),
            image: Set(image),
            students: Set(0),
            instructor_id: Set(instructor_id),
            price: Set(price),
            lessons: Set(lessons),
            duration: Set(duration),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        bump_instructor_courses(&txn, instructor_id, 1).await?;
        insert_videos(&txn, created.id, request.videos.as_deref().unwrap_or_default()).await?;
        insert_resources(&txn, created.id, request.resources.as_deref().unwrap_or_default()).await?;

        txn.commit().await?;

        tracing::info!(course_id = created.id, instructor_id, "Course created");
        Ok(created)
    }

    #[tracing::instrument(skip(db, uploader, request))]
    pub async fn update_course(
        db: &DatabaseConnection,
        uploader: &dyn ImageUploader,
        id: i32,
        request: &CourseRequest,
    ) -> AppResult<course::Model> {
        let existing = course::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        let price = check_price(request.price)?;
        let level = normalize_level(&request.level)?;
        let category = normalize_category(&request.category)?;
        let lessons = check_counter("lessons", request.lessons)?;
        let duration = check_counter("duration", request.duration)?;

        let new_instructor = match request.instructor {
            Some(instructor_id) if instructor_id != existing.instructor_id => {
                instructor::Entity::find_by_id(instructor_id)
                    .one(db)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Instructor not found".to_string()))?;
                Some(instructor_id)
            }
            _ => None,
        };

        let image = uploader::upload_optional(uploader, request.image.as_ref(), COURSES_FOLDER).await?;

        let old_instructor = existing.instructor_id;
        let mut active: course::ActiveModel = existing.into();
        if let Some(title) = non_empty(&request.title) {
            active.title = Set(title);
        }
        if let Some(description) = non_empty(&request.description) {
            active.description = Set(Some(description));
        }
        if let Some(level) = level {
            active.level = Set(level);
        }
        if let Some(category) = category {
            active.category = Set(category);
        }
        if let Some(price) = price {
            active.price = Set(price);
        }
        if let Some(lessons) = lessons {
            active.lessons = Set(lessons);
        }
        if let Some(duration) = duration {
            active.duration = Set(Some(duration));
        }
        if let Some(url) = image {
            active.image = Set(Some(url));
        }
        if let Some(instructor_id) = new_instructor {
            active.instructor_id = Set(instructor_id);
        }
        active.updated_at = Set(Utc::now().naive_utc());

        let txn = db.begin().await?;
        let updated = active.update(&txn).await?;

        if let Some(instructor_id) = new_instructor {
            bump_instructor_courses(&txn, old_instructor, -1).await?;
            bump_instructor_courses(&txn, instructor_id, 1).await?;
        }

        if let Some(videos) = &request.videos {
            course_video::Entity::delete_many()
                .filter(course_video::Column::CourseId.eq(id))
                .exec(&txn)
                .await?;
            insert_videos(&txn, id, videos).await?;
        }
        if let Some(resources) = &request.resources {
            course_resource::Entity::delete_many()
                .filter(course_resource::Column::CourseId.eq(id))
                .exec(&txn)
                .await?;
            insert_resources(&txn, id, resources).await?;
        }

        txn.commit().await?;
        tracing::info!(course_id = id, "Course updated");
        Ok(updated)
    }

    /// Supprime le cours et ses dépendances, `None` si le cours n'existe pas
    #[tracing::instrument(skip(db))]
    pub async fn delete_course(db: &DatabaseConnection, id: i32) -> AppResult<Option<course::Model>> {
        let txn = db.begin().await?;

        let Some(existing) = course::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        course_video::Entity::delete_many()
            .filter(course_video::Column::CourseId.eq(id))
            .exec(&txn)
            .await?;
        course_resource::Entity::delete_many()
            .filter(course_resource::Column::CourseId.eq(id))
            .exec(&txn)
            .await?;
        cart_item::Entity::delete_many()
            .filter(cart_item::Column::CourseId.eq(id))
            .exec(&txn)
            .await?;
        course::Entity::delete_by_id(id).exec(&txn).await?;
        bump_instructor_courses(&txn, existing.instructor_id, -1).await?;

        txn.commit().await?;
        tracing::info!(course_id = id, "Course deleted");
        Ok(Some(existing))
    }

    /// Tous les cours avec un résumé du formateur
    pub async fn list_courses(db: &DatabaseConnection) -> AppResult<Vec<CourseDetail>> {
        let courses = course::Entity::find().order_by_asc(course::Column::Id).all(db).await?;
        Self::with_relations(db, courses, Detail::Summary, false).await
    }

    /// Listing admin: formateur complet, vidéos et ressources ordonnées
    pub async fn list_courses_admin(db: &DatabaseConnection) -> AppResult<Vec<CourseDetail>> {
        let courses = course::Entity::find().order_by_asc(course::Column::Id).all(db).await?;
        Self::with_relations(db, courses, Detail::Full, true).await
    }

    /// Cours auxquels l'utilisateur est inscrit
    pub async fn list_user_courses(db: &DatabaseConnection, user_id: i32) -> AppResult<Vec<CourseDetail>> {
        let course_ids: Vec<i32> = student_course::Entity::find()
            .filter(student_course::Column::UserId.eq(user_id))
            .order_by_asc(student_course::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|enrollment| enrollment.course_id)
            .collect();

        if course_ids.is_empty() {
            return Ok(Vec::new());
        }

        let courses = course::Entity::find()
            .filter(course::Column::Id.is_in(course_ids))
            .order_by_asc(course::Column::Id)
            .all(db)
            .await?;
        Self::with_relations(db, courses, Detail::Summary, true).await
    }

    async fn with_relations(
        db: &DatabaseConnection,
        courses: Vec<course::Model>,
        detail: Detail,
        with_content: bool,
    ) -> AppResult<Vec<CourseDetail>> {
        let course_ids: Vec<i32> = courses.iter().map(|c| c.id).collect();
        let instructor_ids: Vec<i32> = courses.iter().map(|c| c.instructor_id).collect();

        let instructors: HashMap<i32, instructor::Model> = instructor::Entity::find()
            .filter(instructor::Column::Id.is_in(instructor_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        let mut videos: HashMap<i32, Vec<course_video::Model>> = HashMap::new();
        let mut resources: HashMap<i32, Vec<course_resource::Model>> = HashMap::new();

        if with_content && !course_ids.is_empty() {
            for video in course_video::Entity::find()
                .filter(course_video::Column::CourseId.is_in(course_ids.clone()))
                .order_by_asc(course_video::Column::VideoOrder)
                .order_by_asc(course_video::Column::Id)
                .all(db)
                .await?
            {
                videos.entry(video.course_id).or_default().push(video);
            }

            for resource in course_resource::Entity::find()
                .filter(course_resource::Column::CourseId.is_in(course_ids))
                .order_by_asc(course_resource::Column::ResourceOrder)
                .order_by_asc(course_resource::Column::Id)
                .all(db)
                .await?
            {
                resources.entry(resource.course_id).or_default().push(resource);
            }
        }

        let mut details = Vec::with_capacity(courses.len());
        for course in courses {
            let instructor = match (instructors.get(&course.instructor_id), detail) {
                (Some(i), Detail::Summary) => Some(
                    serde_json::to_value(InstructorSummary::from(i))
                        .map_err(|e| AppError::Internal(e.to_string()))?,
                ),
                (Some(i), Detail::Full) => {
                    Some(serde_json::to_value(i).map_err(|e| AppError::Internal(e.to_string()))?)
                }
                (None, _) => None,
            };

            let (course_videos, course_resources) = if with_content {
                (
                    Some(videos.remove(&course.id).unwrap_or_default()),
                    Some(resources.remove(&course.id).unwrap_or_default()),
                )
            } else {
                (None, None)
            };

            details.push(CourseDetail {
                course,
                instructor,
                videos: course_videos,
                resources: course_resources,
            });
        }

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, FakeUploader};

    fn video(title: &str, order: i32) -> VideoInput {
        VideoInput {
            video_title: Some(title.to_string()),
            video_url: Some(format!("https://videos.test/{}", title)),
            video_order: Some(order),
        }
    }

    fn course_request(instructor_id: i32) -> CourseRequest {
        CourseRequest {
            title: Some("Rust for beginners".to_string()),
            price: Some(Decimal::new(4999, 2)),
            instructor: Some(instructor_id),
            level: Some("intermediate".to_string()),
            image: Some(test_support::png_image()),
            videos: Some(vec![video("second", 2), video("first", 1)]),
            resources: Some(vec![ResourceInput {
                resource_title: Some("Slides".to_string()),
                resource_url: Some("https://files.test/slides.pdf".to_string()),
                resource_order: None,
            }]),
            ..Default::default()
        }
    }

    async fn instructor_counters(db: &DatabaseConnection, id: i32) -> (i32, i32) {
        let i = instructor::Entity::find_by_id(id).one(db).await.unwrap().unwrap();
        (i.courses, i.students)
    }

    #[tokio::test]
    async fn test_add_course_writes_everything() {
        let db = test_support::test_db().await;
        let instructor = test_support::insert_instructor(&db, "Grace").await;

        let created = CatalogService::add_course(&db, &FakeUploader, &course_request(instructor.id))
            .await
            .unwrap();

        assert_eq!(created.level, "INTERMEDIATE");
        assert_eq!(created.category, course::DEFAULT_CATEGORY);
        assert_eq!(created.image.as_deref(), Some("https://cdn.test/courses/image.png"));
        assert_eq!(instructor_counters(&db, instructor.id).await.0, 1);

        let listing = CatalogService::list_courses_admin(&db).await.unwrap();
        let videos = listing[0].videos.as_ref().unwrap();
        assert_eq!(videos.iter().map(|v| v.video_order).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(videos[0].video_title.as_deref(), Some("first"));
        assert_eq!(listing[0].resources.as_ref().unwrap()[0].resource_order, 1);
        assert_eq!(listing[0].instructor.as_ref().unwrap()["bio"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_add_course_validation() {
        let db = test_support::test_db().await;
        let instructor = test_support::insert_instructor(&db, "Grace").await;

        let mut negative = course_request(instructor.id);
        negative.price = Some(Decimal::from(-1));
        assert!(matches!(
            CatalogService::add_course(&db, &FakeUploader, &negative).await,
            Err(AppError::Validation(_))
        ));

        let mut bad_level = course_request(instructor.id);
        bad_level.level = Some("EXPERT".to_string());
        assert!(CatalogService::add_course(&db, &FakeUploader, &bad_level).await.is_err());

        assert!(matches!(
            CatalogService::add_course(&db, &FakeUploader, &course_request(999)).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(course::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_lists_and_moves_counter() {
        let db = test_support::test_db().await;
        let grace = test_support::insert_instructor(&db, "Grace").await;
        let linus = test_support::insert_instructor(&db, "Linus").await;
        let created = CatalogService::add_course(&db, &FakeUploader, &course_request(grace.id))
            .await
            .unwrap();

        let request = CourseRequest {
            price: Some(Decimal::from(20)),
            instructor: Some(linus.id),
            videos: Some(vec![video("only", 1)]),
            ..Default::default()
        };
        let updated = CatalogService::update_course(&db, &FakeUploader, created.id, &request)
            .await
            .unwrap();

        assert_eq!(updated.title, "Rust for beginners");
        assert_eq!(updated.price, Decimal::from(20));
        assert_eq!(updated.image, created.image);
        assert_eq!(instructor_counters(&db, grace.id).await.0, 0);
        assert_eq!(instructor_counters(&db, linus.id).await.0, 1);

        let listing = CatalogService::list_courses_admin(&db).await.unwrap();
        assert_eq!(listing[0].videos.as_ref().unwrap().len(), 1);
        // liste de ressources non fournie: conservée
        assert_eq!(listing[0].resources.as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_course_decrements_instructor_counter() {
        let db = test_support::test_db().await;
        let grace = test_support::insert_instructor(&db, "Grace").await;
        let student = test_support::insert_user(&db, "a@example.com", "USER").await;
        let created = CatalogService::add_course(&db, &FakeUploader, &course_request(grace.id))
            .await
            .unwrap();
        crate::services::cart_service::CartService::add(&db, student.id, created.id)
            .await
            .unwrap();

        let deleted = CatalogService::delete_course(&db, created.id).await.unwrap();

        assert_eq!(deleted.map(|c| c.id), Some(created.id));
        assert_eq!(instructor_counters(&db, grace.id).await.0, 0);
        assert_eq!(course_video::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(cart_item::Entity::find().count(&db).await.unwrap(), 0);
        assert!(CatalogService::delete_course(&db, created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_counter_never_goes_below_zero() {
        let db = test_support::test_db().await;
        let grace = test_support::insert_instructor(&db, "Grace").await;
        let course = test_support::insert_course(&db, "Seeded", 10, grace.id).await;

        CatalogService::delete_course(&db, course.id).await.unwrap();

        assert_eq!(instructor_counters(&db, grace.id).await.0, 0);
    }

    #[tokio::test]
    async fn test_listings() {
        let db = test_support::test_db().await;
        let grace = test_support::insert_instructor(&db, "Grace").await;
        let student = test_support::insert_user(&db, "a@example.com", "USER").await;
        let first = test_support::insert_course(&db, "First", 10, grace.id).await;
        test_support::insert_course(&db, "Second", 20, grace.id).await;
        student_course::ActiveModel {
            user_id: Set(student.id),
            course_id: Set(first.id),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let all = CatalogService::list_courses(&db).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].videos.is_none());
        assert_eq!(all[0].instructor.as_ref().unwrap()["name"], "Grace");
        assert!(all[0].instructor.as_ref().unwrap().get("bio").is_none());

        let mine = CatalogService::list_user_courses(&db, student.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].course.title, "First");
        assert_eq!(mine[0].videos.as_ref().map(Vec::len), Some(0));
    }
}
