use std::collections::HashMap;

use chrono::Utc;
use sea_orm::*;

use crate::errors::{AppError, AppResult};
use crate::models::dto::{CartCourse, CartItemView};
use crate::models::{cart_item, course};

const ALREADY_IN_CART: &str = "Course already in cart";

pub struct CartService;

impl CartService {
    /// Panier de l'utilisateur, chaque entrée résolue contre le catalogue
    pub async fn list(db: &DatabaseConnection, user_id: i32) -> AppResult<Vec<CartItemView>> {
        let items = cart_item::Entity::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_asc(cart_item::Column::Id)
            .all(db)
            .await?;

        let course_ids: Vec<i32> = items.iter().map(|item| item.course_id).collect();
        let courses: HashMap<i32, course::Model> = course::Entity::find()
            .filter(course::Column::Id.is_in(course_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(items
            .into_iter()
            .map(|item| CartItemView {
                id: item.id,
                user_id: item.user_id,
                course_id: item.course_id,
                course: courses.get(&item.course_id).map(|c| CartCourse {
                    id: c.id,
                    title: c.title.clone(),
                    image: c.image.clone(),
                    price: c.price,
                }),
            })
            .collect())
    }

    #[tracing::instrument(skip(db))]
    pub async fn add(db: &DatabaseConnection, user_id: i32, course_id: i32) -> AppResult<cart_item::Model> {
        // 1. Doublon (l'index unique couvre les ajouts concurrents)
        let existing = cart_item::Entity::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::CourseId.eq(course_id))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(ALREADY_IN_CART.to_string()));
        }

        // 2. Le cours doit exister
        course::Entity::find_by_id(course_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        // 3. Créer l'entrée
        let item = cart_item::ActiveModel {
            user_id: Set(user_id),
            course_id: Set(course_id),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| AppError::from_insert(e, ALREADY_IN_CART))?;

        tracing::info!(cart_item_id = item.id, "Course added to cart");
        Ok(item)
    }

    /// Retire l'entrée (user, cours), `None` si elle n'existe pas
    #[tracing::instrument(skip(db))]
    pub async fn remove(
        db: &DatabaseConnection,
        user_id: i32,
        course_id: i32,
    ) -> AppResult<Option<cart_item::Model>> {
        let Some(item) = cart_item::Entity::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::CourseId.eq(course_id))
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        cart_item::Entity::delete_by_id(item.id).exec(db).await?;
        Ok(Some(item))
    }
}
