// ============================================================================
// MODÈLE : COURSES
// ============================================================================
//
// Colonnes de la table courses:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - title (VARCHAR, NOT NULL)
//   - level / category (VARCHAR) - valeurs de CourseLevel / CourseCategory
//   - image (VARCHAR, NULL) - URL publique (jamais le binaire)
//   - students (INTEGER, DEFAULT 0) - incrémenté à chaque inscription
//   - instructor_id (INTEGER, NOT NULL, FK vers instructors)
//   - price (DECIMAL, NOT NULL, >= 0)
//
// Points d'attention:
//   - Les vidéos et ressources sont des tables filles ordonnées
//   - Le prix est copié dans order_items au moment de la commande
//
// ============================================================================

use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub level: String,
    pub category: String,
    pub image: Option<String>,
    pub students: i32,
    pub instructor_id: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub lessons: i32,
    pub duration: Option<i32>, // en minutes
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::instructor::Entity",
        from = "Column::InstructorId",
        to = "super::instructor::Column::Id"
    )]
    Instructor,

    #[sea_orm(has_many = "super::course_video::Entity")]
    CourseVideo,

    #[sea_orm(has_many = "super::course_resource::Entity")]
    CourseResource,
}

impl Related<super::instructor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Instructor.def()
    }
}

impl Related<super::course_video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseVideo.def()
    }
}

impl Related<super::course_resource::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseResource.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const COURSE_LEVELS: [&str; 3] = ["BEGINNER", "INTERMEDIATE", "ADVANCED"];

pub const COURSE_CATEGORIES: [&str; 9] = [
    "DEVELOPMENT",
    "DESIGN",
    "BUSINESS",
    "MARKETING",
    "IT & SOFTWARE",
    "PERSONAL DEVELOPMENT",
    "MUSIC",
    "PHOTOGRAPHY",
    "GENERAL",
];

pub const DEFAULT_LEVEL: &str = "BEGINNER";
pub const DEFAULT_CATEGORY: &str = "GENERAL";

pub fn is_valid_level(level: &str) -> bool {
    COURSE_LEVELS.contains(&level)
}

pub fn is_valid_category(category: &str) -> bool {
    COURSE_CATEGORIES.contains(&category)
}
