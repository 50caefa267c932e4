// connexion BD + création du schéma

use sea_orm::sea_query::Index;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};

use crate::config::AppConfig;
use crate::models::{
    cart_item, course, course_resource, course_video, instructor, order, order_item, otp, payment,
    student_course, users,
};

pub async fn establish_connection(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options.max_connections(20).sqlx_logging(false);

    Database::connect(options).await
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;

    // colonnes marquées `indexed`
    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }
    Ok(())
}

/// Crée les tables (ordre des clés étrangères) et les index uniques user/cours
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    create_table(db, &schema, users::Entity).await?;
    create_table(db, &schema, instructor::Entity).await?;
    create_table(db, &schema, course::Entity).await?;
    create_table(db, &schema, course_video::Entity).await?;
    create_table(db, &schema, course_resource::Entity).await?;
    create_table(db, &schema, cart_item::Entity).await?;
    create_table(db, &schema, payment::Entity).await?;
    create_table(db, &schema, order::Entity).await?;
    create_table(db, &schema, order_item::Entity).await?;
    create_table(db, &schema, student_course::Entity).await?;
    create_table(db, &schema, otp::Entity).await?;

    let cart_unique = Index::create()
        .name("idx_cart_items_user_course")
        .table(cart_item::Entity)
        .col(cart_item::Column::UserId)
        .col(cart_item::Column::CourseId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&cart_unique)).await?;

    let enrollment_unique = Index::create()
        .name("idx_student_courses_user_course")
        .table(student_course::Entity)
        .col(student_course::Column::UserId)
        .col(student_course::Column::CourseId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&enrollment_unique)).await?;

    tracing::info!("Database schema ready");
    Ok(())
}
