// Database connection, schema bootstrap and reference data

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, Schema, Set,
};

use crate::models::{categories, events, products, users};

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Creates missing tables from the entity definitions, parents before children.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let statements = [
        schema.create_table_from_entity(users::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(categories::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(products::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(events::Entity).if_not_exists().to_owned(),
    ];

    for statement in statements {
        db.execute(backend.build(&statement)).await?;
    }

    Ok(())
}

/// (name, name_en, description)
const REFERENCE_CATEGORIES: [(&str, &str, &str); 4] = [
    ("شراب", "Syrups", "Liquid supplements and medicines including syrups and sachets"),
    ("أقراص", "Tablets", "Tablets and capsules for various treatments"),
    ("دهانات", "Creams & Gels", "Topical creams, gels, and lotions for external use"),
    ("بخاخ", "Sprays", "Sprays for hair and topical use"),
];

/// Inserts the reference categories when the table is empty. Returns how many
/// rows were inserted.
pub async fn seed_categories(db: &DatabaseConnection) -> Result<usize, DbErr> {
    if categories::Entity::find().count(db).await? > 0 {
        return Ok(0);
    }

    for (name, name_en, description) in REFERENCE_CATEGORIES {
        categories::ActiveModel {
            name: Set(name.to_string()),
            name_en: Set(Some(name_en.to_string())),
            description: Set(Some(description.to_string())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(REFERENCE_CATEGORIES.len())
}
