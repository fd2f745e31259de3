use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

/// A catalog product. Every `*_en` column is the optional English twin of the
/// Arabic column it follows; readers fall back to the Arabic value when absent.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub title_en: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description_en: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i32>,

    // Clinical fields
    #[sea_orm(column_type = "Text", nullable)]
    pub ingredients: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub ingredients_en: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub usage_instructions: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub usage_instructions_en: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub indications: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub indications_en: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub side_effects: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub side_effects_en: Option<String>,
    pub age_range: Option<String>,
    pub age_range_en: Option<String>,
    /// "true" / "false", stored as text
    #[sea_orm(default_value = "false")]
    pub is_prescription: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub warning: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub warning_en: Option<String>,
    pub model_path: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Category,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
