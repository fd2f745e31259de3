use chrono::Utc;
use sea_orm::*;

use crate::models::dto::{GroupedProducts, ProductDetail, ProductInput, ProductSummary, UNCATEGORIZED};
use crate::models::{categories, products};

pub struct ProductService;

impl ProductService {
    /// All products left-joined with their category, grouped by category name.
    pub async fn list_grouped(db: &DatabaseConnection) -> Result<GroupedProducts, DbErr> {
        let rows = products::Entity::find()
            .select_only()
            .column(products::Column::Id)
            .column(products::Column::Title)
            .column(products::Column::TitleEn)
            .column(products::Column::Description)
            .column(products::Column::DescriptionEn)
            .column(products::Column::ImageUrl)
            .column_as(categories::Column::Name, "category_name")
            .left_join(categories::Entity)
            .order_by_asc(products::Column::Id)
            .into_model::<ProductSummary>()
            .all(db)
            .await?;

        let grouped = group_by_category(rows);
        tracing::debug!(products = grouped.product_count(), categories = grouped.category_count(), "listed products");
        Ok(grouped)
    }

    pub async fn find_detail(db: &DatabaseConnection, id: i32) -> Result<Option<ProductDetail>, DbErr> {
        let found = products::Entity::find_by_id(id)
            .find_also_related(categories::Entity)
            .one(db)
            .await?;

        Ok(found.map(|(product, category)| ProductDetail {
            product,
            category_name: category.map(|c| c.name),
        }))
    }

    /// Inserts a product; the caller has already checked that `title` is present.
    pub async fn create(db: &DatabaseConnection, input: ProductInput) -> Result<products::Model, DbErr> {
        let mut product = products::ActiveModel {
            title: Set(input.title.clone().unwrap_or_default()),
            is_prescription: Set("false".to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        apply_input(&mut product, input);

        product.insert(db).await
    }

    /// Writes only the fields present in `input`. `None` when no row has this id.
    pub async fn update(
        db: &DatabaseConnection,
        id: i32,
        input: ProductInput,
    ) -> Result<Option<products::Model>, DbErr> {
        let Some(existing) = products::Entity::find_by_id(id).one(db).await? else {
            return Ok(None);
        };

        let mut product: products::ActiveModel = existing.clone().into();
        apply_input(&mut product, input);

        if !product.is_changed() {
            return Ok(Some(existing));
        }

        product.update(db).await.map(Some)
    }

    /// Idempotent: deleting a missing id is not an error. Returns rows removed.
    pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<u64, DbErr> {
        let result = products::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }
}

/// Single pass over joined rows. Buckets appear in first-seen order and rows
/// keep their relative order inside a bucket.
pub fn group_by_category(rows: Vec<ProductSummary>) -> GroupedProducts {
    let mut grouped = GroupedProducts::default();

    for row in rows {
        let category = row
            .category_name
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        grouped.push(category, row);
    }

    grouped
}

fn apply_input(product: &mut products::ActiveModel, input: ProductInput) {
    macro_rules! set_some {
        ($($field:ident),* $(,)?) => {
            $(
                if let Some(value) = input.$field {
                    product.$field = Set(value);
                }
            )*
        };
    }
    macro_rules! set_optional {
        ($($field:ident),* $(,)?) => {
            $(
                if let Some(value) = input.$field {
                    product.$field = Set(Some(value));
                }
            )*
        };
    }

    set_some!(title, is_prescription);
    set_optional!(
        title_en,
        description,
        description_en,
        image_url,
        category_id,
        ingredients,
        ingredients_en,
        usage_instructions,
        usage_instructions_en,
        indications,
        indications_en,
        side_effects,
        side_effects_en,
        age_range,
        age_range_en,
        warning,
        warning_en,
        model_path,
    );
}
