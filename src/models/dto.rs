// Request payloads and structured responses shared by routes and services
use sea_orm::FromQueryResult;
use serde::ser::SerializeMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

use super::products;

/// Bucket for products whose category does not resolve.
pub const UNCATEGORIZED: &str = "Other";

/// One row of the grouped product listing
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct ProductSummary {
    pub id: i32,
    pub title: String,
    pub title_en: Option<String>,
    pub description: Option<String>,
    pub description_en: Option<String>,
    pub image_url: Option<String>,
    #[serde(rename = "categoryName")]
    pub category_name: Option<String>,
}

/// Category display name → products in that category.
///
/// Serialized as a JSON object whose keys appear in the order each category
/// was first seen in the rows; no sorting is applied.
#[derive(Debug, Default, PartialEq)]
pub struct GroupedProducts(Vec<(String, Vec<ProductSummary>)>);

impl GroupedProducts {
    pub fn push(&mut self, category: String, row: ProductSummary) {
        match self.0.iter_mut().find(|(name, _)| *name == category) {
            Some((_, rows)) => rows.push(row),
            None => self.0.push((category, vec![row])),
        }
    }

    pub fn get(&self, category: &str) -> Option<&[ProductSummary]> {
        self.0
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, rows)| rows.as_slice())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn category_count(&self) -> usize {
        self.0.len()
    }

    pub fn product_count(&self) -> usize {
        self.0.iter().map(|(_, rows)| rows.len()).sum()
    }
}

impl Serialize for GroupedProducts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (category, rows) in &self.0 {
            map.serialize_entry(category, rows)?;
        }
        map.end()
    }
}

/// Full product record with its resolved category name
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: products::Model,
    #[serde(rename = "categoryName")]
    pub category_name: Option<String>,
}

/// Allow-listed product fields accepted on create and update.
///
/// Keys outside this set are ignored by serde, so a caller can never write
/// `id`, `created_at` or any other column directly. On update, absent and
/// `null` fields leave the stored value untouched.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 255, message = "title must be between 1 and 255 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 255))]
    pub title_en: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[validate(length(max = 10000))]
    pub description_en: Option<String>,
    #[validate(length(max = 2048))]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    #[validate(range(min = 1, message = "category_id must be positive"))]
    pub category_id: Option<i32>,
    #[validate(length(max = 10000))]
    pub ingredients: Option<String>,
    #[validate(length(max = 10000))]
    pub ingredients_en: Option<String>,
    #[validate(length(max = 10000))]
    pub usage_instructions: Option<String>,
    #[validate(length(max = 10000))]
    pub usage_instructions_en: Option<String>,
    #[validate(length(max = 10000))]
    pub indications: Option<String>,
    #[validate(length(max = 10000))]
    pub indications_en: Option<String>,
    #[validate(length(max = 10000))]
    pub side_effects: Option<String>,
    #[validate(length(max = 10000))]
    pub side_effects_en: Option<String>,
    #[validate(length(max = 255))]
    pub age_range: Option<String>,
    #[validate(length(max = 255))]
    pub age_range_en: Option<String>,
    #[serde(default, deserialize_with = "prescription_flag")]
    pub is_prescription: Option<String>,
    #[validate(length(max = 10000))]
    pub warning: Option<String>,
    #[validate(length(max = 10000))]
    pub warning_en: Option<String>,
    #[validate(length(max = 2048))]
    pub model_path: Option<String>,
}

/// Allow-listed event fields accepted on create
#[derive(Debug, Default, Deserialize, Validate)]
pub struct EventInput {
    #[validate(length(min = 1, max = 255, message = "title must be between 1 and 255 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 255))]
    pub title_en: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[validate(length(max = 10000))]
    pub description_en: Option<String>,
    pub date: Option<String>,
    #[validate(length(max = 2048))]
    pub cover_image: Option<String>,
    pub gallery_images: Option<Vec<String>>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 64))]
    pub event_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Accepts `1`, `"1"`, `""` and `null` for id-valued form fields.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(n)) => i32::try_from(n)
            .map(Some)
            .map_err(|_| de::Error::custom("id out of range")),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid id: {s}"))),
    }
}

/// Accepts `true`, `false`, `"true"` and `"false"`; normalizes to the text form.
fn prescription_flag<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Flag(flag)) => Ok(Some(flag.to_string())),
        Some(Raw::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" => Ok(Some("true".to_string())),
            "false" => Ok(Some("false".to_string())),
            _ => Err(de::Error::custom("is_prescription must be true or false")),
        },
    }
}
