use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::*;

use crate::models::dto::EventInput;
use crate::models::events;

pub const DEFAULT_EVENT_TYPE: &str = "social";

pub struct EventService;

impl EventService {
    /// Most recent first; ties fall back to the newest id.
    pub async fn list(db: &DatabaseConnection) -> Result<Vec<events::Model>, DbErr> {
        events::Entity::find()
            .order_by_desc(events::Column::Date)
            .order_by_desc(events::Column::Id)
            .all(db)
            .await
    }

    /// Inserts an event whose date has already been resolved.
    pub async fn create(
        db: &DatabaseConnection,
        input: EventInput,
        date: DateTime<Utc>,
    ) -> Result<events::Model, DbErr> {
        let gallery = input.gallery_images.unwrap_or_default();

        let event = events::ActiveModel {
            title: Set(input.title.unwrap_or_default()),
            title_en: Set(input.title_en),
            description: Set(input.description),
            description_en: Set(input.description_en),
            date: Set(date),
            cover_image: Set(input.cover_image),
            gallery_images: Set(serde_json::json!(gallery)),
            event_type: Set(input.event_type.unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string())),
            ..Default::default()
        };

        event.insert(db).await
    }

    /// Idempotent: deleting a missing id is not an error.
    pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<u64, DbErr> {
        let result = events::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }
}

/// Resolves the optional `date` field: absent or blank means now.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (read as UTC) and `YYYY-MM-DD`
/// (midnight UTC), which covers what HTML date and datetime-local inputs send.
pub fn resolve_event_date(raw: Option<&str>, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(now),
        Some(raw) => raw,
    };

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("Invalid date: {raw}"))
}
