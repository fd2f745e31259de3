use actix_web::{web, HttpResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::AdminUser;
use crate::models::dto::{EventInput, SuccessResponse};
use crate::services::event_service::{resolve_event_date, EventService};

use super::{parse_id, IdQuery};

/// GET /api/events - newest first
pub async fn list_events(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let events = EventService::list(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(events))
}

/// POST /api/events (admin)
pub async fn create_event(
    admin: AdminUser,
    body: web::Json<EventInput>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let input = body.into_inner();

    if input.title.as_deref().map_or(true, |title| title.trim().is_empty()) {
        return Err(ApiError::bad_request("title is required"));
    }
    input.validate()?;

    let date = resolve_event_date(input.date.as_deref(), Utc::now()).map_err(ApiError::BadRequest)?;

    let event = EventService::create(db.get_ref(), input, date).await?;
    tracing::info!(event_id = event.id, by = %admin.0.username, "event created");

    Ok(HttpResponse::Created().json(event))
}

/// DELETE /api/events?id=N (admin)
pub async fn delete_event_by_query(
    admin: AdminUser,
    query: web::Query<IdQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = query.require_id()?;
    delete_event(admin, id, db.get_ref()).await
}

/// DELETE /api/events/{id} (admin)
pub async fn delete_event_by_path(
    admin: AdminUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    delete_event(admin, id, db.get_ref()).await
}

async fn delete_event(
    admin: AdminUser,
    id: i32,
    db: &DatabaseConnection,
) -> Result<HttpResponse, ApiError> {
    let removed = EventService::delete(db, id).await?;
    tracing::info!(event_id = id, removed, by = %admin.0.username, "event deleted");

    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}

// No update: events are replaced by delete + create
pub fn event_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/events")
            .route(web::get().to(list_events))
            .route(web::post().to(create_event))
            .route(web::delete().to(delete_event_by_query))
            .default_service(web::route().to(super::method_not_allowed)),
    )
    .service(
        web::resource("/events/{id}")
            .route(web::delete().to(delete_event_by_path))
            .default_service(web::route().to(super::method_not_allowed)),
    );
}
