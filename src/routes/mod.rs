pub mod health;
pub mod auth;
pub mod products;
pub mod events;
pub mod upload;

use actix_web::{middleware::from_fn, web, HttpResponse};
use serde::Deserialize;

use crate::error::ApiError;
use crate::middleware::cors;

/// `?id=` on id-scoped operations
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    pub fn require_id(&self) -> Result<i32, ApiError> {
        match self.id.as_deref() {
            Some(raw) if !raw.is_empty() => parse_id(raw),
            _ => Err(ApiError::bad_request("id is required")),
        }
    }
}

pub fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ApiError::bad_request(format!("Invalid id: {raw}")))
}

pub async fn method_not_allowed() -> Result<HttpResponse, ApiError> {
    Err(ApiError::MethodNotAllowed)
}

/// Registers every route. `upload_limit` bounds decoded upload size; JSON
/// bodies may be a third larger to fit the base64 encoding.
pub fn configure_routes(upload_limit: usize) -> impl Fn(&mut web::ServiceConfig) + Clone {
    let json_limit = upload_limit / 3 * 4 + 64 * 1024;

    move |cfg: &mut web::ServiceConfig| {
        cfg.service(
            web::scope("/api")
                .wrap(from_fn(cors::cors))
                .app_data(
                    web::JsonConfig::default()
                        .limit(json_limit)
                        .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into()),
                )
                .app_data(
                    web::QueryConfig::default()
                        .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into()),
                )
                .service(health::health_check)
                .configure(auth::auth_routes)
                .configure(products::product_routes)
                .configure(events::event_routes)
                .configure(upload::upload_routes),
        )
        .configure(upload::file_routes);
    }
}
