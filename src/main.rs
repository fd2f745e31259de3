mod config;
mod db;
mod error;
mod logging;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

#[cfg(test)]
mod test_support;

use actix_web::{middleware::from_fn, web, App, HttpServer};
use chrono::Duration;

use crate::config::AppConfig;
use crate::services::upload_service::UploadService;
use crate::services::user_service::UserService;
use crate::utils::jwt::TokenService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    tracing::info!("connecting to database");
    let db = db::establish_connection(&config.database_url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to connect to database");
            std::io::Error::other(e)
        })?;

    bootstrap(&db, &config).await.map_err(|e| {
        tracing::error!(error = %e, "database bootstrap failed");
        std::io::Error::other(e)
    })?;
    tracing::info!("database ready");

    let tokens = web::Data::new(TokenService::new(
        &config.jwt_secret,
        Duration::hours(config.token_ttl_hours),
    ));
    let uploads = web::Data::new(UploadService::from_config(&config));
    let db = web::Data::new(db);
    let upload_limit = config.upload_max_bytes;

    tracing::info!(host = %config.host, port = config.port, "starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(from_fn(middleware::request_id::trace_requests))
            .app_data(db.clone())
            .app_data(tokens.clone())
            .app_data(uploads.clone())
            .configure(routes::configure_routes(upload_limit))
    })
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
}

/// Schema, reference categories and the optional admin account.
async fn bootstrap(db: &sea_orm::DatabaseConnection, config: &AppConfig) -> Result<(), String> {
    db::sync_schema(db)
        .await
        .map_err(|e| format!("schema sync failed: {}", e))?;

    if config.seed_categories {
        let inserted = db::seed_categories(db)
            .await
            .map_err(|e| format!("category seed failed: {}", e))?;
        if inserted > 0 {
            tracing::info!(inserted, "seeded reference categories");
        }
    }

    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        let admin = UserService::provision_admin(db, username, password).await?;
        tracing::info!(user_id = admin.id, username = %admin.username, "admin account provisioned");
    }

    Ok(())
}
