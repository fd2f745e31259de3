// Shared fixtures for HTTP tests: in-memory SQLite, real routes, real middleware

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use crate::db;
use crate::models::{categories, users};
use crate::services::storage::LocalDiskStore;
use crate::services::upload_service::UploadService;
use crate::services::user_service::UserService;
use crate::utils::jwt::TokenService;
use crate::utils::password;

pub const TEST_SECRET: &str = "test-secret";
pub const UPLOAD_LIMIT: usize = 1024 * 1024;

pub struct TestContext {
    pub db: DatabaseConnection,
    pub tokens: TokenService,
    pub upload_dir: PathBuf,
}

impl TestContext {
    pub async fn new() -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let db = Database::connect(options).await.expect("failed to open sqlite");
        db::sync_schema(&db).await.expect("failed to create schema");

        Self {
            db,
            tokens: TokenService::new(TEST_SECRET, Duration::hours(24)),
            upload_dir: std::env::temp_dir().join(format!("pharma-uploads-{}", uuid::Uuid::new_v4())),
        }
    }

    pub fn uploads(&self) -> UploadService {
        UploadService::new(
            Arc::new(LocalDiskStore::new(self.upload_dir.clone())),
            UPLOAD_LIMIT,
            None,
            self.upload_dir.clone(),
        )
    }

    pub fn token_for(&self, role: &str) -> String {
        self.tokens
            .generate_token(1, "admin", role)
            .expect("failed to sign token")
    }

    pub fn admin_bearer(&self) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token_for("admin")))
    }

    pub async fn seed_user(&self, username: &str, plain_password: &str, role: &str) -> users::Model {
        let hash = password::hash_password_with_iterations(plain_password, 1_000).unwrap();
        UserService::upsert(&self.db, username, hash, role).await.unwrap()
    }

    pub async fn seed_category(&self, name: &str) -> categories::Model {
        categories::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

/// Builds the service the same way `main` does, around a [`TestContext`].
/// An explicit `UploadService` can replace the local disk one.
macro_rules! test_app {
    ($ctx:expr) => {
        crate::test_support::test_app!($ctx, $ctx.uploads())
    };
    ($ctx:expr, $uploads:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(actix_web::middleware::from_fn(
                    crate::middleware::request_id::trace_requests,
                ))
                .app_data(actix_web::web::Data::new($ctx.db.clone()))
                .app_data(actix_web::web::Data::new($ctx.tokens.clone()))
                .app_data(actix_web::web::Data::new($uploads))
                .configure(crate::routes::configure_routes(
                    crate::test_support::UPLOAD_LIMIT,
                )),
        )
        .await
    };
}

pub(crate) use test_app;
