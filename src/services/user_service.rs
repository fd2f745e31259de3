use std::sync::OnceLock;

use chrono::Utc;
use sea_orm::*;

use crate::models::users;
use crate::utils::password;

pub const ADMIN_ROLE: &str = "admin";

pub struct UserService;

impl UserService {
    /// Exact, case-sensitive lookup.
    pub async fn find_by_username(
        db: &DatabaseConnection,
        username: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(db)
            .await
    }

    /// Returns the user when `password` matches the stored hash.
    ///
    /// An unknown username still pays for one hash computation, so both
    /// failure paths look the same from outside.
    pub async fn authenticate(
        db: &DatabaseConnection,
        username: &str,
        password: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        let Some(user) = Self::find_by_username(db, username).await? else {
            let _ = password::verify_password(password, dummy_hash());
            return Ok(None);
        };

        match password::verify_password(password, &user.password_hash) {
            Ok(true) => Ok(Some(user)),
            Ok(false) => Ok(None),
            Err(e) => {
                tracing::warn!(user_id = user.id, error = %e, "stored password hash is unreadable");
                Ok(None)
            }
        }
    }

    /// Creates the user, or replaces its password hash when it already exists.
    pub async fn upsert(
        db: &DatabaseConnection,
        username: &str,
        password_hash: String,
        role: &str,
    ) -> Result<users::Model, DbErr> {
        match Self::find_by_username(db, username).await? {
            Some(existing) => {
                let mut user: users::ActiveModel = existing.into();
                user.password_hash = Set(password_hash);
                user.update(db).await
            }
            None => {
                users::ActiveModel {
                    username: Set(username.to_string()),
                    password_hash: Set(password_hash),
                    role: Set(role.to_string()),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(db)
                .await
            }
        }
    }

    /// Startup provisioning of the back office account.
    pub async fn provision_admin(
        db: &DatabaseConnection,
        username: &str,
        plain_password: &str,
    ) -> Result<users::Model, String> {
        let hash = password::hash_password(plain_password)?;
        Self::upsert(db, username, hash, ADMIN_ROLE)
            .await
            .map_err(|e| format!("Failed to provision admin: {}", e))
    }
}

#[cfg(not(test))]
const DUMMY_ITERATIONS: u32 = password::ITERATIONS;
#[cfg(test)]
const DUMMY_ITERATIONS: u32 = 1_000;

fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        password::hash_password_with_iterations("not-a-real-password", DUMMY_ITERATIONS)
            .unwrap_or_else(|_| format!("pbkdf2:sha256:{}$AAAAAAAAAAAAAAAAAAAAAA$AAAA", DUMMY_ITERATIONS))
    })
}
