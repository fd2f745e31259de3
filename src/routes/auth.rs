use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::user_service::UserService;
use crate::utils::jwt::TokenService;

// Fields are optional so that a missing one maps to our own 400 message
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Public view of a user; the hash never leaves the server
#[derive(Serialize)]
pub struct PublicUser {
    pub username: String,
    pub role: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

/// POST /api/login
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();

    // 1. Both fields are required
    let (username, password) = match (body.username, body.password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            (username, password)
        }
        _ => return Err(ApiError::bad_request("Username and password are required")),
    };

    // 2. Same answer for unknown user and wrong password
    let Some(user) = UserService::authenticate(db.get_ref(), &username, &password).await? else {
        tracing::info!("login rejected");
        return Err(ApiError::invalid_credentials());
    };

    // 3. Issue the token
    let token = tokens
        .generate_token(user.id, &user.username, &user.role)
        .map_err(ApiError::Internal)?;

    tracing::info!(user_id = user.id, "login succeeded");

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        user: PublicUser {
            username: user.username,
            role: user.role,
        },
    }))
}

/// GET /api/me - token check for the admin UI
#[get("/me")]
pub async fn me(auth_user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(PublicUser {
        username: auth_user.username,
        role: auth_user.role,
    })
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/login")
            .route(web::post().to(login))
            .default_service(web::route().to(super::method_not_allowed)),
    )
    .service(me);
}
