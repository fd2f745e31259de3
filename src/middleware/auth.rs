use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::services::user_service::ADMIN_ROLE;
use crate::utils::jwt::TokenService;

/// Identity taken from a verified bearer token.
/// Used as an extractor on protected routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: String,
}

/// An [`AuthUser`] whose role is `admin`; required by every mutating route.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

impl FromRequest for AdminUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).and_then(|user| {
            if user.role == ADMIN_ROLE {
                Ok(AdminUser(user))
            } else {
                tracing::warn!(user_id = user.user_id, role = %user.role, "non-admin token on admin route");
                Err(ApiError::Forbidden("Admin role required".to_string()))
            }
        }))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, ApiError> {
    let tokens = req
        .app_data::<web::Data<TokenService>>()
        .ok_or_else(|| ApiError::Internal("token service is not registered".to_string()))?;

    // 1. Authorization header
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

    // 2. "Bearer <token>"
    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("Invalid Authorization format (expected: Bearer <token>)".to_string())
        })?;

    // 3. Signature and expiry
    let claims = tokens.verify_token(token).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })?;

    Ok(AuthUser {
        user_id: claims.id,
        username: claims.username,
        role: claims.role,
    })
}
