use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};

/// Claims carried by every bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub username: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64, // expiration timestamp
}

/// Issues and verifies HS256 tokens with a fixed lifetime.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn generate_token(&self, user_id: i32, username: &str, role: &str) -> Result<String, String> {
        self.generate_token_at(user_id, username, role, Utc::now())
    }

    /// Same as [`generate_token`](Self::generate_token) with an explicit issue time.
    pub fn generate_token_at(
        &self,
        user_id: i32,
        username: &str,
        role: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, String> {
        let expiration = issued_at
            .checked_add_signed(self.ttl)
            .ok_or("Failed to calculate expiration")?
            .timestamp();

        let claims = Claims {
            id: user_id,
            username: username.to_string(),
            role: role.to_string(),
            iat: issued_at.timestamp(),
            exp: expiration,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| format!("Failed to generate token: {}", e))
    }

    /// Checks signature and expiry; any failure rejects the token.
    pub fn verify_token(&self, token: &str) -> Result<Claims, String> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| format!("Invalid token: {}", e))
    }
}
