use super::model::{Principal, PrincipalClaims};
use crate::core::error::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::time::Duration;

/// Verifies HS256 principal tokens issued by the identity provider
pub struct JwtValidator {
    decoding_key: DecodingKey,
    leeway: u64,
}

impl JwtValidator {
    pub fn new(secret: String, leeway: Duration) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            leeway: leeway.as_secs(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<Principal, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data =
            decode::<PrincipalClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                tracing::debug!("Token validation failed: {}", e);
                AppError::Unauthorized(format!("Invalid token: {}", e))
            })?;

        let claims = token_data.claims;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Unauthorized("Token subject is not a user id".to_string()))?;

        Ok(Principal {
            user_id,
            role: claims.role,
            category_ids: claims.category_ids,
            is_active: claims.is_active,
        })
    }
}

/// Sign a short-lived principal token for tests
#[cfg(test)]
pub fn test_token(
    secret: &str,
    user_id: i64,
    role: super::model::Role,
    is_active: bool,
) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = PrincipalClaims {
        sub: user_id.to_string(),
        role,
        category_ids: vec![],
        is_active,
        exp: (chrono::Utc::now().timestamp() + 3600) as u64,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
