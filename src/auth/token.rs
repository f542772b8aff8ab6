// JWT token generation and validation service
//
// Identity provisioning (registration, login, password storage) lives in
// a separate identity service; this API only validates the bearer tokens
// that service issues.

use crate::auth::error::AuthError;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32, // user_id
    pub email: String,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
}

/// Token service for JWT operations
pub struct TokenService {
    secret: String,
    token_duration: i64, // in seconds
}

impl TokenService {
    /// Create a new TokenService with secret key.
    /// Tokens expire in 24 hours (86400 seconds), matching the issuer.
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            token_duration: 86_400,
        }
    }

    /// Generate an access token. The issuing identity service uses the
    /// same claims shape; this exists for tooling and tests.
    pub fn generate_access_token(&self, user_id: i32, email: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let exp = now + self.token_duration;

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now,
            exp,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Validate an access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::default();

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            // Check if the error is due to expiration
            if e.to_string().contains("ExpiredSignature") {
                AuthError::ExpiredToken
            } else {
                AuthError::InvalidToken
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // Helper to create a test token service
    fn test_token_service() -> TokenService {
        TokenService::new("test_secret_key_for_testing_purposes".to_string())
    }

    #[test]
    fn test_token_expiration_is_24_hours() {
        let service = test_token_service();
        let token = service.generate_access_token(1, "test@example.com").unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        let duration = claims.exp - claims.iat;
        assert_eq!(duration, 86_400);
    }

    #[test]
    fn test_token_claims_contain_user_identity() {
        let service = test_token_service();
        let user_id = 42;
        let email = "user@example.com";

        let token = service.generate_access_token(user_id, email).unwrap();
        let claims = service.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, email);
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let service = test_token_service();

        assert!(service.validate_access_token("").is_err());
        assert!(service.validate_access_token("not.a.token").is_err());
        assert!(service.validate_access_token("invalid_token_format").is_err());
        assert!(service
            .validate_access_token("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature")
            .is_err());
    }

    #[test]
    fn test_token_signature_verification() {
        let service1 = TokenService::new("secret1".to_string());
        let service2 = TokenService::new("secret2".to_string());

        let token = service1.generate_access_token(1, "test@example.com").unwrap();

        assert!(service1.validate_access_token(&token).is_ok());
        assert!(service2.validate_access_token(&token).is_err());
    }

    proptest! {
        #[test]
        fn prop_valid_tokens_are_accepted(
            user_id in 1i32..1000000,
            email in "[a-z]{3,10}@[a-z]{3,10}\\.(com|org|net)"
        ) {
            let service = test_token_service();

            let token = service.generate_access_token(user_id, &email)?;
            let claims = service.validate_access_token(&token)?;
            prop_assert_eq!(claims.sub, user_id);
            prop_assert_eq!(claims.email, email);
        }

        #[test]
        fn prop_malformed_tokens_rejected(
            malformed in "[a-zA-Z0-9]{10,50}"
        ) {
            let service = test_token_service();

            let result = service.validate_access_token(&malformed);
            prop_assert!(result.is_err());
        }
    }
}
