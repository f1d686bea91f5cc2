use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::db::models::User;
use crate::error::AppError;

/// Claims carried by the short-lived access token. Verified statelessly:
/// signature and expiry only.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub sub: String,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by the refresh token: identity plus a unique token id.
/// The `jti` makes every mint distinct, so rotation always produces a new
/// value; whether the token is still live is decided against the stored
/// value, not the claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mints and verifies both token classes. Secrets and lifetimes come from
/// configuration at construction; minting is a pure function of the input,
/// the secret, and the clock.
pub struct TokenIssuer {
    config: AuthConfig,
}

impl TokenIssuer {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn issue_access(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.config.access_token_expiry_minutes)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.access_token_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("token minting failed: {}", e)))
    }

    pub fn issue_refresh(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user.id.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(self.config.refresh_token_expiry_days)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.refresh_token_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("token minting failed: {}", e)))
    }

    /// Any verification failure is reported as the same `Unauthorized` so
    /// callers cannot tell a bad signature from an expired token.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.config.access_token_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized("invalid access token".to_string()))
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.config.refresh_token_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized("invalid refresh token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn test_config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "access_secret".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_secret: "refresh_secret".to_string(),
            refresh_token_expiry_days: 10,
            token_carrier: "cookie".to_string(),
        }
    }

    fn test_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "ana".to_string(),
            email: "ana@x.com".to_string(),
            full_name: "Ana Lee".to_string(),
            password_hash: "hash".to_string(),
            role: Default::default(),
            avatar_url: "https://cdn.test/a.png".to_string(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_access_roundtrip() {
        let issuer = TokenIssuer::new(test_config());
        let user = test_user();

        let token = issuer.issue_access(&user).unwrap();
        let claims = issuer.verify_access(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, "ana@x.com");
        assert_eq!(claims.username, "ana");
        assert_eq!(claims.full_name, "Ana Lee");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_roundtrip() {
        let issuer = TokenIssuer::new(test_config());
        let user = test_user();

        let token = issuer.issue_refresh(&user).unwrap();
        let claims = issuer.verify_refresh(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
    }

    #[test]
    fn test_refresh_tokens_are_unique_per_mint() {
        let issuer = TokenIssuer::new(test_config());
        let user = test_user();
        let first = issuer.issue_refresh(&user).unwrap();
        let second = issuer.issue_refresh(&user).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenIssuer::new(test_config());
        let mut other_config = test_config();
        other_config.access_token_secret = "different".to_string();
        let other = TokenIssuer::new(other_config);

        let token = issuer.issue_access(&test_user()).unwrap();
        assert!(matches!(
            other.verify_access(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_access_token_is_not_a_refresh_token() {
        let issuer = TokenIssuer::new(test_config());
        let token = issuer.issue_access(&test_user()).unwrap();
        assert!(matches!(
            issuer.verify_refresh(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut config = test_config();
        // exp far enough in the past to clear the default validation leeway
        config.access_token_expiry_minutes = -5;
        let issuer = TokenIssuer::new(config);

        let token = issuer.issue_access(&test_user()).unwrap();
        assert!(matches!(
            issuer.verify_access(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issuer = TokenIssuer::new(test_config());
        let mut token = issuer.issue_access(&test_user()).unwrap();
        token.push('x');
        assert!(matches!(
            issuer.verify_access(&token),
            Err(AppError::Unauthorized(_))
        ));
    }
}
