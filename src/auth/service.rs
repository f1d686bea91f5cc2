use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::tokens::TokenIssuer;
use crate::db::models::{NewUser, ProfileChanges, PublicUser, User, UserRole};
use crate::db::operations::UserStore;
use crate::error::AppError;
use crate::media::MediaStorage;

/// Everything needed to open an account.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub avatar_source: String,
}

/// Credentials presented at login. At least one identifier is required.
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// The access/refresh pair returned by login and refresh.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates the session lifecycle over the store, the token issuer and
/// the media host. A principal is `Authenticated` exactly while a refresh
/// token is stored on its record; login sets it, logout and invalidation
/// clear it, and refresh replaces it (rotation).
pub struct AuthService {
    store: Arc<dyn UserStore>,
    media: Arc<dyn MediaStorage>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, media: Arc<dyn MediaStorage>, tokens: TokenIssuer) -> Self {
        Self {
            store,
            media,
            tokens,
        }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<PublicUser, AppError> {
        let blank = [
            &input.full_name,
            &input.email,
            &input.username,
            &input.password,
            &input.avatar_source,
        ]
        .iter()
        .any(|field| field.trim().is_empty());
        if blank {
            return Err(AppError::Validation("all fields are required".to_string()));
        }

        let username = input.username.trim().to_lowercase();
        let email = input.email.trim().to_lowercase();

        if self
            .store
            .find_by_username_or_email(&username, &email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "an account with this username or email already exists".to_string(),
            ));
        }

        let avatar = self.media.upload(input.avatar_source.trim()).await?;

        let created = self
            .store
            .create(NewUser {
                username,
                email,
                full_name: input.full_name.trim().to_string(),
                password: input.password,
                avatar_url: avatar.url,
                role: UserRole::default(),
            })
            .await?;

        let user = self.store.find_by_id(created.id).await?.ok_or_else(|| {
            AppError::Internal("something went wrong while registering the account".to_string())
        })?;

        info!("registered account {}", user.username);
        Ok(user.into())
    }

    pub async fn login(&self, input: LoginInput) -> Result<(PublicUser, SessionTokens), AppError> {
        let identifier = input
            .username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .or(input.email.as_deref().filter(|e| !e.trim().is_empty()))
            .map(|id| id.trim().to_lowercase())
            .ok_or_else(|| {
                AppError::Validation("username or email is required".to_string())
            })?;

        let user = self
            .store
            .find_by_username_or_email(&identifier, &identifier)
            .await?
            .ok_or_else(|| AppError::NotFound("account does not exist".to_string()))?;

        if !user.verify_password(&input.password)? {
            return Err(AppError::Unauthorized("invalid credentials".to_string()));
        }

        let tokens = self.issue_session(&user).await?;
        info!("account {} logged in", user.username);
        Ok((user.into(), tokens))
    }

    /// Clears the stored refresh token. Clearing an already signed-out
    /// account is a no-op, not an error.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        self.store.update_refresh_token(user_id, None).await?;
        info!("account {} logged out", user_id);
        Ok(())
    }

    /// Exchanges a refresh token for a new access/refresh pair. The
    /// presented token must equal the single stored value; once exchanged,
    /// the old value is overwritten and any replay is rejected.
    pub async fn refresh_session(
        &self,
        presented: Option<String>,
    ) -> Result<SessionTokens, AppError> {
        let presented = presented
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::Unauthorized("unauthorized request".to_string()))?;

        let claims = self.tokens.verify_refresh(&presented)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("invalid refresh token".to_string()))?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid refresh token".to_string()))?;

        if user.refresh_token.as_deref() != Some(presented.as_str()) {
            return Err(AppError::Unauthorized(
                "refresh token is expired or used".to_string(),
            ));
        }

        let tokens = self.issue_session(&user).await?;
        info!("rotated refresh token for {}", user.username);
        Ok(tokens)
    }

    /// Existing sessions stay valid across a password change; only the
    /// accepted credential switches.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if old_password.trim().is_empty() || new_password.trim().is_empty() {
            return Err(AppError::Validation("all fields are required".to_string()));
        }

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("account does not exist".to_string()))?;

        if !user.verify_password(old_password)? {
            return Err(AppError::Unauthorized("invalid old password".to_string()));
        }

        self.store
            .update_password(user_id, new_password.to_string())
            .await?;
        info!("password changed for {}", user.username);
        Ok(())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        full_name: Option<String>,
        email: Option<String>,
    ) -> Result<PublicUser, AppError> {
        let full_name = match full_name {
            Some(name) if name.trim().is_empty() => {
                return Err(AppError::Validation("full name must not be blank".to_string()))
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        let email = match email {
            Some(email) if email.trim().is_empty() => {
                return Err(AppError::Validation("email must not be blank".to_string()))
            }
            Some(email) => Some(email.trim().to_lowercase()),
            None => None,
        };

        if full_name.is_none() && email.is_none() {
            return Err(AppError::Validation(
                "at least one field is required".to_string(),
            ));
        }

        let user = self
            .store
            .update_profile(user_id, ProfileChanges { full_name, email })
            .await?;
        Ok(user.into())
    }

    /// The previous avatar reference is left for external cleanup.
    pub async fn update_avatar(
        &self,
        user_id: Uuid,
        avatar_source: &str,
    ) -> Result<PublicUser, AppError> {
        if avatar_source.trim().is_empty() {
            return Err(AppError::Validation("avatar file is required".to_string()));
        }

        let avatar = self.media.upload(avatar_source.trim()).await?;
        let user = self.store.update_avatar(user_id, avatar.url).await?;
        Ok(user.into())
    }

    /// Request-time resolution for the authorization gate: verify the access
    /// token and resolve the principal with secrets omitted. A principal
    /// deleted after issuance is indistinguishable from a bad token.
    pub async fn authenticate(&self, access_token: &str) -> Result<PublicUser, AppError> {
        let claims = self.tokens.verify_access(access_token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("invalid access token".to_string()))?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid access token".to_string()))?;

        Ok(user.into())
    }

    /// Mints both tokens and persists the refresh token in one step; this is
    /// the `Anonymous` -> `Authenticated` transition. Concurrent calls for
    /// the same principal race last-writer-wins on the stored value.
    async fn issue_session(&self, user: &User) -> Result<SessionTokens, AppError> {
        let access_token = self.tokens.issue_access(user)?;
        let refresh_token = self.tokens.issue_refresh(user)?;

        self.store
            .update_refresh_token(user.id, Some(refresh_token.clone()))
            .await?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
        })
    }
}
