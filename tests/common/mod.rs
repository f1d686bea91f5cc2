//! Shared fixtures for the integration suites: an in-memory store honoring
//! the `UserStore` contract and a stub media host.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use staffdesk_server::db::{NewUser, ProfileChanges, User, UserStore};
use staffdesk_server::error::AppError;
use staffdesk_server::media::{MediaAsset, MediaStorage};
use staffdesk_server::{AppState, Settings};

// Low bcrypt cost keeps the suites fast; verification is cost-agnostic.
const TEST_BCRYPT_COST: u32 = 4;

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-side inspection of the persisted refresh token.
    pub async fn stored_refresh_token(&self, id: Uuid) -> Option<String> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.id == id)
            .and_then(|u| u.refresh_token.clone())
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(AppError::Conflict(
                "username or email already taken".to_string(),
            ));
        }

        let password_hash = bcrypt::hash(&new_user.password, TEST_BCRYPT_COST)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            full_name: new_user.full_name,
            password_hash,
            role: new_user.role,
            avatar_url: new_user.avatar_url,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_refresh_token(
        &self,
        id: Uuid,
        refresh_token: Option<String>,
    ) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.refresh_token = refresh_token;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, new_password: String) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("record not found".to_string()))?;
        user.password_hash = bcrypt::hash(&new_password, TEST_BCRYPT_COST)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("record not found".to_string()))?;
        if let Some(full_name) = changes.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_avatar(&self, id: Uuid, avatar_url: String) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("record not found".to_string()))?;
        user.avatar_url = avatar_url;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

/// Media host double: succeeds with a deterministic URL derived from the
/// file name, or fails when constructed with `failing()`.
pub struct StubMediaStorage {
    fail: bool,
}

impl StubMediaStorage {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl MediaStorage for StubMediaStorage {
    async fn upload(&self, source: &str) -> Result<MediaAsset, AppError> {
        if self.fail {
            return Err(AppError::Upload("media host unavailable".to_string()));
        }
        let name = Path::new(source)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        Ok(MediaAsset {
            url: format!("https://media.test/{}", name),
        })
    }
}

pub fn test_settings() -> Settings {
    Settings::new().expect("Failed to load settings")
}

/// App state over the in-memory fixtures; the store handle is returned for
/// direct inspection.
pub fn test_state() -> (AppState, Arc<InMemoryUserStore>) {
    let store = Arc::new(InMemoryUserStore::new());
    let state = AppState::with_components(
        test_settings(),
        store.clone(),
        Arc::new(StubMediaStorage::new()),
    );
    (state, store)
}
