pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod response;

use actix_web::{web, HttpResponse};
use std::sync::Arc;
use std::time::Duration;

pub use auth::{AuthService, TokenIssuer};
pub use config::Settings;
pub use db::{PgUserStore, PublicUser, User, UserStore};
pub use error::AppError;
pub use media::{HttpMediaClient, MediaStorage};
pub use response::ApiResponse;

pub type Result<T> = std::result::Result<T, AppError>;

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Production wiring: Postgres-backed store and the HTTP media client.
    pub async fn new(config: Settings) -> Result<Self> {
        let store = PgUserStore::new_with_options(
            &config.database.url,
            config.database.max_connections,
            Duration::from_secs(config.database.acquire_timeout_secs),
        )
        .await?;

        if config.database.run_migrations {
            sqlx::migrate!("./migrations")
                .run(store.pool())
                .await
                .map_err(|e| AppError::Internal(format!("migration failed: {}", e)))?;
        }

        let media = HttpMediaClient::new(&config.media)?;
        Ok(Self::with_components(config, Arc::new(store), Arc::new(media)))
    }

    /// Wires the service over any store and media implementation; the seam
    /// the integration tests use.
    pub fn with_components(
        config: Settings,
        store: Arc<dyn UserStore>,
        media: Arc<dyn MediaStorage>,
    ) -> Self {
        let tokens = TokenIssuer::new(config.auth.clone());
        let auth = AuthService::new(store, media, tokens);
        Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
        }
    }
}

/// The account API surface. Shared between `main` and the HTTP tests so the
/// route table cannot drift.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    use auth::handlers;

    cfg.route("/health", web::get().to(health_check)).service(
        web::scope("/api/v1/users")
            .route("/register", web::post().to(handlers::register))
            .route("/login", web::post().to(handlers::login))
            .route("/logout", web::post().to(handlers::logout))
            .route("/refresh-token", web::post().to(handlers::refresh_token))
            .route("/change-password", web::post().to(handlers::change_password))
            .route("/current-user", web::get().to(handlers::current_user))
            .route("/update-account", web::patch().to(handlers::update_account))
            .route("/avatar", web::patch().to(handlers::update_avatar)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health_check() {
        let app =
            test::init_service(App::new().route("/health", web::get().to(health_check))).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
    }
}
