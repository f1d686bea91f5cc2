use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use tracing::warn;

use crate::config::TokenCarrier;
use crate::db::models::PublicUser;
use crate::error::AppError;
use crate::AppState;

/// Cookie names used for the two token carriers.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Request guard: extracting this in a handler enforces a valid, unexpired
/// access token and yields the sanitized principal it names. The token is
/// read from exactly one configured carrier.
///
/// Stateless access tokens cannot see a revocation before they expire; a
/// principal deleted after issuance is caught here by the store lookup.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub PublicUser);

fn extract_token(req: &HttpRequest, carrier: TokenCarrier) -> Option<String> {
    match carrier {
        TokenCarrier::Cookie => req
            .cookie(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string()),
        TokenCarrier::Header => req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.to_string()),
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| AppError::Internal("application state missing".to_string()))?;

            let token = extract_token(&req, state.config.auth.carrier()).ok_or_else(|| {
                warn!("request to {} without an access token", req.path());
                AppError::Unauthorized("unauthorized access".to_string())
            })?;

            let user = state.auth.authenticate(&token).await.map_err(|e| {
                warn!("rejected access token on {}: {}", req.path(), e);
                e
            })?;

            Ok(AuthenticatedUser(user))
        })
    }
}
