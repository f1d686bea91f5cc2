use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::auth::guard::{AuthenticatedUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::auth::service::{LoginInput, RegisterInput, SessionTokens};
use crate::db::models::PublicUser;
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    /// Locally staged avatar file handle, forwarded to the media host.
    pub avatar: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAvatarRequest {
    pub avatar: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionPayload {
    user: PublicUser,
    access_token: String,
    refresh_token: String,
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(true)
        .finish()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = session_cookie(name, String::new());
    cookie.make_removal();
    cookie
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    info!("received registration request for username: {}", req.username);

    match state
        .auth
        .register(RegisterInput {
            full_name: req.full_name,
            email: req.email,
            username: req.username,
            password: req.password,
            avatar_source: req.avatar,
        })
        .await
    {
        Ok(user) => Ok(ApiResponse::new(
            StatusCode::CREATED,
            user,
            "account registered successfully",
        )
        .into_http()),
        Err(e) => {
            error!("registration failed: {}", e);
            Err(e)
        }
    }
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();

    match state
        .auth
        .login(LoginInput {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await
    {
        Ok((user, tokens)) => {
            let envelope = ApiResponse::new(
                StatusCode::OK,
                SessionPayload {
                    user,
                    access_token: tokens.access_token.clone(),
                    refresh_token: tokens.refresh_token.clone(),
                },
                "logged in successfully",
            );
            Ok(HttpResponse::Ok()
                .cookie(session_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token))
                .cookie(session_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token))
                .json(envelope))
        }
        Err(e) => {
            error!("login failed: {}", e);
            Err(e)
        }
    }
}

pub async fn logout(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.auth.logout(user.0.id).await?;

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(ACCESS_TOKEN_COOKIE))
        .cookie(removal_cookie(REFRESH_TOKEN_COOKIE))
        .json(ApiResponse::new(
            StatusCode::OK,
            serde_json::json!({}),
            "logged out",
        )))
}

/// The refresh token is read from its cookie, falling back to the request
/// body for clients without cookie storage.
pub async fn refresh_token(
    http_req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let presented = http_req
        .cookie(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| body.and_then(|b| b.into_inner().refresh_token));

    let tokens: SessionTokens = state.auth.refresh_session(presented).await?;

    let envelope = ApiResponse::new(StatusCode::OK, tokens.clone(), "access token refreshed");
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token))
        .cookie(session_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token))
        .json(envelope))
}

pub async fn change_password(
    user: AuthenticatedUser,
    req: web::Json<ChangePasswordRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state
        .auth
        .change_password(user.0.id, &req.old_password, &req.new_password)
        .await?;

    Ok(ApiResponse::new(
        StatusCode::OK,
        serde_json::json!({}),
        "password changed successfully",
    )
    .into_http())
}

pub async fn current_user(user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
    Ok(ApiResponse::new(
        StatusCode::OK,
        user.0,
        "current account fetched successfully",
    )
    .into_http())
}

pub async fn update_account(
    user: AuthenticatedUser,
    req: web::Json<UpdateAccountRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let updated = state
        .auth
        .update_profile(user.0.id, req.full_name, req.email)
        .await?;

    Ok(ApiResponse::new(StatusCode::OK, updated, "account details updated").into_http())
}

pub async fn update_avatar(
    user: AuthenticatedUser,
    req: web::Json<UpdateAvatarRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let updated = state.auth.update_avatar(user.0.id, &req.avatar).await?;

    Ok(ApiResponse::new(StatusCode::OK, updated, "avatar updated").into_http())
}
