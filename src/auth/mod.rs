//! Session lifecycle for the account service: credential verification,
//! dual-token issuance, refresh-token rotation, and the per-request
//! authorization gate.

pub mod guard;
pub mod handlers;
pub mod service;
pub mod tokens;

pub use guard::{AuthenticatedUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use service::{AuthService, LoginInput, RegisterInput, SessionTokens};
pub use tokens::{AccessClaims, RefreshClaims, TokenIssuer};
