//! User registration, log-in and the bearer token guard for protected routes.

mod log_in;
mod middleware;
mod register;
mod token;

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    Error,
    user::{User, UserID, UserInfo},
};

pub use log_in::post_log_in;
pub use middleware::{AuthState, auth_guard};
pub use register::register_user;
pub use token::{DEFAULT_TOKEN_DURATION, JwtKeys, encode_token};

/// The response to a successful registration or log-in.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The ID of the authenticated user.
    pub id: UserID,
    /// The profile of the authenticated user.
    pub user: UserInfo,
    /// A bearer token for accessing protected routes.
    pub token: String,
}

impl AuthResponse {
    /// Issue a new token for `user`.
    ///
    /// # Errors
    /// Returns [Error::TokenCreation] if the token could not be signed.
    pub fn new(user: &User, token_duration: Duration, keys: &JwtKeys) -> Result<Self, Error> {
        Ok(Self {
            id: user.id,
            user: UserInfo::from(user),
            token: encode_token(user.id, token_duration, keys)?,
        })
    }
}
