//! The endpoint for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error, PasswordHash,
    auth::{AuthResponse, token::JwtKeys},
    user::{NewUser, create_user},
};

/// The state needed for creating a new user.
#[derive(Clone)]
pub struct RegistrationState {
    /// The keys used for signing tokens.
    pub jwt_keys: JwtKeys,
    /// The duration for which an issued token is valid.
    pub token_duration: Duration,
    /// The bcrypt cost used when hashing the new password.
    pub password_cost: u32,
    /// The database connection for creating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            password_cost: state.password_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data for registering a new user.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    /// The user's name.
    #[serde(default)]
    pub full_name: String,
    /// The email address to log in with.
    #[serde(default)]
    pub email: String,
    /// The raw password.
    #[serde(default)]
    pub password: String,
    /// A link to a previously uploaded profile image.
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

/// A route handler for registering a new user.
///
/// Responds with 201 Created, the new user and a token for the new user.
pub async fn register_user(
    State(state): State<RegistrationState>,
    WithRejection(Json(form), _): WithRejection<Json<RegisterForm>, Error>,
) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    let full_name = form.full_name.trim();

    if full_name.is_empty() || form.email.trim().is_empty() || form.password.is_empty() {
        return Err(Error::MissingFields);
    }

    let email: EmailAddress = form
        .email
        .trim()
        .parse()
        .map_err(|_| Error::InvalidEmail(form.email.clone()))?;

    let password_hash = PasswordHash::new(&form.password, state.password_cost)
        .inspect_err(|error| tracing::error!("could not hash password: {error}"))?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = create_user(
        NewUser {
            full_name: full_name.to_owned(),
            email,
            password_hash,
            profile_image_url: form.profile_image_url.filter(|url| !url.is_empty()),
        },
        &connection,
    )?;

    tracing::info!("registered user {}", user.id);

    let response = AuthResponse::new(&user, state.token_duration, &state.jwt_keys)?;

    Ok((StatusCode::CREATED, Json(response)))
}
