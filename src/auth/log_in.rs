//! The endpoint for logging in an existing user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{AuthResponse, token::JwtKeys},
    user::get_user_by_email,
};

/// The state needed for logging in a user.
#[derive(Clone)]
pub struct LogInState {
    /// The keys used for signing tokens.
    pub jwt_keys: JwtKeys,
    /// The duration for which an issued token is valid.
    pub token_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials entered during log-in.
#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    /// Email entered during log-in.
    #[serde(default)]
    pub email: String,
    /// Password entered during log-in.
    #[serde(default)]
    pub password: String,
}

/// Handler for log-in requests.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email or password is empty.
/// - The email does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<LogInState>,
    WithRejection(Json(credentials), _): WithRejection<Json<Credentials>, Error>,
) -> Result<Json<AuthResponse>, Error> {
    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return Err(Error::MissingFields);
    }

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_email(credentials.email.trim(), &connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidCredentials,
        error => error,
    })?;

    let password_is_correct = user
        .password_hash
        .verify(&credentials.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !password_is_correct {
        return Err(Error::InvalidCredentials);
    }

    AuthResponse::new(&user, state.token_duration, &state.jwt_keys).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        auth::AuthResponse,
        endpoints,
        test_utils::{TEST_EMAIL, TEST_PASSWORD, get_test_server, register_test_user},
    };

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_test_server();
        let registered = register_test_user(&server).await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD }))
            .await;

        response.assert_status_ok();
        let body = response.json::<AuthResponse>();
        assert_eq!(body.user, registered.user);
        assert!(!body.token.is_empty());
    }

    #[tokio::test]
    async fn log_in_token_grants_access_to_protected_routes() {
        let server = get_test_server();
        register_test_user(&server).await;

        let token = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD }))
            .await
            .json::<AuthResponse>()
            .token;

        server
            .get(endpoints::USER_INFO)
            .authorization_bearer(token)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": TEST_EMAIL }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "message": "All fields are required" }));
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let server = get_test_server();
        register_test_user(&server).await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": TEST_EMAIL, "password": "definitelyNotTheCorrectPassword" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "message": "Invalid credentials" }));
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "wrongemail@gmail.com", "password": TEST_PASSWORD }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "message": "Invalid credentials" }));
    }

    #[tokio::test]
    async fn log_in_fails_on_malformed_json_with_json_message() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": 42, "password": [] }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<serde_json::Value>();
        assert!(body["message"].is_string(), "{body}");
    }
}
