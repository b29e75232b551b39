//! MoneyMap is a web app for tracking personal income and expenses.
//!
//! This library provides a JSON REST API: users register and log in, record
//! income and expense transactions, view an aggregated dashboard summary and
//! export their transactions as spreadsheets.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod dashboard;
mod db;
mod endpoints;
mod logging;
mod password;
mod routing;
mod transaction;
mod upload;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use dashboard::{DashboardSummary, WindowedSum, build_dashboard_summary};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::PasswordHash;
pub use routing::build_router;
pub use transaction::{NewTransaction, Transaction, TransactionKind, create_transaction};
pub use user::{NewUser, User, UserID, UserInfo, create_user};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing or empty in the request body.
    #[error("All fields are required")]
    MissingFields,

    /// The amount of a transaction was negative or not a finite number.
    #[error("amount must be a positive number, got {0}")]
    InvalidAmount(f64),

    /// The date of a transaction could not be parsed.
    ///
    /// Dates must either be a calendar date "YYYY-MM-DD" or an RFC 3339 timestamp.
    #[error("could not parse the date \"{0}\"")]
    InvalidDate(String),

    /// The email address provided during registration is not a valid email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email address provided during registration belongs to another user.
    #[error("Email already in use")]
    DuplicateEmail,

    /// The user provided an unknown email or the wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The request to a protected route did not include a bearer token.
    #[error("Not authorized, no token")]
    MissingToken,

    /// The bearer token could not be verified or has expired.
    #[error("Not authorized, token failed")]
    InvalidToken,

    /// A JSON web token could not be created for the user.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The image upload request did not contain an image file.
    #[error("No file uploaded")]
    NoFileUploaded,

    /// The uploaded file is not one of the supported image formats.
    #[error("Only .jpeg, .jpg, and .png formats are allowed")]
    UnsupportedImageType,

    /// The multipart form could not be parsed.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The request body, path or query string could not be parsed into the
    /// type a route handler expects, e.g. a JSON boolean where a number belongs.
    #[error("{0}")]
    InvalidRequest(String),

    /// An uploaded file could not be saved to disk.
    #[error("could not save uploaded file: {0}")]
    FileWriteError(String),

    /// The spreadsheet for an export could not be generated.
    #[error("could not export transactions: {0}")]
    ExportError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows or when
    /// a record references a user that does not exist.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::NotFound
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Error::MultipartError(rejection.body_text())
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingFields
            | Error::InvalidAmount(_)
            | Error::InvalidDate(_)
            | Error::InvalidEmail(_)
            | Error::DuplicateEmail
            | Error::InvalidCredentials
            | Error::NoFileUploaded
            | Error::UnsupportedImageType
            | Error::MultipartError(_)
            | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::MissingToken | Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::TokenCreation(_)
            | Error::HashingError(_)
            | Error::FileWriteError(_)
            | Error::ExportError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "Server Error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
