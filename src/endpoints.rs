//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/v1/income/{transaction_id}', use [format_endpoint].

/// The route for registering a new user.
pub const REGISTER: &str = "/api/v1/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/v1/auth/login";
/// The route for getting the profile of the logged in user.
pub const USER_INFO: &str = "/api/v1/auth/getUser";
/// The route for uploading a profile image.
pub const UPLOAD_IMAGE: &str = "/api/v1/auth/upload-image";
/// The route for the dashboard summary of the logged in user.
pub const DASHBOARD: &str = "/api/v1/dashboard";
/// The route that uploaded images are served from.
pub const UPLOADS: &str = "/uploads";

/// The root of the income routes.
pub const INCOME_API: &str = "/api/v1/income";
/// The root of the expense routes.
pub const EXPENSE_API: &str = "/api/v1/expense";

/// The route, relative to [INCOME_API] or [EXPENSE_API], for adding a transaction.
pub const ADD_TRANSACTION: &str = "/add";
/// The route, relative to [INCOME_API] or [EXPENSE_API], for listing transactions.
pub const GET_TRANSACTIONS: &str = "/get";
/// The route, relative to [INCOME_API] or [EXPENSE_API], for downloading transactions.
pub const DOWNLOAD_TRANSACTIONS: &str = "/downloadexcel";
/// The route, relative to [INCOME_API] or [EXPENSE_API], for deleting a transaction.
pub const DELETE_TRANSACTION: &str = "/{transaction_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
#[cfg_attr(not(test), allow(dead_code))]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
