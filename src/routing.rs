//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Extension, Router,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState, Error,
    auth::{auth_guard, post_log_in, register_user},
    dashboard::get_dashboard_summary,
    endpoints,
    transaction::{
        TransactionKind, create_transaction_endpoint, delete_transaction_endpoint,
        download_transactions_endpoint, get_transactions_endpoint,
    },
    upload::upload_image,
    user::get_user_info_endpoint,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::UPLOAD_IMAGE, post(upload_image));

    let protected_routes = Router::new()
        .route(endpoints::USER_INFO, get(get_user_info_endpoint))
        .route(endpoints::DASHBOARD, get(get_dashboard_summary))
        .nest(
            endpoints::INCOME_API,
            transaction_routes(TransactionKind::Income),
        )
        .nest(
            endpoints::EXPENSE_API,
            transaction_routes(TransactionKind::Expense),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::UPLOADS, ServeDir::new(&state.upload_dir))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The routes shared by incomes and expenses. The handlers receive `kind` as an extension.
fn transaction_routes(kind: TransactionKind) -> Router<AppState> {
    Router::new()
        .route(endpoints::ADD_TRANSACTION, post(create_transaction_endpoint))
        .route(endpoints::GET_TRANSACTIONS, get(get_transactions_endpoint))
        .route(
            endpoints::DOWNLOAD_TRANSACTIONS,
            get(download_transactions_endpoint),
        )
        .route(
            endpoints::DELETE_TRANSACTION,
            delete(delete_transaction_endpoint),
        )
        .layer(Extension(kind))
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{endpoints, test_utils::get_test_server};

    #[tokio::test]
    async fn unknown_route_responds_with_json_404() {
        let server = get_test_server();

        let response = server.get("/api/v1/coffee").await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({ "message": "the requested resource could not be found" }));
    }

    #[tokio::test]
    async fn protected_routes_reject_invalid_token() {
        let server = get_test_server();

        for path in [
            endpoints::USER_INFO.to_owned(),
            endpoints::DASHBOARD.to_owned(),
            format!("{}{}", endpoints::INCOME_API, endpoints::GET_TRANSACTIONS),
            format!(
                "{}{}",
                endpoints::EXPENSE_API,
                endpoints::DOWNLOAD_TRANSACTIONS
            ),
        ] {
            let response = server
                .get(&path)
                .authorization_bearer("definitely.not.valid")
                .await;

            response.assert_status(StatusCode::UNAUTHORIZED);
            response.assert_json(&json!({ "message": "Not authorized, token failed" }));
        }
    }
}
