//! Defines the endpoint for listing a user's incomes or expenses.

use axum::{Extension, Json, extract::State};

use crate::{
    Error,
    transaction::{Transaction, TransactionKind, TransactionState, core::get_transactions},
    user::UserID,
};

/// A route handler that responds with all of the logged in user's transactions of one kind, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Extension(kind): Extension<TransactionKind>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transactions(user_id, kind, None, &connection).map(Json)
}
