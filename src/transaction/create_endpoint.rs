//! Defines the endpoint for adding an income or expense.

use axum::{Extension, Json, extract::State};
use axum_extra::extract::WithRejection;

use crate::{
    Error,
    transaction::{
        Transaction, TransactionKind, TransactionState, core::create_transaction,
        form::TransactionForm,
    },
    user::UserID,
};

/// A route handler for adding a transaction for the logged in user, responds with the new transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Extension(kind): Extension<TransactionKind>,
    WithRejection(Json(form), _): WithRejection<Json<TransactionForm>, Error>,
) -> Result<Json<Transaction>, Error> {
    let new_transaction = form.into_new_transaction(kind)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(user_id, new_transaction, &connection)
        .inspect_err(|error| tracing::error!("could not create {}: {error}", kind.as_str()))?;

    tracing::debug!(
        "created {} {} for user {user_id}",
        kind.as_str(),
        transaction.id
    );

    Ok(Json(transaction))
}
