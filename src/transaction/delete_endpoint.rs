use axum::{
    Extension, Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};

use crate::{
    Error,
    transaction::{TransactionId, TransactionKind, TransactionState, core::delete_transaction},
    user::UserID,
};

/// A route handler for deleting one of the logged in user's transactions.
///
/// Responds with success even if the transaction does not exist or belongs to
/// another user, in which case nothing is deleted.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Extension(kind): Extension<TransactionKind>,
    WithRejection(Path(transaction_id), _): WithRejection<Path<TransactionId>, Error>,
) -> Result<Json<Value>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rows_affected = delete_transaction(user_id, kind, transaction_id, &connection)
        .inspect_err(|error| {
            tracing::error!(
                "Could not delete {} {transaction_id}: {error}",
                kind.as_str()
            )
        })?;

    if rows_affected == 0 {
        tracing::debug!(
            "user {user_id} tried to delete {} {transaction_id} which does not exist or is not theirs",
            kind.as_str()
        );
    }

    Ok(Json(
        json!({ "message": format!("{} deleted successfully", kind.title()) }),
    ))
}
