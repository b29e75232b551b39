//! Income and expense transactions.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `NewTransaction` builder for creating transactions
//! - Database functions for storing, querying, and deleting transactions
//! - Route handlers for adding, listing, deleting and exporting transactions
//!
//! The same handlers serve both the income and the expense routes, the
//! router tells them which [TransactionKind] they are serving via an
//! `Extension<TransactionKind>`.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod export;
mod form;
mod list_endpoint;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

pub use core::{
    NewTransaction, Transaction, TransactionId, TransactionKind, create_transaction,
    create_transaction_table, delete_transaction, get_transactions, get_transactions_since,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use export::download_transactions_endpoint;
pub use list_endpoint::get_transactions_endpoint;

/// The state needed by the transaction route handlers.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
