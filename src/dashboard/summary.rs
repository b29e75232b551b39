//! The dashboard summary of a user's finances.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    dashboard::aggregation::{
        EXPENSE_WINDOW_DAYS, INCOME_WINDOW_DAYS, RECENT_TRANSACTIONS_PER_KIND, WindowedSum,
        recent_transactions, sum_transactions, windowed_sum,
    },
    transaction::{Transaction, TransactionKind},
    user::UserID,
};

/// Totals, trailing windows and recent activity for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Total income minus total expenses.
    pub total_balance: f64,
    /// The sum of all incomes.
    pub total_income: f64,
    /// The sum of all expenses.
    pub total_expenses: f64,
    /// Expenses in the last 30 days.
    pub last_30_days_expenses: WindowedSum,
    /// Incomes in the last 60 days.
    pub last_60_days_income: WindowedSum,
    /// The newest incomes and expenses, newest first.
    pub recent_transactions: Vec<Transaction>,
}

/// Compute the dashboard summary for `user_id` as of `now`.
///
/// Everything is computed from the database on each call.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn build_dashboard_summary(
    user_id: UserID,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<DashboardSummary, Error> {
    let total_income = sum_transactions(user_id, TransactionKind::Income, connection)?;
    let total_expenses = sum_transactions(user_id, TransactionKind::Expense, connection)?;

    Ok(DashboardSummary {
        total_balance: total_income - total_expenses,
        total_income,
        total_expenses,
        last_30_days_expenses: windowed_sum(
            user_id,
            TransactionKind::Expense,
            EXPENSE_WINDOW_DAYS,
            now,
            connection,
        )?,
        last_60_days_income: windowed_sum(
            user_id,
            TransactionKind::Income,
            INCOME_WINDOW_DAYS,
            now,
            connection,
        )?,
        recent_transactions: recent_transactions(
            user_id,
            RECENT_TRANSACTIONS_PER_KIND,
            connection,
        )?,
    })
}
