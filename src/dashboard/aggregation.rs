//! Sums, trailing windows and the recent activity feed over a user's transactions.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    transaction::{Transaction, TransactionKind, get_transactions, get_transactions_since},
    user::UserID,
};

/// The trailing window used for the recent expenses total.
pub const EXPENSE_WINDOW_DAYS: i64 = 30;

/// The trailing window used for the recent income total.
pub const INCOME_WINDOW_DAYS: i64 = 60;

/// How many of the newest incomes, and of the newest expenses, go into the recent activity feed.
pub const RECENT_TRANSACTIONS_PER_KIND: u32 = 5;

/// The transactions in a trailing window and the sum of their amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowedSum {
    /// The sum of the amounts of `transactions`.
    pub total: f64,
    /// The transactions in the window, newest first.
    pub transactions: Vec<Transaction>,
}

/// The sum of the amounts of all of `user_id`'s transactions of `kind`, or zero if there are none.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn sum_transactions(
    user_id: UserID,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\"
             WHERE user_id = ?1 AND kind = ?2",
            (user_id.as_i64(), kind),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Get `user_id`'s transactions of `kind` dated within `days` days before `now`, and their total.
///
/// A transaction exactly `days` days old is included.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn windowed_sum(
    user_id: UserID,
    kind: TransactionKind,
    days: i64,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<WindowedSum, Error> {
    let since = now - Duration::days(days);
    let transactions = get_transactions_since(user_id, kind, since, connection)?;
    let total = transactions
        .iter()
        .fold(0.0, |total, transaction| total + transaction.amount);

    Ok(WindowedSum {
        total,
        transactions,
    })
}

/// Get the newest `per_kind_limit` incomes and the newest `per_kind_limit` expenses of `user_id`,
/// merged into one list, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn recent_transactions(
    user_id: UserID,
    per_kind_limit: u32,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut transactions = get_transactions(
        user_id,
        TransactionKind::Income,
        Some(per_kind_limit),
        connection,
    )?;
    transactions.extend(get_transactions(
        user_id,
        TransactionKind::Expense,
        Some(per_kind_limit),
        connection,
    )?);

    // Stable, so ties keep incomes before expenses.
    transactions.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::{
        dashboard::aggregation::{recent_transactions, sum_transactions, windowed_sum},
        test_utils::{get_test_connection, insert_test_user},
        transaction::{Transaction, TransactionKind, create_transaction, get_transactions},
    };

    const NOW: OffsetDateTime = datetime!(2025-10-05 12:00 UTC);

    fn add(
        conn: &rusqlite::Connection,
        user: &crate::User,
        kind: TransactionKind,
        amount: f64,
        date: OffsetDateTime,
    ) -> Transaction {
        create_transaction(
            user.id,
            Transaction::build(kind, "Test", amount).date(date),
            conn,
        )
        .unwrap()
    }

    #[test]
    fn sums_are_zero_without_transactions() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn, "jane@example.com");

        assert_eq!(
            sum_transactions(user.id, TransactionKind::Income, &conn),
            Ok(0.0)
        );

        let window = windowed_sum(user.id, TransactionKind::Expense, 30, NOW, &conn).unwrap();
        assert_eq!(window.total, 0.0);
        assert!(window.transactions.is_empty());
    }

    #[test]
    fn sum_matches_listed_amounts() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn, "jane@example.com");
        for (days_ago, amount) in [(1, 12.5), (100, 7.25), (400, 80.0)] {
            add(
                &conn,
                &user,
                TransactionKind::Expense,
                amount,
                NOW - Duration::days(days_ago),
            );
        }

        let listed_total: f64 = get_transactions(user.id, TransactionKind::Expense, None, &conn)
            .unwrap()
            .iter()
            .map(|transaction| transaction.amount)
            .sum();

        assert_eq!(
            sum_transactions(user.id, TransactionKind::Expense, &conn),
            Ok(listed_total)
        );
        assert_eq!(listed_total, 99.75);
    }

    #[test]
    fn sum_ignores_other_users_and_kinds() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn, "jane@example.com");
        let other_user = insert_test_user(&conn, "john@example.com");
        add(&conn, &user, TransactionKind::Income, 100.0, NOW);
        add(&conn, &user, TransactionKind::Expense, 20.0, NOW);
        add(&conn, &other_user, TransactionKind::Income, 1000.0, NOW);

        assert_eq!(
            sum_transactions(user.id, TransactionKind::Income, &conn),
            Ok(100.0)
        );
    }

    #[test]
    fn window_includes_only_transactions_since_cutoff() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn, "jane@example.com");
        let other_user = insert_test_user(&conn, "john@example.com");
        let on_boundary = add(
            &conn,
            &user,
            TransactionKind::Expense,
            1.0,
            NOW - Duration::days(30),
        );
        let inside = add(
            &conn,
            &user,
            TransactionKind::Expense,
            2.0,
            NOW - Duration::days(2),
        );
        add(
            &conn,
            &user,
            TransactionKind::Expense,
            4.0,
            NOW - Duration::days(30) - Duration::seconds(1),
        );
        add(
            &conn,
            &other_user,
            TransactionKind::Expense,
            8.0,
            NOW - Duration::days(1),
        );

        let window = windowed_sum(user.id, TransactionKind::Expense, 30, NOW, &conn).unwrap();

        assert_eq!(window.transactions, vec![inside, on_boundary]);
        assert_eq!(window.total, 3.0);
    }

    #[test]
    fn recent_transactions_merges_newest_of_each_kind() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn, "jane@example.com");
        for days_ago in 0..7 {
            add(
                &conn,
                &user,
                TransactionKind::Income,
                1.0,
                NOW - Duration::days(2 * days_ago),
            );
            add(
                &conn,
                &user,
                TransactionKind::Expense,
                1.0,
                NOW - Duration::days(2 * days_ago + 1),
            );
        }

        let recent = recent_transactions(user.id, 5, &conn).unwrap();

        assert_eq!(recent.len(), 10);
        assert!(recent.windows(2).all(|pair| pair[0].date >= pair[1].date));
        assert_eq!(
            recent
                .iter()
                .filter(|t| t.kind == TransactionKind::Income)
                .count(),
            5
        );
        assert_eq!(recent[0].date, NOW);
        assert_eq!(recent[0].kind, TransactionKind::Income);
        assert_eq!(recent[1].kind, TransactionKind::Expense);
    }

    #[test]
    fn recent_transactions_returns_fewer_when_fewer_exist() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn, "jane@example.com");
        add(&conn, &user, TransactionKind::Expense, 1.0, NOW);

        let recent = recent_transactions(user.id, 5, &conn).unwrap();

        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn aggregations_are_idempotent() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn, "jane@example.com");
        add(&conn, &user, TransactionKind::Income, 10.0, NOW);
        add(
            &conn,
            &user,
            TransactionKind::Expense,
            5.0,
            NOW - Duration::days(3),
        );

        assert_eq!(
            sum_transactions(user.id, TransactionKind::Income, &conn),
            sum_transactions(user.id, TransactionKind::Income, &conn)
        );
        assert_eq!(
            windowed_sum(user.id, TransactionKind::Expense, 30, NOW, &conn),
            windowed_sum(user.id, TransactionKind::Expense, 30, NOW, &conn)
        );
        assert_eq!(
            recent_transactions(user.id, 5, &conn),
            recent_transactions(user.id, 5, &conn)
        );
    }
}
