//! Defines the core data models and database queries for income and expense transactions.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, user::UserID};

/// Alias for the integer type used for transaction IDs.
pub type TransactionId = i64;

// ============================================================================
// MODELS
// ============================================================================

/// The two kinds of transaction. The kind of a transaction is fixed when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money that was earned, labelled with its source, e.g. "Salary".
    Income,
    /// Money that was spent, labelled with its category, e.g. "Groceries".
    Expense,
}

impl TransactionKind {
    /// The name of the kind as stored in the database and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// The display name of the label column, e.g. in spreadsheet exports.
    pub fn label_heading(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Source",
            TransactionKind::Expense => "Category",
        }
    }

    /// The display name of the kind, e.g. "Income".
    pub fn title(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(FromSqlError::Other(
                format!("unknown transaction kind \"{other}\"").into(),
            )),
        }
    }
}

/// An income or expense recorded by a user.
///
/// On the wire the label is called `source` for income and `category` for
/// expenses, and the kind is sent as `type`.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "TransactionJson", try_from = "TransactionJson")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The ID of the user that owns the transaction.
    pub user_id: UserID,
    /// Whether the transaction is an income or an expense.
    pub kind: TransactionKind,
    /// The source of an income or the category of an expense.
    pub label: String,
    /// The amount of money earned or spent. Never negative.
    pub amount: f64,
    /// When the transaction happened.
    pub date: OffsetDateTime,
    /// An optional link to an icon, e.g. an emoji image.
    pub icon: Option<String>,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
    /// When the transaction was last modified.
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(kind: TransactionKind, label: &str, amount: f64) -> NewTransaction {
        NewTransaction {
            kind,
            label: label.to_owned(),
            amount,
            date: None,
            icon: None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionJson {
    id: TransactionId,
    user_id: UserID,
    #[serde(rename = "type")]
    kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    amount: f64,
    #[serde(with = "time::serde::rfc3339")]
    date: OffsetDateTime,
    #[serde(default)]
    icon: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl From<Transaction> for TransactionJson {
    fn from(transaction: Transaction) -> Self {
        let (source, category) = match transaction.kind {
            TransactionKind::Income => (Some(transaction.label), None),
            TransactionKind::Expense => (None, Some(transaction.label)),
        };

        Self {
            id: transaction.id,
            user_id: transaction.user_id,
            kind: transaction.kind,
            source,
            category,
            amount: transaction.amount,
            date: transaction.date,
            icon: transaction.icon,
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
        }
    }
}

impl TryFrom<TransactionJson> for Transaction {
    type Error = String;

    fn try_from(json: TransactionJson) -> Result<Self, Self::Error> {
        let label = match json.kind {
            TransactionKind::Income => json.source.ok_or("income is missing its source")?,
            TransactionKind::Expense => json.category.ok_or("expense is missing its category")?,
        };

        Ok(Self {
            id: json.id,
            user_id: json.user_id,
            kind: json.kind,
            label,
            amount: json.amount,
            date: json.date,
            icon: json.icon,
            created_at: json.created_at,
            updated_at: json.updated_at,
        })
    }
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use time::macros::datetime;
///
/// let new_transaction = Transaction::build(TransactionKind::Expense, "Groceries", 45.99)
///     .date(datetime!(2025-01-15 0:00 UTC))
///     .icon(Some("https://cdn.jsdelivr.net/npm/emoji-datasource-apple/img/apple/64/1f6d2.png"));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct NewTransaction {
    /// Whether the transaction is an income or an expense.
    pub kind: TransactionKind,
    /// The source of an income or the category of an expense. Must not be empty.
    pub label: String,
    /// The amount of money earned or spent. Must be a finite, non-negative number.
    pub amount: f64,
    /// When the transaction happened. Defaults to the time it is recorded.
    pub date: Option<OffsetDateTime>,
    /// An optional link to an icon.
    pub icon: Option<String>,
}

impl NewTransaction {
    /// Set the date of the transaction.
    pub fn date(mut self, date: OffsetDateTime) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the icon of the transaction.
    pub fn icon(mut self, icon: Option<&str>) -> Self {
        self.icon = icon.map(str::to_owned);
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction for the user `user_id` in the database.
///
/// All timestamps are stored in UTC.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingFields] if the label is empty,
/// - [Error::InvalidAmount] if the amount is negative or not finite,
/// - [Error::NotFound] if `user_id` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if new_transaction.label.trim().is_empty() {
        return Err(Error::MissingFields);
    }

    if !new_transaction.amount.is_finite() || new_transaction.amount < 0.0 {
        return Err(Error::InvalidAmount(new_transaction.amount));
    }

    let now = OffsetDateTime::now_utc();
    let date = new_transaction.date.unwrap_or(now).to_offset(UtcOffset::UTC);

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, kind, label, amount, date, icon, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             RETURNING id, user_id, kind, label, amount, date, icon, created_at, updated_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                new_transaction.kind,
                new_transaction.label.trim(),
                new_transaction.amount,
                date,
                &new_transaction.icon,
                now,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get the transactions of `kind` owned by `user_id`, newest first.
///
/// At most `limit` transactions are returned if `limit` is set.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions(
    user_id: UserID,
    kind: TransactionKind,
    limit: Option<u32>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    // A negative limit means no limit in SQLite.
    let limit = limit.map(i64::from).unwrap_or(-1);

    connection
        .prepare(
            "SELECT id, user_id, kind, label, amount, date, icon, created_at, updated_at
             FROM \"transaction\"
             WHERE user_id = ?1 AND kind = ?2
             ORDER BY date DESC, id DESC
             LIMIT ?3",
        )?
        .query_map((user_id.as_i64(), kind, limit), map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Get the transactions of `kind` owned by `user_id` dated on or after `since`, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions_since(
    user_id: UserID,
    kind: TransactionKind,
    since: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, kind, label, amount, date, icon, created_at, updated_at
             FROM \"transaction\"
             WHERE user_id = ?1 AND kind = ?2 AND date >= ?3
             ORDER BY date DESC, id DESC",
        )?
        .query_map(
            (user_id.as_i64(), kind, since.to_offset(UtcOffset::UTC)),
            map_transaction_row,
        )?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

type RowsAffected = usize;

/// Delete the transaction of `kind` with `id` if it is owned by `user_id`.
///
/// Deleting a transaction that does not exist, or that belongs to another
/// user, is not an error: no rows are affected.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_transaction(
    user_id: UserID,
    kind: TransactionKind,
    id: TransactionId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND kind = ?2 AND user_id = ?3",
            (id, kind, user_id.as_i64()),
        )
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
                label TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount >= 0),
                date TEXT NOT NULL,
                icon TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE TRIGGER IF NOT EXISTS transaction_kind_is_immutable
            BEFORE UPDATE OF kind ON \"transaction\"
            WHEN NEW.kind <> OLD.kind
            BEGIN
                SELECT RAISE(ABORT, 'the kind of a transaction cannot be changed');
            END;",
        (),
    )?;

    // Covers the per-owner, per-kind queries used by the list and dashboard endpoints.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_kind_date
            ON \"transaction\"(user_id, kind, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        kind: row.get(2)?,
        label: row.get(3)?,
        amount: row.get(4)?,
        date: row.get(5)?,
        icon: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod serialization_tests {
    use serde_json::{Value, json};
    use time::macros::datetime;

    use crate::{
        transaction::{Transaction, TransactionKind},
        user::UserID,
    };

    fn transaction(kind: TransactionKind, label: &str) -> Transaction {
        Transaction {
            id: 1,
            user_id: UserID::new(2),
            kind,
            label: label.to_owned(),
            amount: 12.5,
            date: datetime!(2025-01-15 0:00 UTC),
            icon: None,
            created_at: datetime!(2025-01-16 8:00 UTC),
            updated_at: datetime!(2025-01-16 8:00 UTC),
        }
    }

    #[test]
    fn income_serializes_label_as_source() {
        let value = serde_json::to_value(transaction(TransactionKind::Income, "Salary")).unwrap();

        assert_eq!(value["type"], json!("income"));
        assert_eq!(value["source"], json!("Salary"));
        assert_eq!(value.get("category"), None);
        assert_eq!(value["date"], json!("2025-01-15T00:00:00Z"));
        assert_eq!(value["userId"], json!(2));
    }

    #[test]
    fn expense_serializes_label_as_category() {
        let value = serde_json::to_value(transaction(TransactionKind::Expense, "Rent")).unwrap();

        assert_eq!(value["type"], json!("expense"));
        assert_eq!(value["category"], json!("Rent"));
        assert_eq!(value.get("source"), None::<&Value>);
    }

    #[test]
    fn deserialize_fails_without_label() {
        let value = json!({
            "id": 1,
            "userId": 2,
            "type": "expense",
            "source": "Salary",
            "amount": 12.5,
            "date": "2025-01-15T00:00:00Z",
            "createdAt": "2025-01-16T08:00:00Z",
            "updatedAt": "2025-01-16T08:00:00Z",
        });

        assert!(serde_json::from_value::<Transaction>(value).is_err());
    }
}
