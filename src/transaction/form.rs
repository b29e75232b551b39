//! The request body for adding an income or expense, and its validation.

use serde::Deserialize;
use time::{
    Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description,
};

use crate::{
    Error,
    transaction::{NewTransaction, Transaction, TransactionKind},
};

/// An amount as sent by the client, either as a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AmountInput {
    /// e.g. `12.5`
    Number(f64),
    /// e.g. `"12.5"`
    Text(String),
}

/// The data for adding an income or expense.
///
/// Incomes are labelled with `source` and expenses with `category`, the other
/// label is ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransactionForm {
    /// The source of an income, e.g. "Salary".
    #[serde(default)]
    pub source: Option<String>,
    /// The category of an expense, e.g. "Rent".
    #[serde(default)]
    pub category: Option<String>,
    /// The amount of money earned or spent.
    #[serde(default)]
    pub amount: Option<AmountInput>,
    /// Either a calendar date "YYYY-MM-DD" or an RFC 3339 timestamp.
    #[serde(default)]
    pub date: Option<String>,
    /// An optional link to an icon.
    #[serde(default)]
    pub icon: Option<String>,
}

impl TransactionForm {
    /// Validate the form and convert it into a transaction of `kind`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::MissingFields] if the label, amount or date is missing or empty, or if the amount is zero,
    /// - [Error::InvalidAmount] if the amount is negative, not finite or not a number,
    /// - or [Error::InvalidDate] if the date cannot be parsed.
    pub fn into_new_transaction(self, kind: TransactionKind) -> Result<NewTransaction, Error> {
        let label = match kind {
            TransactionKind::Income => self.source,
            TransactionKind::Expense => self.category,
        };

        let label = label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .ok_or(Error::MissingFields)?;

        let amount = match self.amount {
            None => return Err(Error::MissingFields),
            Some(AmountInput::Number(amount)) => amount,
            Some(AmountInput::Text(text)) if text.trim().is_empty() => {
                return Err(Error::MissingFields);
            }
            Some(AmountInput::Text(text)) => text.trim().parse().unwrap_or(f64::NAN),
        };

        if amount == 0.0 {
            return Err(Error::MissingFields);
        }

        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidAmount(amount));
        }

        let date = self
            .date
            .as_deref()
            .map(str::trim)
            .filter(|date| !date.is_empty())
            .ok_or(Error::MissingFields)?;
        let date = parse_transaction_date(date)?;

        let icon = self.icon.as_deref().filter(|icon| !icon.is_empty());

        Ok(Transaction::build(kind, label, amount).date(date).icon(icon))
    }
}

/// Parse a calendar date "YYYY-MM-DD" as midnight UTC, or an RFC 3339 timestamp.
///
/// # Errors
/// Returns [Error::InvalidDate] if `text` is neither.
pub fn parse_transaction_date(text: &str) -> Result<OffsetDateTime, Error> {
    if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(date_time);
    }

    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| Error::InvalidDate(text.to_owned()))
}
