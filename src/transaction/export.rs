//! Exporting a user's incomes or expenses as a spreadsheet.
//!
//! Spreadsheets are generated in memory and never written to disk.

use axum::{
    Extension,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use rust_xlsxwriter::Workbook;
use serde::Deserialize;

use crate::{
    Error,
    transaction::{Transaction, TransactionKind, TransactionState, core::get_transactions},
    user::UserID,
};

/// The file formats transactions can be exported to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// An Excel workbook.
    #[default]
    Xlsx,
    /// Comma separated values.
    Csv,
}

impl ExportFormat {
    fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

/// The query parameters for the download endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// Defaults to [ExportFormat::Xlsx].
    #[serde(default)]
    pub format: ExportFormat,
}

fn export_file_name(kind: TransactionKind, format: ExportFormat) -> String {
    format!("{}_details.{}", kind.as_str(), format.extension())
}

fn header_row(kind: TransactionKind) -> [&'static str; 3] {
    [kind.label_heading(), "Amount", "Date"]
}

/// Write `transactions` to an Excel workbook with a single sheet named after `kind`.
///
/// The columns are the label, the amount and the date as "YYYY-MM-DD".
///
/// # Errors
/// Returns [Error::ExportError] if the workbook could not be written.
pub fn write_xlsx(kind: TransactionKind, transactions: &[Transaction]) -> Result<Vec<u8>, Error> {
    let to_export_error = |error: rust_xlsxwriter::XlsxError| Error::ExportError(error.to_string());

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(kind.title()).map_err(to_export_error)?;

    for (col, heading) in header_row(kind).into_iter().enumerate() {
        worksheet
            .write_string(0, col as u16, heading)
            .map_err(to_export_error)?;
    }

    for (index, transaction) in transactions.iter().enumerate() {
        let row = u32::try_from(index + 1)
            .map_err(|_| Error::ExportError("too many rows for a worksheet".to_owned()))?;

        worksheet
            .write_string(row, 0, &transaction.label)
            .map_err(to_export_error)?;
        worksheet
            .write_number(row, 1, transaction.amount)
            .map_err(to_export_error)?;
        worksheet
            .write_string(row, 2, transaction.date.date().to_string())
            .map_err(to_export_error)?;
    }

    workbook.save_to_buffer().map_err(to_export_error)
}

/// Write `transactions` as CSV with a header row.
///
/// The columns are the same as [write_xlsx].
///
/// # Errors
/// Returns [Error::ExportError] if the CSV could not be written.
pub fn write_csv(kind: TransactionKind, transactions: &[Transaction]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(header_row(kind))
        .map_err(|error| Error::ExportError(error.to_string()))?;

    for transaction in transactions {
        writer
            .write_record([
                transaction.label.clone(),
                transaction.amount.to_string(),
                transaction.date.date().to_string(),
            ])
            .map_err(|error| Error::ExportError(error.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::ExportError(error.to_string()))
}

/// A route handler that responds with all of the logged in user's transactions of one kind as a file download.
pub async fn download_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Extension(kind): Extension<TransactionKind>,
    WithRejection(Query(query), _): WithRejection<Query<ExportQuery>, Error>,
) -> Result<Response, Error> {
    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions(user_id, kind, None, &connection)?
    };

    let bytes = match query.format {
        ExportFormat::Xlsx => write_xlsx(kind, &transactions)?,
        ExportFormat::Csv => write_csv(kind, &transactions)?,
    };

    let file_name = export_file_name(kind, query.format);
    tracing::debug!(
        "exporting {} transactions for user {user_id} as {file_name}",
        transactions.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, query.format.content_type().to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
