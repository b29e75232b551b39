//! Dashboard module
//!
//! Provides an overview of a user's finances: total income, expenses and
//! balance, the transactions in trailing windows, and the newest activity.

mod aggregation;
mod handlers;
mod summary;

pub use aggregation::WindowedSum;
pub use handlers::get_dashboard_summary;
pub use summary::{DashboardSummary, build_dashboard_summary};
