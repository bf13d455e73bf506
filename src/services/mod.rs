//! Outbound data services

pub mod reporting;
pub mod sheets;

pub use reporting::{Ga4Client, ReportResponse, ReportRow, ReportingClient};
pub use sheets::{CsvDirectoryClient, GoogleSheetsClient, Sheet, SpreadsheetClient};
