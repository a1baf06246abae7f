//! Error taxonomy for calendar, valuation and grid evaluation

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IrrGridError {
    /// Discount rate at or below -100%, where discounting is undefined
    #[error("Invalid rate: {rate} (must be greater than -100%)")]
    InvalidRate { rate: f64 },

    /// Newton-Raphson hit a flat NPV curve
    #[error("IRR not found: NPV derivative vanished at iteration {iteration} (rate {rate})")]
    IrrNotFound { iteration: u32, rate: f64 },

    /// Annualization is undefined for this sale date
    #[error("Degenerate scenario for sale date {sale_date}: {reason}")]
    DegenerateScenario { sale_date: NaiveDate, reason: String },

    #[error("Invalid parameter: {field}: {reason}")]
    InvalidParameters { field: String, reason: String },

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("Duplicate {axis} axis value: {value}")]
    DuplicateAxisValue { axis: &'static str, value: String },

    #[error("Holiday calendar line {line}: cannot parse date '{value}'")]
    HolidayParse { line: u64, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type IrrGridResult<T> = Result<T, IrrGridError>;
