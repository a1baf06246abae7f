//! IRR Grid - scenario engine for annualized returns on an index-corrected asset
//!
//! This library provides:
//! - Business-day calendar arithmetic against a holiday set
//! - NPV and IRR (Newton-Raphson) primitives
//! - Grid evaluation of annualized IRR across purchase prices and sale dates,
//!   with a two-regime index correction around a rate change date

pub mod error;
pub mod calendar;
pub mod valuation;
pub mod scenario;

// Re-export commonly used types
pub use error::{IrrGridError, IrrGridResult};
pub use calendar::{business_days_between, HolidaySet};
pub use valuation::{npv, solve_irr, IrrSolution};
pub use scenario::{
    evaluate_grid, GridConfig, GridEngine, PriceRange, ResultCell, ResultMatrix,
    ScenarioParameters, ScenarioRunner,
};
