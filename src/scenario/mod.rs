//! Scenario grid: purchase prices x sale dates -> annualized IRR

mod engine;
mod matrix;
mod params;
mod runner;

pub use engine::{
    evaluate_grid, GridConfig, GridEngine, IrrSolver, RateSegment, SaleHorizon,
    BUSINESS_DAYS_PER_YEAR, DEFAULT_SALE_MONTHS,
};
pub use matrix::{CellOutcome, IrrSurface, ResultCell, ResultMatrix};
pub use params::{PriceRange, ScenarioParameters, MAX_PRICE_POINTS};
pub use runner::ScenarioRunner;
