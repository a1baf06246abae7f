//! Scenario grid engine
//!
//! For every (purchase price, sale date) pair the engine corrects the market
//! value to the sale date with a business-day compounded index, solves the
//! IRR of buying at the purchase price and selling at the corrected value,
//! and annualizes it over the business days actually compounded.

use super::matrix::{CellOutcome, ResultCell, ResultMatrix};
use super::params::ScenarioParameters;
use crate::calendar::HolidaySet;
use crate::error::{IrrGridError, IrrGridResult};
use crate::valuation::{annual_to_periodic, annualize, solve_irr, two_point_irr};
use chrono::{Months, NaiveDate};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Business days in a year for rate conversion and annualization
pub const BUSINESS_DAYS_PER_YEAR: f64 = 252.0;

/// Sale dates run from the base end date to this many months after it
pub const DEFAULT_SALE_MONTHS: u32 = 12;

/// Root-finding method for the two-point cash flow of each cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IrrSolver {
    /// Newton-Raphson on NPV (general cash-flow shapes)
    #[default]
    NewtonRaphson,
    /// `(inflow / outflow) - 1`, exact for one outflow and one inflow
    ClosedForm,
}

/// Configuration for a grid evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Last month offset; sale dates are offsets `0..=sale_months`
    pub sale_months: u32,

    /// Day-count convention for daily rates and annualization
    pub business_days_per_year: f64,

    pub solver: IrrSolver,

    /// Evaluate purchase-price rows on the rayon pool
    pub parallel: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            sale_months: DEFAULT_SALE_MONTHS,
            business_days_per_year: BUSINESS_DAYS_PER_YEAR,
            solver: IrrSolver::NewtonRaphson,
            parallel: true,
        }
    }
}

/// Which rate regime(s) a sale date's correction spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateSegment {
    /// Sale on or before the rate change date
    Single,
    /// Pre-change leg through the change date, post-change leg from the day after
    TwoRate {
        pre_change_days: u32,
        post_change_days: u32,
    },
}

/// Everything about a sale date that does not depend on the purchase price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleHorizon {
    pub months_of_delay: u32,
    pub sale_date: NaiveDate,
    /// Total business days compounded; reused for annualization
    pub business_days: u32,
    pub corrected_value: f64,
    pub segment: RateSegment,
}

/// Grid evaluation engine
#[derive(Debug, Clone, Default)]
pub struct GridEngine {
    config: GridConfig,
}

impl GridEngine {
    pub fn new(config: GridConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Base end date plus 0..=sale_months whole months
    ///
    /// Month addition clamps to the last day of shorter months
    /// (Jan 31 + 1 month = Feb 29 in a leap year).
    pub fn sale_dates(&self, params: &ScenarioParameters) -> IrrGridResult<Vec<NaiveDate>> {
        (0..=self.config.sale_months)
            .map(|offset| {
                params
                    .base_end_date
                    .checked_add_months(Months::new(offset))
                    .ok_or_else(|| {
                        IrrGridError::DateOutOfRange(format!(
                            "{} + {} months",
                            params.base_end_date, offset
                        ))
                    })
            })
            .collect()
    }

    /// Corrected value and business-day count for each sale date
    pub fn horizons(
        &self,
        params: &ScenarioParameters,
        holidays: &HolidaySet,
    ) -> IrrGridResult<Vec<SaleHorizon>> {
        let days_per_year = self.config.business_days_per_year;
        let daily_pre = annual_to_periodic(params.annual_rate_pre_change, days_per_year)?;
        let daily_post = annual_to_periodic(params.annual_rate_post_change, days_per_year)?;

        // The post-change regime starts the day after the change date
        let post_change_start = params.rate_change_date.succ_opt().ok_or_else(|| {
            IrrGridError::DateOutOfRange(format!("day after {}", params.rate_change_date))
        })?;

        let horizons = self
            .sale_dates(params)?
            .into_iter()
            .enumerate()
            .map(|(offset, sale_date)| {
                let (business_days, corrected_value, segment) =
                    if sale_date <= params.rate_change_date {
                        let days = holidays.business_days_between(params.start_date, sale_date);
                        let value = params.market_value * (1.0 + daily_pre).powi(days as i32);
                        (days, value, RateSegment::Single)
                    } else {
                        let pre_change_days = holidays
                            .business_days_between(params.start_date, params.rate_change_date);
                        let post_change_days =
                            holidays.business_days_between(post_change_start, sale_date);
                        let value = params.market_value
                            * (1.0 + daily_pre).powi(pre_change_days as i32)
                            * (1.0 + daily_post).powi(post_change_days as i32);
                        (
                            pre_change_days + post_change_days,
                            value,
                            RateSegment::TwoRate {
                                pre_change_days,
                                post_change_days,
                            },
                        )
                    };

                SaleHorizon {
                    months_of_delay: offset as u32,
                    sale_date,
                    business_days,
                    corrected_value,
                    segment,
                }
            })
            .collect();

        Ok(horizons)
    }

    /// Evaluate the full price x sale-date grid
    ///
    /// Invalid parameters fail the whole evaluation. Cells with no defined
    /// IRR are kept in the matrix as [`CellOutcome::Unavailable`].
    pub fn evaluate(
        &self,
        params: &ScenarioParameters,
        holidays: &HolidaySet,
    ) -> IrrGridResult<ResultMatrix> {
        params.validate()?;

        let horizons = self.horizons(params, holidays)?;
        let prices = params.purchase_price.prices()?;
        let sale_dates: Vec<NaiveDate> = horizons.iter().map(|h| h.sale_date).collect();

        info!(
            "Evaluating {} purchase prices x {} sale dates",
            prices.len(),
            horizons.len()
        );

        let row = |price: &f64| -> Vec<ResultCell> {
            horizons
                .iter()
                .map(|horizon| self.evaluate_cell(*price, horizon))
                .collect()
        };

        let rows: Vec<Vec<ResultCell>> = if self.config.parallel {
            prices.par_iter().map(row).collect()
        } else {
            prices.iter().map(row).collect()
        };

        let cells: Vec<ResultCell> = rows.into_iter().flatten().collect();

        let unavailable = cells.iter().filter(|c| !c.is_available()).count();
        if unavailable > 0 {
            warn!("{} of {} cells have no IRR", unavailable, cells.len());
        }

        Ok(ResultMatrix::new(prices, sale_dates, cells))
    }

    /// Solve one cell, recording failures in the cell itself
    pub fn evaluate_cell(&self, purchase_price: f64, horizon: &SaleHorizon) -> ResultCell {
        let outcome = match self.solve_cell(purchase_price, horizon) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(
                    "Cell ({}, {}) unavailable: {}",
                    purchase_price, horizon.sale_date, err
                );
                CellOutcome::Unavailable {
                    reason: err.to_string(),
                }
            }
        };

        ResultCell {
            purchase_price,
            sale_date: horizon.sale_date,
            months_of_delay: horizon.months_of_delay,
            business_days: horizon.business_days,
            corrected_value: horizon.corrected_value,
            outcome,
        }
    }

    fn solve_cell(&self, purchase_price: f64, horizon: &SaleHorizon) -> IrrGridResult<CellOutcome> {
        let degenerate = |reason: &str| IrrGridError::DegenerateScenario {
            sale_date: horizon.sale_date,
            reason: reason.to_string(),
        };

        if horizon.business_days == 0 {
            return Err(degenerate("no business days between start date and sale date"));
        }

        let solution = match self.config.solver {
            IrrSolver::NewtonRaphson => solve_irr(&[-purchase_price, horizon.corrected_value])?,
            IrrSolver::ClosedForm => two_point_irr(-purchase_price, horizon.corrected_value, 1)?,
        };

        let annual = annualize(
            solution.rate,
            horizon.business_days,
            self.config.business_days_per_year,
        )
        .ok_or_else(|| degenerate("annualization over zero business days"))?;

        if !annual.is_finite() {
            return Err(degenerate("annualized IRR is not finite"));
        }

        Ok(CellOutcome::Solved {
            holding_period_irr: solution.rate,
            annual_irr_pct: annual * 100.0,
            residual: solution.residual,
            converged: solution.converged,
        })
    }
}

/// Evaluate a grid with the default configuration
pub fn evaluate_grid(
    params: &ScenarioParameters,
    holidays: &HolidaySet,
) -> IrrGridResult<ResultMatrix> {
    GridEngine::default().evaluate(params, holidays)
}
