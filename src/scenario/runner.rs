//! Scenario runner for batch grid evaluations
//!
//! Loads the holiday calendar once, then evaluates many parameter sets
//! against it without re-reading the calendar file.

use super::engine::{GridConfig, GridEngine};
use super::matrix::ResultMatrix;
use super::params::ScenarioParameters;
use crate::calendar::{self, HolidaySet};
use crate::error::IrrGridResult;
use rayon::prelude::*;
use std::path::Path;

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv()?;
///
/// for post_rate in [0.10, 0.12, 0.14] {
///     let params = ScenarioParameters { annual_rate_post_change: post_rate, ..base.clone() };
///     let matrix = runner.run(&params)?;
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    holidays: HolidaySet,
    engine: GridEngine,
}

impl ScenarioRunner {
    /// Runner with weekends as the only non-business days
    pub fn new() -> Self {
        Self::default()
    }

    /// Create runner by loading the holiday calendar from the default location
    pub fn from_csv() -> IrrGridResult<Self> {
        Self::from_csv_path(Path::new(calendar::DEFAULT_HOLIDAYS_PATH))
    }

    /// Create runner from a specific holiday calendar file
    pub fn from_csv_path(path: &Path) -> IrrGridResult<Self> {
        Ok(Self::with_holidays(calendar::load_holidays(path)?))
    }

    pub fn with_holidays(holidays: HolidaySet) -> Self {
        Self {
            holidays,
            engine: GridEngine::default(),
        }
    }

    /// Replace the grid configuration
    pub fn with_config(mut self, config: GridConfig) -> Self {
        self.engine = GridEngine::new(config);
        self
    }

    /// Evaluate one scenario grid
    pub fn run(&self, params: &ScenarioParameters) -> IrrGridResult<ResultMatrix> {
        self.engine.evaluate(params, &self.holidays)
    }

    /// Evaluate several scenarios in parallel, one result per input, in order
    pub fn run_scenarios(
        &self,
        scenarios: &[ScenarioParameters],
    ) -> Vec<IrrGridResult<ResultMatrix>> {
        scenarios.par_iter().map(|params| self.run(params)).collect()
    }

    pub fn holidays(&self) -> &HolidaySet {
        &self.holidays
    }

    /// Mutable access for adding ad-hoc holidays
    pub fn holidays_mut(&mut self) -> &mut HolidaySet {
        &mut self.holidays
    }

    pub fn config(&self) -> &GridConfig {
        self.engine.config()
    }
}
