//! IRR Grid CLI
//!
//! Evaluates annualized IRR over purchase prices x sale dates and prints the
//! surface (rows: months of delay, columns: purchase price).

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use irr_grid::calendar::{self, HolidaySet, DEFAULT_HOLIDAYS_PATH};
use irr_grid::scenario::{
    CellOutcome, GridConfig, IrrSolver, IrrSurface, PriceRange, ResultMatrix, ScenarioParameters,
    ScenarioRunner, DEFAULT_SALE_MONTHS,
};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(name = "irr-grid", version, about = "Annualized IRR across purchase prices and sale dates")]
struct Cli {
    /// Scenario as JSON (fields of ScenarioParameters, rates as decimals)
    #[arg(
        long,
        conflicts_with_all = [
            "start_date",
            "base_end_date",
            "rate_change_date",
            "pre_rate",
            "post_rate",
            "price_start",
            "price_end",
            "price_step",
            "market_value",
        ]
    )]
    params: Option<PathBuf>,

    /// Purchase date (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// First candidate sale date (YYYY-MM-DD)
    #[arg(long)]
    base_end_date: Option<NaiveDate>,

    /// Last day of the pre-change rate (YYYY-MM-DD)
    #[arg(long)]
    rate_change_date: Option<NaiveDate>,

    /// Annual rate before the change, in percent
    #[arg(long)]
    pre_rate: Option<f64>,

    /// Annual rate after the change, in percent
    #[arg(long)]
    post_rate: Option<f64>,

    /// First purchase price
    #[arg(long)]
    price_start: Option<f64>,

    /// Purchase price upper bound (exclusive)
    #[arg(long)]
    price_end: Option<f64>,

    /// Purchase price increment
    #[arg(long)]
    price_step: Option<f64>,

    /// Market value at the start date
    #[arg(long)]
    market_value: Option<f64>,

    /// Holiday calendar (`dd/mm/yyyy;weekday;name` lines)
    #[arg(long, default_value = DEFAULT_HOLIDAYS_PATH)]
    holidays: PathBuf,

    /// Ignore the holiday calendar; only weekends are non-business days
    #[arg(long)]
    no_holidays: bool,

    /// Number of monthly offsets after the base end date
    #[arg(long, default_value_t = DEFAULT_SALE_MONTHS)]
    sale_months: u32,

    /// Use the closed-form two-point IRR instead of Newton-Raphson
    #[arg(long)]
    closed_form: bool,

    /// Print the full matrix and surface as JSON
    #[arg(long)]
    json: bool,

    /// Write one CSV row per cell to this path
    #[arg(long)]
    csv: Option<PathBuf>,
}

impl Cli {
    fn scenario(&self) -> Result<ScenarioParameters> {
        if let Some(path) = &self.params {
            let file = File::open(path)
                .with_context(|| format!("opening scenario file {}", path.display()))?;
            return serde_json::from_reader(file)
                .with_context(|| format!("parsing scenario file {}", path.display()));
        }

        fn required<T: Copy>(value: Option<T>, flag: &str) -> Result<T> {
            match value {
                Some(v) => Ok(v),
                None => bail!("missing --{flag} (or pass --params <file>)"),
            }
        }

        Ok(ScenarioParameters {
            start_date: required(self.start_date, "start-date")?,
            base_end_date: required(self.base_end_date, "base-end-date")?,
            rate_change_date: required(self.rate_change_date, "rate-change-date")?,
            annual_rate_pre_change: required(self.pre_rate, "pre-rate")? / 100.0,
            annual_rate_post_change: required(self.post_rate, "post-rate")? / 100.0,
            purchase_price: PriceRange::new(
                required(self.price_start, "price-start")?,
                required(self.price_end, "price-end")?,
                required(self.price_step, "price-step")?,
            ),
            market_value: required(self.market_value, "market-value")?,
        })
    }

    fn holiday_set(&self) -> Result<HolidaySet> {
        if self.no_holidays {
            return Ok(HolidaySet::new());
        }
        calendar::load_holidays(&self.holidays)
            .with_context(|| format!("loading holidays from {}", self.holidays.display()))
    }

    fn grid_config(&self) -> GridConfig {
        GridConfig {
            sale_months: self.sale_months,
            solver: if self.closed_form {
                IrrSolver::ClosedForm
            } else {
                IrrSolver::NewtonRaphson
            },
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct GridResponse<'a> {
    scenario: &'a ScenarioParameters,
    holiday_count: usize,
    matrix: &'a ResultMatrix,
    surface: &'a IrrSurface,
    execution_time_ms: u64,
}

/// Flat CSV row for one cell
#[derive(Serialize)]
struct CellRow {
    purchase_price: f64,
    sale_date: NaiveDate,
    months_of_delay: u32,
    business_days: u32,
    corrected_value: f64,
    annual_irr_pct: Option<f64>,
    converged: Option<bool>,
    unavailable_reason: Option<String>,
}

fn write_cells_csv(path: &Path, matrix: &ResultMatrix) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    for cell in matrix.cells() {
        let (converged, unavailable_reason) = match &cell.outcome {
            CellOutcome::Solved { converged, .. } => (Some(*converged), None),
            CellOutcome::Unavailable { reason } => (None, Some(reason.clone())),
        };
        writer.serialize(CellRow {
            purchase_price: cell.purchase_price,
            sale_date: cell.sale_date,
            months_of_delay: cell.months_of_delay,
            business_days: cell.business_days,
            corrected_value: cell.corrected_value,
            annual_irr_pct: cell.annual_irr_pct(),
            converged,
            unavailable_reason,
        })?;
    }

    writer.flush()?;
    Ok(())
}

fn print_surface(matrix: &ResultMatrix, surface: &IrrSurface) {
    print!("{:>6} {:>10} {:>6}", "Months", "SaleDate", "BDays");
    for price in &surface.purchase_prices {
        print!(" {:>12.2}", price);
    }
    println!();
    println!("{}", "-".repeat(24 + 13 * surface.purchase_prices.len()));

    for (y, &month) in surface.months_of_delay.iter().enumerate() {
        let business_days = matrix
            .get(0, y)
            .map(|c| c.business_days.to_string())
            .unwrap_or_default();
        print!("{:>6} {:>10} {:>6}", month, matrix.sale_dates()[y], business_days);
        for x in 0..surface.purchase_prices.len() {
            match surface.value(y, x) {
                Some(pct) => print!(" {:>11.2}%", pct),
                None => print!(" {:>12}", "n/a"),
            }
        }
        println!();
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let start = Instant::now();

    let scenario = cli.scenario()?;
    let holidays = cli.holiday_set()?;
    let holiday_count = holidays.len();

    let runner = ScenarioRunner::with_holidays(holidays).with_config(cli.grid_config());
    let matrix = runner.run(&scenario).context("evaluating scenario grid")?;
    let surface = matrix.surface()?;

    info!("Grid evaluated in {:?}", start.elapsed());

    if let Some(path) = &cli.csv {
        write_cells_csv(path, &matrix)?;
        if !cli.json {
            println!("Cells written to {}", path.display());
        }
    }

    if cli.json {
        let response = GridResponse {
            scenario: &scenario,
            holiday_count,
            matrix: &matrix,
            surface: &surface,
            execution_time_ms: start.elapsed().as_millis() as u64,
        };
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    if matrix.is_empty() {
        println!("Purchase price range is empty; no scenarios to evaluate.");
        return Ok(());
    }

    println!("Annual IRR (%) by months of delay and purchase price");
    println!(
        "Start {}  |  rate change {}  |  {:.2}% -> {:.2}%  |  market value {:.2}  |  {} holidays\n",
        scenario.start_date,
        scenario.rate_change_date,
        scenario.annual_rate_pre_change * 100.0,
        scenario.annual_rate_post_change * 100.0,
        scenario.market_value,
        holiday_count,
    );
    print_surface(&matrix, &surface);

    let unavailable = matrix.unavailable().count();
    if unavailable > 0 {
        println!("\n{} of {} cells unavailable:", unavailable, matrix.len());
        for cell in matrix.unavailable().take(5) {
            if let CellOutcome::Unavailable { reason } = &cell.outcome {
                println!("  {:.2} @ {}: {}", cell.purchase_price, cell.sale_date, reason);
            }
        }
    }

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
