//! Grid output: per-cell results and the pivoted IRR surface

use crate::error::{IrrGridError, IrrGridResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Outcome of the IRR solve for one cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CellOutcome {
    Solved {
        /// IRR over the whole holding period (one period)
        holding_period_irr: f64,
        /// Annualized IRR in percent (12.5 = 12.5%)
        annual_irr_pct: f64,
        /// NPV of the cash flow at the solved rate
        residual: f64,
        converged: bool,
    },
    /// No defined IRR for this cell; the reason is kept for reporting
    Unavailable { reason: String },
}

/// One (purchase price, sale date) combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultCell {
    pub purchase_price: f64,
    pub sale_date: NaiveDate,
    pub months_of_delay: u32,
    /// Business days used both for compounding and annualization
    pub business_days: u32,
    /// Market value corrected to the sale date
    pub corrected_value: f64,
    pub outcome: CellOutcome,
}

impl ResultCell {
    pub fn annual_irr_pct(&self) -> Option<f64> {
        match self.outcome {
            CellOutcome::Solved { annual_irr_pct, .. } => Some(annual_irr_pct),
            CellOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.outcome, CellOutcome::Solved { .. })
    }
}

/// Dense grid of results, purchase-price major
///
/// Holds exactly `purchase_prices.len() * sale_dates.len()` cells. The
/// month-offset axis is `0..sale_dates.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMatrix {
    purchase_prices: Vec<f64>,
    sale_dates: Vec<NaiveDate>,
    cells: Vec<ResultCell>,
}

impl ResultMatrix {
    pub(crate) fn new(
        purchase_prices: Vec<f64>,
        sale_dates: Vec<NaiveDate>,
        cells: Vec<ResultCell>,
    ) -> Self {
        debug_assert_eq!(cells.len(), purchase_prices.len() * sale_dates.len());
        Self {
            purchase_prices,
            sale_dates,
            cells,
        }
    }

    /// True when the price range produced no prices
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[ResultCell] {
        &self.cells
    }

    pub fn purchase_prices(&self) -> &[f64] {
        &self.purchase_prices
    }

    pub fn sale_dates(&self) -> &[NaiveDate] {
        &self.sale_dates
    }

    pub fn months_of_delay(&self) -> Vec<u32> {
        (0..self.sale_dates.len() as u32).collect()
    }

    /// Cell at (price index, month offset)
    pub fn get(&self, price_index: usize, months_of_delay: usize) -> Option<&ResultCell> {
        if price_index >= self.purchase_prices.len() || months_of_delay >= self.sale_dates.len() {
            return None;
        }
        self.cells
            .get(price_index * self.sale_dates.len() + months_of_delay)
    }

    /// Row of cells for one purchase price, ordered by month offset
    pub fn row(&self, price_index: usize) -> Option<&[ResultCell]> {
        let width = self.sale_dates.len();
        let start = price_index.checked_mul(width)?;
        self.cells.get(start..start + width)
    }

    pub fn unavailable(&self) -> impl Iterator<Item = &ResultCell> {
        self.cells.iter().filter(|c| !c.is_available())
    }

    /// Pivot into a surface with months of delay as rows and prices as columns
    ///
    /// Axis values must be unique; a repeated price or month offset is an
    /// error rather than a silently merged cell.
    pub fn surface(&self) -> IrrGridResult<IrrSurface> {
        let mut price_index: HashMap<u64, usize> = HashMap::with_capacity(self.purchase_prices.len());
        for (i, &price) in self.purchase_prices.iter().enumerate() {
            if price_index.insert(price_key(price), i).is_some() {
                return Err(IrrGridError::DuplicateAxisValue {
                    axis: "purchase_price",
                    value: price.to_string(),
                });
            }
        }

        let months = self.months_of_delay();
        let month_index: BTreeMap<u32, usize> =
            months.iter().enumerate().map(|(i, &m)| (m, i)).collect();

        let width = self.purchase_prices.len();
        let mut z = vec![vec![None; width]; months.len()];
        let mut filled = vec![vec![false; width]; months.len()];

        for cell in &self.cells {
            let (Some(&x), Some(&y)) = (
                price_index.get(&price_key(cell.purchase_price)),
                month_index.get(&cell.months_of_delay),
            ) else {
                return Err(IrrGridError::InvalidParameters {
                    field: "cells".into(),
                    reason: format!(
                        "cell ({}, {}) lies outside the grid axes",
                        cell.purchase_price, cell.months_of_delay
                    ),
                });
            };

            if filled[y][x] {
                return Err(IrrGridError::DuplicateAxisValue {
                    axis: "cell",
                    value: format!("({}, {})", cell.purchase_price, cell.months_of_delay),
                });
            }
            filled[y][x] = true;
            z[y][x] = cell.annual_irr_pct();
        }

        Ok(IrrSurface {
            purchase_prices: self.purchase_prices.clone(),
            months_of_delay: months,
            annual_irr_pct: z,
        })
    }
}

/// Annualized IRR pivoted for charting: `annual_irr_pct[month][price]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrSurface {
    pub purchase_prices: Vec<f64>,
    pub months_of_delay: Vec<u32>,
    pub annual_irr_pct: Vec<Vec<Option<f64>>>,
}

impl IrrSurface {
    pub fn value(&self, months_of_delay: usize, price_index: usize) -> Option<f64> {
        self.annual_irr_pct
            .get(months_of_delay)
            .and_then(|row| row.get(price_index))
            .copied()
            .flatten()
    }
}

/// Hash key for a price; folds -0.0 into 0.0
fn price_key(price: f64) -> u64 {
    if price == 0.0 {
        0.0_f64.to_bits()
    } else {
        price.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(price: f64, month: u32, irr: Option<f64>) -> ResultCell {
        ResultCell {
            purchase_price: price,
            sale_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            months_of_delay: month,
            business_days: 20 + month,
            corrected_value: 100.0,
            outcome: match irr {
                Some(pct) => CellOutcome::Solved {
                    holding_period_irr: pct / 100.0,
                    annual_irr_pct: pct,
                    residual: 0.0,
                    converged: true,
                },
                None => CellOutcome::Unavailable {
                    reason: "no business days".into(),
                },
            },
        }
    }

    fn dates(n: usize) -> Vec<NaiveDate> {
        let base = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        (0..n).map(|i| base + chrono::Months::new(i as u32)).collect()
    }

    #[test]
    fn test_surface_pivots_months_by_price() {
        let matrix = ResultMatrix::new(
            vec![90.0, 100.0],
            dates(2),
            vec![
                cell(90.0, 0, Some(12.0)),
                cell(90.0, 1, Some(11.0)),
                cell(100.0, 0, Some(2.0)),
                cell(100.0, 1, None),
            ],
        );

        let surface = matrix.surface().unwrap();
        assert_eq!(surface.purchase_prices, vec![90.0, 100.0]);
        assert_eq!(surface.months_of_delay, vec![0, 1]);
        assert_eq!(surface.value(0, 0), Some(12.0));
        assert_eq!(surface.value(1, 0), Some(11.0));
        assert_eq!(surface.value(0, 1), Some(2.0));
        assert_eq!(surface.value(1, 1), None);
    }

    #[test]
    fn test_get_and_row() {
        let matrix = ResultMatrix::new(
            vec![90.0, 100.0],
            dates(2),
            vec![
                cell(90.0, 0, Some(12.0)),
                cell(90.0, 1, Some(11.0)),
                cell(100.0, 0, Some(2.0)),
                cell(100.0, 1, None),
            ],
        );

        assert_eq!(matrix.get(1, 0).unwrap().purchase_price, 100.0);
        assert!(matrix.get(2, 0).is_none());
        assert_eq!(matrix.row(0).unwrap().len(), 2);
        assert_eq!(matrix.unavailable().count(), 1);
    }

    #[test]
    fn test_duplicate_price_axis_rejected() {
        let matrix = ResultMatrix::new(
            vec![100.0, 100.0],
            dates(1),
            vec![cell(100.0, 0, Some(1.0)), cell(100.0, 0, Some(1.0))],
        );
        assert!(matches!(
            matrix.surface(),
            Err(IrrGridError::DuplicateAxisValue { .. })
        ));
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = ResultMatrix::new(Vec::new(), dates(13), Vec::new());
        assert!(matrix.is_empty());
        let surface = matrix.surface().unwrap();
        assert!(surface.purchase_prices.is_empty());
        assert_eq!(surface.annual_irr_pct.len(), 13);
        assert!(surface.annual_irr_pct.iter().all(|row| row.is_empty()));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(cell(100.0, 0, None)).unwrap();
        assert_eq!(json["outcome"]["status"], "unavailable");
        assert_eq!(json["sale_date"], "2024-02-01");
    }
}
