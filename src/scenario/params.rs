//! Scenario parameter bundle and purchase-price range

use crate::error::{IrrGridError, IrrGridResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper bound on the number of purchase prices in one grid
pub const MAX_PRICE_POINTS: usize = 1_000_000;

/// Half-open range of candidate purchase prices `[start, end)` stepped by `step`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl PriceRange {
    pub fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    /// Single-price range
    pub fn single(price: f64) -> Self {
        Self {
            start: price,
            end: price + 1.0,
            step: 1.0,
        }
    }

    pub fn validate(&self) -> IrrGridResult<()> {
        for (field, value) in [
            ("purchase_price.start", self.start),
            ("purchase_price.end", self.end),
            ("purchase_price.step", self.step),
        ] {
            if !value.is_finite() {
                return Err(IrrGridError::InvalidParameters {
                    field: field.into(),
                    reason: format!("must be finite, got {value}"),
                });
            }
        }
        if self.step == 0.0 {
            return Err(IrrGridError::InvalidParameters {
                field: "purchase_price.step".into(),
                reason: "must be non-zero".into(),
            });
        }
        let len = self.len();
        if len > MAX_PRICE_POINTS {
            return Err(IrrGridError::InvalidParameters {
                field: "purchase_price".into(),
                reason: format!("{len} prices exceeds the limit of {MAX_PRICE_POINTS}"),
            });
        }
        Ok(())
    }

    /// Number of prices in the range; 0 when `end - start` and `step` disagree in sign
    ///
    /// Saturates at `usize::MAX` for spans too wide to enumerate.
    pub fn len(&self) -> usize {
        if self.step == 0.0 || !self.step.is_finite() {
            return 0;
        }
        let span = (self.end - self.start) / self.step;
        if span.is_nan() || span <= 0.0 {
            return 0;
        }
        if span >= MAX_PRICE_POINTS as f64 + 1.0 {
            return usize::MAX;
        }

        // Rounding in `span` can admit a last price that lands on `end`
        let mut n = span.ceil() as usize;
        while n > 0 && !self.before_end(self.price_at(n - 1)) {
            n -= 1;
        }
        n
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enumerate `start + k * step` for `k in 0..len()`
    ///
    /// Fails with `InvalidParameters` for ranges that [`validate`](Self::validate) rejects.
    pub fn prices(&self) -> IrrGridResult<Vec<f64>> {
        self.validate()?;
        Ok((0..self.len()).map(|k| self.price_at(k)).collect())
    }

    fn price_at(&self, k: usize) -> f64 {
        self.start + k as f64 * self.step
    }

    fn before_end(&self, price: f64) -> bool {
        if self.step > 0.0 {
            price < self.end
        } else {
            price > self.end
        }
    }
}

/// Immutable inputs for one grid evaluation
///
/// Rates are decimals (0.10 = 10% a year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    /// Purchase date; index correction accrues from here
    pub start_date: NaiveDate,

    /// Earliest sale date (month offset 0)
    pub base_end_date: NaiveDate,

    /// Last day the pre-change rate applies
    pub rate_change_date: NaiveDate,

    pub annual_rate_pre_change: f64,
    pub annual_rate_post_change: f64,

    pub purchase_price: PriceRange,

    /// Market value of the asset at the start date
    pub market_value: f64,
}

impl ScenarioParameters {
    /// Check numeric fields and date ordering before any cell is evaluated
    pub fn validate(&self) -> IrrGridResult<()> {
        self.purchase_price.validate()?;

        if !self.market_value.is_finite() {
            return Err(IrrGridError::InvalidParameters {
                field: "market_value".into(),
                reason: format!("must be finite, got {}", self.market_value),
            });
        }

        for rate in [self.annual_rate_pre_change, self.annual_rate_post_change] {
            if !rate.is_finite() || rate <= -1.0 {
                return Err(IrrGridError::InvalidRate { rate });
            }
        }

        if self.base_end_date < self.start_date {
            return Err(IrrGridError::InvalidParameters {
                field: "base_end_date".into(),
                reason: format!(
                    "{} is before start date {}",
                    self.base_end_date, self.start_date
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ScenarioParameters {
        ScenarioParameters {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            base_end_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            rate_change_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            annual_rate_pre_change: 0.10,
            annual_rate_post_change: 0.12,
            purchase_price: PriceRange::new(100_000.0, 100_001.0, 1.0),
            market_value: 110_000.0,
        }
    }

    #[test]
    fn test_price_range_enumeration() {
        let range = PriceRange::new(90_000.0, 110_000.0, 5_000.0);
        assert_eq!(range.prices().unwrap(), vec![90_000.0, 95_000.0, 100_000.0, 105_000.0]);
    }

    #[test]
    fn test_price_range_end_is_exclusive() {
        assert_eq!(PriceRange::new(0.0, 10.0, 5.0).len(), 2);
        assert_eq!(PriceRange::new(0.0, 11.0, 5.0).len(), 3);
    }

    #[test]
    fn test_descending_range() {
        let range = PriceRange::new(110.0, 100.0, -5.0);
        assert_eq!(range.prices().unwrap(), vec![110.0, 105.0]);
    }

    #[test]
    fn test_rounded_span_excludes_end() {
        // (0.1 + 0.2) / 0.1 rounds just above 3, yet 0.0 + 3 * 0.1 == 0.1 + 0.2
        let range = PriceRange::new(0.0, 0.1 + 0.2, 0.1);
        let prices = range.prices().unwrap();
        assert_eq!(prices.len(), 3);
        assert!(prices.iter().all(|p| *p < range.end));

        let range = PriceRange::new(0.1 + 0.2, 0.0, -0.1);
        assert!(range.prices().unwrap().iter().all(|p| *p > range.end));
    }

    #[test]
    fn test_oversized_range_rejected() {
        let range = PriceRange::new(0.0, 1e300, 1.0);
        assert_eq!(range.len(), usize::MAX);
        assert!(matches!(
            range.prices(),
            Err(IrrGridError::InvalidParameters { .. })
        ));

        let at_limit = PriceRange::new(0.0, MAX_PRICE_POINTS as f64, 1.0);
        assert_eq!(at_limit.len(), MAX_PRICE_POINTS);
        assert!(at_limit.validate().is_ok());
        assert!(PriceRange::new(0.0, MAX_PRICE_POINTS as f64 + 1.0, 1.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_mismatched_sign_is_empty() {
        assert!(PriceRange::new(100.0, 90.0, 5.0).is_empty());
        assert!(PriceRange::new(100.0, 100.0, 5.0).is_empty());
        assert!(PriceRange::new(90.0, 100.0, 5.0).validate().is_ok());
    }

    #[test]
    fn test_zero_step_rejected() {
        let range = PriceRange::new(0.0, 10.0, 0.0);
        assert!(matches!(
            range.validate(),
            Err(IrrGridError::InvalidParameters { .. })
        ));
        assert!(range.is_empty());
    }

    #[test]
    fn test_validate_rates() {
        let mut p = params();
        assert!(p.validate().is_ok());

        p.annual_rate_post_change = -1.0;
        assert!(matches!(p.validate(), Err(IrrGridError::InvalidRate { .. })));
    }

    #[test]
    fn test_validate_dates_and_values() {
        let mut p = params();
        p.base_end_date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert!(p.validate().is_err());

        let mut p = params();
        p.market_value = f64::INFINITY;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "start_date": "2024-01-01",
            "base_end_date": "2024-02-01",
            "rate_change_date": "2024-06-01",
            "annual_rate_pre_change": 0.10,
            "annual_rate_post_change": 0.12,
            "purchase_price": { "start": 100000, "end": 100001, "step": 1 },
            "market_value": 110000
        }"#;
        let parsed: ScenarioParameters = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, params());
    }
}
