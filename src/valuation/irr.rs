//! Net present value and Internal Rate of Return (IRR)
//!
//! IRR is solved with Newton-Raphson on NPV using a forward-difference
//! derivative. Two-point cash flows also have a closed form.

use crate::error::{IrrGridError, IrrGridResult};
use log::debug;
use serde::{Deserialize, Serialize};

/// Initial Newton-Raphson guess (10% per period)
pub const DEFAULT_GUESS: f64 = 0.10;

/// Convergence threshold on |NPV| and finite-difference step
pub const TOLERANCE: f64 = 1e-6;

pub const MAX_ITERATIONS: u32 = 1000;

/// Result of an IRR solve
///
/// `converged == false` means the iteration cap was hit and `rate` is the
/// last iterate; `residual` is the NPV at `rate` so callers can judge it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrSolution {
    /// Periodic rate as a decimal
    pub rate: f64,
    /// NPV evaluated at `rate`
    pub residual: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// Net Present Value of `cashflows` at periodic `rate`
///
/// Index 0 is undiscounted; index `t` is discounted by `(1 + rate)^t`.
///
/// # Errors
/// [`IrrGridError::InvalidRate`] when `rate <= -1` (or NaN).
pub fn npv(rate: f64, cashflows: &[f64]) -> IrrGridResult<f64> {
    if !(rate > -1.0) {
        return Err(IrrGridError::InvalidRate { rate });
    }

    let one_plus_r = 1.0 + rate;
    Ok(cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / one_plus_r.powi(t as i32))
        .sum())
}

/// Solve for the periodic IRR of `cashflows` starting from a 10% guess
pub fn solve_irr(cashflows: &[f64]) -> IrrGridResult<IrrSolution> {
    solve_irr_from(cashflows, DEFAULT_GUESS)
}

/// Newton-Raphson IRR from an explicit initial guess
///
/// Iterates until `|npv| < TOLERANCE` or [`MAX_ITERATIONS`] is reached. An
/// iterate that would land at or below -100% is moved halfway towards -1
/// instead, keeping every NPV evaluation inside its domain.
///
/// # Errors
/// * [`IrrGridError::IrrNotFound`] if the NPV curve is flat (all-zero flows,
///   or a vanishing derivative at some iterate)
/// * [`IrrGridError::InvalidRate`] if `guess <= -1`
pub fn solve_irr_from(cashflows: &[f64], guess: f64) -> IrrGridResult<IrrSolution> {
    if cashflows.iter().all(|&cf| cf == 0.0) {
        return Err(IrrGridError::IrrNotFound {
            iteration: 0,
            rate: guess,
        });
    }

    let mut rate = guess;

    for iteration in 0..MAX_ITERATIONS {
        let value = npv(rate, cashflows)?;
        if value.abs() < TOLERANCE {
            return Ok(IrrSolution {
                rate,
                residual: value,
                iterations: iteration,
                converged: true,
            });
        }

        let derivative = (npv(rate + TOLERANCE, cashflows)? - value) / TOLERANCE;
        if derivative == 0.0 || !derivative.is_finite() {
            return Err(IrrGridError::IrrNotFound { iteration, rate });
        }

        let next = rate - value / derivative;
        rate = if next > -1.0 { next } else { (rate - 1.0) / 2.0 };
    }

    let residual = npv(rate, cashflows)?;
    debug!(
        "IRR did not converge after {} iterations (rate {}, residual {})",
        MAX_ITERATIONS, rate, residual
    );

    Ok(IrrSolution {
        rate,
        residual,
        iterations: MAX_ITERATIONS,
        converged: residual.abs() < TOLERANCE,
    })
}

/// Closed-form IRR for one outflow followed by one inflow `periods` later
///
/// `rate = (inflow / -outflow)^(1/periods) - 1`
pub fn two_point_irr(outflow: f64, inflow: f64, periods: u32) -> IrrGridResult<IrrSolution> {
    if periods == 0 {
        return Err(IrrGridError::InvalidParameters {
            field: "periods".into(),
            reason: "must be at least one period".into(),
        });
    }
    if !(outflow < 0.0 && inflow > 0.0) {
        return Err(IrrGridError::IrrNotFound {
            iteration: 0,
            rate: f64::NAN,
        });
    }

    let rate = (inflow / -outflow).powf(1.0 / periods as f64) - 1.0;

    let mut cashflows = vec![0.0; periods as usize + 1];
    cashflows[0] = outflow;
    cashflows[periods as usize] = inflow;
    let residual = npv(rate, &cashflows)?;

    Ok(IrrSolution {
        rate,
        residual,
        iterations: 0,
        converged: true,
    })
}

/// Periodic equivalent of an annual rate: `(1 + annual)^(1/periods) - 1`
pub fn annual_to_periodic(annual_rate: f64, periods_per_year: f64) -> IrrGridResult<f64> {
    if !(annual_rate > -1.0) {
        return Err(IrrGridError::InvalidRate { rate: annual_rate });
    }
    Ok((1.0 + annual_rate).powf(1.0 / periods_per_year) - 1.0)
}

/// Annualize a return earned over `periods` periods
///
/// `(1 + rate)^(periods_per_year / periods) - 1`; `None` when `periods == 0`.
pub fn annualize(rate: f64, periods: u32, periods_per_year: f64) -> Option<f64> {
    if periods == 0 {
        return None;
    }
    Some((1.0 + rate).powf(periods_per_year / periods as f64) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_npv_zero_rate_is_sum() {
        let cashflows = [-1000.0, 250.0, 400.0, 500.0];
        assert_relative_eq!(npv(0.0, &cashflows).unwrap(), 150.0);
    }

    #[test]
    fn test_npv_discounts_by_period() {
        let value = npv(0.10, &[-100.0, 110.0]).unwrap();
        assert_abs_diff_eq!(value, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_npv_rejects_rate_at_minus_one() {
        assert!(matches!(
            npv(-1.0, &[-100.0, 110.0]),
            Err(IrrGridError::InvalidRate { .. })
        ));
        assert!(npv(-1.5, &[1.0]).is_err());
        assert!(npv(f64::NAN, &[1.0]).is_err());
    }

    #[test]
    fn test_simple_irr() {
        // Invest 1000, receive 1100 one period later
        let solution = solve_irr(&[-1000.0, 1100.0]).unwrap();
        assert!(solution.converged);
        assert_abs_diff_eq!(solution.rate, 0.10, epsilon = 1e-9);
    }

    #[test]
    fn test_two_point_matches_closed_form() {
        let (p, f) = (250_000.0, 287_431.17);
        let iterative = solve_irr(&[-p, f]).unwrap();
        let closed = two_point_irr(-p, f, 1).unwrap();

        assert!(iterative.converged);
        assert!(iterative.residual.abs() < TOLERANCE);
        assert_abs_diff_eq!(iterative.rate, f / p - 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(iterative.rate, closed.rate, epsilon = 1e-9);
    }

    #[test]
    fn test_deep_loss_stays_in_domain() {
        // Root at -99%; the first Newton step from 10% overshoots below -1
        let solution = solve_irr(&[-100.0, 1.0]).unwrap();
        assert!(solution.converged);
        assert_abs_diff_eq!(solution.rate, -0.99, epsilon = 1e-6);
    }

    #[test]
    fn test_level_cashflows() {
        // Loan of 10000 repaid by 12 payments of 900
        let mut cashflows = vec![10_000.0];
        cashflows.extend(vec![-900.0; 12]);

        let solution = solve_irr(&cashflows).unwrap();
        assert!(solution.converged);
        assert!(npv(solution.rate, &cashflows).unwrap().abs() < TOLERANCE);
    }

    #[test]
    fn test_all_zero_cashflows_not_found() {
        assert!(matches!(
            solve_irr(&[0.0, 0.0, 0.0]),
            Err(IrrGridError::IrrNotFound { .. })
        ));
    }

    #[test]
    fn test_flat_curve_not_found() {
        // Only a time-zero flow: NPV does not depend on the rate
        assert!(matches!(
            solve_irr(&[-500.0, 0.0]),
            Err(IrrGridError::IrrNotFound { .. })
        ));
    }

    #[test]
    fn test_no_sign_change_never_converges() {
        // No IRR exists; iterates run off until the curve flattens out
        match solve_irr(&[100.0, 100.0]) {
            Err(IrrGridError::IrrNotFound { .. }) => {}
            Ok(solution) => {
                assert!(!solution.converged);
                assert!(solution.residual.abs() >= TOLERANCE);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_two_point_multi_period() {
        let solution = two_point_irr(-1000.0, 1210.0, 2).unwrap();
        assert_abs_diff_eq!(solution.rate, 0.10, epsilon = 1e-12);
        assert_abs_diff_eq!(solution.residual, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_two_point_requires_outflow_then_inflow() {
        assert!(two_point_irr(1000.0, 1100.0, 1).is_err());
        assert!(two_point_irr(-1000.0, 1100.0, 0).is_err());
    }

    #[test]
    fn test_daily_rate_round_trips_to_annual() {
        let daily = annual_to_periodic(0.10, 252.0).unwrap();
        assert_relative_eq!((1.0 + daily).powi(252) - 1.0, 0.10, epsilon = 1e-12);
        assert!(annual_to_periodic(-1.0, 252.0).is_err());
    }

    #[test]
    fn test_annualize() {
        let daily = annual_to_periodic(0.12, 252.0).unwrap();
        let over_126 = (1.0 + daily).powi(126) - 1.0;
        assert_relative_eq!(annualize(over_126, 126, 252.0).unwrap(), 0.12, epsilon = 1e-12);
        assert_eq!(annualize(0.05, 0, 252.0), None);
    }
}
