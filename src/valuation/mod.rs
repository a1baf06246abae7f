//! Time-value-of-money primitives

mod irr;

pub use irr::{
    annual_to_periodic, annualize, npv, solve_irr, solve_irr_from, two_point_irr, IrrSolution,
    DEFAULT_GUESS, MAX_ITERATIONS, TOLERANCE,
};
