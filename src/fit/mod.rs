//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - fit `(mass, width)` to a dataset with Levenberg–Marquardt (`fitter`)
//! - reject outliers against a fitted model (`filter`)
//! - chain fits and filters into the staged estimator (`stages`)
//! - score fits with chi-squared (`goodness`) and map it around the optimum
//!   (`landscape`)

pub mod filter;
pub mod fitter;
pub mod goodness;
pub mod landscape;
pub mod stages;

pub use filter::*;
pub use fitter::*;
pub use goodness::*;
pub use landscape::*;
pub use stages::*;
