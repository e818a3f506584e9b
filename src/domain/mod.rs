//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - measurements and datasets (`Measurement`, `Dataset`)
//! - fit outputs (`ResonanceParams`, `ParamUncertainty`, `FitResult`, etc.)
//! - run configuration (`FitConfig`) and the saved-fit schema (`FitFile`)
//! - serde helpers for values that may be infinite or NaN (`nonfinite`)

pub mod nonfinite;
pub mod types;

pub use types::*;
