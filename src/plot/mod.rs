//! Plot rendering: terminal ASCII (`ascii`) and SVG files (`svg`).

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;
