//! `zfit` library crate.
//!
//! The binary (`zfit`) is a thin wrapper around this library so that:
//!
//! - the fitting core is testable without spawning processes
//! - modules are reusable (e.g., notebooks, batch re-analysis)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
