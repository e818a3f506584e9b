//! Resonance model.
//!
//! The model is a small, pure function so that fitting, filtering and plotting
//! code can share it without carrying state around.

pub mod model;

pub use model::*;
