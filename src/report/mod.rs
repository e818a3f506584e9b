//! Reporting utilities: terminal summary, significant-figure formatting and
//! the optional markdown run bundle.

pub mod bundle;
pub mod format;

pub use bundle::*;
pub use format::*;
