//! Curve fitting for growth reference tables.
//!
//! Responsibilities:
//!
//! - fit one degree-5 polynomial per SD band
//! - evaluate/sample the fitted bands for classification and charts

pub mod fitter;

pub use fitter::*;
