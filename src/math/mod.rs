//! Mathematical utilities: least squares and polynomial fitting.

pub mod ols;
pub mod poly;

pub use ols::*;
pub use poly::*;
