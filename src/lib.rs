//! `posyandu-kms` library crate.
//!
//! The binary (`posyandu`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the growth-chart fragment (reference loading, fitting, classification,
//!   rendering) is reusable by other front-ends
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod chart;
pub mod classify;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
