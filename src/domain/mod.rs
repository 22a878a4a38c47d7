//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - growth-standard types (`GrowthIndicator`, `ReferenceTable`, `Classification`)
//! - typed resident and measurement records (`ResidentRecord`, `MeasurementRecord`)

pub mod records;
pub mod types;

pub use records::*;
pub use types::*;
