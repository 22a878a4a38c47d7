//! Input/output helpers.
//!
//! - WHO reference table loading (`reference`)
//! - resident/measurement record store (`records`)
//! - dashboard CSV export (`export`)
//! - curve JSON read/write (`curve`)

pub mod curve;
pub mod export;
pub mod records;
pub mod reference;

pub use curve::*;
pub use export::*;
pub use records::*;
pub use reference::*;
