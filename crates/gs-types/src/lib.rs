//! # gs-types
//!
//! Core types for the adaptive two-parameter grid search: grid geometry,
//! tolerant coordinates, performance records and their ordering, tunable
//! candidate parameters, and the shared error type.

pub mod errors;
pub mod grid;
pub mod parameter;
pub mod performance;
pub mod point;
pub mod table;

pub use errors::*;
pub use grid::*;
pub use parameter::*;
pub use performance::*;
pub use point::*;
pub use table::*;
