//! Input loaders.
//!
//! Turn catalog and roster files into the inputs the aggregation pipeline
//! consumes.

pub mod catalog;
pub mod roster;

pub use catalog::{load_catalog, parse_catalog};
pub use roster::{load_roster, Roster, RosterOptions, RosterStats};
