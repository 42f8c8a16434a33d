//! Trip aggregation.
//!
//! [`analyzer::analyze`] filters a [`Dataset`](crate::records::Dataset) and
//! derives the breakdown table, the ranked route list and the station summary
//! from the filtered subset.

pub mod analyzer;
pub mod breakdown;
pub mod routes;
pub mod stations;
pub mod types;
pub mod utility;
