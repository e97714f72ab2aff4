//! Grouping and ranking of fatal incidents.
//!
//! Buckets are keyed by rounded coordinate, event type, year-month or year.
//! Each bucket carries the fatality sum, the incident count and the modal
//! event and location types; renderers consume them in the order returned.

pub mod aggregate;
pub mod summary;
pub mod types;
pub mod utility;
