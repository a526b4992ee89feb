//! Turning message records into a deduplicated set of user/role rows.
//!
//! - [`association`] - Candidates, dedup keys and the record normalizer
//! - [`aggregator`] - Thread-safe first-writer-wins collection

pub mod aggregator;
pub mod association;
