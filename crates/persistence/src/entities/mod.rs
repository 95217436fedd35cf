//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod usage_counter;

pub use usage_counter::UsageCounterEntity;
