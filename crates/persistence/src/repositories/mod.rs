//! Repository implementations for database operations.

pub mod usage_counter;

pub use usage_counter::UsageCounterRepository;
