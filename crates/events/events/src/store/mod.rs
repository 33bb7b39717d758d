//! Event Store - persistence layer for event records
//!
//! Provides:
//! - Event persistence and lookup by ID
//! - Completion tracking with notifier fan-out

mod trait_def;
mod memory;

pub use trait_def::EventStore;
pub use memory::MemoryEventStore;
