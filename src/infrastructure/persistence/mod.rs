//! # Persistence Layer
//!
//! Repository ports and their implementations.
//!
//! ## Ports
//!
//! - [`EstateRepository`]: Estate snapshots with versioned commits
//! - [`EventOutbox`]: Committed events awaiting delivery
//!
//! ## Implementations
//!
//! - `in_memory`: Single-lock in-memory store for tests and replay
//! - `postgres`: sqlx/PostgreSQL store with JSONB snapshots

pub mod in_memory;
pub mod postgres;
pub mod traits;

pub use traits::{
    EstateRepository, EventOutbox, OutboxEntry, RepositoryError, RepositoryResult,
};
