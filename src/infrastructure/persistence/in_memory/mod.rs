//! # In-Memory Repositories
//!
//! In-memory implementations for testing without database dependencies.
//!
//! ## Available Repositories
//!
//! - [`InMemoryEstateRepository`]: Estate snapshots and the event outbox
//!
//! ## Thread Safety
//!
//! Storage sits behind `Arc<RwLock<_>>`; one lock covers snapshots and
//! outbox so commits are atomic.

pub mod estate_repository;

pub use estate_repository::InMemoryEstateRepository;
