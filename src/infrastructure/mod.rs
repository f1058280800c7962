//! # Infrastructure Layer
//!
//! Adapters behind the ports the application layer depends on.
//!
//! - [`persistence`]: Estate repository and outbox (in-memory, PostgreSQL)
//! - [`events`]: Event publishers and the outbox relay

pub mod events;
pub mod persistence;
