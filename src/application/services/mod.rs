//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! - [`EstateService`]: Command execution with optimistic concurrency and
//!   the read-side queries

pub mod estate_service;

pub use estate_service::{DEFAULT_MAX_COMMAND_RETRIES, EstateService, EstateServiceConfig};
