//! # PostgreSQL Persistence
//!
//! sqlx-backed repository and outbox. Requires the schema in
//! `migrations/0001_estates.sql`.

pub mod estate_repository;

pub use estate_repository::PostgresEstateRepository;
