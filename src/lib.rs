//! # Estate Settlement
//!
//! Settlement engine for deceased estates: asset verification, statutory
//! debt waterfall, liquidations, tax clearance, gift hotchpot and dependant
//! claims, all behind one [`Estate`](domain::entities::Estate) aggregate.
//!
//! ## Layers
//!
//! - [`domain`]: Aggregate, ledgers, waterfall and adjusters. No I/O.
//! - [`application`]: Typed commands, views and the
//!   [`EstateService`](application::services::EstateService) that loads,
//!   applies and commits with optimistic concurrency.
//! - [`infrastructure`]: Repository and outbox ports with in-memory and
//!   PostgreSQL implementations, event publishers and the outbox relay.
//! - [`config`]: Layered configuration.
//! - [`telemetry`]: Tracing subscriber setup.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use estate_settlement::application::commands::{CreateEstate, EstateCommand};
//! use estate_settlement::application::services::{EstateService, EstateServiceConfig};
//! use estate_settlement::domain::services::NoAdjustment;
//! use estate_settlement::domain::value_objects::{Currency, UserId};
//! use estate_settlement::infrastructure::persistence::in_memory::InMemoryEstateRepository;
//!
//! # tokio_test::block_on(async {
//! let repository = Arc::new(InMemoryEstateRepository::new());
//! let service = EstateService::new(repository, Arc::new(NoAdjustment), EstateServiceConfig::default());
//! let executor = UserId::new("executor-1");
//!
//! let created = service
//!     .create(
//!         CreateEstate {
//!             estate_id: None,
//!             date_of_death: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
//!             currency: Currency::new("KES").unwrap(),
//!             valuation_date: None,
//!         },
//!         &executor,
//!     )
//!     .await
//!     .unwrap();
//!
//! let result = service
//!     .execute(created.id, EstateCommand::Activate, &executor)
//!     .await
//!     .unwrap();
//! assert_eq!(result.estate.version, 2);
//! # });
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;
