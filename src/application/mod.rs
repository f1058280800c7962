//! # Application Layer
//!
//! The command surface of the engine.
//!
//! - [`commands`]: Typed commands and the result envelope
//! - [`views`]: Read projections
//! - [`services`]: The [`EstateService`](services::EstateService)
//! - [`error`]: Application errors and the serializable failure response

pub mod commands;
pub mod error;
pub mod services;
pub mod views;

pub use commands::{CommandOutput, CommandReply, CommandResult, CreateEstate, EstateCommand};
pub use error::{ApplicationError, ApplicationResult, ErrorResponse};
pub use services::{EstateService, EstateServiceConfig};
pub use views::{DebtView, EstateView, TaxView};
