//! # carve-core
//!
//! Core types for decomposing a product-requirements document into a
//! microservice architecture.
//!
//! The decomposition pipeline is strictly linear:
//!
//! - parse the PRD into a [`ParsedDocument`]
//! - identify [`ServiceBoundary`] partitions and build a [`ServiceMap`]
//! - build the typed [`DomainModel`]
//! - validate the map and model
//!
//! This crate holds the data flowing between those stages, plus the shared
//! error, configuration and naming helpers.

mod error;
mod types;

pub mod config;
pub mod fail_open;
pub mod naming;

pub use config::{CarveConfig, ServiceMapConfig, ValidationConfig};
pub use error::{CarveError, ParsingError, Result, MIN_PRD_LENGTH};
pub use naming::{contract_name, is_valid_service_name, kebab_case};
pub use types::*;
