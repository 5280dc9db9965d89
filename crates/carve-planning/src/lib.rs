//! Carve Planning - PRD decomposition into services
//!
//! This crate turns a product-requirements document into service boundaries,
//! a service map and a typed domain model:
//!
//! 1. [`parse_prd`] extracts entities, relationships, contexts, hints and lifecycles
//! 2. [`identify_boundaries`] partitions the entities into service boundaries
//! 3. [`build_service_map`] maps each boundary to a service definition
//! 4. [`build_domain_model`] produces typed entities and relationships
//!
//! [`decompose`] runs all four stages.

pub mod boundaries;
pub mod decomposer;
pub mod domain;
pub mod prd;
pub mod service_map;
pub mod templates;

pub use boundaries::{derive_contracts, identify_boundaries};
pub use decomposer::{decompose, decompose_with, Decomposition, DecompositionSummary, ServiceInfo};
pub use domain::build_domain_model;
pub use prd::parse_prd;
pub use service_map::{build_service_map, build_service_map_with, content_hash};
pub use templates::{example_prd, minimal_prd, terse_prd};
