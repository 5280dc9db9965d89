//! Service map construction

use carve_core::{
    kebab_case, ParsedDocument, ServiceBoundary, ServiceDefinition, ServiceMap, ServiceMapConfig,
    ServiceStack,
};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

/// Hex-encoded SHA-256 digest
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Build the service map with default settings, stamped with the current time.
///
/// `prd_hash` only covers the project name here. Callers holding the full
/// document text replace it with [`content_hash`] of that text.
pub fn build_service_map(doc: &ParsedDocument, boundaries: &[ServiceBoundary]) -> ServiceMap {
    build_service_map_with(doc, boundaries, &ServiceMapConfig::default(), Utc::now())
}

/// One service per boundary
#[instrument(skip_all)]
pub fn build_service_map_with(
    doc: &ParsedDocument,
    boundaries: &[ServiceBoundary],
    config: &ServiceMapConfig,
    generated_at: DateTime<Utc>,
) -> ServiceMap {
    let stack = ServiceStack {
        language: doc
            .hint("language")
            .map(str::to_string)
            .unwrap_or_else(|| config.default_language.clone()),
        framework: doc.hint("framework").map(str::to_string),
        database: doc.hint("database").map(str::to_string),
        message_broker: doc.hint("message_broker").map(str::to_string),
    };

    let services: Vec<ServiceDefinition> = boundaries
        .iter()
        .map(|boundary| ServiceDefinition {
            name: kebab_case(&boundary.name),
            domain: boundary.domain.clone(),
            description: boundary.description.clone(),
            stack: stack.clone(),
            estimated_loc: config.estimate_loc(boundary.entities.len()),
            owns_entities: boundary.entities.clone(),
            provides_contracts: boundary.provides_contracts.clone(),
            consumes_contracts: boundary.consumes_contracts.clone(),
        })
        .collect();

    info!("built service map with {} services", services.len());
    ServiceMap {
        project_name: doc.project_name.clone(),
        services,
        prd_hash: content_hash(&doc.project_name),
        generated_at,
    }
}
