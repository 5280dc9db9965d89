//! PRD decomposition into a service map and domain model

use carve_core::{DomainModel, ParsedDocument, ParsingError, ServiceBoundary, ServiceMap, ServiceMapConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::boundaries::identify_boundaries;
use crate::domain::build_domain_model;
use crate::prd::parse_prd;
use crate::service_map::{build_service_map_with, content_hash};

/// Everything produced by one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decomposition {
    pub document: ParsedDocument,
    pub boundaries: Vec<ServiceBoundary>,
    pub service_map: ServiceMap,
    pub domain_model: DomainModel,
}

impl Decomposition {
    /// Open questions, for the validator's unresolved-question check
    pub fn interview_questions(&self) -> &[String] {
        &self.document.interview_questions
    }

    /// Generate a summary for reporting
    pub fn summary(&self) -> DecompositionSummary {
        DecompositionSummary {
            project_name: self.service_map.project_name.clone(),
            total_entities: self.document.entities.len(),
            total_relationships: self.domain_model.relationships.len(),
            total_contexts: self.document.bounded_contexts.len(),
            total_state_machines: self
                .domain_model
                .entities
                .iter()
                .filter(|e| e.state_machine.is_some())
                .count(),
            total_questions: self.document.interview_questions.len(),
            services: self
                .service_map
                .services
                .iter()
                .map(|s| ServiceInfo {
                    name: s.name.clone(),
                    entities: s.owns_entities.clone(),
                    consumes: s.consumes_contracts.clone(),
                })
                .collect(),
        }
    }
}

/// Run the whole pipeline with default settings
pub fn decompose(text: &str) -> Result<Decomposition, ParsingError> {
    decompose_with(text, &ServiceMapConfig::default(), Utc::now())
}

/// Parse, identify boundaries, build the service map and the domain model.
///
/// The service map's `prd_hash` is replaced with the hash of the full text.
#[instrument(skip_all)]
pub fn decompose_with(
    text: &str,
    config: &ServiceMapConfig,
    generated_at: DateTime<Utc>,
) -> Result<Decomposition, ParsingError> {
    let document = parse_prd(text)?;
    let boundaries = identify_boundaries(&document);
    let mut service_map = build_service_map_with(&document, &boundaries, config, generated_at);
    service_map.prd_hash = content_hash(text);
    let domain_model = build_domain_model(&document, &boundaries);

    info!(
        "decomposed '{}' into {} services",
        service_map.project_name,
        service_map.services.len()
    );
    Ok(Decomposition {
        document,
        boundaries,
        service_map,
        domain_model,
    })
}

/// Summary of decomposition results
#[derive(Debug, Clone)]
pub struct DecompositionSummary {
    pub project_name: String,
    pub total_entities: usize,
    pub total_relationships: usize,
    pub total_contexts: usize,
    pub total_state_machines: usize,
    pub total_questions: usize,
    pub services: Vec<ServiceInfo>,
}

/// Service information for summary
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub name: String,
    pub entities: Vec<String>,
    pub consumes: Vec<String>,
}

impl std::fmt::Display for DecompositionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Project: {}", self.project_name)?;
        writeln!(f, "  Entities: {}", self.total_entities)?;
        writeln!(f, "  Relationships: {}", self.total_relationships)?;
        writeln!(f, "  Bounded contexts: {}", self.total_contexts)?;
        writeln!(f, "  State machines: {}", self.total_state_machines)?;
        writeln!(f, "  Open questions: {}", self.total_questions)?;
        writeln!(f)?;
        writeln!(f, "Services:")?;
        for service in &self.services {
            write!(f, "  {} [{}]", service.name, service.entities.join(", "))?;
            if !service.consumes.is_empty() {
                write!(f, " consumes {}", service.consumes.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::example_prd;

    #[test]
    fn test_decompose_example_prd() {
        let decomposition = decompose(&example_prd()).unwrap();

        assert_eq!(decomposition.service_map.project_name, "ShopFlow");
        assert_eq!(decomposition.service_map.prd_hash, content_hash(&example_prd()));
        assert_eq!(
            decomposition.service_map.services.len(),
            decomposition.boundaries.len()
        );
        assert_eq!(
            decomposition.domain_model.entities.len(),
            decomposition.document.entities.len()
        );
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            decompose("short"),
            Err(ParsingError::TooShort { length: 5, .. })
        ));
    }

    #[test]
    fn test_summarize() {
        let decomposition = decompose(&example_prd()).unwrap();
        let summary = decomposition.summary();

        assert_eq!(summary.project_name, "ShopFlow");
        assert_eq!(summary.services.len(), decomposition.service_map.services.len());
        let rendered = summary.to_string();
        assert!(rendered.starts_with("Project: ShopFlow\n"));
        assert!(rendered.contains("Services:"));
    }
}
