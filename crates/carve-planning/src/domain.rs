//! Domain model construction

use std::collections::HashSet;

use carve_core::{
    normalize_cardinality, DomainEntity, DomainModel, DomainRelationship, EntityField,
    ParsedDocument, RawEntity, RelationshipType, ServiceBoundary, StateMachine, StateTransition,
    UNASSIGNED_SERVICE,
};
use tracing::{info, instrument};

use crate::prd::linear_chain;

/// States of the machine synthesized when the document describes none
pub const DEFAULT_STATES: [&str; 2] = ["active", "inactive"];
pub const DEFAULT_TRIGGER: &str = "transition_to_inactive";

/// Build the typed domain model.
///
/// Relationships whose endpoints are not both known entities are dropped here;
/// the validator reports them when a model arrives from elsewhere.
#[instrument(skip_all)]
pub fn build_domain_model(doc: &ParsedDocument, boundaries: &[ServiceBoundary]) -> DomainModel {
    let entities: Vec<DomainEntity> = doc
        .entities
        .iter()
        .map(|raw| DomainEntity {
            name: raw.name.clone(),
            description: raw.description.clone(),
            owning_service: boundaries
                .iter()
                .find(|b| b.contains(&raw.name))
                .map(|b| b.name.clone())
                .unwrap_or_else(|| UNASSIGNED_SERVICE.to_string()),
            fields: raw
                .fields
                .iter()
                .map(|f| EntityField {
                    name: f.name.clone(),
                    field_type: f.field_type.clone(),
                    required: f.required,
                })
                .collect(),
            state_machine: state_machine_for(doc, raw),
        })
        .collect();

    let known: HashSet<&str> = doc.entity_names().into_iter().collect();
    let relationships: Vec<DomainRelationship> = doc
        .relationships
        .iter()
        .filter(|r| known.contains(r.source.as_str()) && known.contains(r.target.as_str()))
        .map(|r| {
            let kind = RelationshipType::from_alias(&r.relationship_type);
            DomainRelationship {
                source_entity: r.source.clone(),
                target_entity: r.target.clone(),
                relationship_type: kind,
                cardinality: normalize_cardinality(r.cardinality.as_deref()),
                description: format!("{} {} {}", r.source, kind.verb(), r.target),
            }
        })
        .collect();

    info!(
        "built domain model with {} entities and {} relationships",
        entities.len(),
        relationships.len()
    );
    DomainModel {
        entities,
        relationships,
    }
}

/// Lifecycle for entities carrying a status-like field
fn state_machine_for(doc: &ParsedDocument, entity: &RawEntity) -> Option<StateMachine> {
    if !entity.has_state_field() {
        return None;
    }

    let detected = doc
        .state_machines
        .iter()
        .find(|m| m.entity.eq_ignore_ascii_case(&entity.name))
        .filter(|m| !m.states.is_empty());

    let machine = match detected {
        Some(m) => {
            let transitions = if m.transitions.is_empty() {
                linear_chain(&m.states)
            } else {
                m.transitions.clone()
            };
            StateMachine {
                initial_state: m.states[0].clone(),
                states: m.states.clone(),
                transitions: transitions
                    .into_iter()
                    .map(|t| StateTransition {
                        from_state: t.from_state,
                        to_state: t.to_state,
                        trigger: t.trigger,
                    })
                    .collect(),
            }
        }
        None => StateMachine {
            states: DEFAULT_STATES.iter().map(|s| s.to_string()).collect(),
            initial_state: DEFAULT_STATES[0].to_string(),
            transitions: vec![StateTransition {
                from_state: DEFAULT_STATES[0].to_string(),
                to_state: DEFAULT_STATES[1].to_string(),
                trigger: DEFAULT_TRIGGER.to_string(),
            }],
        },
    };
    Some(machine)
}
