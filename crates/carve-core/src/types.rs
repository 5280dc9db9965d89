//! Core type definitions for PRD decomposition
//!
//! Two families of types live here:
//! - `Raw*` records and [`ParsedDocument`]: the loosely-typed output of the PRD parser
//! - [`ServiceBoundary`], [`ServiceMap`] and [`DomainModel`]: the typed outputs of the
//!   boundary identifier and domain modeler, consumed by the validator and downstream tools

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field names that mark an entity as carrying a lifecycle
pub const STATE_FIELD_NAMES: &[&str] = &[
    "status",
    "state",
    "phase",
    "lifecycle",
    "stage",
    "workflow_state",
];

/// Owning service recorded for entities no boundary claims
pub const UNASSIGNED_SERVICE: &str = "unassigned";

/// Whether a field name is one of [`STATE_FIELD_NAMES`] (case-insensitive)
pub fn is_state_field(name: &str) -> bool {
    let lower = name.to_lowercase();
    STATE_FIELD_NAMES.contains(&lower.as_str())
}

// ---------------------------------------------------------------------------
// Parser output
// ---------------------------------------------------------------------------

/// A field discovered on an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawField {
    pub name: String,
    /// Normalized type alias ("str", "int", "float", "bool", "datetime", "UUID", ...)
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
}

impl RawField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            required,
        }
    }
}

/// An entity candidate extracted from the PRD
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntity {
    pub name: String,
    pub description: String,
    pub fields: Vec<RawField>,
    pub owning_context: Option<String>,
}

impl RawEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_fields(mut self, fields: Vec<RawField>) -> Self {
        self.fields = fields;
        self
    }

    /// Whether any field is a lifecycle field (status, state, ...)
    pub fn has_state_field(&self) -> bool {
        self.fields.iter().any(|f| is_state_field(&f.name))
    }
}

/// A relationship between two entities, as written in the PRD
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRelationship {
    pub source: String,
    pub target: String,
    /// Free-form type, normalized later through [`RelationshipType::from_alias`]
    #[serde(rename = "type")]
    pub relationship_type: String,
    pub cardinality: Option<String>,
}

impl RawRelationship {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relationship_type: impl Into<String>,
        cardinality: Option<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relationship_type: relationship_type.into(),
            cardinality,
        }
    }

    /// The relationship type after alias normalization
    pub fn kind(&self) -> RelationshipType {
        RelationshipType::from_alias(&self.relationship_type)
    }
}

/// A bounded context named in the PRD
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawContext {
    pub name: String,
    pub description: String,
    /// Entity names assigned to this context, in document order
    pub entities: Vec<String>,
}

/// A transition discovered in the PRD
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransition {
    pub from_state: String,
    pub to_state: String,
    pub trigger: String,
}

/// A lifecycle discovered for one entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStateMachine {
    pub entity: String,
    /// States in first-discovery order
    pub states: Vec<String>,
    pub transitions: Vec<RawTransition>,
}

/// Everything the parser could extract from one PRD
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub project_name: String,
    pub entities: Vec<RawEntity>,
    pub relationships: Vec<RawRelationship>,
    pub bounded_contexts: Vec<RawContext>,
    pub technology_hints: BTreeMap<String, Option<String>>,
    pub state_machines: Vec<RawStateMachine>,
    pub interview_questions: Vec<String>,
}

impl ParsedDocument {
    /// Look up a technology hint, treating "absent" and "null" alike
    pub fn hint(&self, key: &str) -> Option<&str> {
        self.technology_hints
            .get(key)
            .and_then(|v| v.as_deref())
    }

    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Boundaries and service map
// ---------------------------------------------------------------------------

/// A candidate service boundary with exclusive entity membership
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBoundary {
    pub name: String,
    pub domain: String,
    pub description: String,
    pub entities: Vec<String>,
    pub provides_contracts: Vec<String>,
    pub consumes_contracts: Vec<String>,
}

impl ServiceBoundary {
    pub fn new(
        name: impl Into<String>,
        domain: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.entities.iter().any(|e| e == entity)
    }
}

/// Technology stack of one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStack {
    pub language: String,
    pub framework: Option<String>,
    pub database: Option<String>,
    pub message_broker: Option<String>,
}

/// One deployable service derived from a boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Kebab-case name matching `^[a-z][a-z0-9-]*$`
    pub name: String,
    pub domain: String,
    pub description: String,
    pub stack: ServiceStack,
    pub estimated_loc: u32,
    pub owns_entities: Vec<String>,
    pub provides_contracts: Vec<String>,
    pub consumes_contracts: Vec<String>,
}

/// The full set of services for one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMap {
    pub project_name: String,
    pub services: Vec<ServiceDefinition>,
    pub prd_hash: String,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Domain model
// ---------------------------------------------------------------------------

/// The six relationship kinds of the domain model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    Owns,
    References,
    BelongsTo,
    Triggers,
    Extends,
    DependsOn,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 6] = [
        Self::Owns,
        Self::References,
        Self::BelongsTo,
        Self::Triggers,
        Self::Extends,
        Self::DependsOn,
    ];

    /// Canonical upper-case name ("OWNS", "BELONGS_TO", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owns => "OWNS",
            Self::References => "REFERENCES",
            Self::BelongsTo => "BELONGS_TO",
            Self::Triggers => "TRIGGERS",
            Self::Extends => "EXTENDS",
            Self::DependsOn => "DEPENDS_ON",
        }
    }

    /// Verb phrase used in relationship descriptions
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Owns => "owns",
            Self::References => "references",
            Self::BelongsTo => "belongs to",
            Self::Triggers => "triggers",
            Self::Extends => "extends",
            Self::DependsOn => "depends on",
        }
    }

    /// Map a free-form relationship string onto the enum.
    ///
    /// Unrecognized strings fall back to [`RelationshipType::References`].
    pub fn from_alias(raw: &str) -> Self {
        let key: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();

        match key.as_str() {
            "owns" | "own" | "has" | "has_many" | "has_one" | "has_a" | "contains"
            | "composition" | "composed_of" | "aggregation" | "aggregates" | "parent_of" => {
                Self::Owns
            }
            "references" | "reference" | "ref" | "refers_to" | "association"
            | "associated_with" | "links_to" | "linked_to" | "relates_to" | "related_to" => {
                Self::References
            }
            "belongs_to" | "belongs" | "child_of" | "part_of" | "is_part_of" | "member_of" => {
                Self::BelongsTo
            }
            "triggers" | "trigger" | "emits" | "publishes" | "creates" | "generates"
            | "notifies" | "causes" => Self::Triggers,
            "extends" | "extend" | "inherits" | "inherits_from" | "is_a" | "specializes"
            | "subclass_of" => Self::Extends,
            "depends_on" | "depends" | "requires" | "uses" | "needs" | "consumes"
            | "dependency" => Self::DependsOn,
            _ => Self::References,
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid relationship type: {}", s))
    }
}

/// Normalize a free-form cardinality label to `1:1`, `1:N`, `N:1` or `N:N`.
///
/// Unrecognized or missing labels default to `1:N`.
pub fn normalize_cardinality(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "1:N".to_string();
    };
    let key: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '_' { '-' } else { c })
        .collect();

    let normalized = match key.as_str() {
        "one-to-one" | "onetoone" | "1:1" | "1-1" | "1-to-1" | "1to1" => "1:1",
        "one-to-many" | "onetomany" | "1:n" | "1:m" | "1-n" | "1-to-n" | "1-to-many"
        | "1:*" | "1..*" => "1:N",
        "many-to-one" | "manytoone" | "n:1" | "m:1" | "n-1" | "n-to-1" | "many-to-1"
        | "*:1" => "N:1",
        "many-to-many" | "manytomany" | "n:n" | "n:m" | "m:n" | "m:m" | "n-n" | "n-to-n"
        | "*:*" => "N:N",
        _ => "1:N",
    };
    normalized.to_string()
}

/// A typed field on a domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
}

/// A transition between two states of an entity lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from_state: String,
    pub to_state: String,
    pub trigger: String,
}

/// Entity lifecycle.
///
/// Transition endpoints are not checked against `states` here; the validator
/// reports dangling endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMachine {
    pub states: Vec<String>,
    pub initial_state: String,
    pub transitions: Vec<StateTransition>,
}

/// An entity of the domain model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEntity {
    pub name: String,
    pub description: String,
    /// Boundary name, or [`UNASSIGNED_SERVICE`]
    pub owning_service: String,
    pub fields: Vec<EntityField>,
    pub state_machine: Option<StateMachine>,
}

/// A typed relationship between two domain entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRelationship {
    pub source_entity: String,
    pub target_entity: String,
    pub relationship_type: RelationshipType,
    /// One of `1:1`, `1:N`, `N:1`, `N:N`
    pub cardinality: String,
    pub description: String,
}

/// Entities and relationships of one project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainModel {
    pub entities: Vec<DomainEntity>,
    pub relationships: Vec<DomainRelationship>,
}

impl DomainModel {
    pub fn entity(&self, name: &str) -> Option<&DomainEntity> {
        self.entities.iter().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_aliases() {
        assert_eq!(RelationshipType::from_alias("has many"), RelationshipType::Owns);
        assert_eq!(RelationshipType::from_alias("OWNS"), RelationshipType::Owns);
        assert_eq!(RelationshipType::from_alias("belongs-to"), RelationshipType::BelongsTo);
        assert_eq!(RelationshipType::from_alias("Inherits From"), RelationshipType::Extends);
        assert_eq!(RelationshipType::from_alias("depends_on"), RelationshipType::DependsOn);
        assert_eq!(RelationshipType::from_alias("publishes"), RelationshipType::Triggers);
        assert_eq!(RelationshipType::from_alias("whatever"), RelationshipType::References);
    }

    #[test]
    fn test_relationship_type_serde() {
        let json = serde_json::to_string(&RelationshipType::BelongsTo).unwrap();
        assert_eq!(json, "\"BELONGS_TO\"");
        let back: RelationshipType = serde_json::from_str("\"DEPENDS_ON\"").unwrap();
        assert_eq!(back, RelationshipType::DependsOn);
        assert_eq!("extends".parse::<RelationshipType>(), Ok(RelationshipType::Extends));
        assert!("nope".parse::<RelationshipType>().is_err());
    }

    #[test]
    fn test_normalize_cardinality() {
        assert_eq!(normalize_cardinality(Some("one-to-one")), "1:1");
        assert_eq!(normalize_cardinality(Some("One to Many")), "1:N");
        assert_eq!(normalize_cardinality(Some("many_to_one")), "N:1");
        assert_eq!(normalize_cardinality(Some("M:N")), "N:N");
        assert_eq!(normalize_cardinality(Some("1:n")), "1:N");
        assert_eq!(normalize_cardinality(Some("lots")), "1:N");
        assert_eq!(normalize_cardinality(None), "1:N");
    }

    #[test]
    fn test_state_field_detection() {
        let entity = RawEntity::new("Order").with_fields(vec![
            RawField::new("id", "UUID", true),
            RawField::new("Status", "str", true),
        ]);
        assert!(entity.has_state_field());
        assert!(is_state_field("workflow_state"));
        assert!(!is_state_field("statuses"));
    }

    #[test]
    fn test_raw_field_serializes_type_key() {
        let field = RawField::new("total", "float", false);
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["type"], "float");
    }
}
