//! Structural checks over a service map and domain model

use std::collections::{BTreeMap, BTreeSet, HashSet};

use carve_core::fail_open::fail_open;
use carve_core::{DomainModel, Result, ServiceMap, ValidationConfig};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::report::{Issue, IssueReport, Severity};

/// Configuration for a validator
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// DFS steps the cycle search may take before it reports itself incomplete
    pub max_cycle_search_steps: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::from(&ValidationConfig::default())
    }
}

impl From<&ValidationConfig> for ValidatorConfig {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            max_cycle_search_steps: config.max_cycle_search_steps,
        }
    }
}

/// The fourteen checks, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCheck {
    /// Entity owned by more than one service
    DuplicateEntityOwnership,
    /// Contract provided but consumed by nobody
    UnconsumedContract,
    /// Contract consumed but provided by nobody
    MissingContractProvider,
    /// Simple cycle in the consumer -> provider graph
    CircularDependency,
    /// Service with no contracts at all
    IsolatedService,
    /// Entity without fields
    EmptyEntity,
    /// Transition endpoint outside the state list
    InvalidStateTransition,
    /// Interview questions left open
    UnresolvedQuestions,
    /// Fewer than two services
    TooFewServices,
    /// Contract provided by more than one service
    DuplicateContractProvider,
    DuplicateServiceName,
    /// Domain entity that no service owns
    UnownedEntity,
    /// Service owning no entities
    EmptyService,
    /// Relationship pointing at an unknown entity
    DanglingRelationship,
}

impl ValidationCheck {
    pub const ALL: [ValidationCheck; 14] = [
        Self::DuplicateEntityOwnership,
        Self::UnconsumedContract,
        Self::MissingContractProvider,
        Self::CircularDependency,
        Self::IsolatedService,
        Self::EmptyEntity,
        Self::InvalidStateTransition,
        Self::UnresolvedQuestions,
        Self::TooFewServices,
        Self::DuplicateContractProvider,
        Self::DuplicateServiceName,
        Self::UnownedEntity,
        Self::EmptyService,
        Self::DanglingRelationship,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateEntityOwnership => "PRD-001",
            Self::UnconsumedContract => "PRD-002",
            Self::MissingContractProvider => "PRD-003",
            Self::CircularDependency => "PRD-004",
            Self::IsolatedService => "PRD-005",
            Self::EmptyEntity => "PRD-006",
            Self::InvalidStateTransition => "PRD-007",
            Self::UnresolvedQuestions => "PRD-008",
            Self::TooFewServices => "PRD-009",
            Self::DuplicateContractProvider => "PRD-010",
            Self::DuplicateServiceName => "PRD-011",
            Self::UnownedEntity => "PRD-012",
            Self::EmptyService => "PRD-013",
            Self::DanglingRelationship => "PRD-014",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DuplicateEntityOwnership => "duplicate_entity_ownership",
            Self::UnconsumedContract => "unconsumed_contract",
            Self::MissingContractProvider => "missing_contract_provider",
            Self::CircularDependency => "circular_dependency",
            Self::IsolatedService => "isolated_service",
            Self::EmptyEntity => "empty_entity",
            Self::InvalidStateTransition => "invalid_state_transition",
            Self::UnresolvedQuestions => "unresolved_questions",
            Self::TooFewServices => "too_few_services",
            Self::DuplicateContractProvider => "duplicate_contract_provider",
            Self::DuplicateServiceName => "duplicate_service_name",
            Self::UnownedEntity => "unowned_entity",
            Self::EmptyService => "empty_service",
            Self::DanglingRelationship => "dangling_relationship",
        }
    }
}

impl std::fmt::Display for ValidationCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Validate with the default configuration
pub fn validate(map: &ServiceMap, model: &DomainModel, questions: Option<&[String]>) -> IssueReport {
    Validator::new(ValidatorConfig::default()).validate(map, model, questions)
}

/// Decomposition validator
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Run every check. A check that cannot complete is skipped and recorded
    /// in `skipped_checks`; the others still run.
    #[instrument(skip_all)]
    pub fn validate(
        &self,
        map: &ServiceMap,
        model: &DomainModel,
        questions: Option<&[String]>,
    ) -> IssueReport {
        let mut report = IssueReport::default();

        for check in ValidationCheck::ALL {
            match fail_open(check.name(), || self.run_check(check, map, model, questions)) {
                Some(issues) => {
                    debug!("{} {}: {} issues", check.code(), check, issues.len());
                    report.issues.extend(issues);
                }
                None => report.skipped_checks.push(check),
            }
        }

        info!(
            "validated {} services: {} blocking, {} warnings",
            map.services.len(),
            report.blocking().len(),
            report.warnings().len()
        );
        report
    }

    /// Run a single validation check
    fn run_check(
        &self,
        check: ValidationCheck,
        map: &ServiceMap,
        model: &DomainModel,
        questions: Option<&[String]>,
    ) -> Result<Vec<Issue>> {
        let issues = match check {
            ValidationCheck::DuplicateEntityOwnership => check_entity_ownership(map),
            ValidationCheck::UnconsumedContract => check_unconsumed_contracts(map),
            ValidationCheck::MissingContractProvider => check_missing_providers(map),
            ValidationCheck::CircularDependency => {
                check_cycles(map, self.config.max_cycle_search_steps)
            }
            ValidationCheck::IsolatedService => check_isolated_services(map),
            ValidationCheck::EmptyEntity => check_empty_entities(model),
            ValidationCheck::InvalidStateTransition => check_state_transitions(model),
            ValidationCheck::UnresolvedQuestions => check_questions(questions),
            ValidationCheck::TooFewServices => check_service_count(map),
            ValidationCheck::DuplicateContractProvider => check_duplicate_providers(map),
            ValidationCheck::DuplicateServiceName => check_service_names(map),
            ValidationCheck::UnownedEntity => check_unowned_entities(map, model),
            ValidationCheck::EmptyService => check_empty_services(map),
            ValidationCheck::DanglingRelationship => check_relationship_endpoints(model),
        };
        Ok(issues)
    }
}

/// Group values under a key, keeping first-seen order within each group and
/// dropping repeats.
fn group<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> BTreeMap<&'a str, Vec<&'a str>> {
    let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in pairs {
        let members = groups.entry(key).or_default();
        if !members.contains(&value) {
            members.push(value);
        }
    }
    groups
}

/// contract -> services providing it
fn providers(map: &ServiceMap) -> BTreeMap<&str, Vec<&str>> {
    group(map.services.iter().flat_map(|s| {
        s.provides_contracts
            .iter()
            .map(move |c| (c.as_str(), s.name.as_str()))
    }))
}

fn check_entity_ownership(map: &ServiceMap) -> Vec<Issue> {
    let owners = group(map.services.iter().flat_map(|s| {
        s.owns_entities
            .iter()
            .map(move |e| (e.as_str(), s.name.as_str()))
    }));

    owners
        .into_iter()
        .filter(|(_, services)| services.len() > 1)
        .map(|(entity, services)| {
            Issue::new(
                ValidationCheck::DuplicateEntityOwnership,
                Severity::Blocking,
                format!(
                    "Entity '{}' is owned by multiple services: {}",
                    entity,
                    services.join(", ")
                ),
            )
            .with_details(json!({ "entity": entity, "services": services }))
        })
        .collect()
}

fn check_unconsumed_contracts(map: &ServiceMap) -> Vec<Issue> {
    let consumed: HashSet<&str> = map
        .services
        .iter()
        .flat_map(|s| s.consumes_contracts.iter().map(String::as_str))
        .collect();

    let mut issues = Vec::new();
    for service in &map.services {
        for contract in &service.provides_contracts {
            if !consumed.contains(contract.as_str()) {
                issues.push(
                    Issue::new(
                        ValidationCheck::UnconsumedContract,
                        Severity::Warning,
                        format!(
                            "Contract '{}' provided by '{}' is not consumed by any service",
                            contract, service.name
                        ),
                    )
                    .with_details(json!({ "contract": contract, "service": service.name })),
                );
            }
        }
    }
    issues
}

fn check_missing_providers(map: &ServiceMap) -> Vec<Issue> {
    let provided = providers(map);
    let mut issues = Vec::new();
    for service in &map.services {
        for contract in &service.consumes_contracts {
            if !provided.contains_key(contract.as_str()) {
                issues.push(
                    Issue::new(
                        ValidationCheck::MissingContractProvider,
                        Severity::Blocking,
                        format!(
                            "Service '{}' consumes '{}' which no service provides",
                            service.name, contract
                        ),
                    )
                    .with_details(json!({ "contract": contract, "service": service.name })),
                );
            }
        }
    }
    issues
}

fn check_cycles(map: &ServiceMap, max_steps: usize) -> Vec<Issue> {
    let provided = providers(map);
    let mut graph: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for service in &map.services {
        let edges = graph.entry(service.name.as_str()).or_default();
        for contract in &service.consumes_contracts {
            let Some(providing) = provided.get(contract.as_str()) else {
                continue;
            };
            edges.extend(
                providing
                    .iter()
                    .copied()
                    .filter(|provider| *provider != service.name),
            );
        }
    }

    let search = simple_cycles(&graph, max_steps);
    let mut issues: Vec<Issue> = search
        .cycles
        .iter()
        .map(|cycle| {
            Issue::new(
                ValidationCheck::CircularDependency,
                Severity::Blocking,
                format!("Circular dependency: {}", cycle.join(" -> ")),
            )
            .with_details(json!({ "cycle": cycle }))
        })
        .collect();

    if !search.complete {
        warn!(
            "cycle search stopped after {} steps with {} cycles found",
            max_steps,
            search.cycles.len()
        );
        issues.push(
            Issue::new(
                ValidationCheck::CircularDependency,
                Severity::Blocking,
                format!(
                    "Circular dependency search stopped after {} steps; further cycles may exist",
                    max_steps
                ),
            )
            .with_details(json!({
                "incomplete": true,
                "max_steps": max_steps,
                "cycles_found": search.cycles.len(),
            })),
        );
    }
    issues
}

/// Simple cycles found by [`simple_cycles`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSearch<'a> {
    pub cycles: Vec<Vec<&'a str>>,
    /// False when the step budget ran out before the graph was exhausted
    pub complete: bool,
}

/// Enumerate every simple cycle of a directed graph, within `max_steps` DFS steps.
///
/// Each cycle is reported once, starting from its smallest node, with that
/// node repeated at the end. When the budget runs out the cycles found so far
/// are returned with `complete` unset.
pub fn simple_cycles<'a>(
    graph: &BTreeMap<&'a str, BTreeSet<&'a str>>,
    max_steps: usize,
) -> CycleSearch<'a> {
    let mut walk = Walk {
        graph,
        max_steps,
        steps: 0,
        path: Vec::new(),
        cycles: Vec::new(),
    };
    let mut complete = true;
    for &start in graph.keys() {
        walk.path.clear();
        walk.path.push(start);
        if !walk.visit(start, start) {
            complete = false;
            break;
        }
    }
    CycleSearch {
        cycles: walk.cycles,
        complete,
    }
}

struct Walk<'g, 'a> {
    graph: &'g BTreeMap<&'a str, BTreeSet<&'a str>>,
    max_steps: usize,
    steps: usize,
    path: Vec<&'a str>,
    cycles: Vec<Vec<&'a str>>,
}

impl<'g, 'a> Walk<'g, 'a> {
    // Only nodes ordered after `start` are entered. Returns false once the
    // step budget is spent.
    fn visit(&mut self, start: &'a str, node: &'a str) -> bool {
        self.steps += 1;
        if self.steps > self.max_steps {
            return false;
        }

        let graph = self.graph;
        let Some(next) = graph.get(node) else {
            return true;
        };
        for &neighbor in next {
            if neighbor == start {
                let mut cycle = self.path.clone();
                cycle.push(start);
                self.cycles.push(cycle);
            } else if neighbor > start && !self.path.contains(&neighbor) {
                self.path.push(neighbor);
                let finished = self.visit(start, neighbor);
                self.path.pop();
                if !finished {
                    return false;
                }
            }
        }
        true
    }
}

fn check_isolated_services(map: &ServiceMap) -> Vec<Issue> {
    map.services
        .iter()
        .filter(|s| s.provides_contracts.is_empty() && s.consumes_contracts.is_empty())
        .map(|s| {
            Issue::new(
                ValidationCheck::IsolatedService,
                Severity::Warning,
                format!("Service '{}' neither provides nor consumes any contract", s.name),
            )
            .with_details(json!({ "service": s.name }))
        })
        .collect()
}

fn check_empty_entities(model: &DomainModel) -> Vec<Issue> {
    model
        .entities
        .iter()
        .filter(|e| e.fields.is_empty())
        .map(|e| {
            Issue::new(
                ValidationCheck::EmptyEntity,
                Severity::Warning,
                format!("Entity '{}' has no fields", e.name),
            )
            .with_details(json!({ "entity": e.name }))
        })
        .collect()
}

fn check_state_transitions(model: &DomainModel) -> Vec<Issue> {
    let mut issues = Vec::new();
    for entity in &model.entities {
        let Some(machine) = &entity.state_machine else {
            continue;
        };
        for transition in &machine.transitions {
            let missing: Vec<&str> = [&transition.from_state, &transition.to_state]
                .into_iter()
                .filter(|s| !machine.states.contains(s))
                .map(String::as_str)
                .collect();
            if missing.is_empty() {
                continue;
            }
            issues.push(
                Issue::new(
                    ValidationCheck::InvalidStateTransition,
                    Severity::Blocking,
                    format!(
                        "Entity '{}' transition '{}' ({} -> {}) uses unknown states: {}",
                        entity.name,
                        transition.trigger,
                        transition.from_state,
                        transition.to_state,
                        missing.join(", ")
                    ),
                )
                .with_details(json!({
                    "entity": entity.name,
                    "trigger": transition.trigger,
                    "unknown_states": missing,
                })),
            );
        }
    }
    issues
}

fn check_questions(questions: Option<&[String]>) -> Vec<Issue> {
    match questions {
        Some(questions) if !questions.is_empty() => vec![Issue::new(
            ValidationCheck::UnresolvedQuestions,
            Severity::Warning,
            format!("{} interview questions are unresolved", questions.len()),
        )
        .with_details(json!({ "questions": questions }))],
        _ => Vec::new(),
    }
}

fn check_service_count(map: &ServiceMap) -> Vec<Issue> {
    if map.services.len() >= 2 {
        return Vec::new();
    }
    vec![Issue::new(
        ValidationCheck::TooFewServices,
        Severity::Warning,
        format!(
            "Only {} service(s) identified; consider whether the system needs splitting",
            map.services.len()
        ),
    )
    .with_details(json!({ "count": map.services.len() }))]
}

fn check_duplicate_providers(map: &ServiceMap) -> Vec<Issue> {
    providers(map)
        .into_iter()
        .filter(|(_, services)| services.len() > 1)
        .map(|(contract, services)| {
            Issue::new(
                ValidationCheck::DuplicateContractProvider,
                Severity::Blocking,
                format!(
                    "Contract '{}' is provided by multiple services: {}",
                    contract,
                    services.join(", ")
                ),
            )
            .with_details(json!({ "contract": contract, "services": services }))
        })
        .collect()
}

fn check_service_names(map: &ServiceMap) -> Vec<Issue> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for service in &map.services {
        *counts.entry(service.name.as_str()).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, count)| {
            Issue::new(
                ValidationCheck::DuplicateServiceName,
                Severity::Error,
                format!("Service name '{}' is used {} times", name, count),
            )
            .with_details(json!({ "service": name, "count": count }))
        })
        .collect()
}

fn check_unowned_entities(map: &ServiceMap, model: &DomainModel) -> Vec<Issue> {
    let owned: HashSet<&str> = map
        .services
        .iter()
        .flat_map(|s| s.owns_entities.iter().map(String::as_str))
        .collect();

    model
        .entities
        .iter()
        .filter(|e| !owned.contains(e.name.as_str()))
        .map(|e| {
            Issue::new(
                ValidationCheck::UnownedEntity,
                Severity::Warning,
                format!("Entity '{}' is not owned by any service", e.name),
            )
            .with_details(json!({ "entity": e.name }))
        })
        .collect()
}

fn check_empty_services(map: &ServiceMap) -> Vec<Issue> {
    map.services
        .iter()
        .filter(|s| s.owns_entities.is_empty())
        .map(|s| {
            Issue::new(
                ValidationCheck::EmptyService,
                Severity::Warning,
                format!("Service '{}' owns no entities", s.name),
            )
            .with_details(json!({ "service": s.name }))
        })
        .collect()
}

fn check_relationship_endpoints(model: &DomainModel) -> Vec<Issue> {
    let known: HashSet<&str> = model.entities.iter().map(|e| e.name.as_str()).collect();

    let mut issues = Vec::new();
    for rel in &model.relationships {
        for endpoint in [&rel.source_entity, &rel.target_entity] {
            if known.contains(endpoint.as_str()) {
                continue;
            }
            issues.push(
                Issue::new(
                    ValidationCheck::DanglingRelationship,
                    Severity::Error,
                    format!(
                        "Relationship '{}' refers to unknown entity '{}'",
                        rel.description, endpoint
                    ),
                )
                .with_details(json!({
                    "source": rel.source_entity,
                    "target": rel.target_entity,
                    "missing": endpoint,
                })),
            );
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use carve_core::{
        DomainEntity, DomainRelationship, EntityField, RelationshipType, ServiceDefinition,
        ServiceStack, StateMachine, StateTransition,
    };
    use chrono::Utc;

    use super::*;

    fn service(name: &str, owns: &[&str], provides: &[&str], consumes: &[&str]) -> ServiceDefinition {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        ServiceDefinition {
            name: name.to_string(),
            domain: name.to_string(),
            description: String::new(),
            stack: ServiceStack {
                language: "python".to_string(),
                framework: None,
                database: None,
                message_broker: None,
            },
            estimated_loc: 500,
            owns_entities: strings(owns),
            provides_contracts: strings(provides),
            consumes_contracts: strings(consumes),
        }
    }

    fn map(services: Vec<ServiceDefinition>) -> ServiceMap {
        ServiceMap {
            project_name: "Test".to_string(),
            services,
            prd_hash: String::new(),
            generated_at: Utc::now(),
        }
    }

    fn entity(name: &str, fields: &[&str]) -> DomainEntity {
        DomainEntity {
            name: name.to_string(),
            description: String::new(),
            owning_service: "unassigned".to_string(),
            fields: fields
                .iter()
                .map(|f| EntityField {
                    name: f.to_string(),
                    field_type: "str".to_string(),
                    required: true,
                })
                .collect(),
            state_machine: None,
        }
    }

    fn model(entities: Vec<DomainEntity>) -> DomainModel {
        DomainModel {
            entities,
            relationships: Vec::new(),
        }
    }

    /// Two well-formed services that depend on each other in one direction
    fn healthy() -> (ServiceMap, DomainModel) {
        (
            map(vec![
                service("orders", &["Order"], &["orders-api"], &["users-api"]),
                service("users", &["User"], &["users-api"], &["orders-api"]),
            ]),
            model(vec![entity("Order", &["id"]), entity("User", &["id"])]),
        )
    }

    /// Orders depends on users, nothing depends back
    fn one_way() -> (ServiceMap, DomainModel) {
        (
            map(vec![
                service("orders", &["Order"], &["orders-api"], &["users-api"]),
                service("users", &["User"], &["users-api"], &[]),
            ]),
            model(vec![entity("Order", &["id"]), entity("User", &["id"])]),
        )
    }

    fn codes(report: &IssueReport) -> Vec<&str> {
        report.issues.iter().map(|i| i.code.as_str()).collect()
    }

    #[test]
    fn test_codes_match_order() {
        for (i, check) in ValidationCheck::ALL.iter().enumerate() {
            assert_eq!(check.code(), format!("PRD-{:03}", i + 1));
        }
        assert_eq!(
            serde_json::to_value(ValidationCheck::DanglingRelationship).unwrap(),
            "dangling_relationship"
        );
    }

    #[test]
    fn test_duplicate_entity_ownership() {
        let map = map(vec![
            service("billing", &["X"], &["billing-api"], &[]),
            service("shipping", &["X"], &["shipping-api"], &[]),
        ]);
        let report = validate(&map, &model(vec![entity("X", &["id"])]), None);

        let issues = report.by_code("PRD-001");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Blocking);
        assert!(issues[0].message.contains("billing"));
        assert!(issues[0].message.contains("shipping"));
        assert!(issues[0].message.contains("'X'"));
        assert_eq!(issues[0].details["services"], json!(["billing", "shipping"]));
        assert!(!report.is_valid());
    }

    #[test]
    fn test_contract_checks() {
        let map = map(vec![
            service("orders", &["Order"], &["orders-api"], &["billing-api"]),
            service("users", &["User"], &["users-api"], &[]),
        ]);
        let report = validate(&map, &model(vec![]), None);

        let unconsumed = report.by_code("PRD-002");
        assert_eq!(unconsumed.len(), 2);
        assert!(unconsumed.iter().all(|i| i.severity == Severity::Warning));

        let missing = report.by_code("PRD-003");
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].severity, Severity::Blocking);
        assert!(missing[0].message.contains("billing-api"));
    }

    #[test]
    fn test_two_service_cycle() {
        let map = map(vec![
            service("service-a", &["A"], &["a"], &["b"]),
            service("service-b", &["B"], &["b"], &["a"]),
        ]);
        let report = validate(&map, &model(vec![entity("A", &["id"]), entity("B", &["id"])]), None);

        let cycles = report.by_code("PRD-004");
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].severity, Severity::Blocking);
        assert_eq!(
            cycles[0].message,
            "Circular dependency: service-a -> service-b -> service-a"
        );
        assert_eq!(
            cycles[0].details["cycle"],
            json!(["service-a", "service-b", "service-a"])
        );
    }

    #[test]
    fn test_every_simple_cycle_reported_once() {
        let mut graph: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        graph.insert("a", ["b"].into_iter().collect());
        graph.insert("b", ["a", "c"].into_iter().collect());
        graph.insert("c", ["a"].into_iter().collect());
        graph.insert("d", BTreeSet::new());

        let search = simple_cycles(&graph, 1_000);
        assert!(search.complete);
        assert_eq!(search.cycles, vec![vec!["a", "b", "a"], vec!["a", "b", "c", "a"]]);
    }

    #[test]
    fn test_exhausted_search_keeps_found_cycles() {
        let mut graph: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        graph.insert("a", ["b"].into_iter().collect());
        graph.insert("b", ["a", "c"].into_iter().collect());
        graph.insert("c", ["a"].into_iter().collect());

        // a, b are visited and yield a -> b -> a; entering c exceeds the budget
        let search = simple_cycles(&graph, 2);
        assert!(!search.complete);
        assert_eq!(search.cycles, vec![vec!["a", "b", "a"]]);
    }

    #[test]
    fn test_self_consumption_is_not_a_cycle() {
        let map = map(vec![
            service("orders", &["Order"], &["orders-api"], &["orders-api"]),
            service("users", &["User"], &["users-api"], &[]),
        ]);
        let report = validate(&map, &model(vec![]), None);
        assert!(report.by_code("PRD-004").is_empty());
    }

    #[test]
    fn test_cycle_budget_exhaustion_is_blocking() {
        let (map, model) = healthy();
        let validator = Validator::new(ValidatorConfig {
            max_cycle_search_steps: 1,
        });
        let report = validator.validate(&map, &model, None);

        assert!(report.skipped_checks.is_empty());
        let issues = report.by_code("PRD-004");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Blocking);
        assert_eq!(issues[0].details["incomplete"], true);
        assert!(!report.is_valid());

        let report = validate(&map, &model, None);
        assert_eq!(report.by_code("PRD-004").len(), 1);
        assert!(report.by_code("PRD-004")[0].details.get("incomplete").is_none());
    }

    #[test]
    fn test_densely_cyclic_map_is_invalid() {
        let names: Vec<String> = ('a'..='i').map(|c| format!("svc-{}", c)).collect();
        let services = names
            .iter()
            .map(|name| {
                let provides = format!("{}-api", name);
                let consumes: Vec<String> = names
                    .iter()
                    .filter(|other| *other != name)
                    .map(|other| format!("{}-api", other))
                    .collect();
                let consumes: Vec<&str> = consumes.iter().map(String::as_str).collect();
                service(name, &["E"], &[provides.as_str()], &consumes)
            })
            .collect();
        let report = validate(&map(services), &model(vec![]), None);

        assert!(report.skipped_checks.is_empty());
        let cycles = report.by_code("PRD-004");
        assert!(cycles.len() > 1);
        assert!(cycles.last().unwrap().message.contains("stopped after 100000 steps"));
        assert!(!report.is_valid());
    }

    #[test]
    fn test_isolated_and_empty_services() {
        let map = map(vec![
            service("lonely", &[], &[], &[]),
            service("users", &["User"], &["users-api"], &[]),
        ]);
        let report = validate(&map, &model(vec![entity("User", &["id"])]), None);

        assert_eq!(report.by_code("PRD-005").len(), 1);
        assert!(report.by_code("PRD-005")[0].message.contains("lonely"));
        assert_eq!(report.by_code("PRD-013").len(), 1);
        assert!(report.by_code("PRD-013")[0].message.contains("lonely"));
    }

    #[test]
    fn test_empty_entity() {
        let (map, _) = healthy();
        let report = validate(&map, &model(vec![entity("Order", &[]), entity("User", &["id"])]), None);

        let issues = report.by_code("PRD-006");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].details["entity"], "Order");
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_invalid_state_transition() {
        let (map, mut model) = healthy();
        model.entities[0].state_machine = Some(StateMachine {
            states: vec!["pending".into(), "paid".into()],
            initial_state: "pending".into(),
            transitions: vec![
                StateTransition {
                    from_state: "pending".into(),
                    to_state: "paid".into(),
                    trigger: "pay".into(),
                },
                StateTransition {
                    from_state: "paid".into(),
                    to_state: "refunded".into(),
                    trigger: "refund".into(),
                },
            ],
        });
        let report = validate(&map, &model, None);

        let issues = report.by_code("PRD-007");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Blocking);
        assert_eq!(issues[0].details["unknown_states"], json!(["refunded"]));
    }

    #[test]
    fn test_unresolved_questions() {
        let (map, model) = one_way();
        assert!(validate(&map, &model, None).by_code("PRD-008").is_empty());
        let none: Vec<String> = Vec::new();
        assert!(validate(&map, &model, Some(none.as_slice())).by_code("PRD-008").is_empty());

        let questions = vec!["Which database?".to_string()];
        let report = validate(&map, &model, Some(questions.as_slice()));
        let issues = report.by_code("PRD-008");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert!(report.is_valid());
    }

    #[test]
    fn test_too_few_services() {
        let map = map(vec![service("solo", &["User"], &["solo-api"], &[])]);
        let report = validate(&map, &model(vec![entity("User", &["id"])]), None);
        assert_eq!(report.by_code("PRD-009").len(), 1);

        let (map, model) = healthy();
        assert!(validate(&map, &model, None).by_code("PRD-009").is_empty());
    }

    #[test]
    fn test_duplicate_contract_provider() {
        let map = map(vec![
            service("orders", &["Order"], &["shared-api"], &[]),
            service("users", &["User"], &["shared-api"], &[]),
        ]);
        let report = validate(&map, &model(vec![]), None);

        let issues = report.by_code("PRD-010");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Blocking);
        assert_eq!(issues[0].details["services"], json!(["orders", "users"]));
    }

    #[test]
    fn test_duplicate_service_name() {
        let map = map(vec![
            service("orders", &["Order"], &["orders-api"], &[]),
            service("orders", &["User"], &["users-api"], &[]),
        ]);
        let report = validate(&map, &model(vec![]), None);

        let issues = report.by_code("PRD-011");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
        assert!(!report.is_valid());
    }

    #[test]
    fn test_unowned_entity() {
        let (map, mut model) = healthy();
        model.entities.push(entity("Invoice", &["id"]));
        let report = validate(&map, &model, None);

        let issues = report.by_code("PRD-012");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Invoice"));
    }

    #[test]
    fn test_dangling_relationship() {
        let (map, mut model) = healthy();
        model.relationships = vec![
            DomainRelationship {
                source_entity: "Order".into(),
                target_entity: "User".into(),
                relationship_type: RelationshipType::BelongsTo,
                cardinality: "N:1".into(),
                description: "Order belongs to User".into(),
            },
            DomainRelationship {
                source_entity: "Ghost".into(),
                target_entity: "Phantom".into(),
                relationship_type: RelationshipType::References,
                cardinality: "1:N".into(),
                description: "Ghost references Phantom".into(),
            },
        ];
        let report = validate(&map, &model, None);

        let issues = report.by_code("PRD-014");
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == Severity::Error));
        assert_eq!(issues[0].details["missing"], "Ghost");
        assert_eq!(issues[1].details["missing"], "Phantom");
    }

    #[test]
    fn test_healthy_map_has_only_the_cycle() {
        let (map, model) = healthy();
        let report = validate(&map, &model, None);
        assert_eq!(codes(&report), vec!["PRD-004"]);
    }

    #[test]
    fn test_one_way_dependency_is_valid() {
        let (map, model) = one_way();
        let report = validate(&map, &model, None);

        assert!(report.is_valid());
        assert_eq!(codes(&report), vec!["PRD-002"]);
    }

    #[test]
    fn test_empty_inputs() {
        let report = validate(&map(vec![]), &model(vec![]), None);
        assert_eq!(codes(&report), vec!["PRD-009"]);
        assert!(report.is_valid());
    }
}
