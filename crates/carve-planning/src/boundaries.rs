//! Service boundary identification
//!
//! Partitions the parsed entities into boundaries: explicit bounded contexts
//! first, then aggregates discovered from the ownership graph, then
//! relationship affinity, and finally a single project-wide fallback.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use carve_core::{contract_name, kebab_case, ParsedDocument, RelationshipType, ServiceBoundary};
use tracing::{debug, info, instrument};

use crate::prd::normalize_context_key;

/// Boundary collecting entities with no relationship evidence
pub const MISCELLANEOUS: &str = "Miscellaneous";
pub const MISCELLANEOUS_DOMAIN: &str = "shared";
/// Domain of the single project-wide boundary
pub const GENERAL_DOMAIN: &str = "general";

/// Relationship kinds that pull an unassigned entity towards a boundary
const AFFINITY_KINDS: [RelationshipType; 3] = [
    RelationshipType::References,
    RelationshipType::Triggers,
    RelationshipType::DependsOn,
];

/// Boundaries under construction with an entity → boundary index
struct Partition<'a> {
    boundaries: Vec<ServiceBoundary>,
    owner: HashMap<&'a str, usize>,
}

impl<'a> Partition<'a> {
    fn new() -> Self {
        Self {
            boundaries: Vec::new(),
            owner: HashMap::new(),
        }
    }

    fn push(&mut self, boundary: ServiceBoundary) -> usize {
        self.boundaries.push(boundary);
        self.boundaries.len() - 1
    }

    fn is_claimed(&self, entity: &str) -> bool {
        self.owner.contains_key(entity)
    }

    fn claim(&mut self, entity: &'a str, idx: usize) {
        if !self.is_claimed(entity) {
            self.owner.insert(entity, idx);
            self.boundaries[idx].entities.push(entity.to_string());
        }
    }
}

/// Identify service boundaries for a parsed document.
///
/// Always returns at least one boundary, and every document entity appears in
/// exactly one of them.
#[instrument(skip_all)]
pub fn identify_boundaries(doc: &ParsedDocument) -> Vec<ServiceBoundary> {
    let names: Vec<&str> = doc.entity_names();
    let known: BTreeSet<&str> = names.iter().copied().collect();
    let mut partition = Partition::new();

    seed_from_contexts(doc, &known, &mut partition);
    debug!("{} boundaries seeded from bounded contexts", partition.boundaries.len());

    seed_from_aggregates(doc, &names, &known, &mut partition);
    debug!("{} boundaries after aggregate discovery", partition.boundaries.len());

    if !partition.boundaries.is_empty() {
        assign_by_affinity(doc, &names, &mut partition);
    } else {
        let idx = partition.push(ServiceBoundary::new(
            doc.project_name.clone(),
            GENERAL_DOMAIN,
            format!("All entities of {}", doc.project_name),
        ));
        for &name in &names {
            partition.claim(name, idx);
        }
    }

    // Nothing should be left at this point; keep the partition total regardless
    for &name in &names {
        partition.claim(name, 0);
    }

    let mut boundaries = partition.boundaries;
    derive_contracts(doc, &mut boundaries);
    info!(
        "identified {} boundaries for {} entities",
        boundaries.len(),
        names.len()
    );
    boundaries
}

/// Step 1: one boundary per distinct bounded context
fn seed_from_contexts<'a>(
    doc: &'a ParsedDocument,
    known: &BTreeSet<&str>,
    partition: &mut Partition<'a>,
) {
    let mut by_key: HashMap<String, usize> = HashMap::new();
    for context in &doc.bounded_contexts {
        let key = normalize_context_key(&context.name);
        let idx = match by_key.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = partition.push(ServiceBoundary::new(
                    context.name.clone(),
                    kebab_case(&key),
                    context.description.clone(),
                ));
                by_key.insert(key, idx);
                idx
            }
        };
        for entity in &context.entities {
            if known.contains(entity.as_str()) {
                partition.claim(entity, idx);
            }
        }
    }
}

/// Step 2: aggregate roots of the OWNS graph among unassigned entities
fn seed_from_aggregates<'a>(
    doc: &'a ParsedDocument,
    names: &[&'a str],
    known: &BTreeSet<&str>,
    partition: &mut Partition<'a>,
) {
    let mut children: BTreeMap<&'a str, Vec<&'a str>> = BTreeMap::new();
    let mut owned: BTreeSet<&'a str> = BTreeSet::new();
    for rel in doc.relationships.iter().filter(|r| r.kind() == RelationshipType::Owns) {
        let (source, target) = (rel.source.as_str(), rel.target.as_str());
        if source == target
            || !known.contains(source)
            || !known.contains(target)
            || partition.is_claimed(source)
            || partition.is_claimed(target)
        {
            continue;
        }
        let list = children.entry(source).or_default();
        if !list.contains(&target) {
            list.push(target);
        }
        owned.insert(target);
    }

    // BTreeMap iteration gives the sorted-name order
    let roots: Vec<&'a str> = children
        .keys()
        .copied()
        .filter(|name| !owned.contains(name))
        .collect();

    for root in roots {
        if partition.is_claimed(root) {
            continue;
        }
        let idx = partition.push(ServiceBoundary::new(
            root,
            kebab_case(root),
            format!("Aggregate rooted at {}", root),
        ));
        partition.claim(root, idx);
        for &child in children.get(root).into_iter().flatten() {
            if names.contains(&child) {
                partition.claim(child, idx);
            }
        }
    }
}

/// Step 3: join the boundary sharing the most non-ownership relationships
fn assign_by_affinity<'a>(doc: &ParsedDocument, names: &[&'a str], partition: &mut Partition<'a>) {
    let mut miscellaneous: Option<usize> = None;
    for &name in names {
        if partition.is_claimed(name) {
            continue;
        }

        let mut votes = vec![0usize; partition.boundaries.len()];
        for rel in doc
            .relationships
            .iter()
            .filter(|r| AFFINITY_KINDS.contains(&r.kind()))
        {
            let other = if rel.source == name {
                rel.target.as_str()
            } else if rel.target == name {
                rel.source.as_str()
            } else {
                continue;
            };
            if let Some(&idx) = partition.owner.get(other) {
                votes[idx] += 1;
            }
        }

        let mut best: Option<(usize, usize)> = None;
        for (idx, &count) in votes.iter().enumerate() {
            if count > 0 && best.map_or(true, |(_, top)| count > top) {
                best = Some((idx, count));
            }
        }

        let idx = match best {
            Some((idx, _)) => idx,
            None => *miscellaneous.get_or_insert_with(|| {
                partition.push(ServiceBoundary::new(
                    MISCELLANEOUS,
                    MISCELLANEOUS_DOMAIN,
                    "Entities without a clear owning service",
                ))
            }),
        };
        partition.claim(name, idx);
    }
}

/// Every boundary provides `{kebab(name)}-api`; cross-boundary relationships add consumers.
///
/// `BELONGS_TO` couples both ways, so the target also consumes the source's contract.
pub fn derive_contracts(doc: &ParsedDocument, boundaries: &mut [ServiceBoundary]) {
    let mut owner: HashMap<String, usize> = HashMap::new();
    for (idx, boundary) in boundaries.iter_mut().enumerate() {
        boundary.provides_contracts = vec![contract_name(&boundary.name)];
        for entity in &boundary.entities {
            owner.entry(entity.clone()).or_insert(idx);
        }
    }

    for rel in &doc.relationships {
        let kind = rel.kind();
        if kind == RelationshipType::Owns {
            continue;
        }
        let (Some(&source), Some(&target)) = (owner.get(&rel.source), owner.get(&rel.target)) else {
            continue;
        };
        if source == target {
            continue;
        }
        add_consumed(boundaries, source, target);
        if kind == RelationshipType::BelongsTo {
            add_consumed(boundaries, target, source);
        }
    }
}

fn add_consumed(boundaries: &mut [ServiceBoundary], consumer: usize, provider: usize) {
    let contract = contract_name(&boundaries[provider].name);
    let list = &mut boundaries[consumer].consumes_contracts;
    if !list.contains(&contract) {
        list.push(contract);
    }
}

#[cfg(test)]
mod tests {
    use carve_core::{RawContext, RawEntity, RawRelationship};

    use super::*;

    fn doc(entities: &[&str], relationships: &[(&str, &str, &str)]) -> ParsedDocument {
        ParsedDocument {
            project_name: "Test Project".to_string(),
            entities: entities.iter().map(|n| RawEntity::new(*n)).collect(),
            relationships: relationships
                .iter()
                .map(|(s, t, k)| RawRelationship::new(*s, *t, *k, None))
                .collect(),
            ..Default::default()
        }
    }

    fn context(name: &str, entities: &[&str]) -> RawContext {
        RawContext {
            name: name.to_string(),
            description: format!("{} context", name),
            entities: entities.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn layout(boundaries: &[ServiceBoundary]) -> Vec<(&str, Vec<&str>)> {
        boundaries
            .iter()
            .map(|b| (b.name.as_str(), b.entities.iter().map(String::as_str).collect()))
            .collect()
    }

    #[test]
    fn test_aggregate_root_boundary() {
        let d = doc(&["User", "Profile"], &[("User", "Profile", "OWNS")]);
        let boundaries = identify_boundaries(&d);
        assert_eq!(layout(&boundaries), vec![("User", vec!["User", "Profile"])]);
        assert_eq!(boundaries[0].domain, "user");
        assert_eq!(boundaries[0].provides_contracts, vec!["user-api"]);
    }

    #[test]
    fn test_roots_processed_in_sorted_order() {
        let d = doc(
            &["Zone", "Shelf", "Account", "Wallet"],
            &[("Zone", "Shelf", "OWNS"), ("Account", "Wallet", "OWNS")],
        );
        let names: Vec<_> = identify_boundaries(&d).into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Account", "Zone"]);
    }

    #[test]
    fn test_contexts_seed_and_merge() {
        let mut d = doc(&["User", "Order", "Invoice"], &[]);
        d.bounded_contexts = vec![
            context("Order Service", &["Order", "Ghost"]),
            context("Identity", &["User"]),
            context("order", &["Invoice"]),
        ];
        let boundaries = identify_boundaries(&d);
        assert_eq!(
            layout(&boundaries),
            vec![
                ("Order Service", vec!["Order", "Invoice"]),
                ("Identity", vec!["User"]),
            ]
        );
        assert_eq!(boundaries[0].domain, "order");
    }

    #[test]
    fn test_affinity_and_miscellaneous() {
        let mut d = doc(
            &["User", "Order", "Session", "Coupon", "Audit"],
            &[("Session", "User", "REFERENCES"), ("Coupon", "Order", "DEPENDS_ON"), ("Audit", "Order", "OWNS")],
        );
        d.bounded_contexts = vec![context("Identity", &["User"]), context("Orders", &["Order"])];
        let boundaries = identify_boundaries(&d);
        assert_eq!(
            layout(&boundaries),
            vec![
                ("Identity", vec!["User", "Session"]),
                ("Orders", vec!["Order", "Coupon"]),
                ("Miscellaneous", vec!["Audit"]),
            ]
        );
        assert_eq!(boundaries[2].domain, MISCELLANEOUS_DOMAIN);
    }

    #[test]
    fn test_affinity_tie_keeps_first_boundary() {
        let mut d = doc(
            &["A", "B", "C"],
            &[("C", "B", "REFERENCES"), ("C", "A", "TRIGGERS")],
        );
        d.bounded_contexts = vec![context("First", &["A"]), context("Second", &["B"])];
        let boundaries = identify_boundaries(&d);
        assert_eq!(boundaries[0].entities, vec!["A", "C"]);
    }

    #[test]
    fn test_project_fallback() {
        let d = doc(&["Alpha", "Beta"], &[("Alpha", "Beta", "REFERENCES")]);
        let boundaries = identify_boundaries(&d);
        assert_eq!(layout(&boundaries), vec![("Test Project", vec!["Alpha", "Beta"])]);
        assert_eq!(boundaries[0].domain, GENERAL_DOMAIN);
        assert_eq!(boundaries[0].provides_contracts, vec!["test-project-api"]);
    }

    #[test]
    fn test_empty_document_still_has_a_boundary() {
        let boundaries = identify_boundaries(&doc(&[], &[]));
        assert_eq!(boundaries.len(), 1);
        assert!(boundaries[0].entities.is_empty());
    }

    #[test]
    fn test_contract_derivation() {
        let mut d = doc(
            &["User", "Order", "Payment"],
            &[
                ("Order", "User", "REFERENCES"),
                ("Order", "User", "DEPENDS_ON"),
                ("Payment", "Order", "BELONGS_TO"),
                ("User", "Order", "OWNS"),
            ],
        );
        d.bounded_contexts = vec![
            context("Identity", &["User"]),
            context("Orders", &["Order"]),
            context("Payments", &["Payment"]),
        ];
        let boundaries = identify_boundaries(&d);
        assert!(boundaries[0].consumes_contracts.is_empty());
        assert_eq!(boundaries[1].consumes_contracts, vec!["identity-api", "payments-api"]);
        assert_eq!(boundaries[2].consumes_contracts, vec!["orders-api"]);
    }
}
