//! Relationship extraction

use std::collections::HashSet;

use carve_core::{RawEntity, RawRelationship};
use regex::Regex;
use tracing::debug;

use super::text::{window, NameIndex};

/// Characters searched on each side of a match for an explicit cardinality label
const CARDINALITY_WINDOW: usize = 60;

/// Keyword phrase, relationship type, default cardinality
const KEYWORDS: &[(&str, &str, &str)] = &[
    (r"has\s+many", "OWNS", "1:N"),
    (r"has\s+one", "OWNS", "1:1"),
    (r"has\s+an?", "OWNS", "1:1"),
    (r"owns", "OWNS", "1:N"),
    (r"contains", "OWNS", "1:N"),
    (r"has", "OWNS", "1:N"),
    (r"belongs\s+to", "BELONGS_TO", "N:1"),
    (r"is\s+part\s+of", "BELONGS_TO", "N:1"),
    (r"references", "REFERENCES", "N:1"),
    (r"refers\s+to", "REFERENCES", "N:1"),
    (r"is\s+associated\s+with", "REFERENCES", "N:N"),
    (r"links\s+to", "REFERENCES", "N:1"),
    (r"depends\s+on", "DEPENDS_ON", "N:1"),
    (r"requires", "DEPENDS_ON", "N:1"),
    (r"uses", "DEPENDS_ON", "N:1"),
    (r"triggers", "TRIGGERS", "1:N"),
    (r"creates", "TRIGGERS", "1:N"),
    (r"generates", "TRIGGERS", "1:N"),
    (r"extends", "EXTENDS", "1:1"),
    (r"inherits\s+from", "EXTENDS", "1:1"),
];

/// Compiled `Entity <keyword> [quantifier] Entity` patterns, built once
fn keyword_patterns() -> &'static [(Regex, &'static str, &'static str)] {
    static PATTERNS: std::sync::OnceLock<Vec<(Regex, &'static str, &'static str)>> =
        std::sync::OnceLock::new();
    PATTERNS.get_or_init(|| {
        KEYWORDS
            .iter()
            .map(|(keyword, kind, cardinality)| {
                let pattern = format!(
                    r"\b([A-Z][A-Za-z0-9]*)\s+(?i:{})\s+(?:(?i:an?|the|many|multiple|several|one\s+or\s+more|zero\s+or\s+more|one|a\s+single)\s+)?([A-Z][A-Za-z0-9]*)",
                    keyword
                );
                (Regex::new(&pattern).unwrap(), *kind, *cardinality)
            })
            .collect()
    })
}

/// Lowercase-tolerant sentence patterns for terse PRDs
fn prose_patterns() -> [(&'static Regex, &'static str, &'static str); 5] {
    [
        (
            regex!(r"(?i)\beach\s+(\w+)\s+(?:has|have|contains?)\s+(?:many|multiple|several|one\s+or\s+more)\s+(\w+)"),
            "OWNS",
            "1:N",
        ),
        (
            regex!(r"(?i)\beach\s+(\w+)\s+belongs\s+to\s+(?:an?|one|the|a\s+single)\s+(\w+)"),
            "BELONGS_TO",
            "N:1",
        ),
        (
            regex!(r"(?i)\b(\w+)\s+can\s+(?:have|own|create|place|hold)\s+(?:many|multiple|several)\s+(\w+)"),
            "OWNS",
            "1:N",
        ),
        (
            regex!(r"(?i)\ban?\s+(\w+)\s+(?:is|are)\s+(?:linked|tied|attached|assigned)\s+to\s+(?:an?|the|one)\s+(\w+)"),
            "REFERENCES",
            "N:1",
        ),
        (
            regex!(r"(?i)\b(\w+)\s+(?:is|are)\s+(?:made\s+up|composed|comprised)\s+of\s+(?:(?:many|multiple|several|one\s+or\s+more)\s+)?(\w+)"),
            "OWNS",
            "1:N",
        ),
    ]
}

/// Explicit cardinality label near a match
fn explicit_cardinality(text: &str, range: std::ops::Range<usize>) -> Option<String> {
    let label = regex!(
        r"(?i)\b(one[- ]to[- ]one|one[- ]to[- ]many|many[- ]to[- ]one|many[- ]to[- ]many)\b|(?:^|[^A-Za-z0-9])([1NM*]\s*:\s*[1NM*])(?:$|[^A-Za-z0-9])"
    );
    let caps = label.captures(window(text, range, CARDINALITY_WINDOW))?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Deduplicating collector keyed by `(source, target, type)`
#[derive(Default)]
struct RelationshipSet {
    seen: HashSet<(String, String, String)>,
    items: Vec<RawRelationship>,
}

impl RelationshipSet {
    fn push(&mut self, source: &str, target: &str, kind: &str, cardinality: String) {
        if source == target {
            return;
        }
        let key = (source.to_string(), target.to_string(), kind.to_string());
        if self.seen.insert(key) {
            self.items
                .push(RawRelationship::new(source, target, kind, Some(cardinality)));
        }
    }
}

pub(crate) fn extract_relationships(text: &str, entities: &[RawEntity]) -> Vec<RawRelationship> {
    if entities.len() < 2 {
        return Vec::new();
    }
    let index = NameIndex::new(entities);
    let mut found = RelationshipSet::default();

    for (pattern, kind, default_cardinality) in keyword_patterns() {
        let mut pos = 0;
        // Restart right after the source so chained sentences ("A has B has C") are all seen
        while let Some(caps) = pattern.captures_at(text, pos) {
            let (Some(whole), Some(src), Some(dst)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                break;
            };
            if let (Some(source), Some(target)) =
                (index.resolve(src.as_str()), index.resolve(dst.as_str()))
            {
                let cardinality = explicit_cardinality(text, whole.range())
                    .unwrap_or_else(|| default_cardinality.to_string());
                found.push(source, target, kind, cardinality);
            }
            pos = src.end();
        }
    }

    let arrow = regex!(r"\b([A-Z][A-Za-z0-9]*)\s*(?:-{1,2}>|→)\s*([A-Z][A-Za-z0-9]*)");
    let mut pos = 0;
    while let Some(caps) = arrow.captures_at(text, pos) {
        let (Some(whole), Some(src), Some(dst)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            break;
        };
        if let (Some(source), Some(target)) =
            (index.resolve(src.as_str()), index.resolve(dst.as_str()))
        {
            let cardinality =
                explicit_cardinality(text, whole.range()).unwrap_or_else(|| "N:1".to_string());
            found.push(source, target, "REFERENCES", cardinality);
        }
        // Chains: "A -> B -> C" yields A→B and B→C
        pos = dst.start();
    }

    for (pattern, kind, default_cardinality) in prose_patterns() {
        for caps in pattern.captures_iter(text) {
            let (Some(whole), Some(src), Some(dst)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            if let (Some(source), Some(target)) =
                (index.resolve(src.as_str()), index.resolve(dst.as_str()))
            {
                let cardinality = explicit_cardinality(text, whole.range())
                    .unwrap_or_else(|| default_cardinality.to_string());
                found.push(source, target, kind, cardinality);
            }
        }
    }

    debug!("extracted {} relationships", found.items.len());
    found.items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(names: &[&str]) -> Vec<RawEntity> {
        names.iter().map(|n| RawEntity::new(*n)).collect()
    }

    fn triples(rels: &[RawRelationship]) -> Vec<(String, String, String, String)> {
        rels.iter()
            .map(|r| {
                (
                    r.source.clone(),
                    r.target.clone(),
                    r.relationship_type.clone(),
                    r.cardinality.clone().unwrap_or_default(),
                )
            })
            .collect()
    }

    #[test]
    fn test_has_many() {
        let rels = extract_relationships("User has many Order.", &entities(&["User", "Order"]));
        assert_eq!(
            triples(&rels),
            vec![("User".into(), "Order".into(), "OWNS".into(), "1:N".into())]
        );
    }

    #[test]
    fn test_plural_and_unknown_targets() {
        let rels = extract_relationships(
            "Customer has many Orders. Customer references Warehouse.",
            &entities(&["Customer", "Order"]),
        );
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].target, "Order");
    }

    #[test]
    fn test_explicit_cardinality_label() {
        let rels = extract_relationships(
            "Student is associated with Course (many-to-many).",
            &entities(&["Student", "Course"]),
        );
        assert_eq!(rels[0].relationship_type, "REFERENCES");
        assert_eq!(rels[0].cardinality.as_deref(), Some("many-to-many"));
    }

    #[test]
    fn test_arrow_chain() {
        let rels = extract_relationships(
            "Flow: Cart -> Order --> Invoice",
            &entities(&["Cart", "Order", "Invoice"]),
        );
        let pairs: Vec<_> = rels.iter().map(|r| (r.source.as_str(), r.target.as_str())).collect();
        assert_eq!(pairs, vec![("Cart", "Order"), ("Order", "Invoice")]);
        assert!(rels.iter().all(|r| r.relationship_type == "REFERENCES"));
    }

    #[test]
    fn test_lowercase_prose() {
        let text = "each order belongs to a customer. customers can place many orders.";
        let rels = extract_relationships(text, &entities(&["Customer", "Order"]));
        let found = triples(&rels);
        assert!(found.contains(&("Order".into(), "Customer".into(), "BELONGS_TO".into(), "N:1".into())));
        assert!(found.contains(&("Customer".into(), "Order".into(), "OWNS".into(), "1:N".into())));
    }

    #[test]
    fn test_dedup_keeps_distinct_types() {
        let text = "User has many Order. User owns Order. User references Order.";
        let rels = extract_relationships(text, &entities(&["User", "Order"]));
        let kinds: Vec<_> = rels.iter().map(|r| r.relationship_type.as_str()).collect();
        assert_eq!(kinds, vec!["OWNS", "REFERENCES"]);
    }

    #[test]
    fn test_single_entity_has_no_relationships() {
        assert!(extract_relationships("User has many User.", &entities(&["User"])).is_empty());
    }
}
