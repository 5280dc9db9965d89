//! State-machine detection
//!
//! Four strategies propose states and transitions per entity; results are merged
//! by case-insensitive entity name, keeping states in first-discovery order.

use std::collections::HashMap;

use carve_core::{RawEntity, RawStateMachine, RawTransition};
use tracing::debug;

use super::entities::entity_name_from_heading;
use super::text::{bullet_content, split_list, strip_markup, to_snake, truncate_chars, Document, NameIndex};

/// Longest state name, in words, accepted from a value list
const MAX_STATE_WORDS: usize = 3;

/// Per-entity accumulator
#[derive(Debug)]
struct Draft {
    entity: String,
    states: Vec<String>,
    transitions: Vec<RawTransition>,
}

impl Draft {
    fn add_state(&mut self, state: &str) {
        if !state.is_empty() && !self.states.iter().any(|s| s == state) {
            self.states.push(state.to_string());
        }
    }

    fn add_transition(&mut self, from: &str, to: &str, trigger: String) {
        if from.is_empty() || to.is_empty() {
            return;
        }
        self.add_state(from);
        self.add_state(to);
        let duplicate = self
            .transitions
            .iter()
            .any(|t| t.from_state == from && t.to_state == to);
        if !duplicate {
            self.transitions.push(RawTransition {
                from_state: from.to_string(),
                to_state: to.to_string(),
                trigger,
            });
        }
    }
}

#[derive(Debug, Default)]
struct MachineArena {
    drafts: Vec<Draft>,
    index: HashMap<String, usize>,
}

impl MachineArena {
    fn draft(&mut self, entity: &str) -> &mut Draft {
        let key = entity.to_lowercase();
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.index.insert(key, self.drafts.len());
                self.drafts.push(Draft {
                    entity: entity.to_string(),
                    states: Vec::new(),
                    transitions: Vec::new(),
                });
                self.drafts.len() - 1
            }
        };
        &mut self.drafts[idx]
    }

    fn add_states(&mut self, entity: &str, states: &[String]) {
        let draft = self.draft(entity);
        for state in states {
            draft.add_state(state);
        }
    }

    fn into_machines(self) -> Vec<RawStateMachine> {
        self.drafts
            .into_iter()
            .filter(|d| d.states.len() >= 2)
            .map(|d| {
                let transitions = if d.transitions.is_empty() {
                    linear_chain(&d.states)
                } else {
                    d.transitions
                };
                RawStateMachine {
                    entity: d.entity,
                    states: d.states,
                    transitions,
                }
            })
            .collect()
    }
}

/// `a, b, c` → `a→b`, `b→c`, triggered by `"{from}_to_{to}"`
pub fn linear_chain(states: &[String]) -> Vec<RawTransition> {
    states
        .windows(2)
        .map(|pair| RawTransition {
            from_state: pair[0].clone(),
            to_state: pair[1].clone(),
            trigger: format!("{}_to_{}", pair[0], pair[1]),
        })
        .collect()
}

/// Normalize a comma/or list of state names; `None` unless at least two survive
fn state_list(raw: &str) -> Option<Vec<String>> {
    let raw = raw.trim().trim_end_matches(|c: char| c == '.' || c == ';');
    let mut states: Vec<String> = Vec::new();
    for item in split_list(raw) {
        let item = regex!(r"(?i)^(?:either|or|and)\s+").replace(item.trim(), "");
        if item.split_whitespace().count() > MAX_STATE_WORDS {
            return None;
        }
        let state = to_snake(&item);
        if !state.is_empty() && !states.contains(&state) {
            states.push(state);
        }
    }
    (states.len() >= 2).then_some(states)
}

fn has_arrow(s: &str) -> bool {
    s.contains("->") || s.contains('→') || s.contains("=>")
}

/// `pending -> paid (on payment) -> shipped` → transitions with optional triggers
fn arrow_transitions(line: &str) -> Vec<(String, String, String)> {
    let content = bullet_content(line).unwrap_or(line);
    let content = strip_markup(content);
    let segments: Vec<(String, Option<String>)> = regex!(r"\s*(?:-{1,2}>|→|=>)\s*")
        .split(&content)
        .map(|segment| {
            let caps = regex!(r"^\s*([^:(\[]*?)\s*(?:[:(\[]\s*(?:(?i:on|when|via)\s+)?([^)\]]*?)\s*[)\]]?)?\s*$")
                .captures(segment);
            let state = caps
                .as_ref()
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
                .unwrap_or(segment);
            let trigger = caps
                .as_ref()
                .and_then(|c| c.get(2))
                .map(|m| to_snake(m.as_str()))
                .filter(|t| !t.is_empty());
            let state = if state.split_whitespace().count() > MAX_STATE_WORDS {
                String::new()
            } else {
                to_snake(state)
            };
            (state, trigger)
        })
        .collect();

    segments
        .windows(2)
        .filter(|pair| !pair[0].0.is_empty() && !pair[1].0.is_empty())
        .map(|pair| {
            let (from, _) = &pair[0];
            let (to, trigger) = &pair[1];
            let trigger = trigger
                .clone()
                .unwrap_or_else(|| format!("{}_to_{}", from, to));
            (from.clone(), to.clone(), trigger)
        })
        .collect()
}

/// Entities owning a status-like field
fn stateful_entities(entities: &[RawEntity]) -> Vec<&str> {
    entities
        .iter()
        .filter(|e| e.has_state_field())
        .map(|e| e.name.as_str())
        .collect()
}

/// "Order status: pending, confirmed, shipped"
fn explicit_status_lists(text: &str, index: &NameIndex) -> Vec<(String, Vec<String>)> {
    let pattern = regex!(
        r"\b([A-Za-z][A-Za-z0-9]*)[ \t]+(?i:status|state|phase|stage|lifecycle)(?i:es|s)?[ \t]*(?i:values?)?[ \t]*(?:\*\*)?:(?:\*\*)?[ \t]*([^\n]+)"
    );
    pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let entity = index.resolve(caps.get(1)?.as_str())?;
            let values = caps.get(2)?.as_str();
            if has_arrow(values) {
                return None;
            }
            Some((entity.to_string(), state_list(values)?))
        })
        .collect()
}

/// "Order can be pending, paid, or cancelled"
fn can_be_lists(text: &str, index: &NameIndex) -> Vec<(String, Vec<String>)> {
    let pattern = regex!(r"\b([A-Za-z][A-Za-z0-9]*)[ \t]+(?i:can[ \t]+be)[ \t]+(?:one[ \t]+of[ \t]*:?[ \t]*)?([^.\n]+)");
    pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let entity = index.resolve(caps.get(1)?.as_str())?;
            Some((entity.to_string(), state_list(caps.get(2)?.as_str())?))
        })
        .collect()
}

/// Enum line inside the entity's own heading block
fn heading_block_enum(doc: &Document, entity: &str) -> Option<Vec<String>> {
    let pattern = regex!(
        r"(?i)\b(?:status|state|phase|stage|lifecycle|workflow_state)\b[^\n]*?\b(?:enum|one\s+of|values?)\b\s*[:=]?\s*[(\[{]?\s*([^\n)\]}|]+)"
    );
    doc.headings
        .iter()
        .filter(|h| {
            entity_name_from_heading(&h.text)
                .map(|(name, _)| name.eq_ignore_ascii_case(entity))
                .unwrap_or(false)
        })
        .flat_map(|h| doc.lines[doc.block(h)].iter())
        .find_map(|(_, line)| {
            let caps = pattern.captures(line)?;
            state_list(caps.get(1)?.as_str())
        })
}

fn from_status_fields(doc: &Document, entities: &[RawEntity], index: &NameIndex, arena: &mut MachineArena) {
    let explicit = explicit_status_lists(doc.text, index);
    let can_be = can_be_lists(doc.text, index);
    for entity in stateful_entities(entities) {
        let states = explicit
            .iter()
            .chain(can_be.iter())
            .find(|(name, _)| name == entity)
            .map(|(_, states)| states.clone())
            .or_else(|| heading_block_enum(doc, entity));
        if let Some(states) = states {
            arena.add_states(entity, &states);
        }
    }
}

fn from_transition_sentences(text: &str, index: &NameIndex, arena: &mut MachineArena) {
    let pattern = regex!(
        r"\b([A-Za-z][A-Za-z0-9]*)[ \t]+(?i:transitions?|moves?|changes?|goes|progresses|switches)[ \t]+(?i:from)[ \t]+[`'*]*(\w+)[`'*]*[ \t]+(?i:to)[ \t]+[`'*]*(\w+)[`'*]*(?:[ \t]+(?i:when|on|after|upon|once|if)[ \t]+([^.\n,;]+))?"
    );
    for caps in pattern.captures_iter(text) {
        let (Some(entity), Some(from), Some(to)) = (
            caps.get(1).and_then(|m| index.resolve(m.as_str())),
            caps.get(2),
            caps.get(3),
        ) else {
            continue;
        };
        let from = to_snake(from.as_str());
        let to = to_snake(to.as_str());
        let trigger = caps
            .get(4)
            .map(|m| truncate_chars(&to_snake(m.as_str()), 40))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("{}_to_{}", from, to));
        arena.draft(entity).add_transition(&from, &to, trigger);
    }
}

fn from_arrow_status_lines(text: &str, index: &NameIndex, arena: &mut MachineArena) {
    let pattern = regex!(
        r"\b([A-Za-z][A-Za-z0-9]*)[ \t]+(?i:status|state|states|lifecycle|workflow)[ \t]*(?:\*\*)?:(?:\*\*)?[ \t]*([^\n]+)"
    );
    for caps in pattern.captures_iter(text) {
        let (Some(entity), Some(chain)) = (caps.get(1).and_then(|m| index.resolve(m.as_str())), caps.get(2)) else {
            continue;
        };
        if !has_arrow(chain.as_str()) {
            continue;
        }
        for (from, to, trigger) in arrow_transitions(chain.as_str()) {
            arena.draft(entity).add_transition(&from, &to, trigger);
        }
    }
}

fn from_state_machine_headings(doc: &Document, index: &NameIndex, arena: &mut MachineArena) {
    let pattern = regex!(
        r"(?i)^(?:\d+(?:\.\d+)*[.)]?\s+)?([A-Za-z][A-Za-z0-9 ]*?)\s+(?:state\s+machine|lifecycle|states|status\s+flow|state\s+transitions|workflow)$"
    );
    for heading in &doc.headings {
        let title = strip_markup(&heading.text);
        let Some(raw) = pattern.captures(&title).and_then(|c| c.get(1)) else {
            continue;
        };
        let joined: String = raw.as_str().split_whitespace().collect();
        let Some(entity) = index.resolve(raw.as_str()).or_else(|| index.resolve(&joined)) else {
            continue;
        };
        for (_, line) in &doc.lines[doc.block(heading)] {
            if !has_arrow(line) {
                continue;
            }
            for (from, to, trigger) in arrow_transitions(line) {
                arena.draft(entity).add_transition(&from, &to, trigger);
            }
        }
    }
}

pub(crate) fn extract_state_machines(doc: &Document, entities: &[RawEntity]) -> Vec<RawStateMachine> {
    let index = NameIndex::new(entities);
    let mut arena = MachineArena::default();

    from_status_fields(doc, entities, &index, &mut arena);
    from_transition_sentences(doc.text, &index, &mut arena);
    from_arrow_status_lines(doc.text, &index, &mut arena);
    from_state_machine_headings(doc, &index, &mut arena);

    let machines = arena.into_machines();
    debug!("detected {} state machines", machines.len());
    machines
}

#[cfg(test)]
mod tests {
    use carve_core::RawField;

    use super::*;

    fn order_with_status() -> Vec<RawEntity> {
        vec![
            RawEntity::new("Order").with_fields(vec![
                RawField::new("id", "UUID", true),
                RawField::new("status", "str", true),
            ]),
            RawEntity::new("User"),
        ]
    }

    fn run(text: &str, entities: &[RawEntity]) -> Vec<RawStateMachine> {
        extract_state_machines(&Document::new(text), entities)
    }

    fn pairs(machine: &RawStateMachine) -> Vec<(&str, &str)> {
        machine
            .transitions
            .iter()
            .map(|t| (t.from_state.as_str(), t.to_state.as_str()))
            .collect()
    }

    #[test]
    fn test_explicit_status_list_infers_chain() {
        let machines = run("Order status: pending, confirmed, shipped", &order_with_status());
        assert_eq!(machines.len(), 1);
        let m = &machines[0];
        assert_eq!(m.entity, "Order");
        assert_eq!(m.states, vec!["pending", "confirmed", "shipped"]);
        assert_eq!(pairs(m), vec![("pending", "confirmed"), ("confirmed", "shipped")]);
        assert_eq!(m.transitions[0].trigger, "pending_to_confirmed");
    }

    #[test]
    fn test_status_list_requires_state_field() {
        let entities = vec![RawEntity::new("Order")];
        assert!(run("Order status: pending, confirmed, shipped", &entities).is_empty());
    }

    #[test]
    fn test_can_be_list() {
        let machines = run("An Order can be pending, paid, or cancelled.", &order_with_status());
        assert_eq!(machines[0].states, vec!["pending", "paid", "cancelled"]);
    }

    #[test]
    fn test_heading_block_enum() {
        let text = "### Order\n- id: UUID\n- status: enum(draft, placed, In Progress)\n";
        let machines = run(text, &order_with_status());
        assert_eq!(machines[0].states, vec!["draft", "placed", "in_progress"]);
    }

    #[test]
    fn test_transition_sentences() {
        let text = "A User transitions from invited to active when the email is confirmed. \
                    The User moves from active to suspended.";
        let machines = run(text, &order_with_status());
        assert_eq!(machines.len(), 1);
        let m = &machines[0];
        assert_eq!(m.entity, "User");
        assert_eq!(m.states, vec!["invited", "active", "suspended"]);
        assert_eq!(m.transitions[0].trigger, "the_email_is_confirmed");
        assert_eq!(m.transitions[1].trigger, "active_to_suspended");
    }

    #[test]
    fn test_arrow_status_line_with_triggers() {
        let text = "User lifecycle: invited -> active (on confirm) -> archived";
        let machines = run(text, &order_with_status());
        let m = &machines[0];
        assert_eq!(pairs(m), vec![("invited", "active"), ("active", "archived")]);
        assert_eq!(m.transitions[0].trigger, "confirm");
        assert_eq!(m.transitions[1].trigger, "active_to_archived");
    }

    #[test]
    fn test_state_machine_heading_block() {
        let text = "#### Order State Machine\n- pending -> paid\n- paid -> shipped\n- pending -> cancelled\n";
        let machines = run(text, &order_with_status());
        let m = &machines[0];
        assert_eq!(m.states, vec!["pending", "paid", "shipped", "cancelled"]);
        assert_eq!(m.transitions.len(), 3);
    }

    #[test]
    fn test_strategies_merge_per_entity() {
        let text = "Order status: pending, paid\n\nOrder transitions from paid to refunded.";
        let machines = run(text, &order_with_status());
        assert_eq!(machines.len(), 1);
        assert_eq!(machines[0].states, vec!["pending", "paid", "refunded"]);
        // explicit transitions suppress the inferred chain
        assert_eq!(pairs(&machines[0]), vec![("paid", "refunded")]);
    }

    #[test]
    fn test_single_state_dropped() {
        let text = "Order transitions from pending to pending.";
        assert!(run(text, &order_with_status()).is_empty());
    }
}
