//! Bounded-context extraction and entity assignment

use std::collections::HashMap;

use carve_core::{RawContext, RawEntity};
use tracing::debug;

use super::entities::entity_name_from_heading;
use super::text::{bullet_content, split_list, strip_markup, truncate_chars, word_positions, Document, NameIndex};

/// Bytes within which a context mention claims an entity mention
const PROXIMITY: usize = 500;

/// Leading words dropped from prose `... Service` mentions
const LEADING_FILLERS: &[&str] = &[
    "the", "a", "an", "each", "every", "our", "this", "that", "its", "their", "new", "separate",
    "dedicated",
];

/// Qualifiers that make "X Service" a kind of service rather than a context
const NOT_CONTEXTS: &[&str] = &[
    "web", "micro", "external", "third", "backend", "frontend", "cloud", "managed", "platform",
    "api", "rest", "core", "shared", "domain",
];

/// Everyday phrases ending in "service" that never name a context
const SERVICE_PHRASES: &[&str] = &[
    "customer service", "customer support service", "self service", "field service",
    "public service", "civil service", "client service", "room service",
];

/// Whether any trailing run of words in a "... Service" mention is a generic
/// phrase or starts with a generic qualifier
fn is_generic_service_mention(words: &[&str]) -> bool {
    (0..words.len().saturating_sub(1)).any(|start| {
        let window = words[start..].join(" ").to_lowercase();
        let first = words[start].to_lowercase();
        SERVICE_PHRASES.contains(&window.as_str()) || NOT_CONTEXTS.contains(&first.as_str())
    })
}

/// Lowercase, collapse whitespace and drop a trailing "service"
pub fn normalize_context_key(name: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let stripped = collapsed.strip_suffix("service").unwrap_or(&collapsed);
    stripped.trim().to_string()
}

/// A context under construction
#[derive(Debug)]
struct Candidate {
    name: String,
    description: String,
    /// Byte offsets where the context is mentioned
    mentions: Vec<usize>,
    /// Entities placed by document structure
    members: Vec<String>,
}

#[derive(Debug, Default)]
struct ContextArena {
    contexts: Vec<Candidate>,
    index: HashMap<String, usize>,
}

impl ContextArena {
    /// Register a context, returning its slot
    fn seed(&mut self, name: &str, description: &str, mention: Option<usize>) -> Option<usize> {
        let name = name.trim();
        let key = normalize_context_key(name);
        if key.is_empty() {
            return None;
        }
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.index.insert(key, self.contexts.len());
                self.contexts.push(Candidate {
                    name: name.to_string(),
                    description: String::new(),
                    mentions: Vec::new(),
                    members: Vec::new(),
                });
                self.contexts.len() - 1
            }
        };
        let ctx = &mut self.contexts[idx];
        if ctx.description.is_empty() {
            ctx.description = description.to_string();
        }
        if let Some(pos) = mention {
            ctx.mentions.push(pos);
        }
        Some(idx)
    }

    fn add_member(&mut self, idx: usize, entity: &str) {
        let members = &mut self.contexts[idx].members;
        if !members.iter().any(|m| m == entity) {
            members.push(entity.to_string());
        }
    }

    fn lookup(&self, name: &str) -> Option<usize> {
        self.index.get(&normalize_context_key(name)).copied()
    }
}

/// Context name carried by a heading, if it names one
fn context_name_from_heading(text: &str) -> Option<String> {
    let s = strip_markup(text);
    let s = regex!(r"^\d+(?:\.\d+)*[.)]?\s+").replace(&s, "");
    if let Some(caps) =
        regex!(r"(?i)^(?:service|microservice|bounded\s+context|context)\s*:\s*(.+)$").captures(&s)
    {
        return caps.get(1).map(|m| m.as_str().trim().to_string());
    }
    if regex!(r"^[A-Z][A-Za-z0-9]*(?:\s+[A-Z][A-Za-z0-9]*){0,3}\s+(?:Service|Microservice)$").is_match(&s) {
        return Some(s.trim().to_string());
    }
    None
}

/// First prose line of a heading block
fn block_description(doc: &Document, range: std::ops::Range<usize>) -> String {
    doc.lines[range]
        .iter()
        .map(|(_, line)| line.trim())
        .find(|line| !line.is_empty() && bullet_content(line).is_none() && !line.starts_with('|'))
        .map(|line| truncate_chars(&strip_markup(line), 200))
        .unwrap_or_default()
}

/// Entity names listed on an `Entities:`/`Owns:` line
fn listed_members(line: &str) -> Option<Vec<String>> {
    let content = bullet_content(line).unwrap_or(line);
    let caps = regex!(
        r"(?i)^\s*(?:\*\*)?(?:entities|owns|manages|models|aggregates|data)(?:\*\*)?\s*:(?:\*\*)?\s*(.+)$"
    )
    .captures(content)?;
    caps.get(1).map(|m| split_list(m.as_str()))
}

fn from_headings(doc: &Document, index: &NameIndex, arena: &mut ContextArena) {
    for heading in &doc.headings {
        let Some(name) = context_name_from_heading(&heading.text) else {
            continue;
        };
        let description = block_description(doc, doc.block(heading));
        let Some(slot) = arena.seed(&name, &description, Some(heading.offset)) else {
            continue;
        };

        let section = doc.section(heading);
        for (_, line) in &doc.lines[section.clone()] {
            if let Some(items) = listed_members(line) {
                for item in items {
                    if let Some(entity) = index.resolve(&item) {
                        arena.add_member(slot, entity);
                    }
                }
            }
        }
        for nested in doc.headings.iter().filter(|h| section.contains(&h.line)) {
            if let Some((entity_name, _)) = entity_name_from_heading(&nested.text) {
                if let Some(entity) = index.resolve(&entity_name) {
                    arena.add_member(slot, entity);
                }
            }
        }
    }
}

fn from_prose(text: &str, arena: &mut ContextArena) {
    let pattern = regex!(r"\b((?:[A-Z][a-z0-9]+[ \t]+){1,3}Service)\b");
    for caps in pattern.captures_iter(text) {
        let Some(m) = caps.get(1) else {
            continue;
        };
        let mut words: Vec<&str> = m.as_str().split_whitespace().collect();
        while words.len() > 1 && LEADING_FILLERS.contains(&words[0].to_lowercase().as_str()) {
            words.remove(0);
        }
        if words.len() < 2 {
            continue;
        }
        if is_generic_service_mention(&words) {
            continue;
        }
        arena.seed(&words.join(" "), "", Some(m.start()));
    }
}

/// Record every whole-word, case-insensitive mention of each context name
fn collect_mentions(text: &str, arena: &mut ContextArena) {
    let lowered = text.to_ascii_lowercase();
    for ctx in &mut arena.contexts {
        let key = normalize_context_key(&ctx.name);
        let mut positions = word_positions(&lowered, &ctx.name.to_ascii_lowercase());
        if key != ctx.name.to_ascii_lowercase() {
            positions.extend(word_positions(&lowered, &key));
        }
        ctx.mentions.extend(positions);
        ctx.mentions.sort_unstable();
        ctx.mentions.dedup();
    }
}

/// Closest context mention within [`PROXIMITY`] of the entity's first mention
fn nearest_context(text: &str, entity: &str, arena: &ContextArena) -> Option<usize> {
    let anchor = word_positions(text, entity).first().copied().or_else(|| {
        word_positions(&text.to_ascii_lowercase(), &entity.to_ascii_lowercase())
            .first()
            .copied()
    })?;
    let mut best: Option<(usize, usize)> = None;
    for (idx, ctx) in arena.contexts.iter().enumerate() {
        for &pos in &ctx.mentions {
            let distance = pos.abs_diff(anchor);
            if distance <= PROXIMITY && best.map_or(true, |(_, d)| distance < d) {
                best = Some((idx, distance));
            }
        }
    }
    best.map(|(idx, _)| idx)
}

/// Find bounded contexts and assign each entity's `owning_context`.
///
/// Entities keep a context named in an entity-listing table; otherwise they are
/// placed by document structure, then by proximity, then by name containment.
pub(crate) fn extract_contexts(doc: &Document, entities: &mut [RawEntity]) -> Vec<RawContext> {
    let index = NameIndex::new(entities);
    let mut arena = ContextArena::default();

    from_headings(doc, &index, &mut arena);
    from_prose(doc.text, &mut arena);
    for entity in entities.iter() {
        if let Some(ctx) = &entity.owning_context {
            arena.seed(ctx, "", None);
        }
    }
    collect_mentions(doc.text, &mut arena);
    debug!("found {} bounded contexts", arena.contexts.len());

    for entity in entities.iter_mut() {
        let slot = match &entity.owning_context {
            Some(ctx) => arena.lookup(ctx),
            None => arena
                .contexts
                .iter()
                .position(|c| c.members.contains(&entity.name))
                .or_else(|| nearest_context(doc.text, &entity.name, &arena))
                .or_else(|| {
                    let needle = entity.name.to_lowercase();
                    arena
                        .contexts
                        .iter()
                        .position(|c| normalize_context_key(&c.name).contains(&needle))
                }),
        };
        entity.owning_context = slot.map(|idx| arena.contexts[idx].name.clone());
    }

    arena
        .contexts
        .into_iter()
        .map(|ctx| RawContext {
            entities: entities
                .iter()
                .filter(|e| e.owning_context.as_deref() == Some(ctx.name.as_str()))
                .map(|e| e.name.clone())
                .collect(),
            name: ctx.name,
            description: ctx.description,
        })
        .collect()
}
