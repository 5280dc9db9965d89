//! Entity extraction
//!
//! Five independent strategies each propose entity candidates; [`EntityArena`]
//! merges them by case-insensitive name in discovery order.

use std::collections::HashMap;
use std::ops::Range;

use carve_core::{RawEntity, RawField};
use tracing::debug;

use super::text::{
    bullet_content, declared_entity_name, is_separator_row, is_table_line, singularize,
    split_list, strip_markup, table_cells, to_entity_name, to_snake, Document,
};

const ENTITY_HEADERS: &[&str] = &[
    "entity", "entities", "entity name", "model", "models", "object", "aggregate", "resource",
    "table",
];
const ENTITY_DESCRIPTION_HEADERS: &[&str] =
    &["description", "purpose", "notes", "responsibility", "summary"];
const ENTITY_FIELDS_HEADERS: &[&str] = &["fields", "attributes", "key fields", "properties"];
const ENTITY_CONTEXT_HEADERS: &[&str] = &[
    "service", "context", "bounded context", "owner", "owning service", "domain",
];

const FIELD_NAME_HEADERS: &[&str] = &[
    "field", "field name", "name", "attribute", "column", "property",
];
const FIELD_TYPE_HEADERS: &[&str] = &["type", "data type", "datatype"];
const FIELD_REQUIRED_HEADERS: &[&str] = &["required", "mandatory"];
const FIELD_NULLABLE_HEADERS: &[&str] = &["nullable", "optional"];
const FIELD_CONSTRAINT_HEADERS: &[&str] = &["constraints", "constraint", "notes", "description"];

/// Bullet keys that introduce a list of field names
const FIELD_LIST_KEYS: &[&str] = &["fields", "attributes", "properties", "columns"];
/// Bullet keys that carry the entity description
const DESCRIPTION_KEYS: &[&str] = &["description", "summary", "purpose"];
/// Bullet keys that describe the entity but are not fields
const META_KEYS: &[&str] = &[
    "relationships", "relations", "notes", "note", "owner", "owned_by", "service", "context",
    "states", "transitions", "lifecycle", "example", "examples", "responsibilities",
    "entities", "owns", "belongs_to", "references", "has_many", "has_one", "rules",
    "validation", "indexes", "index", "constraints",
];

/// Merge arena keyed by lowercase entity name.
///
/// First-found description wins, fields are unioned without duplicate names and the
/// owning context is only filled while still empty.
#[derive(Debug, Default)]
pub(crate) struct EntityArena {
    entities: Vec<RawEntity>,
    index: HashMap<String, usize>,
}

impl EntityArena {
    pub fn absorb(&mut self, candidate: RawEntity) {
        let key = candidate.name.to_lowercase();
        match self.index.get(&key) {
            Some(&idx) => {
                let existing = &mut self.entities[idx];
                if existing.description.is_empty() && !candidate.description.is_empty() {
                    existing.description = candidate.description;
                }
                for field in candidate.fields {
                    let duplicate = existing
                        .fields
                        .iter()
                        .any(|f| f.name.eq_ignore_ascii_case(&field.name));
                    if !duplicate {
                        existing.fields.push(field);
                    }
                }
                if existing.owning_context.is_none() {
                    existing.owning_context = candidate.owning_context;
                }
            }
            None => {
                self.index.insert(key, self.entities.len());
                self.entities.push(candidate);
            }
        }
    }

    pub fn absorb_all(&mut self, candidates: Vec<RawEntity>) {
        for candidate in candidates {
            self.absorb(candidate);
        }
    }

    pub fn into_entities(self) -> Vec<RawEntity> {
        self.entities
    }
}

/// Run every strategy over the document and merge the candidates
pub(crate) fn extract_entities(doc: &Document) -> Vec<RawEntity> {
    let all_lines = 0..doc.lines.len();
    let strategies: [(&str, Vec<RawEntity>); 5] = [
        ("tables", from_tables(doc, all_lines.clone())),
        ("heading_blocks", from_heading_blocks(doc, all_lines, false)),
        ("prose", from_prose(doc.text)),
        ("data_model_section", from_data_model_sections(doc)),
        ("inline_lists", from_inline_lists(doc.text)),
    ];

    let mut arena = EntityArena::default();
    for (strategy, candidates) in strategies {
        debug!("entity strategy {} proposed {} candidates", strategy, candidates.len());
        arena.absorb_all(candidates);
    }
    arena.into_entities()
}

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

/// Map a written type onto the normalized alias set
pub(crate) fn normalize_type(raw: &str) -> Option<&'static str> {
    let cleaned = strip_markup(raw).to_lowercase();
    let cleaned = cleaned.trim().trim_end_matches('?').trim();
    if cleaned.ends_with("[]")
        || cleaned.starts_with("list[")
        || cleaned.starts_with("list<")
        || cleaned.starts_with("array<")
        || cleaned.starts_with("array[")
        || cleaned.starts_with("vec<")
    {
        return Some("list");
    }
    let head = cleaned
        .split(|c: char| c == '(' || c == '<' || c == '[' || c.is_whitespace())
        .next()
        .unwrap_or("");

    let normalized = match head {
        "string" | "str" | "text" | "varchar" | "char" | "email" | "url" | "enum" | "slug"
        | "phone" | "citext" => "str",
        "int" | "integer" | "bigint" | "smallint" | "long" | "number" | "serial" | "int32"
        | "int64" | "i32" | "i64" | "u32" | "u64" | "usize" => "int",
        "float" | "double" | "decimal" | "numeric" | "real" | "money" | "currency" | "f32"
        | "f64" => "float",
        "bool" | "boolean" | "flag" => "bool",
        "date" | "datetime" | "timestamp" | "timestamptz" | "time" | "instant" => "datetime",
        "uuid" | "guid" | "objectid" | "id" => "UUID",
        "json" | "jsonb" | "object" | "dict" | "map" | "hash" | "hashmap" => "dict",
        "array" | "list" | "set" | "vec" => "list",
        "binary" | "bytes" | "blob" | "bytea" => "bytes",
        _ => return None,
    };
    Some(normalized)
}

/// Guess a type from a field name when none is written
pub(crate) fn infer_type(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    if lower == "id" || lower.ends_with("_id") || name.ends_with("Id") {
        "UUID"
    } else if lower.ends_with("_at")
        || lower.ends_with("_on")
        || lower.contains("date")
        || lower.contains("timestamp")
        || lower.ends_with("time")
    {
        "datetime"
    } else if lower.starts_with("is_") || lower.starts_with("has_") || lower.starts_with("can_") {
        "bool"
    } else if ["count", "quantity", "qty", "age", "position", "rank"].contains(&lower.as_str())
        || lower.ends_with("_count")
    {
        "int"
    } else if ["price", "amount", "total", "cost", "balance", "rate", "fee", "score"]
        .iter()
        .any(|w| lower.contains(w))
    {
        "float"
    } else {
        "str"
    }
}

fn is_field_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A capitalized identifier used as a type names another entity or value object
fn reference_type(token: &str) -> Option<String> {
    let token = token.trim();
    (token.starts_with(|c: char| c.is_ascii_uppercase()) && is_field_identifier(token))
        .then(|| token.to_string())
}

fn is_required(text: &str) -> bool {
    let lower = text.to_lowercase();
    !(lower.contains("optional") || lower.contains("nullable") || lower.contains("not required"))
}

fn build_field(name: &str, paren: Option<&str>, rest: Option<&str>, full: &str) -> RawField {
    let paren_type = paren
        .and_then(|p| p.split(',').next())
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let rest = rest.map(str::trim).filter(|r| !r.is_empty());
    let rest_type = rest.and_then(|r| {
        r.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .next()
            .filter(|t| !t.is_empty())
    });
    let rest_is_single_token = rest
        .map(|r| !r.contains(char::is_whitespace))
        .unwrap_or(false);

    let field_type = paren_type
        .and_then(|t| normalize_type(t).map(String::from).or_else(|| reference_type(t)))
        .or_else(|| rest_type.and_then(normalize_type).map(String::from))
        .or_else(|| {
            rest_type
                .filter(|_| rest_is_single_token)
                .and_then(reference_type)
        })
        .unwrap_or_else(|| infer_type(name).to_string());

    RawField::new(name, field_type, is_required(full))
}

/// What a bullet line inside an entity block contributes
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BulletItem {
    Field(RawField),
    FieldList(Vec<RawField>),
    Description(String),
    Other,
}

/// Parse a single `name: type`, `name (type, required)` or bare `name` declaration
pub(crate) fn parse_field(content: &str) -> Option<RawField> {
    let cleaned: String = content.chars().filter(|c| !matches!(c, '*' | '`')).collect();
    let caps = regex!(
        r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(?:\(([^)]*)\))?\s*(?:(?:[:=]|\s-|–|—)\s*(.*))?$"
    )
    .captures(cleaned.trim())?;
    let name = caps.get(1)?.as_str();
    let paren = caps.get(2).map(|m| m.as_str());
    let rest = caps.get(3).map(|m| m.as_str());
    Some(build_field(name, paren, rest, &cleaned))
}

pub(crate) fn parse_bullet(content: &str) -> BulletItem {
    let cleaned: String = content.chars().filter(|c| !matches!(c, '*' | '`')).collect();
    let key_caps = regex!(r"^\s*([A-Za-z_][A-Za-z0-9_ ]*?)\s*:\s*(.*)$").captures(cleaned.trim());
    if let Some(caps) = key_caps {
        let key = to_snake(&caps[1]);
        let rest = caps[2].trim();
        if FIELD_LIST_KEYS.contains(&key.as_str()) {
            let fields = rest.split(',').filter_map(parse_field).collect();
            return BulletItem::FieldList(fields);
        }
        if DESCRIPTION_KEYS.contains(&key.as_str()) {
            return BulletItem::Description(rest.to_string());
        }
        if META_KEYS.contains(&key.as_str()) {
            return BulletItem::Other;
        }
    }
    match parse_field(content) {
        Some(field) => BulletItem::Field(field),
        None => BulletItem::Other,
    }
}

// ---------------------------------------------------------------------------
// Strategy (i): markdown tables
// ---------------------------------------------------------------------------

fn column(header: &[String], names: &[&str]) -> Option<usize> {
    header
        .iter()
        .position(|h| names.contains(&h.to_lowercase().trim()))
}

/// Entity name carried by a heading, plus whether the heading marks it explicitly
pub(crate) fn entity_name_from_heading(text: &str) -> Option<(String, bool)> {
    let mut s = strip_markup(text);
    s = regex!(r"^\d+(?:\.\d+)*[.)]?\s+").replace(&s, "").into_owned();
    s = regex!(r"\s*\([^)]*\)\s*$").replace(&s, "").into_owned();

    let mut explicit = false;
    if let Some(m) = regex!(r"(?i)^(?:entity|model|aggregate|table|object)\s*:\s*").find(&s) {
        s = s[m.end()..].to_string();
        explicit = true;
    }
    if let Some(m) = regex!(r"(?i)\s+(?:entity|model|aggregate|table|object|schema)$").find(&s) {
        s.truncate(m.start());
        explicit = true;
    }
    let name = if explicit {
        declared_entity_name(&s)
    } else {
        to_entity_name(&s)
    };
    name.map(|name| (name, explicit))
}

/// Consecutive table lines starting at `start`, limited to `range`
fn table_extent(doc: &Document, start: usize, range: &Range<usize>) -> usize {
    let mut end = start;
    while end < range.end && is_table_line(doc.lines[end].1) {
        end += 1;
    }
    end
}

pub(crate) fn from_tables(doc: &Document, range: Range<usize>) -> Vec<RawEntity> {
    let mut out = Vec::new();
    let mut idx = range.start;
    while idx < range.end {
        if !is_table_line(doc.lines[idx].1) {
            idx += 1;
            continue;
        }
        let end = table_extent(doc, idx, &range);
        let rows: Vec<Vec<String>> = (idx..end).map(|i| table_cells(doc.lines[i].1)).collect();
        if rows.len() >= 2 && is_separator_row(&rows[1]) {
            let header = &rows[0];
            let body: Vec<&Vec<String>> =
                rows[2..].iter().filter(|r| !is_separator_row(r)).collect();
            if let Some(entities) = entity_listing_table(header, &body) {
                out.extend(entities);
            } else if let Some(entity) = field_table(doc, idx, header, &body) {
                out.push(entity);
            }
        }
        idx = end;
    }
    out
}

fn entity_listing_table(header: &[String], body: &[&Vec<String>]) -> Option<Vec<RawEntity>> {
    let first = header.first()?.to_lowercase();
    if !ENTITY_HEADERS.contains(&first.trim()) {
        return None;
    }
    let desc_col = column(header, ENTITY_DESCRIPTION_HEADERS);
    let fields_col = column(header, ENTITY_FIELDS_HEADERS);
    let ctx_col = column(header, ENTITY_CONTEXT_HEADERS);

    let cell = |row: &Vec<String>, col: Option<usize>| -> String {
        col.and_then(|c| row.get(c)).cloned().unwrap_or_default()
    };

    let entities = body
        .iter()
        .filter_map(|&row| {
            let name = declared_entity_name(row.first()?)?;
            let fields = fields_col
                .map(|_| {
                    cell(row, fields_col)
                        .split(',')
                        .filter_map(parse_field)
                        .collect()
                })
                .unwrap_or_default();
            let context = cell(row, ctx_col);
            Some(RawEntity {
                name,
                description: cell(row, desc_col),
                fields,
                owning_context: (!context.is_empty()).then_some(context),
            })
        })
        .collect();
    Some(entities)
}

fn field_table(
    doc: &Document,
    table_line: usize,
    header: &[String],
    body: &[&Vec<String>],
) -> Option<RawEntity> {
    let name_col = column(header, FIELD_NAME_HEADERS)?;
    let type_col = column(header, FIELD_TYPE_HEADERS)?;
    let required_col = column(header, FIELD_REQUIRED_HEADERS);
    let nullable_col = column(header, FIELD_NULLABLE_HEADERS);
    let constraint_col = column(header, FIELD_CONSTRAINT_HEADERS);

    let heading = doc.heading_above(table_line)?;
    let (entity_name, _) = entity_name_from_heading(&heading.text)?;

    let fields = body
        .iter()
        .filter_map(|&row| {
            let raw_name = row.get(name_col)?;
            let name = if is_field_identifier(raw_name) {
                raw_name.clone()
            } else {
                to_snake(raw_name)
            };
            if name.is_empty() {
                return None;
            }
            let raw_type = row.get(type_col).map(String::as_str).unwrap_or("");
            let field_type = normalize_type(raw_type)
                .map(String::from)
                .or_else(|| reference_type(raw_type))
                .unwrap_or_else(|| infer_type(&name).to_string());

            let flag = |col: Option<usize>| {
                col.and_then(|c| row.get(c)).map(|v| {
                    matches!(
                        v.to_lowercase().trim(),
                        "yes" | "y" | "true" | "x" | "✓" | "✔" | "required"
                    )
                })
            };
            let required = flag(required_col)
                .or_else(|| flag(nullable_col).map(|nullable| !nullable))
                .unwrap_or_else(|| {
                    constraint_col
                        .and_then(|c| row.get(c))
                        .map(|v| is_required(v))
                        .unwrap_or(true)
                });
            Some(RawField::new(name, field_type, required))
        })
        .collect();

    Some(RawEntity::new(entity_name).with_fields(fields))
}

// ---------------------------------------------------------------------------
// Strategy (ii): heading + bullet-list blocks
// ---------------------------------------------------------------------------

/// `relaxed` admits entity headings without any field bullets (used inside data-model sections)
pub(crate) fn from_heading_blocks(doc: &Document, range: Range<usize>, relaxed: bool) -> Vec<RawEntity> {
    let mut out = Vec::new();
    for heading in doc.headings.iter().filter(|h| range.contains(&h.line)) {
        let Some((name, explicit)) = entity_name_from_heading(&heading.text) else {
            continue;
        };

        let mut entity = RawEntity::new(name);
        let block = doc.block(heading);
        for idx in block.start..block.end.min(range.end) {
            let line = doc.lines[idx].1;
            if let Some(content) = bullet_content(line) {
                match parse_bullet(content) {
                    BulletItem::Field(field) => push_field(&mut entity, field),
                    BulletItem::FieldList(fields) => {
                        for field in fields {
                            push_field(&mut entity, field);
                        }
                    }
                    BulletItem::Description(text) if entity.description.is_empty() => {
                        entity.description = text;
                    }
                    _ => {}
                }
            } else if entity.description.is_empty()
                && !line.trim().is_empty()
                && !is_table_line(line)
            {
                entity.description = strip_markup(line.trim());
            }
        }

        if !entity.fields.is_empty() || explicit || relaxed {
            out.push(entity);
        }
    }
    out
}

fn push_field(entity: &mut RawEntity, field: RawField) {
    if !entity
        .fields
        .iter()
        .any(|f| f.name.eq_ignore_ascii_case(&field.name))
    {
        entity.fields.push(field);
    }
}

// ---------------------------------------------------------------------------
// Strategy (iii): prose sentences
// ---------------------------------------------------------------------------

fn strip_article(s: &str) -> &str {
    let lower = s.to_lowercase();
    for article in ["a ", "an ", "the ", "its ", "their "] {
        if lower.starts_with(article) {
            return s[article.len()..].trim();
        }
    }
    s
}

pub(crate) fn from_prose(text: &str) -> Vec<RawEntity> {
    let mut out = Vec::new();

    // "the system manages Orders which have an id, a total and a status"
    let manages = regex!(
        r"(?i:the\s+system\s+(?:manages|tracks|stores|handles|maintains))\s+(?:(?i:an?|the)\s+)?([A-Z][A-Za-z0-9]*)\s+(?i:which|that|with|who)\s+(?i:has|have|contains?|includes?|holds?)\s+([^.\n]+)"
    );
    for caps in manages.captures_iter(text) {
        let Some(name) = to_entity_name(&singularize(&caps[1])) else {
            continue;
        };
        let fields = split_list(&caps[2])
            .iter()
            .map(|item| strip_article(item))
            .filter(|item| item.split_whitespace().count() <= 3)
            .map(to_snake)
            .filter(|name| !name.is_empty())
            .map(|name| {
                let field_type = infer_type(&name);
                RawField::new(name, field_type, true)
            })
            .collect();
        out.push(RawEntity::new(name).with_fields(fields));
    }

    // "User: A registered customer of the store"
    let definition = regex!(
        r"(?m)^\s*(?:[-*+]\s+)?(?:\*\*)?([A-Z][A-Za-z0-9]+)(?:\*\*)?\s*:(?:\*\*)?\s+((?i:an?|the|represents|stores|holds|tracks|describes|each|records?)\b[^\n]*)$"
    );
    for caps in definition.captures_iter(text) {
        if let Some(name) = to_entity_name(&caps[1]) {
            out.push(RawEntity::new(name).with_description(caps[2].trim()));
        }
    }

    // "The Invoice entity ..."
    let marked = regex!(r"\b([A-Z][A-Za-z0-9]+)\s+(?:entity|model|object|aggregate)\b");
    for caps in marked.captures_iter(text) {
        if let Some(name) = declared_entity_name(&caps[1]) {
            out.push(RawEntity::new(name));
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Strategy (iv): explicit data-model section
// ---------------------------------------------------------------------------

pub(crate) fn from_data_model_sections(doc: &Document) -> Vec<RawEntity> {
    let section_heading = regex!(
        r"(?i)^(?:\d+(?:\.\d+)*[.)]?\s+)?(?:data\s+model|domain\s+model|data\s+entities|core\s+entities|key\s+entities|entities|entity\s+definitions|models|data\s+schema|schema)\b"
    );

    let mut out = Vec::new();
    for heading in doc
        .headings
        .iter()
        .filter(|h| section_heading.is_match(&strip_markup(&h.text)))
    {
        let section = doc.section(heading);
        out.extend(from_tables(doc, section.clone()));
        out.extend(from_heading_blocks(doc, section.clone(), true));

        // Bullets directly under the section heading list entities
        let top_level_end = doc
            .headings
            .iter()
            .find(|h| h.line > heading.line)
            .map(|h| h.line)
            .unwrap_or(section.end)
            .min(section.end);
        for idx in section.start..top_level_end {
            let Some(content) = bullet_content(doc.lines[idx].1) else {
                continue;
            };
            let caps = regex!(r"^(?:\*\*)?([A-Z][A-Za-z0-9 ]*?)(?:\*\*)?\s*(?:(?::|\s-|–|—)(?:\*\*)?\s*(.*))?$")
                .captures(content);
            if let Some(caps) = caps {
                if let Some(name) = to_entity_name(&caps[1]) {
                    let description = caps.get(2).map(|m| strip_markup(m.as_str())).unwrap_or_default();
                    out.push(RawEntity::new(name).with_description(description));
                }
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Strategy (v): terse inline lists
// ---------------------------------------------------------------------------

pub(crate) fn from_inline_lists(text: &str) -> Vec<RawEntity> {
    let patterns = [
        // "three entities: User, Order, Product"
        regex!(
            r"(?i)\b(?:\d+|two|three|four|five|six|seven|eight|nine|ten|several|the\s+following)\s+(?:(?:core|main|key|domain|primary|business)\s+)?(?:entities|models|objects|resources|aggregates)\s*(?::|-|—|–|\bare\b|\binclude\b)?\s*([^\n.]+)"
        ),
        // "models: User, Order"
        regex!(r"(?i)\b(?:entities|models|objects|aggregates)\s*:\s*([^\n.]+)"),
        // "manages Users, Orders and Invoices"
        regex!(
            r"\b(?i:manages|tracks|stores|handles|supports|includes|contains)\s+([A-Z][A-Za-z0-9]*(?:\s*,\s*[A-Z][A-Za-z0-9]*)+(?:\s*,?\s*(?i:and)\s+[A-Z][A-Za-z0-9]*)?)"
        ),
        // "(User, Order, Product)"
        regex!(
            r"\(([A-Z][A-Za-z0-9]*(?:\s*,\s*[A-Z][A-Za-z0-9]*)+(?:\s*,?\s*(?:and|or)\s+[A-Z][A-Za-z0-9]*)?)\)"
        ),
    ];

    let mut out = Vec::new();
    for pattern in patterns {
        for caps in pattern.captures_iter(text) {
            for item in split_list(&caps[1]) {
                let item = item.split('(').next().unwrap_or("").trim();
                if let Some(name) = to_entity_name(&singularize(item)) {
                    out.push(RawEntity::new(name));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(entities: &[RawEntity]) -> Vec<&str> {
        entities.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_normalize_type() {
        assert_eq!(normalize_type("String"), Some("str"));
        assert_eq!(normalize_type("VARCHAR(255)"), Some("str"));
        assert_eq!(normalize_type("timestamp"), Some("datetime"));
        assert_eq!(normalize_type("uuid"), Some("UUID"));
        assert_eq!(normalize_type("decimal?"), Some("float"));
        assert_eq!(normalize_type("string[]"), Some("list"));
        assert_eq!(normalize_type("Money Amount"), Some("float"));
        assert_eq!(normalize_type("Address"), None);
    }

    #[test]
    fn test_infer_type() {
        assert_eq!(infer_type("user_id"), "UUID");
        assert_eq!(infer_type("created_at"), "datetime");
        assert_eq!(infer_type("is_active"), "bool");
        assert_eq!(infer_type("quantity"), "int");
        assert_eq!(infer_type("total_price"), "float");
        assert_eq!(infer_type("email"), "str");
    }

    #[test]
    fn test_parse_field_variants() {
        let f = parse_field("email: string").unwrap();
        assert_eq!((f.name.as_str(), f.field_type.as_str(), f.required), ("email", "str", true));

        let f = parse_field("`total` (decimal, optional) - order total").unwrap();
        assert_eq!((f.field_type.as_str(), f.required), ("float", false));

        let f = parse_field("**shipping_address** (Address)").unwrap();
        assert_eq!(f.field_type, "Address");

        let f = parse_field("created_at").unwrap();
        assert_eq!(f.field_type, "datetime");

        let f = parse_field("owner: the person who placed it").unwrap();
        assert_eq!(f.field_type, "str");

        assert!(parse_field("Users can sign up quickly").is_none());
    }

    #[test]
    fn test_parse_bullet_keys() {
        assert_eq!(
            parse_bullet("Description: A customer order"),
            BulletItem::Description("A customer order".to_string())
        );
        assert_eq!(parse_bullet("Relationships: belongs to User"), BulletItem::Other);
        match parse_bullet("Fields: id (UUID), name, created_at") {
            BulletItem::FieldList(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["id", "name", "created_at"]);
                assert_eq!(fields[0].field_type, "UUID");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_entity_name_from_heading() {
        assert_eq!(entity_name_from_heading("3.1 User Model"), Some(("User".to_string(), true)));
        assert_eq!(entity_name_from_heading("Entity: Order Item"), Some(("OrderItem".to_string(), true)));
        assert_eq!(entity_name_from_heading("Product"), Some(("Product".to_string(), false)));
        assert_eq!(entity_name_from_heading("Data Model"), None);
        assert_eq!(entity_name_from_heading("API Endpoints"), None);
    }

    #[test]
    fn test_tables() {
        let text = "\
| Entity | Description | Service |
|--------|-------------|---------|
| User | A registered customer | Identity |
| Order | A purchase | |

### Product
| Field | Type | Required |
|-------|------|----------|
| id | uuid | yes |
| price | decimal | no |
";
        let doc = Document::new(text);
        let entities = from_tables(&doc, 0..doc.lines.len());
        assert_eq!(names(&entities), vec!["User", "Order", "Product"]);
        assert_eq!(entities[0].owning_context.as_deref(), Some("Identity"));
        assert_eq!(entities[1].owning_context, None);
        assert_eq!(entities[2].fields.len(), 2);
        assert_eq!(entities[2].fields[1].field_type, "float");
        assert!(!entities[2].fields[1].required);
    }

    #[test]
    fn test_entity_table_rows_are_declared_names() {
        let text = "\
| Entity | Description |
|--------|-------------|
| Author | Writes posts |
| Post | An article |
| Team | A group of authors |
| Order Service | Declared even with a section-like suffix |
| Status | Too generic |
";
        let doc = Document::new(text);
        let entities = from_tables(&doc, 0..doc.lines.len());
        assert_eq!(names(&entities), vec!["Author", "Post", "Team", "OrderService"]);
    }

    #[test]
    fn test_marked_names_skip_section_filter() {
        assert_eq!(
            entity_name_from_heading("Entity: Release Notes"),
            Some(("ReleaseNotes".to_string(), true))
        );
        assert_eq!(entity_name_from_heading("Release Notes"), None);
        let entities = from_prose("Each Gateway entity is versioned.");
        assert_eq!(names(&entities), vec!["Gateway"]);
    }

    #[test]
    fn test_heading_blocks_skip_sections() {
        let text = "\
## Overview
- fast: really

### Customer
A person buying things.
- id: UUID
- email: string

### Invoice
No bullets here.
";
        let doc = Document::new(text);
        let entities = from_heading_blocks(&doc, 0..doc.lines.len(), false);
        assert_eq!(names(&entities), vec!["Customer"]);
        assert_eq!(entities[0].description, "A person buying things.");

        let relaxed = from_heading_blocks(&doc, 0..doc.lines.len(), true);
        assert_eq!(names(&relaxed), vec!["Customer", "Invoice"]);
    }

    #[test]
    fn test_prose_patterns() {
        let text = "The system manages Tickets which have a title, a priority and an assignee.\n\
                    Venue: A physical location hosting events\n\
                    Each Seat entity is numbered.";
        let entities = from_prose(text);
        assert_eq!(names(&entities), vec!["Ticket", "Venue", "Seat"]);
        let fields: Vec<_> = entities[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["title", "priority", "assignee"]);
    }

    #[test]
    fn test_data_model_section() {
        let text = "\
## Data Model
- **Author**: A person who writes posts
- Comment

### Post
";
        let doc = Document::new(text);
        let entities = from_data_model_sections(&doc);
        assert_eq!(names(&entities), vec!["Post", "Author", "Comment"]);
        assert_eq!(entities[1].description, "A person who writes posts");
    }

    #[test]
    fn test_inline_lists() {
        let text = "It has three entities: Users, Orders and Products. \
                    The backend manages Carts, Coupons and Wishlists (REST, GraphQL).";
        let entities = from_inline_lists(text);
        let found = names(&entities);
        for expected in ["User", "Order", "Product", "Cart", "Coupon", "Wishlist"] {
            assert!(found.contains(&expected), "missing {}", expected);
        }
        assert!(!found.contains(&"REST"));
        assert!(!found.contains(&"GraphQL"));
    }

    #[test]
    fn test_arena_merge_rules() {
        let mut arena = EntityArena::default();
        arena.absorb(RawEntity::new("User").with_fields(vec![RawField::new("id", "UUID", true)]));
        arena.absorb(
            RawEntity::new("user")
                .with_description("A customer")
                .with_fields(vec![
                    RawField::new("ID", "str", true),
                    RawField::new("email", "str", true),
                ]),
        );
        arena.absorb(RawEntity {
            name: "USER".to_string(),
            description: "ignored".to_string(),
            fields: Vec::new(),
            owning_context: Some("Identity".to_string()),
        });

        let entities = arena.into_entities();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "User");
        assert_eq!(entities[0].description, "A customer");
        assert_eq!(entities[0].fields.len(), 2);
        assert_eq!(entities[0].fields[0].field_type, "UUID");
        assert_eq!(entities[0].owning_context.as_deref(), Some("Identity"));
    }
}
