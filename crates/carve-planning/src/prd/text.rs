//! Markdown and wording helpers shared by the extraction strategies

use std::collections::HashMap;

use carve_core::RawEntity;

/// Last words that mark a heading as a document section rather than an entity
const SECTION_SUFFIXES: &[&str] = &[
    "overview", "introduction", "summary", "background", "goals", "objectives", "scope",
    "requirements", "requirement", "features", "endpoints", "endpoint", "api", "apis",
    "architecture", "service", "services", "microservice", "microservices", "deployment",
    "security", "testing", "tests", "glossary", "appendix", "notes", "constraints",
    "assumptions", "timeline", "milestones", "roadmap", "risks", "stack", "technology",
    "technologies", "infrastructure", "configuration", "monitoring", "logging",
    "observability", "metrics", "performance", "design", "diagram", "diagrams", "model",
    "models", "entities", "relationships", "contexts", "context", "machine", "machines",
    "flow", "flows", "workflows", "rules", "questions", "considerations", "integration",
    "integrations", "stories", "criteria", "dependencies", "layer", "gateway", "queue",
    "cache", "database", "broker", "server", "frontend", "backend", "ui", "ux", "slas",
    "specification", "specifications", "details", "definitions", "schema", "states",
    "transitions", "responsibilities", "capabilities", "personas", "tables", "fields",
    "attributes", "hints", "decisions", "references", "changelog",
];

/// Whole names that are too generic to be entities
const GENERIC_TERMS: &[&str] = &[
    "system", "application", "app", "platform", "project", "data", "domain", "description",
    "information", "info", "status", "state", "example", "examples", "todo", "none", "the",
    "this", "that", "these", "those", "each", "every", "all", "our", "we", "it", "they",
    "entity", "field", "type", "name", "id", "key", "value", "values", "table", "list",
    "core", "general", "misc", "miscellaneous", "other", "goal", "purpose", "problem",
    "solution", "approach", "future", "next", "must", "should", "may", "can", "will", "when",
    "if", "then", "and", "or", "for", "with", "from", "to", "by", "on", "in", "at", "as",
    "an", "a", "is", "are", "be", "main", "primary", "prd", "language", "framework",
    "broker", "message broker", "auth", "authentication", "authorization", "tech",
    "use case", "functional", "users can", "important", "warning", "tip", "summary",
    "yes", "no",
];

/// Technology vocabulary that is never an entity
const TECH_TERMS: &[&str] = &[
    "rest", "restful", "graphql", "grpc", "json", "xml", "yaml", "http", "https", "sql",
    "nosql", "jwt", "oauth", "oauth2", "saml", "oidc", "docker", "kubernetes", "aws", "gcp",
    "azure", "mvp", "faq", "url", "uuid", "crud", "saas", "python", "java", "javascript",
    "typescript", "golang", "rust", "ruby", "kotlin", "scala", "elixir", "php", "django",
    "flask", "fastapi", "express", "nestjs", "spring", "rails", "laravel", "postgresql",
    "postgres", "mysql", "mongodb", "sqlite", "redis", "kafka", "rabbitmq", "nats",
    "websocket", "websockets", "cqrs", "saga", "ci", "cd", "api", "sdk", "cli", "html",
    "css", "s3", "stripe", "paypal", "sendgrid", "twilio", "elasticsearch", "dynamodb",
];

fn is_listed(list: &[&str], word: &str) -> bool {
    list.contains(&word)
}

/// A markdown heading with its position
#[derive(Debug, Clone)]
pub(crate) struct Heading {
    pub level: usize,
    pub text: String,
    /// Index into the line table
    pub line: usize,
    /// Byte offset of the heading line
    pub offset: usize,
}

/// The document split into lines, with byte offsets and headings indexed once
#[derive(Debug)]
pub(crate) struct Document<'a> {
    pub text: &'a str,
    pub lines: Vec<(usize, &'a str)>,
    pub headings: Vec<Heading>,
}

impl<'a> Document<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut offset = 0;
        for line in text.split('\n') {
            lines.push((offset, line.strip_suffix('\r').unwrap_or(line)));
            offset += line.len() + 1;
        }

        let headings = lines
            .iter()
            .enumerate()
            .filter_map(|(idx, (offset, line))| {
                heading_of(line).map(|(level, text)| Heading {
                    level,
                    text: text.to_string(),
                    line: idx,
                    offset: *offset,
                })
            })
            .collect();

        Self {
            text,
            lines,
            headings,
        }
    }

    /// Line index range owned by a heading: up to the next heading of any level
    pub fn block(&self, heading: &Heading) -> std::ops::Range<usize> {
        let end = self
            .headings
            .iter()
            .find(|h| h.line > heading.line)
            .map(|h| h.line)
            .unwrap_or(self.lines.len());
        heading.line + 1..end
    }

    /// Line index range of a whole section: up to the next heading of the same or higher level
    pub fn section(&self, heading: &Heading) -> std::ops::Range<usize> {
        let end = self
            .headings
            .iter()
            .find(|h| h.line > heading.line && h.level <= heading.level)
            .map(|h| h.line)
            .unwrap_or(self.lines.len());
        heading.line + 1..end
    }

    /// The nearest heading at or above a line
    pub fn heading_above(&self, line: usize) -> Option<&Heading> {
        self.headings.iter().rev().find(|h| h.line < line)
    }
}

/// `## Title` → `(2, "Title")`
pub(crate) fn heading_of(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim();
    if text.is_empty() {
        None
    } else {
        Some((level, text))
    }
}

/// Content of a bullet or numbered list item
pub(crate) fn bullet_content(line: &str) -> Option<&str> {
    let caps = regex!(r"^\s*(?:[-*+•]|\d+[.)])\s+(.+?)\s*$").captures(line)?;
    caps.get(1).map(|m| m.as_str())
}

/// Whether a line belongs to a markdown table
pub(crate) fn is_table_line(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// Cells of a table row, trimmed and stripped of inline markup
pub(crate) fn table_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|c| strip_markup(c.trim())).collect()
}

/// `|---|:--:|` style separator rows
pub(crate) fn is_separator_row(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|c| {
            let c = c.trim();
            !c.is_empty() && c.chars().all(|ch| ch == '-' || ch == ':')
        })
}

/// Remove emphasis, code ticks and quotes
pub(crate) fn strip_markup(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '*' | '`' | '"'))
        .collect::<String>()
        .trim()
        .trim_matches('_')
        .trim()
        .to_string()
}

/// Split an inline enumeration ("A, B and C", "a | b | c", "x or y")
pub(crate) fn split_list(s: &str) -> Vec<String> {
    regex!(r"(?i)\s*(?:,|;|\||/|\band\b|\bor\b)\s*")
        .split(s)
        .map(|item| {
            strip_markup(item)
                .trim_matches(|c: char| c == '\'' || c == '.' || c == '(' || c == ')')
                .trim()
                .to_string()
        })
        .filter(|item| !item.is_empty())
        .collect()
}

/// Naive singular form: `categories` → `category`, `boxes` → `box`, `users` → `user`
pub(crate) fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.len() > 3 && lower.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if lower.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if lower.len() > 2
        && lower.ends_with('s')
        && !lower.ends_with("ss")
        && !lower.ends_with("us")
        && !lower.ends_with("is")
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Naive plural form: `category` → `categories`, `box` → `boxes`, `user` → `users`
pub(crate) fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    let consonant_y = lower.ends_with('y')
        && lower
            .chars()
            .rev()
            .nth(1)
            .map(|c| !"aeiou".contains(c))
            .unwrap_or(false);
    if consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether `term` occurs in `haystack` delimited by non-word characters on both sides
pub(crate) fn contains_word(haystack: &str, term: &str) -> bool {
    find_word(haystack, term, true).is_some()
}

/// Whether `term` occurs in `haystack` at the start of a word (`file` matches `files`, not `profile`)
pub(crate) fn contains_word_prefix(haystack: &str, term: &str) -> bool {
    find_word(haystack, term, false).is_some()
}

/// Byte offsets of every whole-word occurrence of `term`
pub(crate) fn word_positions(haystack: &str, term: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut from = 0;
    while let Some(pos) = find_word_from(haystack, term, from, true) {
        positions.push(pos);
        from = pos + term.len().max(1);
    }
    positions
}

fn find_word(haystack: &str, term: &str, whole: bool) -> Option<usize> {
    find_word_from(haystack, term, 0, whole)
}

fn find_word_from(haystack: &str, term: &str, from: usize, whole: bool) -> Option<usize> {
    if term.is_empty() || from > haystack.len() {
        return None;
    }
    let mut start = from;
    while let Some(rel) = haystack.get(start..)?.find(term) {
        let pos = start + rel;
        let end = pos + term.len();
        let before_ok = haystack[..pos]
            .chars()
            .next_back()
            .map(|c| !is_word_char(c))
            .unwrap_or(true);
        let after_ok = !whole
            || haystack[end..]
                .chars()
                .next()
                .map(|c| !is_word_char(c))
                .unwrap_or(true);
        // Terms like "c#" or "node.js" end in punctuation; only alphanumeric edges need a boundary
        let term_starts_word = term.chars().next().map(is_word_char).unwrap_or(false);
        let term_ends_word = term.chars().next_back().map(is_word_char).unwrap_or(false);
        if (before_ok || !term_starts_word) && (after_ok || !term_ends_word) {
            return Some(pos);
        }
        start = pos + haystack[pos..].chars().next().map(char::len_utf8).unwrap_or(1);
    }
    None
}

/// Whether any of `terms` is mentioned as a word prefix
pub(crate) fn mentions_any(haystack: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| contains_word_prefix(haystack, t))
}

/// Slice of `text` extending `radius` bytes around `range`, snapped to char boundaries
pub(crate) fn window(text: &str, range: std::ops::Range<usize>, radius: usize) -> &str {
    let mut start = range.start.saturating_sub(radius);
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (range.end + radius).min(text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }
    &text[start..end]
}

/// Truncate to at most `max` characters
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// `In Progress` → `in_progress`, `Out-for-Delivery` → `out_for_delivery`
pub(crate) fn to_snake(s: &str) -> String {
    let mut out = String::new();
    let mut pending = false;
    for c in strip_markup(s).chars() {
        if c.is_alphanumeric() {
            if pending && !out.is_empty() {
                out.push('_');
            }
            pending = false;
            out.extend(c.to_lowercase());
        } else {
            pending = true;
        }
    }
    out
}

/// Validate and normalize an entity name found in a heading or in prose.
///
/// On top of [`declared_entity_name`], names whose last word marks a document
/// section ("Overview", "API Endpoints", "Order Service") are rejected.
pub(crate) fn to_entity_name(raw: &str) -> Option<String> {
    let name = declared_entity_name(raw)?;
    let cleaned = strip_markup(raw);
    let last = cleaned.split_whitespace().last()?.to_lowercase();
    if is_listed(SECTION_SUFFIXES, &last) {
        return None;
    }
    Some(name)
}

/// Validate and normalize a name the document declares as an entity: a row of
/// an entity table, or a name marked with "Entity:" or "... entity".
///
/// Accepts one to four capitalized words, joins them in PascalCase and rejects
/// generic terms and technology names.
pub(crate) fn declared_entity_name(raw: &str) -> Option<String> {
    let cleaned = strip_markup(raw);
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.is_empty() || words.len() > 4 {
        return None;
    }
    if !words[0].starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    if words
        .iter()
        .any(|w| !w.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
    {
        return None;
    }
    if !cleaned.chars().any(|c| c.is_ascii_lowercase()) {
        return None;
    }

    let lower = cleaned.to_lowercase();
    if is_listed(GENERIC_TERMS, &lower) || is_listed(TECH_TERMS, &lower) {
        return None;
    }

    let name: String = words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    if name.len() > 60 {
        return None;
    }
    Some(name)
}

/// Case-insensitive entity lookup that also answers for naive singular/plural forms
#[derive(Debug, Default)]
pub(crate) struct NameIndex {
    by_key: HashMap<String, String>,
}

impl NameIndex {
    pub fn new(entities: &[RawEntity]) -> Self {
        let mut by_key = HashMap::new();
        for entity in entities {
            let lower = entity.name.to_lowercase();
            for key in [lower.clone(), pluralize(&lower), singularize(&lower)] {
                by_key.entry(key).or_insert_with(|| entity.name.clone());
            }
        }
        Self { by_key }
    }

    /// Canonical entity name for a token as written in the text
    pub fn resolve(&self, token: &str) -> Option<&str> {
        let lower = strip_markup(token).to_lowercase();
        self.by_key
            .get(&lower)
            .or_else(|| self.by_key.get(&singularize(&lower)))
            .map(String::as_str)
    }
}
