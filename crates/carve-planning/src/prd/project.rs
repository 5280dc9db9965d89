//! Project name detection

use super::text::{heading_of, strip_markup, truncate_chars, Document};

pub const UNTITLED_PROJECT: &str = "Untitled Project";

/// Longest name taken from a bare first line
const MAX_LINE_NAME: usize = 120;

pub(crate) fn extract_project_name(doc: &Document) -> String {
    let top_level = || doc.headings.iter().filter(|h| h.level == 1);

    let explicit = top_level().find_map(|h| {
        let caps = regex!(r"(?i)^(?:project|prd)\s*:\s*(.+)$").captures(&h.text)?;
        caps.get(1).map(|m| strip_markup(m.as_str()))
    });
    if let Some(name) = explicit.filter(|n| !n.is_empty()) {
        return name;
    }

    if let Some(name) = top_level().map(|h| strip_markup(&h.text)).find(|n| !n.is_empty()) {
        return name;
    }

    let labelled = doc.lines.iter().find_map(|(_, line)| {
        let caps = regex!(
            r"(?i)^\s*(?:[-*+]\s+)?(?:\*\*)?(?:project|product)\s+name(?:\*\*)?\s*:(?:\*\*)?\s*(.+)$"
        )
        .captures(line)?;
        caps.get(1).map(|m| strip_markup(m.as_str()))
    });
    if let Some(name) = labelled.filter(|n| !n.is_empty()) {
        return name;
    }

    doc.lines
        .iter()
        .map(|(_, line)| line.trim())
        .find(|line| !line.is_empty())
        .map(|line| {
            let line = heading_of(line).map(|(_, text)| text).unwrap_or(line);
            truncate_chars(line, MAX_LINE_NAME)
        })
        .unwrap_or_else(|| UNTITLED_PROJECT.to_string())
}
