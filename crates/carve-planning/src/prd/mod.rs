//! PRD parsing
//!
//! Turns markdown or prose requirements into a [`ParsedDocument`]. Every
//! extraction step is a deterministic pattern scan; nothing here fails except
//! the minimum-length check.

/// A `&'static Regex` compiled on first use
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}

mod contexts;
mod entities;
mod project;
mod questions;
mod relationships;
mod state_machines;
mod technology;
mod text;

use carve_core::{ParsedDocument, ParsingError, MIN_PRD_LENGTH};
use tracing::{info, instrument};

pub use contexts::normalize_context_key;
pub use project::UNTITLED_PROJECT;
pub use questions::NO_ENTITIES_QUESTION;
pub use state_machines::linear_chain;
pub use technology::PRIMARY_HINTS;

use text::Document;

/// Parse a requirements document.
///
/// Fails only when the trimmed input is shorter than [`MIN_PRD_LENGTH`]
/// characters; any other input yields a document, possibly with empty
/// collections.
#[instrument(skip_all)]
pub fn parse_prd(text: &str) -> Result<ParsedDocument, ParsingError> {
    let length = text.trim().chars().count();
    if length < MIN_PRD_LENGTH {
        return Err(ParsingError::TooShort {
            length,
            minimum: MIN_PRD_LENGTH,
        });
    }

    let doc = Document::new(text);
    let project_name = project::extract_project_name(&doc);
    let mut entities = entities::extract_entities(&doc);
    let bounded_contexts = contexts::extract_contexts(&doc, &mut entities);
    let relationships = relationships::extract_relationships(text, &entities);
    let technology_hints = technology::extract_technology_hints(text);
    let state_machines = state_machines::extract_state_machines(&doc, &entities);

    let mut parsed = ParsedDocument {
        project_name,
        entities,
        relationships,
        bounded_contexts,
        technology_hints,
        state_machines,
        interview_questions: Vec::new(),
    };
    parsed.interview_questions = questions::generate_questions(text, &parsed);

    info!(
        "parsed '{}': {} entities, {} relationships, {} contexts, {} state machines",
        parsed.project_name,
        parsed.entities.len(),
        parsed.relationships.len(),
        parsed.bounded_contexts.len(),
        parsed.state_machines.len()
    );
    Ok(parsed)
}
