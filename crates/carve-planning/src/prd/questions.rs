//! Interview questions for gaps the document leaves open

use carve_core::ParsedDocument;

use super::text::{contains_word, mentions_any};

/// Shown in place of every other question when nothing could be extracted
pub const NO_ENTITIES_QUESTION: &str =
    "No entities were found in the document. What are the core domain objects the system manages?";

/// Entities listed by name before the remainder is summarized
const MAX_LISTED: usize = 5;

const AUTH_TERMS: &[&str] = &["auth", "login", "log in", "sign in", "sign-in", "signup", "sign up", "password"];
const LISTING_TERMS: &[&str] = &["list", "search", "pagination", "paginate", "paginated", "browse"];
const PAGINATION_STRATEGIES: &[&str] = &["cursor", "offset", "page size", "keyset", "limit"];
const PAYMENT_TERMS: &[&str] = &["payment", "checkout", "billing", "charge"];
const PAYMENT_PROVIDERS: &[&str] = &["stripe", "paypal", "braintree", "adyen", "square", "razorpay"];
const FILE_TERMS: &[&str] = &["upload", "file", "attachment", "image", "document storage"];
const STORAGE_TARGETS: &[&str] = &["s3", "gcs", "blob storage", "azure blob", "minio", "cloud storage", "filesystem", "cdn"];
const NOTIFICATION_TERMS: &[&str] = &["email", "e-mail", "notification", "notify", "sms"];
const NOTIFICATION_PROVIDERS: &[&str] = &["sendgrid", "mailgun", "ses", "twilio", "postmark", "smtp", "firebase", "fcm", "apns"];
const CACHE_TERMS: &[&str] = &["cache", "caching", "cached"];
const CACHE_STRATEGIES: &[&str] = &["redis", "memcached", "ttl", "cdn", "write-through", "cache-aside", "read-through"];

fn names_any(lowered: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| contains_word(lowered, t))
}

fn hint_missing(doc: &ParsedDocument, key: &str) -> bool {
    doc.hint(key).is_none()
}

/// "A, B, C, D, E (+2 more)"
fn summarize_names(names: &[&str]) -> String {
    let mut listed = names
        .iter()
        .take(MAX_LISTED)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() > MAX_LISTED {
        listed.push_str(&format!(" (+{} more)", names.len() - MAX_LISTED));
    }
    listed
}

/// Run the question rules in their fixed order
pub(crate) fn generate_questions(text: &str, doc: &ParsedDocument) -> Vec<String> {
    if doc.entities.is_empty() {
        return vec![NO_ENTITIES_QUESTION.to_string()];
    }

    let lowered = text.to_lowercase();
    let mut questions = Vec::new();

    if mentions_any(&lowered, AUTH_TERMS) && hint_missing(doc, "auth") {
        questions.push(
            "Authentication is mentioned but no mechanism is specified. Should the system use JWT, OAuth2, sessions or API keys?"
                .to_string(),
        );
    }
    if hint_missing(doc, "database") {
        questions.push("No database technology was specified. Which database should the services use?".to_string());
    }
    if doc.bounded_contexts.len() > 1 && hint_missing(doc, "message_broker") {
        questions.push(format!(
            "{} bounded contexts were found but no message broker. How should services communicate asynchronously?",
            doc.bounded_contexts.len()
        ));
    }

    let fieldless: Vec<&str> = doc
        .entities
        .iter()
        .filter(|e| e.fields.is_empty())
        .map(|e| e.name.as_str())
        .collect();
    if !fieldless.is_empty() {
        questions.push(format!(
            "These entities have no fields defined: {}. What attributes should they carry?",
            summarize_names(&fieldless)
        ));
    }

    if doc.relationships.is_empty() && doc.entities.len() > 1 {
        questions.push(format!(
            "No relationships were detected between the {} entities. How do they relate to each other?",
            doc.entities.len()
        ));
    }
    if mentions_any(&lowered, LISTING_TERMS) && !names_any(&lowered, PAGINATION_STRATEGIES) {
        questions.push(
            "Listing or search is mentioned without a pagination strategy. Should list endpoints use cursor or offset pagination?"
                .to_string(),
        );
    }
    if mentions_any(&lowered, PAYMENT_TERMS) && !names_any(&lowered, PAYMENT_PROVIDERS) {
        questions.push("Payments are mentioned but no provider is named. Which payment provider should be integrated?".to_string());
    }
    if mentions_any(&lowered, FILE_TERMS) && !names_any(&lowered, STORAGE_TARGETS) {
        questions.push("File uploads are mentioned but no storage target is named. Where should uploaded files be stored?".to_string());
    }
    if mentions_any(&lowered, NOTIFICATION_TERMS) && !names_any(&lowered, NOTIFICATION_PROVIDERS) {
        questions.push(
            "Email or notifications are mentioned but no delivery provider is named. Which provider should send them?".to_string(),
        );
    }
    if hint_missing(doc, "language") {
        questions.push("No implementation language was specified. Which language should the services be written in?".to_string());
    }
    if mentions_any(&lowered, CACHE_TERMS) && !names_any(&lowered, CACHE_STRATEGIES) {
        questions.push("Caching is mentioned without a strategy. What should be cached, where, and for how long?".to_string());
    }

    questions
}
