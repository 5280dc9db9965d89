//! Kebab-case conversion for service and contract names

/// Prefix used when a converted name would start with a digit
pub const DIGIT_PREFIX: &str = "svc-";

/// Fallback when a name has no alphanumeric characters at all
pub const EMPTY_NAME: &str = "service";

/// Convert an arbitrary name to kebab-case matching `^[a-z][a-z0-9-]*$`.
///
/// - a hyphen is inserted at every lower→upper transition (`OrderItem` → `order-item`)
/// - every run of non-alphanumeric characters becomes a single hyphen
/// - leading/trailing hyphens are trimmed
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if (pending_hyphen || (prev_lower && c.is_ascii_uppercase())) && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c.to_ascii_lowercase());
            prev_lower = c.is_ascii_lowercase();
        } else {
            pending_hyphen = true;
            prev_lower = false;
        }
    }

    if out.is_empty() {
        return EMPTY_NAME.to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, DIGIT_PREFIX);
    }
    out
}

/// Name of the contract a service provides
pub fn contract_name(service: &str) -> String {
    format!("{}-api", kebab_case(service))
}

/// Whether a name already satisfies `^[a-z][a-z0-9-]*$`
pub fn is_valid_service_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
