//! Fail-open execution for independent, non-critical steps
//!
//! The validator runs each of its checks through [`fail_open`] so that one check
//! that cannot complete never prevents the remaining checks from reporting.

use tracing::warn;

use crate::Result;

/// Execute an operation that should fail open.
///
/// Logs the error via `tracing::warn!` on failure and returns `None`.
///
/// ```
/// use carve_core::fail_open::fail_open;
/// use carve_core::{CarveError, Result};
///
/// fn flaky() -> Result<u32> {
///     Err(CarveError::Validation("graph unavailable".to_string()))
/// }
///
/// assert_eq!(fail_open("flaky", flaky), None);
/// assert_eq!(fail_open("steady", || Ok::<_, CarveError>(7)), Some(7));
/// ```
pub fn fail_open<F, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Result<T>,
{
    match f() {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}
