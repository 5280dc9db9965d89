//! # carve-validation
//!
//! Structural validation of a decomposition.
//!
//! [`validate`] runs fourteen independent checks over a [`ServiceMap`] and
//! [`DomainModel`] (plus, optionally, the parser's open interview questions)
//! and collects the findings in an [`IssueReport`]. The report is valid when
//! it holds no BLOCKING or ERROR issues. Checks never abort the run: one that
//! fails is skipped and listed in [`IssueReport::skipped_checks`]. A cycle
//! search that runs out of steps reports the cycles it found plus a BLOCKING
//! issue saying the search was incomplete.
//!
//! [`ServiceMap`]: carve_core::ServiceMap
//! [`DomainModel`]: carve_core::DomainModel

mod report;
mod validator;

pub use report::{Issue, IssueReport, Severity};
pub use validator::{simple_cycles, validate, CycleSearch, ValidationCheck, Validator, ValidatorConfig};
