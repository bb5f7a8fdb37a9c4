//! Verification predicates
//!
//! Pure pass/fail predicates over a [`Page`] or [`Session`]. These never
//! mutate state and never perform network calls; they are the only place a
//! scenario's outcome is decided. The boolean forms answer questions; the
//! `check` adapter turns a failed question into a `Check` error carrying
//! enough context to diagnose which expectation broke.

use crate::config::Role;
use crate::error::{HarnessError, Result};
use crate::page::{LinkPredicate, Page};
use crate::session::Session;

pub fn page_contains(page: &Page, needle: &str) -> bool {
    page.contains(needle)
}

pub fn page_lacks(page: &Page, needle: &str) -> bool {
    !page.contains(needle)
}

pub fn link_count_matching(page: &Page, predicate: &LinkPredicate) -> usize {
    page.links_matching(predicate).count()
}

/// Whether any form on the page declares a field with this name.
pub fn form_field_present(page: &Page, field: &str) -> bool {
    page.forms().iter().any(|f| f.has_field(field))
}

/// Count of markup elements declaring `name="<field>"`, across all forms.
pub fn field_count(page: &Page, field: &str) -> Result<usize> {
    page.query_count(&format!("[name=\"{field}\"]"))
}

pub fn identity_is(session: &Session, role: Role) -> bool {
    session.identity().role() == Some(role)
}

/// Turn a failed expectation into a scenario-stopping error. The first
/// failing check aborts the scenario body; teardown still runs.
pub fn check(condition: bool, context: impl Into<String>) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(HarnessError::Check(context.into()))
    }
}

/// Equality check that reports both sides on failure.
pub fn check_eq<T: PartialEq + std::fmt::Debug>(
    actual: T,
    expected: T,
    context: &str,
) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(HarnessError::Check(format!(
            "{context}: expected {expected:?}, got {actual:?}"
        )))
    }
}
