//! Entity identifier extraction
//!
//! The remote application assigns identifiers server-side and exposes them
//! only as trailing numeric path segments on links (`/admin/content/edit/42`).
//! The extraction rule is entity-agnostic; it is the link being resolved
//! that gives the id its meaning.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{HarnessError, Result};
use crate::page::Link;

/// An opaque identifier recovered from a link's path. It has no meaning
/// outside the remote application and is never synthesized locally.
pub type EntityId = String;

static TRAILING_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(\d+)$").expect("static pattern"));

/// Extract the trailing numeric path segment from a link's href.
///
/// Any query string is ignored; the segment must terminate the path. A href
/// that does not end in a numeric segment is a resolution failure, never a
/// default id.
pub fn resolve_id(link: &Link) -> Result<EntityId> {
    let path = link.href.split(['?', '#']).next().unwrap_or("");
    TRAILING_ID
        .captures(path)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| HarnessError::Resolution {
            operation: "resolve_id".to_string(),
            detail: format!(
                "href {:?} (text {:?}) has no trailing numeric segment",
                link.href, link.text
            ),
        })
}
