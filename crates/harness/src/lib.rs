//! MergeGrade automation engine
//!
//! This crate drives a remote, session-authenticated web application through
//! its HTML interface:
//! - Maintains an authenticated, cookie-bearing HTTP session
//! - Discovers and submits HTML forms by declarative predicate
//! - Extracts opaque entity identifiers from response markup
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Automation Engine                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Session                                                    │
//! │    ├── open(config) -> Session                              │
//! │    ├── authenticate(credentials)                            │
//! │    ├── fetch(path) -> Page                                  │
//! │    └── submit(form) -> Page                                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Page (immutable snapshot)                                  │
//! │    ├── form_matching(predicate) -> Option<&Form>            │
//! │    ├── links_matching(predicate) -> [&Link]                 │
//! │    └── query_count(css) -> usize                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  resolve_id(link) -> EntityId   (trailing numeric segment)  │
//! │  verify::*                      (pure pass/fail predicates) │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod form;
pub mod page;
pub mod resolve;
pub mod session;
pub mod verify;

pub use config::{Config, Credentials, Role};
pub use error::{HarnessError, Result};
pub use form::{Form, FormMethod, FormPredicate};
pub use page::{Link, LinkPredicate, Page};
pub use resolve::{resolve_id, EntityId};
pub use session::{Identity, Session};
