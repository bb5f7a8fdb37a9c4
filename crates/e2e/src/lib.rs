//! MergeGrade acceptance scenarios
//!
//! High-level operations against the target blog application (create,
//! comment, merge, destroy, sweep-clean) composed from the automation
//! engine in `mergegrade-harness`, plus an orchestrator that runs them as
//! independent, self-cleaning scenarios with point weights.
//!
//! Run against a live target through the `acceptance` test binary:
//!
//! ```text
//! TARGET_URL=http://blog.example.com ADMIN_USER=admin ADMIN_PASS=... \
//!     cargo test --package mergegrade-e2e --test acceptance
//! ```

pub mod ops;
pub mod orchestrator;
pub mod suite;

pub use orchestrator::{Orchestrator, Scenario, ScenarioResult, SuiteReport};
