//! Scenario orchestration
//!
//! Runs scenarios as independent units: setup (fresh admin session, sweep
//! residue from earlier runs), the scenario body, and an unconditional
//! teardown sweep. The first failing check stops a scenario's body but
//! never its teardown, and a teardown failure never blocks the next
//! scenario. Point weights are runner metadata; a scenario is pass/fail
//! with no partial credit.

use std::future::Future;
use std::time::Instant;

use futures::future::LocalBoxFuture;
use serde::Serialize;
use tracing::{error, info, warn};

use mergegrade_harness::{Config, Result, Session};

use crate::ops;

type ScenarioBody = Box<dyn Fn(Config) -> LocalBoxFuture<'static, Result<()>>>;

/// One isolated, self-cleaning end-to-end test case.
pub struct Scenario {
    name: &'static str,
    points: u32,
    body: ScenarioBody,
}

impl Scenario {
    pub fn new<F, Fut>(name: &'static str, points: u32, body: F) -> Self
    where
        F: Fn(Config) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        Self {
            name,
            points,
            body: Box::new(move |config| Box::pin(body(config))),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn points(&self) -> u32 {
        self.points
    }
}

/// Outcome of one scenario, with the triggering error's message when it
/// failed.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub points: u32,
    pub passed: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Aggregate outcome of a scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub points_earned: u32,
    pub points_possible: u32,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Drives scenarios against one configured target.
pub struct Orchestrator {
    config: Config,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the given scenarios in order, each isolated by its own sessions
    /// and by sweep-cleanup on both sides of the body.
    pub async fn run(&self, scenarios: &[Scenario]) -> SuiteReport {
        let start = Instant::now();
        let mut results = Vec::with_capacity(scenarios.len());

        info!("running {} scenario(s)...", scenarios.len());
        for scenario in scenarios {
            let result = self.run_one(scenario).await;
            if result.passed {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.passed).count();
        let report = SuiteReport {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            points_earned: results.iter().filter(|r| r.passed).map(|r| r.points).sum(),
            points_possible: results.iter().map(|r| r.points).sum(),
            duration_ms: start.elapsed().as_millis() as u64,
            results,
        };

        info!(
            "scenario results: {} passed, {} failed, {}/{} points ({} ms)",
            report.passed,
            report.failed,
            report.points_earned,
            report.points_possible,
            report.duration_ms
        );
        report
    }

    async fn run_one(&self, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        info!("scenario: {}", scenario.name);

        let outcome = match self.setup().await {
            Ok(()) => (scenario.body)(self.config.clone()).await,
            Err(e) => Err(e),
        };

        // Teardown runs even when the body was abandoned; its failures are
        // logged and suppressed so one scenario's residue never blocks the
        // next.
        if let Err(e) = self.sweep().await {
            warn!(scenario = scenario.name, error = %e, "teardown sweep failed");
        }

        ScenarioResult {
            name: scenario.name.to_string(),
            points: scenario.points,
            passed: outcome.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    /// Pre-body isolation: authenticate a fresh admin session and remove
    /// any marker-tagged residue a previous run may have left behind.
    async fn setup(&self) -> Result<()> {
        self.sweep().await
    }

    async fn sweep(&self) -> Result<()> {
        let mut session = Session::open(&self.config)?;
        session.authenticate(&self.config.admin).await?;
        ops::sweep_clean_articles(&session).await?;
        ops::sweep_clean_users(&session, ops::PUBLISHER_LOGIN).await?;
        Ok(())
    }
}
