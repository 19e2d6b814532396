//! Session orchestrator: every configured site and category, one job at a time.

use crate::config::RunConfig;
use crate::cookies::CookieJar;
use crate::driver::Driver;
use crate::error::ScrapeError;
use crate::retry::{retry_everything, run_with_retry, ErrorClass};
use crate::store::{locked, DedupStore, SharedStore};
use crate::walker::PaginationWalker;
use anyhow::{Context, Result};
use std::sync::Mutex;
use tracing::info;

/// Outcome counters for one full run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Category jobs attempted (retries not counted)
    pub jobs: usize,
    /// Jobs that exhausted their retry budget
    pub failed_jobs: usize,
    /// Records added during this run
    pub new_records: usize,
    /// Records in the store after the run
    pub total_records: usize,
}

/// Owns the driver, the store, and the cross-cutting session concerns: cookie
/// restore/persist and the optional tracing bracket around the whole run.
pub struct SessionOrchestrator<D: Driver> {
    driver: D,
    config: RunConfig,
    classify: fn(&ScrapeError) -> ErrorClass,
}

impl<D: Driver> SessionOrchestrator<D> {
    pub fn new(driver: D, config: RunConfig) -> Self {
        Self { driver, config, classify: retry_everything }
    }

    /// Replaces the error classification policy used by the retry wrapper.
    pub fn with_classifier(mut self, classify: fn(&ScrapeError) -> ErrorClass) -> Self {
        self.classify = classify;
        self
    }

    /// Runs every configured category job sequentially.
    ///
    /// Exhausted retries for one category never abort the session; the next
    /// job proceeds regardless. Only setup and teardown failures (snapshot
    /// load, cookie restore, tracing) surface as errors.
    pub async fn run(&self) -> Result<SessionSummary> {
        let store: SharedStore = Mutex::new(
            DedupStore::load_from(&self.config.products_path)
                .context("Failed to load product snapshot")?,
        );
        let starting = locked(&store).len();
        info!("Loaded {} existing record(s)", starting);

        let cookie_jar = CookieJar::new(&self.config.cookies_path);
        cookie_jar
            .restore(&self.driver)
            .await
            .context("Failed to restore cookie snapshot")?;

        if self.config.enable_tracing {
            self.driver.tracing_start().await.context("Failed to start tracing")?;
        }

        let walker = PaginationWalker::new(&self.driver, &self.config);
        let mut jobs = 0usize;
        let mut failed_jobs = 0usize;

        for site in &self.config.websites {
            for category in &site.categories {
                jobs += 1;
                let label = format!("{}/{}", site.name, category.name);
                let succeeded =
                    run_with_retry(&label, self.config.max_attempts, self.classify, || {
                        walker.walk(site, category, &store, &cookie_jar)
                    })
                    .await;
                if !succeeded {
                    failed_jobs += 1;
                }
            }
        }

        if self.config.enable_tracing {
            self.driver
                .tracing_stop(&self.config.trace_path)
                .await
                .context("Failed to stop tracing")?;
        }

        let guard = locked(&store);
        let summary = SessionSummary {
            jobs,
            failed_jobs,
            new_records: guard.len().saturating_sub(starting),
            total_records: guard.len(),
        };
        info!(
            "Session finished: {} job(s), {} failed, {} new record(s), {} total",
            summary.jobs, summary.failed_jobs, summary.new_records, summary.total_records
        );
        Ok(summary)
    }

    /// Releases the driver, e.g. so a real browser can be shut down.
    pub fn into_driver(self) -> D {
        self.driver
    }
}
