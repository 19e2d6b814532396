//! Cookie snapshot shared across categories and runs.
//!
//! Restoring a previous cookie set lets a later run resume an authenticated or
//! rate-limit-appeased state; capturing after every navigation keeps the
//! snapshot current even when a later category fails.

use crate::driver::{Cookie, Driver};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

/// Reads and writes the serialized cookie list around the driver session.
pub struct CookieJar {
    path: PathBuf,
}

impl CookieJar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Restores a previously captured cookie set, if one exists.
    pub async fn restore<D: Driver>(&self, driver: &D) -> Result<()> {
        if !self.path.exists() {
            debug!("No cookie snapshot at {}", self.path.display());
            return Ok(());
        }

        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read cookie snapshot: {}", self.path.display()))?;
        let cookies: Vec<Cookie> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse cookie snapshot: {}", self.path.display()))?;

        debug!("Restoring {} cookie(s)", cookies.len());
        driver.add_cookies(cookies).await
    }

    /// Captures the driver's current cookie set, overwriting the snapshot.
    pub async fn capture<D: Driver>(&self, driver: &D) -> Result<()> {
        let cookies = driver.cookies().await?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create cookie directory: {}", parent.display())
                })?;
            }
        }

        let json =
            serde_json::to_string_pretty(&cookies).context("Failed to serialize cookies")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write cookie snapshot: {}", self.path.display()))
    }
}
