//! Browser automation capability seam.
//!
//! The engine drives any backend that can navigate, locate elements, read text
//! and attributes, click, wait, screenshot, and shuttle cookies. Tests script
//! an in-memory implementation; the optional `chromium` feature provides a
//! CDP-backed one. Timeouts are policy, not mechanism: callers bound every
//! driver call with [`bounded`] rather than the driver enforcing its own.

use crate::error::ScrapeError;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::time::Duration;

/// One located DOM element.
#[async_trait]
pub trait Element: Send + Sync {
    /// Text content of the element.
    async fn text_content(&self) -> Result<String>;

    /// Attribute value, `None` when the attribute is absent.
    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    async fn click(&self) -> Result<()>;

    async fn is_visible(&self) -> Result<bool>;

    /// Locates the first descendant matching `selector`.
    async fn find(&self, selector: &str) -> Result<Option<Self>>
    where
        Self: Sized;
}

/// A scripted browser session.
#[async_trait]
pub trait Driver: Send + Sync {
    type Elem: Element;

    async fn navigate(&self, url: &str) -> Result<()>;

    /// All elements currently matching `selector`, in document order.
    async fn locate(&self, selector: &str) -> Result<Vec<Self::Elem>>;

    /// Resolves once the page has gone network-quiet. Callers bound this with
    /// the configured network-idle timeout.
    async fn wait_for_network_idle(&self) -> Result<()>;

    /// Cooperative pause, used for politeness pacing between pages.
    async fn wait(&self, duration: Duration);

    async fn screenshot(&self, path: &Path) -> Result<()>;

    async fn cookies(&self) -> Result<Vec<Cookie>>;

    async fn add_cookies(&self, cookies: Vec<Cookie>) -> Result<()>;

    async fn tracing_start(&self) -> Result<()>;

    async fn tracing_stop(&self, path: &Path) -> Result<()>;
}

/// Browser cookie, serialized as-is into the cookie snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Expiry as epoch seconds; negative or absent means session-scoped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
}

/// Bounds one automation action with a per-action timeout.
///
/// An elapsed timer surfaces as [`ScrapeError::ElementTimeout`] tagged with the
/// selector the action was waiting on.
pub(crate) async fn bounded<T, F>(
    selector: &str,
    timeout_ms: u64,
    action: F,
) -> Result<T, ScrapeError>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_millis(timeout_ms), action).await {
        Ok(result) => result.map_err(ScrapeError::from),
        Err(_) => Err(ScrapeError::ElementTimeout {
            selector: selector.to_string(),
            timeout_ms,
        }),
    }
}
