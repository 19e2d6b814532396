//! Pagination walker: drives one category job to completion or abandonment.
//!
//! Per category the walk is navigate, resolve the category link, wait for the
//! network to go quiet, then cycle extract / persist / screenshot / delay /
//! advance until no next-page control is visible. Nothing is handled locally;
//! any failure along the path bubbles up to the retry wrapper, which restarts
//! the walk from the top. Pages persisted before a failure are kept, and a
//! retried walk re-extracts them at no cost thanks to the dedup key.

use crate::config::{Category, RunConfig, SiteConfig, CATEGORY_NAME_PLACEHOLDER};
use crate::cookies::CookieJar;
use crate::driver::{bounded, Driver, Element};
use crate::error::ScrapeError;
use crate::extract::extract_page;
use crate::store::{locked, SharedStore};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct PaginationWalker<'a, D: Driver> {
    driver: &'a D,
    config: &'a RunConfig,
}

impl<'a, D: Driver> PaginationWalker<'a, D> {
    pub fn new(driver: &'a D, config: &'a RunConfig) -> Self {
        Self { driver, config }
    }

    /// Walks one category. Errors are left entirely to the retry wrapper.
    pub async fn walk(
        &self,
        site: &SiteConfig,
        category: &Category,
        store: &SharedStore,
        cookie_jar: &CookieJar,
    ) -> Result<(), ScrapeError> {
        info!("Walking {} / {} ({})", site.name, category.name, category.kind);

        self.driver.navigate(&site.url).await?;
        cookie_jar.capture(self.driver).await.map_err(ScrapeError::Persist)?;

        self.resolve_category(site, category).await?;
        self.wait_for_network_idle().await?;

        let mut page_index: u32 = 1;
        loop {
            let cards = bounded(
                &site.selectors.item_cards,
                self.config.global_timeout_ms,
                self.driver.locate(&site.selectors.item_cards),
            )
            .await?;
            debug!("Page {}: {} item card(s)", page_index, cards.len());

            extract_page(&cards, site, &category.kind, self.config.item_timeout_ms, store)
                .await?;

            // Persist before anything else can fail: this page is now durable
            locked(store).save_to(&self.config.products_path).map_err(ScrapeError::Persist)?;

            let shot = screenshot_path(&self.config.screenshot_prefix, &site.name, page_index);
            self.driver.screenshot(&shot).await?;

            self.driver.wait(Duration::from_millis(self.config.page_delay_ms)).await;

            if let Some(cap) = self.config.max_pages {
                if page_index >= cap {
                    warn!(
                        "Stopping {} / {} at the configured page cap ({})",
                        site.name, category.name, cap
                    );
                    break;
                }
            }

            let next = self.driver.locate(&site.selectors.next_page).await?;
            let mut advanced = false;
            if let Some(control) = next.first() {
                if control.is_visible().await? {
                    control.click().await?;
                    page_index += 1;
                    advanced = true;
                }
            }
            if !advanced {
                debug!("No visible next-page control after page {}", page_index);
                break;
            }
        }

        info!("Finished {} / {} after {} page(s)", site.name, category.name, page_index);
        Ok(())
    }

    /// Resolves and enters the category from the site root.
    ///
    /// Zero matches fails the job. One match is clicked as-is. With several
    /// candidates the first exact, case-sensitive trimmed-text match wins; if
    /// none matches exactly, no click happens and the walk continues on
    /// whatever page it is on (preserved, documented behavior).
    async fn resolve_category(
        &self,
        site: &SiteConfig,
        category: &Category,
    ) -> Result<(), ScrapeError> {
        let selector =
            site.selectors.category_link.replace(CATEGORY_NAME_PLACEHOLDER, &category.name);
        let links = bounded(
            &selector,
            self.config.global_timeout_ms,
            self.driver.locate(&selector),
        )
        .await?;
        debug!("Found {} element(s) for category: {}", links.len(), category.name);

        match links.len() {
            0 => Err(ScrapeError::CategoryNotFound { name: category.name.clone() }),
            1 => {
                links[0].click().await?;
                Ok(())
            }
            _ => {
                for link in &links {
                    let text = bounded(
                        &selector,
                        self.config.item_timeout_ms,
                        link.text_content(),
                    )
                    .await?;
                    if text.trim() == category.name {
                        link.click().await?;
                        return Ok(());
                    }
                }
                warn!(
                    "No exact text match among {} candidates for category: {}",
                    links.len(),
                    category.name
                );
                Ok(())
            }
        }
    }

    async fn wait_for_network_idle(&self) -> Result<(), ScrapeError> {
        let timeout_ms = self.config.network_idle_timeout_ms;
        match tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.driver.wait_for_network_idle(),
        )
        .await
        {
            Ok(result) => result.map_err(ScrapeError::from),
            Err(_) => Err(ScrapeError::NetworkIdleTimeout { timeout_ms }),
        }
    }
}

/// Deterministic screenshot name keyed by `(site, page_index)`.
fn screenshot_path(prefix: &str, site_name: &str, page_index: u32) -> PathBuf {
    PathBuf::from(format!("{}_{}_{}.jpg", prefix, site_name, page_index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screenshot_path_is_deterministic() {
        let path = screenshot_path("shots/page", "acme", 3);
        assert_eq!(path, PathBuf::from("shots/page_acme_3.jpg"));
        assert_eq!(path, screenshot_path("shots/page", "acme", 3));
    }

    #[test]
    fn test_screenshot_paths_differ_per_page() {
        assert_ne!(
            screenshot_path("s", "acme", 1),
            screenshot_path("s", "acme", 2)
        );
        assert_ne!(
            screenshot_path("s", "acme", 1),
            screenshot_path("s", "other", 1)
        );
    }
}
