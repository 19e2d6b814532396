//! pricetrail - incremental price-history scraper for paginated e-commerce
//! category listings, driven through a scripted browser session.
//!
//! The engine walks each configured (site, category) pair page by page,
//! normalizes and deduplicates item records by `(url, price)`, and rewrites
//! the full snapshot after every page so a crash loses at most one page.

pub mod config;
pub mod cookies;
pub mod driver;
pub mod error;
pub mod extract;
pub mod format;
pub mod normalize;
pub mod record;
pub mod retry;
pub mod session;
pub mod store;
pub mod walker;

#[cfg(feature = "chromium")]
pub mod chromium;

pub use config::RunConfig;
pub use error::ScrapeError;
pub use record::ProductRecord;
pub use session::{SessionOrchestrator, SessionSummary};
pub use store::DedupStore;
