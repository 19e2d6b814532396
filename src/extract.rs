//! Page extraction: item cards into normalized, deduplicated records.

use crate::config::SiteConfig;
use crate::driver::{bounded, Element};
use crate::error::ScrapeError;
use crate::normalize::{normalize_price, normalize_title};
use crate::record::{epoch_now, ProductRecord};
use crate::store::{locked, SharedStore};
use tracing::debug;

/// Extracts every item card on the current page, inserting unseen records into
/// the store. Returns only the records added by this call.
///
/// There is no per-item catch: a timeout or missing field on any single card
/// aborts the remainder of the page and surfaces as a category-level error.
/// Records inserted before the failure stay in the store, which is safe
/// because extraction is idempotent under the `(url, price)` dedup key.
pub async fn extract_page<E: Element>(
    cards: &[E],
    site: &SiteConfig,
    category_kind: &str,
    item_timeout_ms: u64,
    store: &SharedStore,
) -> Result<Vec<ProductRecord>, ScrapeError> {
    let mut added = Vec::new();

    for card in cards {
        let title_selector = site.selectors.item_title.as_str();
        let title_el = bounded(title_selector, item_timeout_ms, card.find(title_selector))
            .await?
            .ok_or_else(|| ScrapeError::ElementTimeout {
                selector: title_selector.to_string(),
                timeout_ms: item_timeout_ms,
            })?;

        let url = bounded(title_selector, item_timeout_ms, title_el.attribute("href"))
            .await?
            .unwrap_or_default();
        let raw_title = bounded(title_selector, item_timeout_ms, title_el.text_content()).await?;

        let price_selector = site.selectors.item_price.as_str();
        let price_el = bounded(price_selector, item_timeout_ms, card.find(price_selector))
            .await?
            .ok_or_else(|| ScrapeError::ElementTimeout {
                selector: price_selector.to_string(),
                timeout_ms: item_timeout_ms,
            })?;
        let raw_price = bounded(price_selector, item_timeout_ms, price_el.text_content()).await?;

        let record = ProductRecord {
            store: site.name.clone(),
            kind: category_kind.to_string(),
            name: normalize_title(&raw_title),
            price: normalize_price(&raw_price),
            url,
            date: epoch_now(),
        };

        let mut guard = locked(store);
        if !guard.contains(&record.url, &record.price) {
            guard.add(record.clone());
            added.push(record);
        }
    }

    debug!("Extracted {} new record(s) from {} card(s)", added.len(), cards.len());
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SelectorSet, SiteConfig};
    use crate::store::DedupStore;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted element tree: children keyed by selector.
    #[derive(Clone, Default)]
    struct FakeElement {
        text: String,
        attrs: HashMap<String, String>,
        children: HashMap<String, FakeElement>,
    }

    #[async_trait]
    impl Element for FakeElement {
        async fn text_content(&self) -> Result<String> {
            Ok(self.text.clone())
        }

        async fn attribute(&self, name: &str) -> Result<Option<String>> {
            Ok(self.attrs.get(name).cloned())
        }

        async fn click(&self) -> Result<()> {
            Ok(())
        }

        async fn is_visible(&self) -> Result<bool> {
            Ok(true)
        }

        async fn find(&self, selector: &str) -> Result<Option<Self>> {
            Ok(self.children.get(selector).cloned())
        }
    }

    fn make_site() -> SiteConfig {
        SiteConfig {
            name: "acme".to_string(),
            url: "https://acme.example".to_string(),
            selectors: SelectorSet {
                category_link: "a[title=\"CATEGORY_NAME\"]".to_string(),
                item_cards: ".card".to_string(),
                item_title: ".title".to_string(),
                item_price: ".price".to_string(),
                next_page: ".next".to_string(),
            },
            categories: Vec::new(),
        }
    }

    fn make_card(title: &str, href: &str, price: &str) -> FakeElement {
        let mut card = FakeElement::default();
        card.children.insert(
            ".title".to_string(),
            FakeElement {
                text: title.to_string(),
                attrs: HashMap::from([("href".to_string(), href.to_string())]),
                children: HashMap::new(),
            },
        );
        card.children.insert(
            ".price".to_string(),
            FakeElement { text: price.to_string(), ..FakeElement::default() },
        );
        card
    }

    #[tokio::test]
    async fn test_extracts_and_normalizes() {
        let site = make_site();
        let store = Mutex::new(DedupStore::new());
        let cards =
            vec![make_card("Runner,  mesh upper", "/p/1", "$1,299.00"), make_card("Loafer", "/p/2", "499 kr")];

        let added = extract_page(&cards, &site, "sneakers", 1000, &store).await.unwrap();

        assert_eq!(added.len(), 2);
        assert_eq!(added[0].name, "Runner");
        assert_eq!(added[0].price, "129900");
        assert_eq!(added[0].url, "/p/1");
        assert_eq!(added[0].store, "acme");
        assert_eq!(added[0].kind, "sneakers");
        assert_eq!(added[1].price, "499");
        assert_eq!(locked(&store).len(), 2);
    }

    #[tokio::test]
    async fn test_second_pass_is_idempotent() {
        let site = make_site();
        let store = Mutex::new(DedupStore::new());
        let cards = vec![make_card("Runner", "/p/1", "999")];

        let first = extract_page(&cards, &site, "sneakers", 1000, &store).await.unwrap();
        let second = extract_page(&cards, &site, "sneakers", 1000, &store).await.unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(locked(&store).len(), 1);
    }

    #[tokio::test]
    async fn test_price_change_yields_new_record() {
        let site = make_site();
        let store = Mutex::new(DedupStore::new());

        let before = vec![make_card("Runner", "/p/1", "999")];
        let after = vec![make_card("Runner", "/p/1", "1099")];

        extract_page(&before, &site, "sneakers", 1000, &store).await.unwrap();
        let added = extract_page(&after, &site, "sneakers", 1000, &store).await.unwrap();

        assert_eq!(added.len(), 1);
        let guard = locked(&store);
        assert_eq!(guard.len(), 2);
        assert!(guard.contains("/p/1", "999"));
        assert!(guard.contains("/p/1", "1099"));
    }

    #[tokio::test]
    async fn test_missing_field_aborts_rest_of_page() {
        let site = make_site();
        let store = Mutex::new(DedupStore::new());

        let mut broken = make_card("Broken", "/p/2", "100");
        broken.children.remove(".price");

        let cards = vec![make_card("Runner", "/p/1", "999"), broken, make_card("Third", "/p/3", "50")];

        let result = extract_page(&cards, &site, "sneakers", 1000, &store).await;
        assert!(matches!(result, Err(ScrapeError::ElementTimeout { .. })));

        // The card before the failure was already inserted, the one after was not
        let guard = locked(&store);
        assert_eq!(guard.len(), 1);
        assert!(guard.contains("/p/1", "999"));
        assert!(!guard.contains("/p/3", "50"));
    }

    #[tokio::test]
    async fn test_missing_href_becomes_empty_url() {
        let site = make_site();
        let store = Mutex::new(DedupStore::new());

        let mut card = make_card("Runner", "/p/1", "999");
        if let Some(title) = card.children.get_mut(".title") {
            title.attrs.clear();
        }

        let added = extract_page(&[card], &site, "sneakers", 1000, &store).await.unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].url, "");
    }

    #[tokio::test]
    async fn test_empty_page_adds_nothing() {
        let site = make_site();
        let store = Mutex::new(DedupStore::new());

        let added = extract_page::<FakeElement>(&[], &site, "sneakers", 1000, &store).await.unwrap();
        assert!(added.is_empty());
        assert!(locked(&store).is_empty());
    }
}
