//! CDP-backed driver built on chromiumoxide.
//!
//! Launches a headless Chromium, keeps one working tab, and maps the engine's
//! capability seam onto CDP calls. Only compiled with the `chromium` feature.

use crate::config::RunConfig;
use crate::driver::{Cookie, Driver, Element};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, Headers, SetExtraHttpHeadersParams,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launches a headless Chromium and opens the working tab.
    pub async fn launch(config: &RunConfig) -> Result<Self> {
        let browser_config = BrowserConfig::builder()
            .window_size(config.viewport.width, config.viewport.height)
            .arg(format!("--user-agent={}", config.user_agent))
            .build()
            .map_err(|e| anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch Chromium")?;

        // The handler stream must be polled for the whole browser lifetime
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!("Browser handler event error: {}", err);
                }
            }
        });

        let page = browser.new_page("about:blank").await.context("Failed to open page")?;

        if !config.extra_headers.is_empty() {
            let headers =
                serde_json::to_value(&config.extra_headers).context("Failed to encode headers")?;
            page.execute(SetExtraHttpHeadersParams::new(Headers::new(headers)))
                .await
                .context("Failed to set extra headers")?;
        }

        Ok(Self { browser, page, handler_task })
    }

    /// Shuts the browser down and stops the handler loop.
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await.context("Failed to close browser")?;
        self.handler_task.abort();
        Ok(())
    }
}

pub struct ChromiumElement {
    inner: chromiumoxide::element::Element,
}

#[async_trait]
impl Element for ChromiumElement {
    async fn text_content(&self) -> Result<String> {
        Ok(self.inner.inner_text().await?.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.inner.attribute(name).await?)
    }

    async fn click(&self) -> Result<()> {
        self.inner.click().await.context("Click failed")?;
        Ok(())
    }

    async fn is_visible(&self) -> Result<bool> {
        // CDP has no direct visibility query; having a clickable point means
        // the element is rendered and on screen
        Ok(self.inner.clickable_point().await.is_ok())
    }

    async fn find(&self, selector: &str) -> Result<Option<Self>> {
        match self.inner.find_element(selector).await {
            Ok(element) => Ok(Some(Self { inner: element })),
            Err(_) => Ok(None),
        }
    }
}

#[async_trait]
impl Driver for ChromiumDriver {
    type Elem = ChromiumElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }

    async fn locate(&self, selector: &str) -> Result<Vec<Self::Elem>> {
        // chromiumoxide reports zero matches as an error; the engine expects
        // an empty set instead
        match self.page.find_elements(selector).await {
            Ok(elements) => {
                Ok(elements.into_iter().map(|inner| ChromiumElement { inner }).collect())
            }
            Err(_) => Ok(Vec::new()),
        }
    }

    async fn wait_for_network_idle(&self) -> Result<()> {
        self.page.wait_for_navigation().await.context("Navigation wait failed")?;
        Ok(())
    }

    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create screenshot directory: {}", parent.display())
                })?;
            }
        }

        self.page
            .save_screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Jpeg)
                    .full_page(true)
                    .build(),
                path,
            )
            .await
            .with_context(|| format!("Failed to capture screenshot: {}", path.display()))?;
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        let cookies = self.page.get_cookies().await.context("Failed to read cookies")?;
        Ok(cookies
            .into_iter()
            .map(|c| Cookie {
                name: c.name,
                value: c.value,
                domain: Some(c.domain),
                path: Some(c.path),
                expires: Some(c.expires),
                http_only: c.http_only,
                secure: c.secure,
            })
            .collect())
    }

    async fn add_cookies(&self, cookies: Vec<Cookie>) -> Result<()> {
        let params = cookies
            .into_iter()
            .map(|c| {
                let mut builder = CookieParam::builder().name(c.name).value(c.value);
                if let Some(domain) = c.domain {
                    builder = builder.domain(domain);
                }
                if let Some(path) = c.path {
                    builder = builder.path(path);
                }
                builder.build().map_err(|e| anyhow!("Invalid cookie: {}", e))
            })
            .collect::<Result<Vec<CookieParam>>>()?;

        self.page.set_cookies(params).await.context("Failed to restore cookies")?;
        Ok(())
    }

    async fn tracing_start(&self) -> Result<()> {
        // CDP tracing needs a streaming collector this driver does not wire up
        warn!("Tracing requested but not supported by the chromium driver");
        Ok(())
    }

    async fn tracing_stop(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
