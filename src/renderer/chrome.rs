// src/renderer/chrome.rs
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{InteractionHook, RenderError, Renderer};
use crate::config::RendererConfig;

const INTERACTION_PAUSE: Duration = Duration::from_secs(1);
const SCROLL_HALF_PAGE_JS: &str = "window.scrollTo(0, document.body.scrollHeight / 2);";
const BODY_TEXT_JS: &str = "document.body ? document.body.innerText : ''";
const SHOW_MORE_XPATH: &str = "//a[contains(text(), 'Show more')]";

/// Headless Chrome session, so JavaScript-rendered boards show their content.
///
/// One browser process and one tab per instance. `close` (or drop) ends the process.
pub struct ChromeRenderer {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
    settle_delay: Duration,
    navigated: bool,
}

impl ChromeRenderer {
    pub fn launch(config: &RendererConfig) -> Result<Self, RenderError> {
        let browser = Browser::new(LaunchOptions {
            headless: config.headless,
            args: vec![OsStr::new("--disable-notifications")],
            ..Default::default()
        })
        .map_err(|e| RenderError::Launch(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| RenderError::Launch(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(Duration::from_secs(config.timeout_secs));
        if let Err(e) = tab.set_user_agent(&config.user_agent, None, None) {
            warn!("Could not set user agent: {}", e);
        }

        info!("Launched headless browser (headless={})", config.headless);
        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            navigated: false,
        })
    }

    fn ensure_navigated(&self) -> Result<(), RenderError> {
        if self.tab.is_none() {
            return Err(RenderError::Closed);
        }
        if !self.navigated {
            return Err(RenderError::NotNavigated);
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(tab) = self.tab.take() {
            if let Err(e) = tab.close(false) {
                debug!("Tab close failed: {}", e);
            }
        }
        if self.browser.take().is_some() {
            info!("Browser session closed");
        }
        self.navigated = false;
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        self.navigated = false;
        info!("Navigating to {}", url);

        let target = url.to_string();
        on_tab(self.tab.clone(), move |tab| {
            tab.navigate_to(&target)
                .and_then(|tab| tab.wait_until_navigated())
                .map(|_| ())
                .map_err(|e| RenderError::Navigation {
                    url: target.clone(),
                    message: e.to_string(),
                })
        })
        .await?;

        // client-side rendering
        tokio::time::sleep(self.settle_delay).await;
        self.navigated = true;
        Ok(())
    }

    async fn interact(&mut self, hook: InteractionHook) -> Result<(), RenderError> {
        self.ensure_navigated()?;
        debug!("Running interaction {:?}", hook);

        let clicked = on_tab(self.tab.clone(), move |tab| match hook {
            InteractionHook::ScrollHalfPage => tab
                .evaluate(SCROLL_HALF_PAGE_JS, false)
                .map(|_| true)
                .map_err(|e| RenderError::Interaction(e.to_string())),
            // a missing link is not an error
            InteractionHook::ClickShowMore => match tab.find_element_by_xpath(SHOW_MORE_XPATH) {
                Ok(element) => element
                    .click()
                    .map(|_| true)
                    .map_err(|e| RenderError::Interaction(e.to_string())),
                Err(_) => Ok(false),
            },
        })
        .await?;

        if clicked {
            tokio::time::sleep(INTERACTION_PAUSE).await;
        }
        Ok(())
    }

    async fn rendered_html(&mut self) -> Result<String, RenderError> {
        self.ensure_navigated()?;
        on_tab(self.tab.clone(), |tab| {
            tab.get_content()
                .map_err(|e| RenderError::Capture(e.to_string()))
        })
        .await
    }

    async fn visible_text(&mut self) -> Result<String, RenderError> {
        self.ensure_navigated()?;
        on_tab(self.tab.clone(), |tab| {
            let result = tab
                .evaluate(BODY_TEXT_JS, false)
                .map_err(|e| RenderError::Capture(e.to_string()))?;
            Ok(result
                .value
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default())
        })
        .await
    }

    async fn close(&mut self) {
        self.shutdown();
    }
}

/// Run a blocking tab operation off the async executor
async fn on_tab<T, F>(tab: Option<Arc<Tab>>, op: F) -> Result<T, RenderError>
where
    T: Send + 'static,
    F: FnOnce(&Tab) -> Result<T, RenderError> + Send + 'static,
{
    let tab = tab.ok_or(RenderError::Closed)?;
    tokio::task::spawn_blocking(move || op(&tab))
        .await
        .map_err(|e| RenderError::Capture(format!("Browser task failed: {}", e)))?
}

impl Drop for ChromeRenderer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
