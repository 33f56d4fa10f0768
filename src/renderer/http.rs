// src/renderer/http.rs
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info};

use super::{InteractionHook, RenderError, Renderer};
use crate::config::RendererConfig;
use crate::extraction::visible_text;

/// Plain HTTP fetch. No JavaScript runs, so it only suits server-rendered boards.
pub struct HttpRenderer {
    client: Option<Client>,
    page: Option<String>,
}

impl HttpRenderer {
    pub fn new(config: &RendererConfig) -> Result<Self, RenderError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        Ok(Self {
            client: Some(client),
            page: None,
        })
    }

    fn page(&self) -> Result<&str, RenderError> {
        if self.client.is_none() {
            return Err(RenderError::Closed);
        }
        self.page.as_deref().ok_or(RenderError::NotNavigated)
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        let client = self.client.as_ref().ok_or(RenderError::Closed)?;
        self.page = None;
        info!("Fetching job post: {}", url);

        let navigation_error = |message: String| RenderError::Navigation {
            url: url.to_string(),
            message,
        };

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(navigation_error(format!("HTTP error: {}", response.status())));
        }

        let html = response
            .text()
            .await
            .map_err(|e| navigation_error(format!("Failed to read response body: {}", e)))?;
        self.page = Some(html);
        Ok(())
    }

    async fn interact(&mut self, hook: InteractionHook) -> Result<(), RenderError> {
        debug!("Static page, skipping {:?}", hook);
        Ok(())
    }

    async fn rendered_html(&mut self) -> Result<String, RenderError> {
        self.page().map(str::to_string)
    }

    async fn visible_text(&mut self) -> Result<String, RenderError> {
        let page = self.page()?;
        let document = Html::parse_document(page);
        let body = Selector::parse("body").map_err(|e| RenderError::Capture(e.to_string()))?;
        Ok(document
            .select(&body)
            .map(visible_text)
            .collect::<Vec<_>>()
            .join(" "))
    }

    async fn close(&mut self) {
        self.client = None;
        self.page = None;
    }
}
