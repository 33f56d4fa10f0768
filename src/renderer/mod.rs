// src/renderer/mod.rs
//! Page renderers: turn a URL into rendered HTML and visible text

pub mod chrome;
pub mod http;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::config::{RendererConfig, RendererKind};
use crate::extraction::Platform;

pub use chrome::ChromeRenderer;
pub use http::HttpRenderer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to launch renderer: {0}")]
    Launch(String),

    #[error("Failed to navigate to {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Failed to capture page: {0}")]
    Capture(String),

    #[error("Interaction failed: {0}")]
    Interaction(String),

    #[error("No page loaded")]
    NotNavigated,

    #[error("Renderer already closed")]
    Closed,
}

/// Page interactions performed before the HTML is captured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionHook {
    /// Scroll halfway down so lazy descriptions expand
    ScrollHalfPage,
    /// Click the first "Show more" link, if any
    ClickShowMore,
}

pub fn hooks_for(platform: Platform) -> &'static [InteractionHook] {
    match platform {
        Platform::LinkedIn => &[InteractionHook::ScrollHalfPage],
        Platform::Greenhouse => &[InteractionHook::ClickShowMore],
        _ => &[],
    }
}

/// One stateful rendering session. Not shared: callers drive it sequentially.
#[async_trait]
pub trait Renderer: Send {
    /// Load `url` and wait for the page to settle
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError>;

    async fn interact(&mut self, hook: InteractionHook) -> Result<(), RenderError>;

    async fn rendered_html(&mut self) -> Result<String, RenderError>;

    async fn visible_text(&mut self) -> Result<String, RenderError>;

    /// Release the session. Best-effort, never fails; later calls return `Closed`.
    async fn close(&mut self);
}

/// Build the renderer selected in the configuration
pub fn launch(config: &RendererConfig) -> Result<Box<dyn Renderer>> {
    let renderer: Box<dyn Renderer> = match config.kind {
        RendererKind::Chrome => Box::new(ChromeRenderer::launch(config)?),
        RendererKind::Http => Box::new(HttpRenderer::new(config)?),
    };
    Ok(renderer)
}
