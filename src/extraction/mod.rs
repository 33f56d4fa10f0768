// src/extraction/mod.rs
pub mod extractor;
pub mod selectors;

pub use extractor::{visible_text, ContentExtractor, Extraction};
pub use selectors::{Platform, SelectorSet};
