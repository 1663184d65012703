//! Query Translator
//!
//! Turns a vibe into a search query with one call to the generation service.
//! Any failure (or a blank answer) falls back to the vibe text verbatim; the
//! translator never returns an error. There are no retries: a single failed
//! call bounds the latency the translator adds to a request.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::generation::GenerationService;
use crate::models::{SearchQuery, Vibe};

/// Instruction sent with every vibe
pub const DJ_INSTRUCTION: &str = "You are a professional DJ. Convert the user's vibe description \
into a specific YouTube search query that yields the best music video results. Return ONLY the \
search query, nothing else. Example: 'chill lo-fi' -> 'lofi hip hop radio - beats to relax/study to'.";

/// Outcome of one translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub query: SearchQuery,
    /// True when the vibe was used verbatim
    pub fallback: bool,
}

/// Vibe → search query translator
#[derive(Clone)]
pub struct QueryTranslator {
    service: Option<Arc<dyn GenerationService>>,
}

impl QueryTranslator {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self {
            service: Some(service),
        }
    }

    /// Translator that always uses the vibe as the query
    pub fn passthrough() -> Self {
        Self { service: None }
    }

    pub fn from_optional(service: Option<Arc<dyn GenerationService>>) -> Self {
        Self { service }
    }

    pub async fn translate(&self, vibe: &Vibe) -> Translation {
        let Some(service) = &self.service else {
            debug!("No generation service configured, using vibe as query");
            return Translation {
                query: SearchQuery::from_vibe(vibe),
                fallback: true,
            };
        };

        match service.generate(DJ_INSTRUCTION, vibe.as_str()).await {
            Ok(text) => match SearchQuery::new(clean_generated(&text)) {
                Some(query) => {
                    info!(
                        provider = service.provider_name(),
                        query = %query,
                        "Generated search query"
                    );
                    Translation {
                        query,
                        fallback: false,
                    }
                }
                None => {
                    warn!(
                        provider = service.provider_name(),
                        "Generation service returned empty text, falling back to raw vibe"
                    );
                    Translation {
                        query: SearchQuery::from_vibe(vibe),
                        fallback: true,
                    }
                }
            },
            Err(e) => {
                warn!(
                    provider = service.provider_name(),
                    error = %e,
                    "Generation failed, falling back to raw vibe"
                );
                Translation {
                    query: SearchQuery::from_vibe(vibe),
                    fallback: true,
                }
            }
        }
    }
}

/// Trim whitespace and one pair of wrapping quotes
fn clean_generated(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['"', '\'', '`'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].trim();
        }
    }
    trimmed
}
