//! Recommendation services
//!
//! Translator and resolver are independent leaves; the pipeline composes them.

pub mod pipeline;
pub mod resolver;
pub mod translator;

pub use pipeline::{Recommendation, RecommendationError, RecommendationPipeline};
pub use resolver::{parse_track_ids, ResolutionError, TrackResolver};
pub use translator::{QueryTranslator, Translation};
