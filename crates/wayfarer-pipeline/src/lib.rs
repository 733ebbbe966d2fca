//! Place discovery pipeline.
//!
//! For every blog: recognize entities → keep locations → normalize and
//! filter → geocode → score popularity from the blog's reviews → insert one
//! `popular_places` row per resolved name. Strictly sequential: one blog,
//! one candidate, one external call at a time.

pub mod popularity;
pub mod resolver;
pub mod run;
pub mod throttle;

#[cfg(test)]
mod testing;

pub use popularity::{Popularity, RATING_WEIGHT, SENTIMENT_WEIGHT};
pub use resolver::CoordinateResolver;
pub use run::{CandidateOutcome, DEFAULT_THROTTLE, Pipeline, PipelineConfig, RunStats};
pub use throttle::Throttle;
