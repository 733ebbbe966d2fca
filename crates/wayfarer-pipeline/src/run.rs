//! Discovery run: every blog, every location mention, one row per resolved place.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Utc;
use tracing::{debug, error, info, warn};
use wayfarer_ai::{EntityRecognizer, SentimentScorer};
use wayfarer_core::{Blog, NewPlace, PlaceCandidate};
use wayfarer_geo::Geocoder;
use wayfarer_store::PlaceStore;

use crate::popularity;
use crate::resolver::CoordinateResolver;
use crate::throttle::Throttle;

/// Pause applied between candidates unless configured otherwise.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum spacing between consecutive candidates.
    pub throttle: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            throttle: DEFAULT_THROTTLE,
        }
    }
}

/// What happened to one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// Too short after cleaning; never geocoded.
    Invalid,
    /// No coordinates: empty result set or provider failure.
    Unresolved,
    Saved,
    SaveFailed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub blogs: usize,
    /// Distinct cleaned location names, summed over blogs.
    pub candidates: usize,
    pub invalid: usize,
    pub unresolved: usize,
    pub saved: usize,
    pub save_failed: usize,
    pub elapsed_secs: f64,
}

impl RunStats {
    fn record(&mut self, outcome: CandidateOutcome) {
        self.candidates += 1;
        match outcome {
            CandidateOutcome::Invalid => self.invalid += 1,
            CandidateOutcome::Unresolved => self.unresolved += 1,
            CandidateOutcome::Saved => self.saved += 1,
            CandidateOutcome::SaveFailed => self.save_failed += 1,
        }
    }
}

/// Sequential place-discovery pipeline over pluggable collaborators.
pub struct Pipeline<R, G, S, P> {
    recognizer: R,
    resolver: CoordinateResolver<G>,
    store: S,
    sentiment: P,
    throttle: Throttle,
}

impl<R, G, S, P> Pipeline<R, G, S, P>
where
    R: EntityRecognizer,
    G: Geocoder,
    S: PlaceStore,
    P: SentimentScorer,
{
    pub fn new(
        recognizer: R,
        geocoder: G,
        store: S,
        sentiment: P,
        config: PipelineConfig,
    ) -> Self {
        Self {
            recognizer,
            resolver: CoordinateResolver::new(geocoder),
            store,
            sentiment,
            throttle: Throttle::new(config.throttle),
        }
    }

    /// Process every blog once, in the order the store returns them.
    ///
    /// Failing to list blogs or to run the recognizer aborts the run.
    /// Per-candidate failures (geocoding, insert) are logged and skipped.
    pub async fn run(&mut self) -> anyhow::Result<RunStats> {
        let start = Instant::now();
        info!(
            throttle_ms = self.throttle.min_interval().as_millis() as u64,
            "discovery run started"
        );

        // 1. Fetch all blogs.
        let blogs = self.store.list_blogs().await.context("listing blogs")?;
        info!(count = blogs.len(), "blogs to process");

        // 2. Walk them one at a time.
        let mut stats = RunStats::default();
        for blog in &blogs {
            self.process_blog(blog, &mut stats).await?;
            stats.blogs += 1;
        }

        stats.elapsed_secs = start.elapsed().as_secs_f64();
        info!(
            blogs = stats.blogs,
            candidates = stats.candidates,
            invalid = stats.invalid,
            unresolved = stats.unresolved,
            saved = stats.saved,
            save_failed = stats.save_failed,
            elapsed_secs = stats.elapsed_secs,
            "discovery run completed"
        );
        Ok(stats)
    }

    async fn process_blog(&mut self, blog: &Blog, stats: &mut RunStats) -> anyhow::Result<()> {
        info!(blog_id = %blog.id, "processing blog");

        let candidates = self.extract_candidates(blog).await?;
        if candidates.is_empty() {
            info!(blog_id = %blog.id, "no locations mentioned");
            return Ok(());
        }

        // Fetched on the first resolved place, reused for the rest of this blog.
        let mut blog_score: Option<f64> = None;
        for candidate in &candidates {
            // Gate on start times: the previous candidate's lookups count
            // toward the pause before this one.
            self.throttle.wait().await;
            let outcome = self.process_candidate(blog, candidate, &mut blog_score).await;
            stats.record(outcome);
        }
        Ok(())
    }

    /// Location mentions in the blog, cleaned and de-duplicated.
    async fn extract_candidates(
        &mut self,
        blog: &Blog,
    ) -> anyhow::Result<BTreeSet<PlaceCandidate>> {
        let entities = self
            .recognizer
            .recognize(&blog.content)
            .await
            .with_context(|| format!("recognizing entities in blog {}", blog.id))?;

        let candidates: BTreeSet<PlaceCandidate> = entities
            .iter()
            .filter(|e| e.category.is_location())
            .map(|e| PlaceCandidate::from_raw(&e.text))
            .collect();
        info!(
            blog_id = %blog.id,
            entities = entities.len(),
            locations = candidates.len(),
            "entities recognized"
        );
        Ok(candidates)
    }

    async fn process_candidate(
        &mut self,
        blog: &Blog,
        candidate: &PlaceCandidate,
        blog_score: &mut Option<f64>,
    ) -> CandidateOutcome {
        let name = candidate.name.as_str();
        if !candidate.is_valid() {
            warn!(blog_id = %blog.id, place = name, "invalid place name, skipping");
            return CandidateOutcome::Invalid;
        }

        let Some(at) = self.resolver.resolve(name).await else {
            debug!(blog_id = %blog.id, place = name, "skipping unresolved place");
            return CandidateOutcome::Unresolved;
        };

        let score = match *blog_score {
            Some(score) => score,
            None => {
                let score = popularity::score(&self.store, &self.sentiment, &blog.id)
                    .await
                    .value();
                *blog_score = Some(score);
                score
            }
        };

        let place = NewPlace::discovered(name, at, score, blog.id.clone(), Utc::now());
        match self.store.insert_place(&place).await {
            Ok(()) => {
                info!(
                    blog_id = %blog.id,
                    place = name,
                    lat = at.latitude,
                    long = at.longitude,
                    popularity = score,
                    "saved place"
                );
                CandidateOutcome::Saved
            }
            Err(e) => {
                error!(blog_id = %blog.id, place = name, error = %e, "failed to save place");
                CandidateOutcome::SaveFailed
            }
        }
    }
}
