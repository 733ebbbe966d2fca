//! Blog popularity from its reviews.
//!
//! `popularity = 0.6 × mean(rating) + 0.4 × mean(sentiment(text))`
//!
//! A blog with no reviews, or whose reviews could not be read, scores `0.0`.
//! The two cases stay distinguishable in [`Popularity`] so they can be
//! logged differently, but both persist as zero.

use tracing::{debug, error};
use wayfarer_ai::SentimentScorer;
use wayfarer_core::{BlogId, Review};
use wayfarer_store::PlaceStore;

pub const RATING_WEIGHT: f64 = 0.6;
pub const SENTIMENT_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Popularity {
    Scored { score: f64, reviews: usize },
    NoReviews,
    /// The review fetch failed.
    Unavailable,
}

impl Popularity {
    /// The number written to `popular_places.popularity_score`.
    pub fn value(&self) -> f64 {
        match *self {
            Popularity::Scored { score, .. } => score,
            Popularity::NoReviews | Popularity::Unavailable => 0.0,
        }
    }
}

/// Blend ratings and sentiment over an already-fetched review set.
pub fn blend<S: SentimentScorer + ?Sized>(reviews: &[Review], sentiment: &S) -> Popularity {
    if reviews.is_empty() {
        return Popularity::NoReviews;
    }
    let n = reviews.len() as f64;
    let mean_rating = reviews.iter().map(|r| r.rating).sum::<f64>() / n;
    let mean_polarity = reviews
        .iter()
        .map(|r| sentiment.polarity(&r.text))
        .sum::<f64>()
        / n;

    Popularity::Scored {
        score: RATING_WEIGHT * mean_rating + SENTIMENT_WEIGHT * mean_polarity,
        reviews: reviews.len(),
    }
}

/// Fetch a blog's reviews and score them. Fetch failures are logged and
/// reported as [`Popularity::Unavailable`].
pub async fn score<P, S>(store: &P, sentiment: &S, blog_id: &BlogId) -> Popularity
where
    P: PlaceStore + ?Sized,
    S: SentimentScorer + ?Sized,
{
    let reviews = match store.fetch_reviews(blog_id).await {
        Ok(reviews) => reviews,
        Err(e) => {
            error!(
                blog_id = %blog_id,
                error = %e,
                "failed to fetch reviews, popularity defaults to 0"
            );
            return Popularity::Unavailable;
        }
    };

    let popularity = blend(&reviews, sentiment);
    debug!(
        blog_id = %blog_id,
        reviews = reviews.len(),
        score = popularity.value(),
        "popularity computed"
    );
    popularity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use wayfarer_ai::LexiconSentiment;

    /// Scores every text with the same polarity.
    struct Flat(f64);

    impl SentimentScorer for Flat {
        fn polarity(&self, _text: &str) -> f64 {
            self.0
        }
    }

    fn review(rating: f64, text: &str) -> Review {
        Review {
            text: text.into(),
            rating,
        }
    }

    #[test]
    fn no_reviews_scores_zero() {
        let p = blend(&[], &Flat(1.0));
        assert_eq!(p, Popularity::NoReviews);
        assert_eq!(p.value(), 0.0);
    }

    #[test]
    fn weighted_blend() {
        // 0.6 × 4.0 + 0.4 × 0.5
        let p = blend(&[review(5.0, "a"), review(3.0, "b")], &Flat(0.5));
        assert!((p.value() - 2.6).abs() < 1e-9);
        assert!(matches!(p, Popularity::Scored { reviews: 2, .. }));
    }

    #[test]
    fn mixed_reviews_with_lexicon() {
        // wonderful (1.0) and terrible (-1.0) average out: 0.6 × 3.0 + 0.
        let reviews = [review(5.0, "Wonderful"), review(1.0, "Terrible")];
        let p = blend(&reviews, &LexiconSentiment::new());
        assert!((p.value() - 1.8).abs() < 1e-9);
    }

    #[test]
    fn missing_ratings_count_as_zero() {
        // Ratings 4 and a null read as 0: mean 2.0.
        let p = blend(&[review(4.0, ""), review(0.0, "")], &Flat(0.0));
        assert!((p.value() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn negative_sentiment_lowers_score() {
        let sentiment = LexiconSentiment::new();
        let happy = blend(&[review(4.0, "Wonderful, loved it")], &sentiment);
        let grumpy = blend(&[review(4.0, "Terrible and dirty")], &sentiment);
        assert!(happy.value() > 2.4);
        assert!(grumpy.value() < 2.4);
    }

    #[tokio::test]
    async fn scores_fetched_reviews() {
        let store = MemoryStore::default()
            .review(7, 5.0, "x")
            .review(7, 4.0, "y")
            .review(8, 1.0, "other blog");
        let p = score(&store, &Flat(-1.0), &BlogId::Int(7)).await;
        // 0.6 × 4.5 − 0.4
        assert!((p.value() - 2.3).abs() < 1e-9);
        assert!(matches!(p, Popularity::Scored { reviews: 2, .. }));
    }

    #[tokio::test]
    async fn blog_without_reviews() {
        let p = score(&MemoryStore::default(), &Flat(1.0), &BlogId::Int(1)).await;
        assert_eq!(p, Popularity::NoReviews);
    }

    #[tokio::test]
    async fn fetch_failure_is_unavailable() {
        let store = MemoryStore::default()
            .review(1, 5.0, "great")
            .unreadable_reviews(1);
        let p = score(&store, &Flat(1.0), &BlogId::Int(1)).await;
        assert_eq!(p, Popularity::Unavailable);
        assert_eq!(p.value(), 0.0);
    }
}
