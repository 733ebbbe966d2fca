//! In-memory collaborators for pipeline tests.
//!
//! Each fake records its calls behind `Arc<Mutex<_>>`, so a test keeps a
//! clone for assertions after handing the original to the pipeline.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use wayfarer_ai::EntityRecognizer;
use wayfarer_core::{Blog, BlogId, Coordinates, EntityCategory, NewPlace, RawEntity, Review};
use wayfarer_geo::{GeocodeError, GeocodeMatch, Geocoder};
use wayfarer_store::{PlaceStore, StoreError};

pub fn loc(text: &str) -> RawEntity {
    RawEntity::new(text, EntityCategory::Location, 0.99)
}

pub fn per(text: &str) -> RawEntity {
    RawEntity::new(text, EntityCategory::Person, 0.99)
}

pub fn at(lat: f64, lng: f64) -> Coordinates {
    Coordinates::new(lat, lng).unwrap()
}

/// Returns pre-set entities keyed by exact blog content.
#[derive(Clone, Default)]
pub struct ScriptedRecognizer {
    entities: HashMap<String, Vec<RawEntity>>,
    fail: bool,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRecognizer {
    pub fn with(mut self, content: &str, entities: Vec<RawEntity>) -> Self {
        self.entities.insert(content.to_string(), entities);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl EntityRecognizer for ScriptedRecognizer {
    async fn recognize(&mut self, text: &str) -> anyhow::Result<Vec<RawEntity>> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.fail {
            anyhow::bail!("model crashed");
        }
        Ok(self.entities.get(text).cloned().unwrap_or_default())
    }
}

/// Resolves a fixed table of names; everything else has no results.
#[derive(Clone, Default)]
pub struct TableGeocoder {
    known: HashMap<String, Coordinates>,
    broken: HashSet<String>,
    pub calls: Arc<Mutex<Vec<String>>>,
    /// When each lookup arrived, on the tokio clock.
    pub call_times: Arc<Mutex<Vec<tokio::time::Instant>>>,
}

impl TableGeocoder {
    pub fn with(mut self, name: &str, coordinates: Coordinates) -> Self {
        self.known.insert(name.to_string(), coordinates);
        self
    }

    /// Make lookups for `name` fail at the provider.
    pub fn broken(mut self, name: &str) -> Self {
        self.broken.insert(name.to_string());
        self
    }
}

#[async_trait]
impl Geocoder for TableGeocoder {
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
        self.calls.lock().unwrap().push(query.to_string());
        self.call_times
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());
        if self.broken.contains(query) {
            return Err(GeocodeError::Server {
                status: 503,
                body: "upstream unavailable".into(),
            });
        }
        Ok(self
            .known
            .get(query)
            .map(|&coordinates| {
                vec![GeocodeMatch {
                    coordinates,
                    label: Some(query.to_string()),
                }]
            })
            .unwrap_or_default())
    }
}

/// Store backed by in-memory tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    blogs: Vec<Blog>,
    reviews: HashMap<BlogId, Vec<Review>>,
    unreadable_reviews: HashSet<BlogId>,
    rejected_names: HashSet<String>,
    listing_fails: bool,
    pub inserted: Arc<Mutex<Vec<NewPlace>>>,
    pub review_fetches: Arc<Mutex<Vec<BlogId>>>,
}

impl MemoryStore {
    pub fn blog(mut self, id: i64, content: &str) -> Self {
        self.blogs.push(Blog {
            id: BlogId::Int(id),
            content: content.to_string(),
        });
        self
    }

    pub fn review(mut self, blog_id: i64, rating: f64, text: &str) -> Self {
        self.reviews
            .entry(BlogId::Int(blog_id))
            .or_default()
            .push(Review {
                text: text.to_string(),
                rating,
            });
        self
    }

    pub fn unreadable_reviews(mut self, blog_id: i64) -> Self {
        self.unreadable_reviews.insert(BlogId::Int(blog_id));
        self
    }

    /// Inserts for this place name fail with a server error.
    pub fn reject(mut self, name: &str) -> Self {
        self.rejected_names.insert(name.to_string());
        self
    }

    pub fn listing_fails(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    pub fn inserted(&self) -> Vec<NewPlace> {
        self.inserted.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaceStore for MemoryStore {
    async fn list_blogs(&self) -> Result<Vec<Blog>, StoreError> {
        if self.listing_fails {
            return Err(StoreError::Server {
                status: 500,
                body: "database offline".into(),
            });
        }
        Ok(self.blogs.clone())
    }

    async fn fetch_reviews(&self, blog_id: &BlogId) -> Result<Vec<Review>, StoreError> {
        self.review_fetches.lock().unwrap().push(blog_id.clone());
        if self.unreadable_reviews.contains(blog_id) {
            return Err(StoreError::Server {
                status: 401,
                body: "permission denied for table blog_reviews".into(),
            });
        }
        Ok(self.reviews.get(blog_id).cloned().unwrap_or_default())
    }

    async fn insert_place(&self, place: &NewPlace) -> Result<(), StoreError> {
        if self.rejected_names.contains(&place.name) {
            return Err(StoreError::Server {
                status: 409,
                body: "conflict".into(),
            });
        }
        self.inserted.lock().unwrap().push(place.clone());
        Ok(())
    }
}
