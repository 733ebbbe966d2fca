//! Shared place-discovery types exchanged between the store, the
//! recognizer, the geocoder and the pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::normalize;

/// Category written to every newly discovered place.
pub const DEFAULT_CATEGORY_GUESS: &str = "Unknown";

/// Primary key of a store row.
///
/// The store hands out integer keys for some tables and UUIDs for others;
/// both round-trip to the same JSON shape they arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

pub type BlogId = RowId;

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RowId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A blog post as read from the `blogs` table. Other columns are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    pub id: BlogId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

/// A review attached to a blog, from the `blog_reviews` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    /// Explicit rating on a 0–5 scale.
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,
}

/// Entity group assigned by the recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityCategory {
    Location,
    Person,
    Organization,
    Misc,
    Other(String),
}

impl EntityCategory {
    /// Parse a recognizer group label. Accepts both the CoNLL short forms
    /// (`LOC`, `PER`, `ORG`) and spelled-out forms (`LOCATION`, ...).
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "LOC" | "LOCATION" => Self::Location,
            "PER" | "PERSON" => Self::Person,
            "ORG" | "ORGANIZATION" => Self::Organization,
            "MISC" => Self::Misc,
            _ => Self::Other(label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Location => "LOC",
            Self::Person => "PER",
            Self::Organization => "ORG",
            Self::Misc => "MISC",
            Self::Other(s) => s,
        }
    }

    pub fn is_location(&self) -> bool {
        matches!(self, Self::Location)
    }
}

impl From<String> for EntityCategory {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<EntityCategory> for String {
    fn from(c: EntityCategory) -> Self {
        c.as_str().to_string()
    }
}

/// One grouped span from the entity recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    pub text: String,
    pub category: EntityCategory,
    /// Mean token confidence for the span.
    pub score: f32,
}

impl RawEntity {
    pub fn new(text: impl Into<String>, category: EntityCategory, score: f32) -> Self {
        Self {
            text: text.into(),
            category,
            score,
        }
    }
}

/// A cleaned place name, not yet known to be valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceCandidate {
    pub name: String,
}

impl PlaceCandidate {
    /// Clean raw recognizer text into a candidate.
    pub fn from_raw(raw: &str) -> Self {
        Self {
            name: normalize::normalize(raw),
        }
    }

    pub fn is_valid(&self) -> bool {
        normalize::is_valid(&self.name)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} outside [-180, 180]")]
    Longitude(f64),
}

/// A resolved WGS84 position. `(0.0, 0.0)` is a legitimate value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build a position, rejecting out-of-range or non-finite values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Insert body for the `popular_places` table.
///
/// One row per (place, blog) occurrence; rows are never merged, so the same
/// name discovered twice yields two rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlace {
    pub name: String,
    pub lat: f64,
    pub long: f64,
    pub popularity_score: f64,
    pub blog_ids: Vec<BlogId>,
    pub review_ids: Vec<RowId>,
    pub category_guess: String,
    pub added_at: DateTime<Utc>,
}

impl NewPlace {
    /// A freshly discovered place referenced by a single blog.
    pub fn discovered(
        name: impl Into<String>,
        at: Coordinates,
        popularity_score: f64,
        blog_id: BlogId,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            lat: at.latitude,
            long: at.longitude,
            popularity_score,
            blog_ids: vec![blog_id],
            review_ids: Vec::new(),
            category_guess: DEFAULT_CATEGORY_GUESS.to_string(),
            added_at,
        }
    }
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
