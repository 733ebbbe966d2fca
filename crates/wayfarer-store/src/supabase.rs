//! PostgREST client for the Supabase project.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, info};
use wayfarer_core::{Blog, BlogId, NewPlace, Review};

use crate::{PlaceStore, StoreError};

const BLOGS_TABLE: &str = "blogs";
const REVIEWS_TABLE: &str = "blog_reviews";
const PLACES_TABLE: &str = "popular_places";

/// Supabase REST store.
///
/// Every request carries the project key both as `apikey` and as a bearer
/// token, which is what PostgREST behind Supabase expects for anon keys.
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
}

impl SupabaseStore {
    /// Create a store client for a project URL like
    /// `https://xyzcompany.supabase.co` (no trailing slash needed).
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StoreError::Other("empty Supabase URL".into()));
        }

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(api_key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {api_key}"))?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

fn header_value(s: &str) -> Result<HeaderValue, StoreError> {
    HeaderValue::from_str(s)
        .map_err(|_| StoreError::Other("API key is not a valid header value".into()))
}

/// PostgREST equality filter for a blog id.
fn eq_filter(blog_id: &BlogId) -> String {
    format!("eq.{blog_id}")
}

async fn server_error(resp: reqwest::Response) -> StoreError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    StoreError::Server { status, body }
}

#[async_trait]
impl PlaceStore for SupabaseStore {
    async fn list_blogs(&self) -> Result<Vec<Blog>, StoreError> {
        let url = self.table_url(BLOGS_TABLE);
        debug!(url = %url, "listing blogs");

        let resp = self
            .client
            .get(&url)
            .query(&[("select", "*")])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(server_error(resp).await);
        }

        let blogs: Vec<Blog> = serde_json::from_str(&resp.text().await?)?;
        info!(count = blogs.len(), "fetched blogs");
        Ok(blogs)
    }

    async fn fetch_reviews(&self, blog_id: &BlogId) -> Result<Vec<Review>, StoreError> {
        let url = self.table_url(REVIEWS_TABLE);
        debug!(url = %url, blog_id = %blog_id, "fetching reviews");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("blog_id", eq_filter(blog_id).as_str()),
                ("select", "text,rating"),
            ])
            .send()
            .await?;
        if resp.status() != StatusCode::OK {
            return Err(server_error(resp).await);
        }

        let reviews: Vec<Review> = serde_json::from_str(&resp.text().await?)?;
        debug!(blog_id = %blog_id, count = reviews.len(), "fetched reviews");
        Ok(reviews)
    }

    async fn insert_place(&self, place: &NewPlace) -> Result<(), StoreError> {
        let url = self.table_url(PLACES_TABLE);
        debug!(url = %url, name = %place.name, "inserting place");

        let resp = self
            .client
            .post(&url)
            .header("Prefer", "return=minimal")
            .json(place)
            .send()
            .await?;
        if resp.status() != StatusCode::CREATED {
            return Err(server_error(resp).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wayfarer_core::{Coordinates, RowId};

    #[test]
    fn trims_trailing_slash() {
        let store = SupabaseStore::new("https://abc.supabase.co/", "key").unwrap();
        assert_eq!(store.base_url, "https://abc.supabase.co");
    }

    #[test]
    fn table_urls() {
        let store = SupabaseStore::new("https://abc.supabase.co", "key").unwrap();
        assert_eq!(
            store.table_url(REVIEWS_TABLE),
            "https://abc.supabase.co/rest/v1/blog_reviews"
        );
        assert_eq!(
            store.table_url(PLACES_TABLE),
            "https://abc.supabase.co/rest/v1/popular_places"
        );
    }

    #[test]
    fn rejects_empty_url() {
        assert!(matches!(
            SupabaseStore::new("/", "key"),
            Err(StoreError::Other(_))
        ));
    }

    #[test]
    fn rejects_key_with_control_characters() {
        assert!(matches!(
            SupabaseStore::new("https://abc.supabase.co", "bad\nkey"),
            Err(StoreError::Other(_))
        ));
    }

    #[test]
    fn equality_filters() {
        assert_eq!(eq_filter(&RowId::Int(12)), "eq.12");
        assert_eq!(
            eq_filter(&RowId::from("5c0e7d1a-0000-4000-8000-000000000001")),
            "eq.5c0e7d1a-0000-4000-8000-000000000001"
        );
    }

    #[test]
    fn blogs_payload_parses() {
        let body = r#"[
            {"id": 1, "content": "I visited Paris.", "title": "France", "user_id": "u1"},
            {"id": 2, "content": null, "created_at": "2025-03-18T10:00:00+00:00"}
        ]"#;
        let blogs: Vec<Blog> = serde_json::from_str(body).unwrap();
        assert_eq!(blogs.len(), 2);
        assert_eq!(blogs[0].id, RowId::Int(1));
        assert_eq!(blogs[1].content, "");
    }

    #[test]
    fn insert_body_serializes() {
        let place = NewPlace::discovered(
            "Eiffel Tower",
            Coordinates::new(48.8584, 2.2945).unwrap(),
            1.5,
            RowId::Int(1),
            Utc::now(),
        );
        let json = serde_json::to_value(&place).unwrap();
        assert_eq!(json["blog_ids"], serde_json::json!([1]));
        assert_eq!(json["category_guess"], "Unknown");
        assert!(json["added_at"].is_string());
    }

    #[tokio::test]
    async fn transport_failure_is_http_error() {
        // Port 9 (discard) is not listening on loopback.
        let store = SupabaseStore::new("http://127.0.0.1:9", "key").unwrap();
        let err = store.list_blogs().await.unwrap_err();
        assert!(matches!(err, StoreError::Http(_)), "got {err:?}");
    }
}
