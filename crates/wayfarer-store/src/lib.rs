//! Storage layer: the shared Supabase project holding blogs, their reviews,
//! and the `popular_places` table this pipeline appends to.

mod error;
mod supabase;

pub use error::StoreError;
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use wayfarer_core::{Blog, BlogId, NewPlace, Review};

/// Read blogs and reviews, append discovered places.
///
/// The pipeline only ever creates rows; it never updates or deletes them.
#[async_trait]
pub trait PlaceStore: Send + Sync {
    /// Every blog currently in the store, in store order.
    async fn list_blogs(&self) -> Result<Vec<Blog>, StoreError>;

    /// Reviews attached to one blog. An empty vector means the blog has no
    /// reviews; an error means they could not be read.
    async fn fetch_reviews(&self, blog_id: &BlogId) -> Result<Vec<Review>, StoreError>;

    /// Insert one discovered place.
    async fn insert_place(&self, place: &NewPlace) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: PlaceStore + ?Sized> PlaceStore for Box<T> {
    async fn list_blogs(&self) -> Result<Vec<Blog>, StoreError> {
        (**self).list_blogs().await
    }

    async fn fetch_reviews(&self, blog_id: &BlogId) -> Result<Vec<Review>, StoreError> {
        (**self).fetch_reviews(blog_id).await
    }

    async fn insert_place(&self, place: &NewPlace) -> Result<(), StoreError> {
        (**self).insert_place(place).await
    }
}
