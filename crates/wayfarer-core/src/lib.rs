pub mod normalize;
pub mod place;

pub use normalize::{MIN_PLACE_NAME_LEN, is_valid, normalize};
pub use place::{
    Blog, BlogId, CoordinateError, Coordinates, DEFAULT_CATEGORY_GUESS, EntityCategory, NewPlace,
    PlaceCandidate, RawEntity, Review, RowId,
};
