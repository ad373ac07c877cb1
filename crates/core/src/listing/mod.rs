//! Room search, filtering and sorting for the listing page.

mod query;

pub use query::{
    query_rooms, FilterState, PriceRange, RoomQuery, SortKey, PRICE_RANGES, ROOM_TYPES,
};
