use std::{cmp::Ordering, collections::BTreeSet, fmt, str::FromStr};

use anyhow::{anyhow, Error};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::RoomRecord;

/// Room types offered as filters.
pub const ROOM_TYPES: [&str; 4] = ["Single Bed", "Double Bed", "Family Room", "Luxury Suite"];

/// Price brackets offered as filters.
pub const PRICE_RANGES: [PriceRange; 6] = [
    PriceRange::new(0.0, 100.0),
    PriceRange::new(500.0, 1000.0),
    PriceRange::new(1000.0, 2000.0),
    PriceRange::new(2000.0, 5000.0),
    PriceRange::new(5000.0, 10000.0),
    PriceRange::new(10000.0, 20000.0),
];

static PRICE_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*\D?\s*(\d+(?:\.\d+)?)\s*to\s*(\d+(?:\.\d+)?)\s*$")
        .expect("failed to compile price range regex")
});

/// Inclusive nightly price bracket, labelled `"<min> To <max>"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    /// Lowest accepted price.
    pub min: f64,
    /// Highest accepted price.
    pub max: f64,
}

impl PriceRange {
    /// Bracket from `min` to `max`, both inclusive.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `price` lies inside the bracket.
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} To {}", self.min, self.max)
    }
}

impl FromStr for PriceRange {
    type Err = Error;

    /// Accepts the label form, optionally prefixed by a currency symbol.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let captures = PRICE_RANGE_RE
            .captures(raw)
            .ok_or_else(|| anyhow!("invalid price range '{raw}'"))?;
        let min: f64 = captures[1].parse()?;
        let max: f64 = captures[2].parse()?;
        if min > max {
            return Err(anyhow!("price range '{raw}' has min above max"));
        }
        Ok(Self::new(min, max))
    }
}

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Keep the order the backend returned.
    #[default]
    None,
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
    /// Most recently listed first.
    NewestFirst,
    /// Earliest listed first.
    OldestFirst,
}

impl SortKey {
    /// Every key, in the order a selector cycles through them.
    pub const ALL: [SortKey; 5] = [
        SortKey::None,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::NewestFirst,
        SortKey::OldestFirst,
    ];

    /// Label shown in the sort selector; `None` has none.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            SortKey::None => None,
            SortKey::PriceAsc => Some("Price Low To High"),
            SortKey::PriceDesc => Some("Price High To Low"),
            SortKey::NewestFirst => Some("Newest First"),
            SortKey::OldestFirst => Some("Oldest First"),
        }
    }

    /// The key after this one, wrapping around.
    pub fn next(&self) -> SortKey {
        let index = Self::ALL.iter().position(|key| key == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    fn compare(&self, a: &RoomRecord, b: &RoomRecord) -> Ordering {
        match self {
            SortKey::None => Ordering::Equal,
            SortKey::PriceAsc => a.price_per_night.total_cmp(&b.price_per_night),
            SortKey::PriceDesc => b.price_per_night.total_cmp(&a.price_per_night),
            SortKey::NewestFirst => b.created_at.cmp(&a.created_at),
            SortKey::OldestFirst => a.created_at.cmp(&b.created_at),
        }
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(SortKey::None);
        }
        SortKey::ALL
            .into_iter()
            .find(|key| key.label().is_some_and(|label| label.eq_ignore_ascii_case(raw)))
            .ok_or_else(|| anyhow!("unknown sort option '{raw}'"))
    }
}

/// Selected filters. An empty category restricts nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    /// Accepted room types.
    pub room_types: BTreeSet<String>,
    /// Accepted price brackets; a room must fall in at least one.
    pub price_ranges: Vec<PriceRange>,
}

impl FilterState {
    /// Whether the room type is accepted.
    pub fn accepts_room_type(&self, room: &RoomRecord) -> bool {
        self.room_types.is_empty() || self.room_types.contains(&room.room_type)
    }

    /// Whether the nightly price falls in any selected bracket.
    pub fn accepts_price(&self, room: &RoomRecord) -> bool {
        self.price_ranges.is_empty()
            || self
                .price_ranges
                .iter()
                .any(|range| range.contains(room.price_per_night))
    }

    /// No category restricts anything.
    pub fn is_empty(&self) -> bool {
        self.room_types.is_empty() && self.price_ranges.is_empty()
    }
}

/// Destination search, filters and sort order, as chosen on the listing page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomQuery {
    /// Substring matched against the hotel city, ignoring case.
    pub destination: Option<String>,
    /// Category filters.
    pub filters: FilterState,
    /// Result order.
    pub sort: SortKey,
}

impl RoomQuery {
    /// Set or clear the destination search.
    pub fn set_destination(&mut self, destination: impl Into<String>) {
        let destination = destination.into();
        self.destination = if destination.trim().is_empty() {
            None
        } else {
            Some(destination)
        };
    }

    /// Select or deselect a room type; returns whether it is now selected.
    pub fn toggle_room_type(&mut self, room_type: &str) -> bool {
        if self.filters.room_types.remove(room_type) {
            false
        } else {
            self.filters.room_types.insert(room_type.to_string());
            true
        }
    }

    /// Select or deselect a price bracket; returns whether it is now selected.
    pub fn toggle_price_range(&mut self, range: PriceRange) -> bool {
        let before = self.filters.price_ranges.len();
        self.filters.price_ranges.retain(|selected| *selected != range);
        if self.filters.price_ranges.len() == before {
            self.filters.price_ranges.push(range);
            true
        } else {
            false
        }
    }

    /// Choose the sort order.
    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    /// Reset search, filters and sort.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Rooms matching the query, in display order.
    pub fn apply(&self, rooms: &[RoomRecord]) -> Vec<RoomRecord> {
        query_rooms(rooms, self.destination.as_deref(), &self.filters, self.sort)
    }
}

/// Filter then stably sort `rooms`.
///
/// A room is kept when it matches the destination AND the room-type filter
/// AND the price filter. Ties keep their input order.
pub fn query_rooms(
    rooms: &[RoomRecord],
    destination: Option<&str>,
    filters: &FilterState,
    sort: SortKey,
) -> Vec<RoomRecord> {
    let needle = destination
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty());

    let mut matched: Vec<RoomRecord> = rooms
        .iter()
        .filter(|room| match &needle {
            Some(needle) => room.city().to_lowercase().contains(needle),
            None => true,
        })
        .filter(|room| filters.accepts_room_type(room) && filters.accepts_price(room))
        .cloned()
        .collect();

    if sort != SortKey::None {
        matched.sort_by(|a, b| sort.compare(a, b));
    }
    matched
}
