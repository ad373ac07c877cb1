#![allow(missing_docs)]

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// Hotel data embedded in each room record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HotelSummary {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// A bookable room as listed by `/api/rooms`.
///
/// Records are immutable snapshots; the backend owns the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub hotel: HotelSummary,
    pub room_type: String,
    pub price_per_night: f64,
    #[serde(default)]
    pub amenities: BTreeSet<String>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

fn default_available() -> bool {
    true
}

impl RoomRecord {
    pub fn hotel_name(&self) -> &str {
        &self.hotel.name
    }

    pub fn city(&self) -> &str {
        &self.hotel.city
    }

    pub fn address(&self) -> &str {
        &self.hotel.address
    }

    /// First image, used as the listing thumbnail.
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_backend_room_payload() {
        let room: RoomRecord = serde_json::from_value(json!({
            "_id": "r1",
            "hotel": { "_id": "h1", "name": "Sea Breeze", "city": "Goa", "address": "Beach Rd" },
            "roomType": "Double Bed",
            "pricePerNight": 250,
            "amenities": ["Free WiFi", "Pool Access", "Free WiFi"],
            "images": ["a.jpg", "b.jpg"],
            "createdAt": "2024-06-01T09:30:00.000Z"
        }))
        .expect("room should decode");

        assert_eq!(room.city(), "Goa");
        assert_eq!(room.hotel_name(), "Sea Breeze");
        assert_eq!(room.price_per_night, 250.0);
        assert_eq!(room.amenities.len(), 2);
        assert_eq!(room.cover_image(), Some("a.jpg"));
        assert!(room.is_available);
    }
}
