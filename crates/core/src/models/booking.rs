#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, HotelSummary};

/// A relation the backend may return either populated or as a bare id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference<T> {
    Populated(T),
    Id(String),
}

impl<T> Reference<T> {
    pub fn populated(&self) -> Option<&T> {
        match self {
            Reference::Populated(value) => Some(value),
            Reference::Id(_) => None,
        }
    }
}

/// Room details embedded in a booking.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedRoom {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub room_type: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub hotel: Option<HotelSummary>,
}

/// Guest details embedded in owner-side bookings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BookingGuest {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(alias = "name", default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// A reservation as listed for a guest or a hotel owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub room: Reference<BookedRoom>,
    #[serde(default)]
    pub user: Option<Reference<BookingGuest>>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub check_in_date: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub check_out_date: DateTime<Utc>,
    #[serde(default = "default_guests")]
    pub guests: u32,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub payment_method: String,
}

fn default_guests() -> u32 {
    1
}

impl Booking {
    /// Label combining hotel name and room type, falling back to the room id.
    pub fn title(&self) -> String {
        match &self.room {
            Reference::Populated(room) => match &room.hotel {
                Some(hotel) => format!("{} ({})", hotel.name, room.room_type),
                None => room.room_type.clone(),
            },
            Reference::Id(id) => id.clone(),
        }
    }

    /// Name of the guest who made the booking, when populated.
    pub fn guest_name(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(Reference::populated)
            .map(|guest| guest.username.as_str())
    }

    pub fn payment_label(&self) -> &'static str {
        if self.is_paid {
            "Paid"
        } else {
            "Pending"
        }
    }
}

/// Aggregates shown on the owner dashboard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub bookings: Vec<Booking>,
    pub total_bookings: u64,
    pub total_revenue: f64,
}
