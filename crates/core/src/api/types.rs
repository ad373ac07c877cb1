#![allow(missing_docs)]

//! Request bodies and narrowed response shapes, one per endpoint.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{
    error::{ApiError, FieldErrors},
    models::{Booking, DashboardSummary, RoomRecord, UserProfile},
};

/// Responses carrying the backend's `success`/`message` acknowledgement.
pub(crate) trait Acknowledged {
    fn success(&self) -> bool;
    fn message(&self) -> Option<&str>;

    /// Turn `success: false` into [`ApiError::Rejected`].
    fn accepted(self, fallback: &str) -> Result<Self, ApiError>
    where
        Self: Sized,
    {
        if self.success() {
            Ok(self)
        } else {
            Err(ApiError::Rejected {
                status: None,
                message: self
                    .message()
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or(fallback)
                    .to_string(),
            })
        }
    }
}

macro_rules! acknowledged {
    ($($name:ident),+ $(,)?) => {
        $(
            impl Acknowledged for $name {
                fn success(&self) -> bool {
                    self.success
                }

                fn message(&self) -> Option<&str> {
                    self.message.as_deref()
                }
            }
        )+
    };
}

#[derive(Debug, Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SignInResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `userData` as sent by `user-details`, tokens still attached.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailsResponse {
    #[serde(default)]
    pub user_data: Option<UserData>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Profile fetched from `user-details` with the credentials split off.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDetails {
    pub profile: UserProfile,
    /// Replacement bearer token issued by the backend, if any.
    pub access_token: Option<String>,
}

/// Fields submitted on account creation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    /// Local completeness check before anything is sent.
    pub fn missing_fields(&self) -> FieldErrors {
        let mut missing = FieldErrors::new();
        for (field, value) in [
            ("username", &self.username),
            ("email", &self.email),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                missing.insert(field.to_string(), "This field is required".to_string());
            }
        }
        missing
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoomsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub rooms: Option<Vec<Value>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RoomsResponse {
    pub fn into_rooms(self) -> Vec<RoomRecord> {
        decode_records("room", self.rooms)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleAvailabilityRequest<'a> {
    pub room_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest<'a> {
    pub room: &'a str,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest<'a> {
    pub room: &'a str,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub guests: u32,
    pub payment_method: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct BookingsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub bookings: Option<Vec<Value>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl BookingsResponse {
    pub fn into_bookings(self) -> Vec<Booking> {
        decode_records("booking", self.bookings)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub bookings: Option<Vec<Value>>,
    #[serde(default)]
    pub total_bookings: Option<Value>,
    #[serde(default)]
    pub total_revenue: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl DashboardResponse {
    /// Missing or non-numeric totals count as zero.
    pub fn into_summary(self) -> DashboardSummary {
        DashboardSummary {
            bookings: decode_records("booking", self.bookings),
            total_bookings: lenient_number(self.total_bookings.as_ref())
                .map(|value| value.max(0.0) as u64)
                .unwrap_or(0),
            total_revenue: lenient_number(self.total_revenue.as_ref()).unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest<'a> {
    pub booking_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct PaymentResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Details submitted when a user registers a hotel.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct HotelRegistration {
    pub name: String,
    pub contact: String,
    pub address: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl HotelRegistration {
    /// Names of required fields left blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("contact", &self.contact),
            ("address", &self.address),
            ("city", &self.city),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

acknowledged!(
    SignInResponse,
    MessageResponse,
    RoomsResponse,
    AvailabilityResponse,
    BookingsResponse,
    DashboardResponse,
    PaymentResponse,
);

/// Decode each record on its own; malformed entries are logged and skipped.
pub(crate) fn decode_records<T: DeserializeOwned>(
    kind: &str,
    values: Option<Vec<Value>>,
) -> Vec<T> {
    values
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(kind, index, error = %err, "dropping malformed record");
                None
            }
        })
        .collect()
}

/// Body of a non-2xx response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<RawFieldErrors>,
}

/// Validation errors arrive either keyed by field or as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawFieldErrors {
    Keyed(BTreeMap<String, Value>),
    Listed(Vec<RawFieldError>),
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawFieldError {
    #[serde(alias = "param", alias = "field", default)]
    path: Option<String>,
    #[serde(alias = "message", default)]
    msg: Option<String>,
}

impl RawFieldErrors {
    pub fn into_field_errors(self) -> FieldErrors {
        match self {
            RawFieldErrors::Keyed(map) => map
                .into_iter()
                .filter_map(|(field, value)| value_message(&value).map(|message| (field, message)))
                .collect(),
            RawFieldErrors::Listed(items) => items
                .into_iter()
                .filter_map(|item| {
                    let message = item.msg?;
                    Some((item.path.unwrap_or_else(|| "form".to_string()), message))
                })
                .collect(),
        }
    }
}

fn value_message(value: &Value) -> Option<String> {
    match value {
        Value::String(message) => Some(message.clone()),
        Value::Array(items) => items.iter().find_map(value_message),
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("msg"))
            .and_then(value_message),
        _ => None,
    }
}

fn lenient_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}
