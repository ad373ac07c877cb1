//! Typed client for the booking backend's REST API.

mod client;
/// Request and response shapes for each endpoint.
pub mod types;

pub use client::ApiClient;
pub use types::{HotelRegistration, SignupForm, UserDetails};
