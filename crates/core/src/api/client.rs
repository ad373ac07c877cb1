use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::{
    config::AppConfig,
    error::ApiError,
    models::{Booking, DashboardSummary, RoomRecord},
};

use super::types::{
    Acknowledged, AvailabilityRequest, AvailabilityResponse, BookRequest, BookingsResponse,
    DashboardResponse, ErrorBody, HotelRegistration, MessageResponse, PaymentRequest,
    PaymentResponse, RoomsResponse, SignInRequest, SignInResponse, SignupForm,
    ToggleAvailabilityRequest, UserDetails, UserDetailsResponse,
};

const SIGN_IN: &str = "/api/user/sign-in";
const USER_DETAILS: &str = "/api/user/user-details";
const SIGN_UP: &str = "/api/user/sign-up";
const SIGN_OUT: &str = "/api/user/sign-out";
const ROOMS: &str = "/api/rooms";
const OWNER_ROOMS: &str = "/api/rooms/owner";
const TOGGLE_AVAILABILITY: &str = "/api/rooms/toggle-availability";
const CHECK_AVAILABILITY: &str = "/api/bookings/check-availability";
const BOOK: &str = "/api/bookings/book";
const USER_BOOKINGS: &str = "/api/bookings/user";
const HOTEL_BOOKINGS: &str = "/api/bookings/hotel";
const STRIPE_PAYMENT: &str = "/api/bookings/stripe-payment";
const HOTELS: &str = "/api/hotels/";

/// HTTP client for the booking backend.
///
/// Clones share the same token slot. Every request reads the slot at send
/// time and attaches `Authorization: Bearer <token>` when it is set, so a
/// token change is visible to all holders immediately.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Build a client for the configured backend.
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ApiError::Network)?;
        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Replace the bearer token attached to outgoing requests.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    /// Current bearer token.
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Exchange credentials for a bearer token.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let body: SignInResponse = self
            .send(self.request(Method::POST, SIGN_IN).json(&SignInRequest { email, password }))
            .await?;
        let body = body.accepted("Login failed. Please try again.")?;
        body.token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::Decode("sign-in response carried no token".to_string()))
    }

    /// Fetch the profile for the token in the slot.
    pub async fn user_details(&self) -> Result<UserDetails, ApiError> {
        self.fetch_user_details(self.request(Method::GET, USER_DETAILS))
            .await
    }

    /// Fetch the profile for an explicit token without touching the slot.
    pub async fn user_details_with(&self, token: &str) -> Result<UserDetails, ApiError> {
        let builder = self
            .http
            .get(self.url(USER_DETAILS))
            .bearer_auth(token);
        self.fetch_user_details(builder).await
    }

    async fn fetch_user_details(&self, builder: RequestBuilder) -> Result<UserDetails, ApiError> {
        let body: UserDetailsResponse = self.send(builder).await?;
        let data = body.user_data.ok_or_else(|| {
            ApiError::Decode(
                body.message
                    .unwrap_or_else(|| "user-details response carried no userData".to_string()),
            )
        })?;
        Ok(UserDetails {
            profile: data.profile,
            access_token: data.access_token.filter(|token| !token.is_empty()),
        })
    }

    /// Create an account. Does not sign in.
    pub async fn sign_up(&self, form: &SignupForm) -> Result<Option<String>, ApiError> {
        let body: MessageResponse = self
            .send(self.request(Method::POST, SIGN_UP).json(form))
            .await?;
        Ok(body.accepted("Signup failed. Please try again.")?.message)
    }

    /// Tell the backend a token is being discarded. The response body is ignored.
    pub async fn sign_out(&self, token: &str) -> Result<(), ApiError> {
        self.http
            .post(self.url(SIGN_OUT))
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(ApiError::Network)?;
        Ok(())
    }

    /// Public room catalog.
    pub async fn rooms(&self) -> Result<Vec<RoomRecord>, ApiError> {
        let body: RoomsResponse = self.send(self.request(Method::GET, ROOMS)).await?;
        Ok(body
            .accepted("Failed to load rooms")?
            .into_rooms())
    }

    /// Rooms belonging to the signed-in owner.
    pub async fn owner_rooms(&self) -> Result<Vec<RoomRecord>, ApiError> {
        let body: RoomsResponse = self.send(self.request(Method::GET, OWNER_ROOMS)).await?;
        Ok(body
            .accepted("Failed to load your rooms")?
            .into_rooms())
    }

    /// Flip a room between listed and unlisted.
    pub async fn toggle_availability(&self, room_id: &str) -> Result<Option<String>, ApiError> {
        self.post_for_message(
            TOGGLE_AVAILABILITY,
            &ToggleAvailabilityRequest { room_id },
            "Failed to update room availability",
        )
        .await
    }

    /// Ask the backend whether a room is free for a date range.
    pub async fn check_availability(
        &self,
        request: &AvailabilityRequest<'_>,
    ) -> Result<AvailabilityResponse, ApiError> {
        self.send(self.request(Method::POST, CHECK_AVAILABILITY).json(request))
            .await
    }

    /// Place a booking.
    pub async fn book(&self, request: &BookRequest<'_>) -> Result<Option<String>, ApiError> {
        self.post_for_message(BOOK, request, "Booking failed").await
    }

    /// Bookings made by the signed-in user.
    pub async fn user_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        let body: BookingsResponse = self.send(self.request(Method::GET, USER_BOOKINGS)).await?;
        Ok(body
            .accepted("Failed to load bookings")?
            .into_bookings())
    }

    /// Bookings and totals for the signed-in owner's hotel.
    pub async fn hotel_bookings(&self) -> Result<DashboardSummary, ApiError> {
        let body: DashboardResponse = self.send(self.request(Method::GET, HOTEL_BOOKINGS)).await?;
        Ok(body
            .accepted("Failed to fetch dashboard data")?
            .into_summary())
    }

    /// Start a card payment and return the checkout URL.
    pub async fn stripe_payment(&self, booking_id: &str) -> Result<String, ApiError> {
        let body: PaymentResponse = self
            .send(
                self.request(Method::POST, STRIPE_PAYMENT)
                    .json(&PaymentRequest { booking_id }),
            )
            .await?;
        body.accepted("Payment could not be started")?
            .url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::Decode("payment response carried no url".to_string()))
    }

    /// Register a hotel for the signed-in user.
    pub async fn register_hotel(
        &self,
        registration: &HotelRegistration,
    ) -> Result<Option<String>, ApiError> {
        self.post_for_message(HOTELS, registration, "Hotel registration failed")
            .await
    }

    async fn post_for_message<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<Option<String>, ApiError> {
        let response: MessageResponse = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        Ok(response.accepted(fallback)?.message)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.token.read().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(ApiError::Network)?;
        let status = response.status();
        debug!(url = %response.url().path(), status = status.as_u16(), "backend response");
        if !status.is_success() {
            return Err(classify(status, response).await);
        }
        let bytes = response.bytes().await.map_err(ApiError::Network)?;
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

async fn classify(status: StatusCode, response: Response) -> ApiError {
    let body = match response.bytes().await {
        Ok(bytes) => serde_json::from_slice::<ErrorBody>(&bytes).unwrap_or_default(),
        Err(err) => {
            warn!(?err, "failed to read error body");
            ErrorBody::default()
        }
    };
    error_from_parts(status, body)
}

fn error_from_parts(status: StatusCode, body: ErrorBody) -> ApiError {
    let message = body.message.filter(|message| !message.trim().is_empty());
    let fields = body
        .errors
        .map(|errors| errors.into_field_errors())
        .unwrap_or_default();

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY if !fields.is_empty() => {
            ApiError::Validation {
                message: message.unwrap_or_else(|| "Please check the highlighted fields.".to_string()),
                fields,
            }
        }
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized { message },
        StatusCode::NOT_FOUND => ApiError::NotFound { message },
        status if status.is_server_error() => ApiError::Server {
            status: status.as_u16(),
            message,
        },
        status => ApiError::Rejected {
            status: Some(status.as_u16()),
            message: message.unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            }),
        },
    }
}
