//! In-process stub of the booking backend.

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use staybook_core::AppConfig;
use tokio::{net::TcpListener, task::JoinHandle};

pub const GUEST_TOKEN: &str = "guest-token";
pub const OWNER_TOKEN: &str = "owner-token";
pub const EXPIRED_TOKEN: &str = "expired-token";
/// Accepted by `user-details` only, which answers with [`ROTATED_TOKEN`].
pub const STALE_TOKEN: &str = "stale-token";
pub const ROTATED_TOKEN: &str = "rotated-token";
pub const GUEST_EMAIL: &str = "ana@example.com";
pub const OWNER_EMAIL: &str = "olu@example.com";
pub const PASSWORD: &str = "secret";

type Reply = (StatusCode, Json<Value>);

#[derive(Default)]
pub struct Calls {
    pub sign_out: AtomicUsize,
    pub bookings: AtomicUsize,
}

impl Calls {
    pub fn sign_outs(&self) -> usize {
        self.sign_out.load(Ordering::SeqCst)
    }

    pub fn bookings(&self) -> usize {
        self.bookings.load(Ordering::SeqCst)
    }
}

pub struct StubBackend {
    pub base_url: String,
    pub calls: Arc<Calls>,
    handle: JoinHandle<()>,
}

impl StubBackend {
    pub async fn start() -> Self {
        let calls = Arc::new(Calls::default());
        let app = Router::new()
            .route("/api/user/sign-in", post(sign_in))
            .route("/api/user/user-details", get(user_details))
            .route("/api/user/sign-up", post(sign_up))
            .route("/api/user/sign-out", post(sign_out))
            .route("/api/rooms", get(rooms))
            .route("/api/rooms/owner", get(owner_rooms))
            .route("/api/rooms/toggle-availability", post(toggle_availability))
            .route("/api/bookings/check-availability", post(check_availability))
            .route("/api/bookings/book", post(book))
            .route("/api/bookings/user", get(user_bookings))
            .route("/api/bookings/hotel", get(hotel_bookings))
            .route("/api/bookings/stripe-payment", post(stripe_payment))
            .route("/api/hotels/", post(register_hotel))
            .with_state(calls.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server");
        });

        Self {
            base_url: format!("http://{addr}"),
            calls,
            handle,
        }
    }

    pub fn config(&self) -> AppConfig {
        AppConfig {
            backend_url: self.base_url.clone(),
            request_timeout_secs: 5,
            ..AppConfig::default()
        }
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn ok(body: Value) -> Reply {
    (StatusCode::OK, Json(body))
}

fn unauthorized() -> Reply {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": "Not authorized, token failed" })),
    )
}

fn role_for(headers: &HeaderMap) -> Option<&'static str> {
    match bearer(headers) {
        Some(GUEST_TOKEN | ROTATED_TOKEN) => Some("guest"),
        Some(OWNER_TOKEN) => Some("hotelOwner"),
        _ => None,
    }
}

async fn sign_in(Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match (email, password) {
        (GUEST_EMAIL, PASSWORD) => ok(json!({ "success": true, "token": GUEST_TOKEN })),
        (OWNER_EMAIL, PASSWORD) => ok(json!({ "success": true, "token": OWNER_TOKEN })),
        ("ghost@example.com", _) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "User not found" })),
        ),
        ("boom@example.com", _) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false })),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid credentials" })),
        ),
    }
}

async fn user_details(headers: HeaderMap) -> Reply {
    let (role, access_token) = match bearer(&headers) {
        Some(STALE_TOKEN) => ("guest", Some(ROTATED_TOKEN)),
        token => match role_for(&headers) {
            Some(role) => (role, token),
            None => return unauthorized(),
        },
    };
    let (id, name, email) = if role == "hotelOwner" {
        ("u2", "Olu", OWNER_EMAIL)
    } else {
        ("u1", "Ana", GUEST_EMAIL)
    };
    ok(json!({
        "userData": {
            "_id": id,
            "username": name,
            "email": email,
            "role": role,
            "accessToken": access_token,
            "refreshToken": "refresh"
        }
    }))
}

async fn sign_up(Json(body): Json<Value>) -> Reply {
    if body["email"] == GUEST_EMAIL {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "message": "Validation failed",
                "errors": { "email": "Email already exists" }
            })),
        );
    }
    ok(json!({ "success": true, "message": "User created successfully" }))
}

async fn sign_out(State(calls): State<Arc<Calls>>) -> Reply {
    calls.sign_out.fetch_add(1, Ordering::SeqCst);
    ok(json!({ "success": true }))
}

/// The last room has no `createdAt` and a bare hotel id, so clients drop it.
pub fn room_fixtures() -> Value {
    json!([
        {
            "_id": "room1",
            "hotel": { "_id": "h1", "name": "Palm Stay", "city": "Goa", "address": "Beach Rd" },
            "roomType": "Single Bed",
            "pricePerNight": 80,
            "amenities": ["Free WiFi"],
            "images": ["palm.jpg"],
            "isAvailable": true,
            "createdAt": "2024-01-01"
        },
        {
            "_id": "room2",
            "hotel": { "_id": "h1", "name": "Palm Stay", "city": "Goa", "address": "Beach Rd" },
            "roomType": "Luxury Suite",
            "pricePerNight": 1500,
            "amenities": ["Pool Access", "Room Service"],
            "images": [],
            "isAvailable": true,
            "createdAt": "2024-06-01"
        },
        {
            "_id": "room3",
            "hotel": { "_id": "h2", "name": "Harbour View", "city": "Mumbai", "address": "Marine Dr" },
            "roomType": "Double Bed",
            "pricePerNight": 650,
            "createdAt": "2024-03-10T12:00:00.000Z"
        },
        {
            "_id": "room4",
            "hotel": "h3",
            "roomType": "Family Room",
            "pricePerNight": 300
        }
    ])
}

async fn rooms() -> Reply {
    ok(json!({ "success": true, "rooms": room_fixtures() }))
}

async fn owner_rooms(headers: HeaderMap) -> Reply {
    match role_for(&headers) {
        Some(_) => ok(json!({ "success": true, "rooms": room_fixtures() })),
        None => unauthorized(),
    }
}

async fn toggle_availability(headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    if role_for(&headers).is_none() {
        return unauthorized();
    }
    match body["roomId"].as_str() {
        Some(_) => ok(json!({ "success": true, "message": "Room availability Updated" })),
        None => ok(json!({ "success": false, "message": "roomId is required" })),
    }
}

async fn check_availability(Json(body): Json<Value>) -> Reply {
    let available = body["room"] == "room1";
    ok(json!({ "success": true, "isAvailable": available }))
}

async fn book(
    State(calls): State<Arc<Calls>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if role_for(&headers).is_none() || body["room"] == "revoked" {
        return unauthorized();
    }
    if body["room"] == "room2" {
        return ok(json!({ "success": false, "message": "Room is not available" }));
    }
    calls.bookings.fetch_add(1, Ordering::SeqCst);
    ok(json!({ "success": true, "message": "Booking created successfully" }))
}

async fn user_bookings(headers: HeaderMap) -> Reply {
    if role_for(&headers).is_none() {
        return unauthorized();
    }
    ok(json!({
        "success": true,
        "bookings": [
            {
                "_id": "b1",
                "room": {
                    "_id": "room1",
                    "roomType": "Single Bed",
                    "hotel": { "_id": "h1", "name": "Palm Stay", "city": "Goa" }
                },
                "user": "u1",
                "checkInDate": "2024-07-01T00:00:00.000Z",
                "checkOutDate": "2024-07-03T00:00:00.000Z",
                "guests": 2,
                "totalPrice": 160,
                "isPaid": false,
                "status": "pending",
                "paymentMethod": "Pay At Hotel"
            },
            { "_id": "b2", "room": "room3", "guests": 1 }
        ]
    }))
}

async fn hotel_bookings(headers: HeaderMap) -> Reply {
    match role_for(&headers) {
        Some("hotelOwner") => ok(json!({
            "success": true,
            "bookings": [],
            "totalBookings": 2,
            "totalRevenue": "320.5"
        })),
        Some(_) => ok(json!({ "success": false, "message": "No Hotel found" })),
        None => unauthorized(),
    }
}

async fn stripe_payment(headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    if role_for(&headers).is_none() {
        return unauthorized();
    }
    let booking = body["bookingId"].as_str().unwrap_or_default();
    ok(json!({ "success": true, "url": format!("https://checkout.example/{booking}") }))
}

async fn register_hotel(headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    if role_for(&headers).is_none() {
        return unauthorized();
    }
    if body["name"].as_str().unwrap_or_default().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": "Name is required" })),
        );
    }
    ok(json!({ "success": true, "message": "Hotel Registered Successfully" }))
}
