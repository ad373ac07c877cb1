#![warn(clippy::all, missing_docs)]

//! Core logic for the staybook hotel storefront.
//!
//! This crate hosts the backend models, configuration handling, the typed
//! REST client, session management and the room listing query engine used
//! by the terminal UI and any future frontends.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod listing;
pub mod models;
pub mod notice;
pub mod session;

pub use api::{ApiClient, HotelRegistration, SignupForm};
pub use config::AppConfig;
pub use context::{AppContext, BookingRequest};
pub use error::{ActionError, ApiError, SessionError};
pub use listing::{query_rooms, FilterState, PriceRange, RoomQuery, SortKey};
pub use models::{Booking, DashboardSummary, RoomRecord, UserProfile};
pub use notice::{Notice, NoticeLevel, Notifier};
pub use session::{FileTokenStore, LoginSuccess, SessionManager, TokenStore};
