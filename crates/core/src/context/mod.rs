//! Application context: one explicit owner for the client, session, room
//! snapshot and notifier, built at start and torn down at exit.

mod booking;

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::{
    api::{types::Acknowledged, ApiClient, HotelRegistration},
    config::AppConfig,
    error::{ActionError, ApiError},
    listing::RoomQuery,
    models::{Booking, DashboardSummary, RoomRecord},
    notice::{Notice, Notifier},
    session::{SessionManager, TokenStore},
};

pub use booking::{BookingRequest, DEFAULT_PAYMENT_METHOD, GUEST_LIMIT};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Everything a frontend needs to drive the storefront.
pub struct AppContext {
    config: AppConfig,
    api: ApiClient,
    session: SessionManager,
    notifier: Notifier,
    rooms: Vec<RoomRecord>,
}

impl AppContext {
    /// Build the client, restore any saved session and fetch the room catalog once.
    ///
    /// The returned receiver yields every notice raised by the context.
    pub async fn start(
        config: AppConfig,
        store: Arc<dyn TokenStore>,
    ) -> Result<(Self, UnboundedReceiver<Notice>), ApiError> {
        let (mut context, notices) = Self::new(config, store)?;
        context.session.restore().await;
        context.load_rooms().await;
        info!(
            backend = %context.config.backend_url,
            rooms = context.rooms.len(),
            authenticated = context.session.is_authenticated(),
            "storefront ready"
        );
        Ok((context, notices))
    }

    /// Context with an anonymous session and no rooms loaded.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn TokenStore>,
    ) -> Result<(Self, UnboundedReceiver<Notice>), ApiError> {
        let api = ApiClient::new(&config)?;
        let (notifier, notices) = Notifier::channel();
        let session = SessionManager::new(api.clone(), store, notifier.clone());
        Ok((
            Self {
                config,
                api,
                session,
                notifier,
                rooms: Vec::new(),
            },
            notices,
        ))
    }

    /// Let a pending sign-out notification finish, then drop everything.
    pub async fn shutdown(mut self) {
        self.session.settle(SHUTDOWN_GRACE).await;
        debug!("storefront shut down");
    }

    /// Settings the context was built with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current session state.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Mutable session access for login, signup and logout.
    pub fn session_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }

    /// Handle for raising notices from the frontend.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Last fetched room catalog.
    pub fn rooms(&self) -> &[RoomRecord] {
        &self.rooms
    }

    /// Catalog filtered and sorted by `query`.
    pub fn visible_rooms(&self, query: &RoomQuery) -> Vec<RoomRecord> {
        query.apply(&self.rooms)
    }

    /// Refresh the room catalog. On failure the previous snapshot is kept.
    pub async fn load_rooms(&mut self) -> bool {
        match self.api.rooms().await {
            Ok(rooms) => {
                debug!(count = rooms.len(), "rooms loaded");
                self.rooms = rooms;
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to load rooms");
                self.notifier.error(err.user_message("Failed to load rooms"));
                false
            }
        }
    }

    /// Ask whether the room is free for the requested dates.
    pub async fn check_availability(
        &mut self,
        request: &BookingRequest,
    ) -> Result<bool, ActionError> {
        let result = self
            .api
            .check_availability(&request.availability())
            .await
            .and_then(|response| response.accepted("Failed to check availability"));
        let response = self.settle_call(result, "Failed to check availability")?;

        if response.is_available {
            self.notifier.success("Room is available");
        } else {
            self.notifier.error("Room is not available");
        }
        Ok(response.is_available)
    }

    /// Place a booking for the signed-in user.
    pub async fn book(&mut self, request: &BookingRequest) -> Result<(), ActionError> {
        self.require_user()?;
        let result = self.api.book(&request.book()).await;
        let message = self.settle_call(result, "Booking failed")?;
        info!(room = request.room_id(), nights = request.nights(), "room booked");
        self.notifier
            .success(message.unwrap_or_else(|| "Booking created successfully".to_string()));
        Ok(())
    }

    /// Bookings made by the signed-in user.
    pub async fn my_bookings(&mut self) -> Result<Vec<Booking>, ActionError> {
        self.require_user()?;
        let result = self.api.user_bookings().await;
        self.settle_call(result, "Failed to load bookings")
    }

    /// Start card payment for an unpaid booking; returns the checkout URL.
    pub async fn payment_link(&mut self, booking_id: &str) -> Result<String, ActionError> {
        self.require_user()?;
        let result = self.api.stripe_payment(booking_id).await;
        self.settle_call(result, "Payment could not be started")
    }

    /// Rooms listed by the signed-in owner.
    pub async fn owner_rooms(&mut self) -> Result<Vec<RoomRecord>, ActionError> {
        self.require_owner()?;
        let result = self.api.owner_rooms().await;
        self.settle_call(result, "Failed to load your rooms")
    }

    /// Flip one of the owner's rooms between listed and unlisted.
    pub async fn toggle_room_availability(&mut self, room_id: &str) -> Result<(), ActionError> {
        self.require_owner()?;
        let result = self.api.toggle_availability(room_id).await;
        let message = self.settle_call(result, "Failed to update room availability")?;
        self.notifier
            .success(message.unwrap_or_else(|| "Room availability updated".to_string()));
        Ok(())
    }

    /// Bookings and revenue for the owner's hotel.
    pub async fn dashboard(&mut self) -> Result<DashboardSummary, ActionError> {
        self.require_owner()?;
        let result = self.api.hotel_bookings().await;
        self.settle_call(result, "Failed to fetch dashboard data")
    }

    /// Register a hotel; the user becomes an owner on success.
    pub async fn register_hotel(
        &mut self,
        registration: &HotelRegistration,
    ) -> Result<(), ActionError> {
        self.require_user()?;
        let missing = registration.missing_fields();
        if !missing.is_empty() {
            let err = ActionError::Invalid(format!(
                "Please fill in all required fields: {}",
                missing.join(", ")
            ));
            self.notifier.error(err.to_string());
            return Err(err);
        }

        let result = self.api.register_hotel(registration).await;
        let message = self.settle_call(result, "Hotel registration failed")?;
        self.session.mark_owner();
        info!(hotel = %registration.name, "hotel registered");
        self.notifier
            .success(message.unwrap_or_else(|| "Hotel registered successfully".to_string()));
        Ok(())
    }

    fn require_user(&self) -> Result<(), ActionError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            self.notifier.error(ActionError::NotAuthenticated.to_string());
            Err(ActionError::NotAuthenticated)
        }
    }

    fn require_owner(&self) -> Result<(), ActionError> {
        self.require_user()?;
        if self.session.is_owner() {
            Ok(())
        } else {
            self.notifier.error(ActionError::Forbidden.to_string());
            Err(ActionError::Forbidden)
        }
    }

    /// Report a failed user-initiated call and drop the session on 401.
    fn settle_call<T>(
        &mut self,
        result: Result<T, ApiError>,
        fallback: &str,
    ) -> Result<T, ActionError> {
        result.map_err(|err| {
            let err = ActionError::from(err);
            if err.is_unauthorized() {
                debug!("backend rejected token; clearing session");
                self.session.expire();
            }
            warn!(error = %err, "{}", fallback);
            self.notifier.error(err.user_message(fallback));
            err
        })
    }
}
