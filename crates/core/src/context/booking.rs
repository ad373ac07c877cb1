#![allow(missing_docs)]

use std::ops::RangeInclusive;

use chrono::NaiveDate;

use crate::{
    api::types::{AvailabilityRequest, BookRequest},
    error::ActionError,
};

/// Guests accepted per booking.
pub const GUEST_LIMIT: RangeInclusive<u32> = 1..=10;

/// Payment method used when the guest does not choose one.
pub const DEFAULT_PAYMENT_METHOD: &str = "Pay At Hotel";

/// A validated stay request for one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    room_id: String,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: u32,
    payment_method: String,
}

impl BookingRequest {
    /// Check the dates and guest count before anything is sent.
    pub fn new(
        room_id: impl Into<String>,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: u32,
    ) -> Result<Self, ActionError> {
        let room_id = room_id.into();
        if room_id.trim().is_empty() {
            return Err(ActionError::Invalid("No room selected".to_string()));
        }
        if check_in >= check_out {
            return Err(ActionError::Invalid(
                "Check-in date must be less than check-out date".to_string(),
            ));
        }
        if !GUEST_LIMIT.contains(&guests) {
            return Err(ActionError::Invalid(format!(
                "Guests must be between {} and {}",
                GUEST_LIMIT.start(),
                GUEST_LIMIT.end()
            )));
        }
        Ok(Self {
            room_id,
            check_in,
            check_out,
            guests,
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
        })
    }

    /// Override the payment method.
    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        let method = method.into();
        if !method.trim().is_empty() {
            self.payment_method = method;
        }
        self
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn guests(&self) -> u32 {
        self.guests
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    /// Number of nights between check-in and check-out.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub(crate) fn availability(&self) -> AvailabilityRequest<'_> {
        AvailabilityRequest {
            room: &self.room_id,
            check_in_date: self.check_in,
            check_out_date: self.check_out,
        }
    }

    pub(crate) fn book(&self) -> BookRequest<'_> {
        BookRequest {
            room: &self.room_id,
            check_in_date: self.check_in,
            check_out_date: self.check_out,
            guests: self.guests,
            payment_method: &self.payment_method,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
    }

    #[test]
    fn accepts_a_valid_stay() {
        let request =
            BookingRequest::new("r1", date("2024-07-01"), date("2024-07-04"), 2).expect("valid");
        assert_eq!(request.nights(), 3);
        assert_eq!(request.payment_method(), "Pay At Hotel");

        let body = serde_json::to_value(request.book()).expect("encode");
        assert_eq!(body["checkInDate"], "2024-07-01");
        assert_eq!(body["paymentMethod"], "Pay At Hotel");
        assert_eq!(body["guests"], 2);
    }

    #[test]
    fn rejects_inverted_or_empty_stays() {
        let err = BookingRequest::new("r1", date("2024-07-04"), date("2024-07-04"), 1)
            .expect_err("same day");
        assert_eq!(err.to_string(), "Check-in date must be less than check-out date");

        assert!(BookingRequest::new("r1", date("2024-07-05"), date("2024-07-04"), 1).is_err());
        assert!(BookingRequest::new(" ", date("2024-07-01"), date("2024-07-04"), 1).is_err());
    }

    #[test]
    fn guest_count_is_bounded() {
        let (start, end) = (date("2024-07-01"), date("2024-07-02"));
        assert!(BookingRequest::new("r1", start, end, 0).is_err());
        assert!(BookingRequest::new("r1", start, end, 10).is_ok());
        assert!(BookingRequest::new("r1", start, end, 11).is_err());
    }

    #[test]
    fn blank_payment_method_keeps_default() {
        let request = BookingRequest::new("r1", date("2024-07-01"), date("2024-07-02"), 1)
            .expect("valid")
            .with_payment_method("  ");
        assert_eq!(request.payment_method(), DEFAULT_PAYMENT_METHOD);
    }
}
