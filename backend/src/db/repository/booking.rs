//! Booking and payment repository trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::api::{Booking, BookingDraft, BookingId, NewPayment, Payment, PaymentId, UserId};

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Store a booking after checking it against the accommodation calendar.
    ///
    /// The overlap check and the insert run in the same transaction.
    ///
    /// # Returns
    /// * `Ok(Booking)` - The stored booking
    /// * `Err(RepositoryError::NotFound)` - If the accommodation, user or payment does not exist
    /// * `Err(RepositoryError::Conflict)` - If the dates overlap an existing booking
    async fn create_booking(&self, booking: BookingDraft) -> RepositoryResult<Booking>;

    async fn get_booking(&self, id: BookingId) -> RepositoryResult<Booking>;

    /// Overwrite dates, guests, payment and amount. The booking never
    /// conflicts with itself.
    async fn update_booking(&self, id: BookingId, booking: BookingDraft)
        -> RepositoryResult<Booking>;

    async fn delete_booking(&self, id: BookingId) -> RepositoryResult<()>;

    /// Bookings with `check_in >= from` and `check_out <= to`.
    async fn list_bookings_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<Booking>>;

    /// Bookings created during a calendar year (UTC).
    async fn list_bookings_by_year(&self, year: i32) -> RepositoryResult<Vec<Booking>>;

    async fn list_bookings_by_user(&self, user_id: UserId) -> RepositoryResult<Vec<Booking>>;

    async fn count_bookings_by_user(&self, user_id: UserId) -> RepositoryResult<u64>;

    // ==================== Payments ====================

    async fn create_payment(&self, payment: NewPayment) -> RepositoryResult<Payment>;

    async fn get_payment(&self, id: PaymentId) -> RepositoryResult<Payment>;

    async fn update_payment(&self, id: PaymentId, payment: NewPayment) -> RepositoryResult<Payment>;

    /// # Returns
    /// * `Err(RepositoryError::Conflict)` - If a booking references the payment
    async fn delete_payment(&self, id: PaymentId) -> RepositoryResult<()>;

    async fn list_payments(&self) -> RepositoryResult<Vec<Payment>>;

    /// The payment attached to a booking; `NotFound` when it has none.
    async fn get_booking_payment(&self, booking_id: BookingId) -> RepositoryResult<Payment>;
}
