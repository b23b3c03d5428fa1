use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{BookingId, PaymentId, UserId};

/// A stay reserved by a guest. `check_out` is exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub register_number: String,
    pub user_id: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_of_guests: i32,
    pub amount: f64,
    pub payment_id: Option<PaymentId>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn nights(&self) -> i64 {
        nights_between(self.check_in, self.check_out)
    }

    /// Whether the stay shares at least one night with `[check_in, check_out)`.
    pub fn overlaps(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        self.check_in < check_out && check_in < self.check_out
    }
}

pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub register_number: String,
    pub user_id: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_of_guests: i32,
    #[serde(default)]
    pub payment_id: Option<PaymentId>,
}

/// Partial update of a booking; absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingUpdate {
    #[serde(default)]
    pub check_in: Option<NaiveDate>,
    #[serde(default)]
    pub check_out: Option<NaiveDate>,
    #[serde(default)]
    pub num_of_guests: Option<i32>,
    /// Replaces the payment method. A payment can be swapped but not
    /// detached; delete and rebook to drop it.
    #[serde(default)]
    pub payment_id: Option<PaymentId>,
}

/// Fully resolved booking handed to a repository, amount included.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub register_number: String,
    pub user_id: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_of_guests: i32,
    pub payment_id: Option<PaymentId>,
    pub amount: f64,
}

impl BookingDraft {
    pub fn from_new(booking: &NewBooking, price_per_night: f64) -> Self {
        Self {
            register_number: booking.register_number.clone(),
            user_id: booking.user_id,
            check_in: booking.check_in,
            check_out: booking.check_out,
            num_of_guests: booking.num_of_guests,
            payment_id: booking.payment_id,
            amount: nights_between(booking.check_in, booking.check_out) as f64 * price_per_night,
        }
    }

    /// Merge an update into an existing booking and reprice it.
    pub fn from_update(current: &Booking, update: &BookingUpdate, price_per_night: f64) -> Self {
        let check_in = update.check_in.unwrap_or(current.check_in);
        let check_out = update.check_out.unwrap_or(current.check_out);
        Self {
            register_number: current.register_number.clone(),
            user_id: current.user_id,
            check_in,
            check_out,
            num_of_guests: update.num_of_guests.unwrap_or(current.num_of_guests),
            payment_id: update.payment_id.or(current.payment_id),
            amount: nights_between(check_in, check_out) as f64 * price_per_night,
        }
    }
}

/// A payment method guests can attach to their bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn booking(check_in: NaiveDate, check_out: NaiveDate) -> Booking {
        Booking {
            id: BookingId(1),
            register_number: "VUT-01".into(),
            user_id: UserId(1),
            check_in,
            check_out,
            num_of_guests: 2,
            amount: 0.0,
            payment_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_overlap_is_half_open() {
        let b = booking(date(2024, 7, 1), date(2024, 7, 5));
        assert!(b.overlaps(date(2024, 7, 4), date(2024, 7, 8)));
        assert!(b.overlaps(date(2024, 6, 28), date(2024, 7, 2)));
        // Checking in on the day the previous guest checks out is allowed.
        assert!(!b.overlaps(date(2024, 7, 5), date(2024, 7, 7)));
        assert!(!b.overlaps(date(2024, 6, 25), date(2024, 7, 1)));
    }

    #[test]
    fn test_update_swaps_but_keeps_payment() {
        let mut current = booking(date(2024, 7, 1), date(2024, 7, 5));
        current.payment_id = Some(PaymentId(4));

        let untouched = BookingDraft::from_update(&current, &BookingUpdate::default(), 50.0);
        assert_eq!(untouched.payment_id, Some(PaymentId(4)));
        assert_eq!(untouched.amount, 200.0);

        let swapped = BookingUpdate {
            payment_id: Some(PaymentId(9)),
            check_out: Some(date(2024, 7, 3)),
            ..Default::default()
        };
        let draft = BookingDraft::from_update(&current, &swapped, 50.0);
        assert_eq!(draft.payment_id, Some(PaymentId(9)));
        assert_eq!(draft.amount, 100.0);
    }

    #[test]
    fn test_draft_amount_uses_nights() {
        let new = NewBooking {
            register_number: "VUT-01".into(),
            user_id: UserId(3),
            check_in: date(2024, 7, 1),
            check_out: date(2024, 7, 4),
            num_of_guests: 2,
            payment_id: None,
        };
        let draft = BookingDraft::from_new(&new, 50.0);
        assert_eq!(draft.amount, 150.0);
    }

    #[test]
    fn test_draft_from_update_keeps_unchanged_fields() {
        let current = booking(date(2024, 7, 1), date(2024, 7, 5));
        let update = BookingUpdate {
            check_out: Some(date(2024, 7, 3)),
            payment_id: Some(PaymentId(9)),
            ..Default::default()
        };
        let draft = BookingDraft::from_update(&current, &update, 100.0);
        assert_eq!(draft.check_in, date(2024, 7, 1));
        assert_eq!(draft.num_of_guests, 2);
        assert_eq!(draft.payment_id, Some(PaymentId(9)));
        assert_eq!(draft.amount, 200.0);
    }
}
