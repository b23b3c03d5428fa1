use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;

use super::models::*;
use super::schema::*;
use super::{ensure_user, map_diesel_error, or_missing, PostgresRepository};
use crate::api::{Booking, BookingDraft, BookingId, NewPayment, Payment, PaymentId, UserId};
use crate::db::repository::{BookingRepository, ErrorContext, RepositoryError, RepositoryResult};

/// Lock the accommodation row, check the references and reject any booking on
/// the same listing whose half-open `[check_in, check_out)` range intersects
/// the draft's.
fn check_booking(
    conn: &mut PgConnection,
    op: &'static str,
    booking: &BookingDraft,
    except: Option<BookingId>,
) -> RepositoryResult<()> {
    accommodations::table
        .find(&booking.register_number)
        .select(accommodations::register_number)
        .for_update()
        .first::<String>(conn)
        .map_err(or_missing(op, "accommodation", &booking.register_number))?;
    ensure_user(conn, op, booking.user_id)?;
    if let Some(payment_id) = booking.payment_id {
        let found: bool = diesel::select(exists(payments::table.find(payment_id.0)))
            .get_result(conn)
            .map_err(map_diesel_error)?;
        if !found {
            return Err(RepositoryError::missing(op, "payment", payment_id));
        }
    }

    let mut clashes = bookings::table
        .filter(bookings::register_number.eq(&booking.register_number))
        .filter(bookings::check_in.lt(booking.check_out))
        .filter(bookings::check_out.gt(booking.check_in))
        .into_boxed();
    if let Some(id) = except {
        clashes = clashes.filter(bookings::booking_id.ne(id.0));
    }
    let clash = clashes
        .order(bookings::check_in.asc())
        .select(BookingRow::as_select())
        .first::<BookingRow>(conn)
        .optional()
        .map_err(map_diesel_error)?;
    if let Some(existing) = clash {
        return Err(RepositoryError::conflict_on(
            op,
            "accommodation",
            &booking.register_number,
            format!(
                "{} is already booked from {} to {} (booking {})",
                booking.register_number, existing.check_in, existing.check_out, existing.booking_id
            ),
        ));
    }
    Ok(())
}

#[async_trait]
impl BookingRepository for PostgresRepository {
    async fn create_booking(&self, booking: BookingDraft) -> RepositoryResult<Booking> {
        const OP: &str = "create_booking";
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                check_booking(tx, OP, &booking, None)?;
                diesel::insert_into(bookings::table)
                    .values(&NewBookingRow {
                        register_number: booking.register_number,
                        user_id: booking.user_id.0,
                        check_in: booking.check_in,
                        check_out: booking.check_out,
                        num_of_guests: booking.num_of_guests,
                        amount: booking.amount,
                        payment_id: booking.payment_id.map(|id| id.0),
                    })
                    .returning(BookingRow::as_returning())
                    .get_result::<BookingRow>(tx)
                    .map(Into::into)
                    .map_err(map_diesel_error)
            })
        })
        .await
    }

    async fn get_booking(&self, id: BookingId) -> RepositoryResult<Booking> {
        self.with_conn(move |conn| {
            bookings::table
                .find(id.0)
                .select(BookingRow::as_select())
                .first::<BookingRow>(conn)
                .map(Into::into)
                .map_err(or_missing("get_booking", "booking", id))
        })
        .await
    }

    async fn update_booking(
        &self,
        id: BookingId,
        booking: BookingDraft,
    ) -> RepositoryResult<Booking> {
        const OP: &str = "update_booking";
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let found: bool = diesel::select(exists(bookings::table.find(id.0)))
                    .get_result(tx)
                    .map_err(map_diesel_error)?;
                if !found {
                    return Err(RepositoryError::missing(OP, "booking", id));
                }
                check_booking(tx, OP, &booking, Some(id))?;
                diesel::update(bookings::table.find(id.0))
                    .set(&BookingChangeset {
                        check_in: booking.check_in,
                        check_out: booking.check_out,
                        num_of_guests: booking.num_of_guests,
                        amount: booking.amount,
                        payment_id: booking.payment_id.map(|p| p.0),
                    })
                    .returning(BookingRow::as_returning())
                    .get_result::<BookingRow>(tx)
                    .map(Into::into)
                    .map_err(or_missing(OP, "booking", id))
            })
        })
        .await
    }

    async fn delete_booking(&self, id: BookingId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(bookings::table.find(id.0))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::missing("delete_booking", "booking", id));
            }
            Ok(())
        })
        .await
    }

    async fn list_bookings_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<Booking>> {
        self.with_conn(move |conn| {
            bookings::table
                .filter(bookings::check_in.ge(from))
                .filter(bookings::check_out.le(to))
                .order(bookings::booking_id.asc())
                .select(BookingRow::as_select())
                .load::<BookingRow>(conn)
                .map(|rows| rows.into_iter().map(Into::into).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_bookings_by_year(&self, year: i32) -> RepositoryResult<Vec<Booking>> {
        let bounds = Utc
            .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
            .single()
            .zip(Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0).single());
        let (start, end) = bounds.ok_or_else(|| {
            RepositoryError::validation_with_context(
                format!("Year {} is out of range", year),
                ErrorContext::new("list_bookings_by_year").with_details(format!("year={}", year)),
            )
        })?;
        self.with_conn(move |conn| {
            bookings::table
                .filter(bookings::created_at.ge(start))
                .filter(bookings::created_at.lt(end))
                .order(bookings::booking_id.asc())
                .select(BookingRow::as_select())
                .load::<BookingRow>(conn)
                .map(|rows| rows.into_iter().map(Into::into).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_bookings_by_user(&self, user_id: UserId) -> RepositoryResult<Vec<Booking>> {
        self.with_conn(move |conn| {
            ensure_user(conn, "list_bookings_by_user", user_id)?;
            bookings::table
                .filter(bookings::user_id.eq(user_id.0))
                .order(bookings::booking_id.asc())
                .select(BookingRow::as_select())
                .load::<BookingRow>(conn)
                .map(|rows| rows.into_iter().map(Into::into).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn count_bookings_by_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        self.with_conn(move |conn| {
            ensure_user(conn, "count_bookings_by_user", user_id)?;
            let count: i64 = bookings::table
                .filter(bookings::user_id.eq(user_id.0))
                .count()
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn create_payment(&self, payment: NewPayment) -> RepositoryResult<Payment> {
        self.with_conn(move |conn| {
            diesel::insert_into(payments::table)
                .values(&NewPaymentRow {
                    title: payment.title,
                    description: payment.description,
                })
                .returning(PaymentRow::as_returning())
                .get_result::<PaymentRow>(conn)
                .map(Into::into)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_payment(&self, id: PaymentId) -> RepositoryResult<Payment> {
        self.with_conn(move |conn| {
            payments::table
                .find(id.0)
                .select(PaymentRow::as_select())
                .first::<PaymentRow>(conn)
                .map(Into::into)
                .map_err(or_missing("get_payment", "payment", id))
        })
        .await
    }

    async fn update_payment(&self, id: PaymentId, payment: NewPayment) -> RepositoryResult<Payment> {
        self.with_conn(move |conn| {
            diesel::update(payments::table.find(id.0))
                .set(&PaymentChangeset {
                    title: payment.title,
                    description: payment.description,
                })
                .returning(PaymentRow::as_returning())
                .get_result::<PaymentRow>(conn)
                .map(Into::into)
                .map_err(or_missing("update_payment", "payment", id))
        })
        .await
    }

    async fn delete_payment(&self, id: PaymentId) -> RepositoryResult<()> {
        const OP: &str = "delete_payment";
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let referenced: bool = diesel::select(exists(
                    bookings::table.filter(bookings::payment_id.eq(id.0)),
                ))
                .get_result(tx)
                .map_err(map_diesel_error)?;
                if referenced {
                    return Err(RepositoryError::conflict_on(
                        OP,
                        "payment",
                        id,
                        format!("Payment {} is referenced by bookings", id),
                    ));
                }
                let deleted = diesel::delete(payments::table.find(id.0))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                if deleted == 0 {
                    return Err(RepositoryError::missing(OP, "payment", id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn list_payments(&self) -> RepositoryResult<Vec<Payment>> {
        self.with_conn(|conn| {
            payments::table
                .order(payments::payment_id.asc())
                .select(PaymentRow::as_select())
                .load::<PaymentRow>(conn)
                .map(|rows| rows.into_iter().map(Into::into).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_booking_payment(&self, booking_id: BookingId) -> RepositoryResult<Payment> {
        const OP: &str = "get_booking_payment";
        self.with_conn(move |conn| {
            let payment_id: Option<i64> = bookings::table
                .find(booking_id.0)
                .select(bookings::payment_id)
                .first(conn)
                .map_err(or_missing(OP, "booking", booking_id))?;
            let payment_id = payment_id.ok_or_else(|| {
                RepositoryError::not_found(format!("Booking {} has no payment", booking_id))
                    .with_operation(OP)
            })?;
            payments::table
                .find(payment_id)
                .select(PaymentRow::as_select())
                .first::<PaymentRow>(conn)
                .map(Into::into)
                .map_err(or_missing(OP, "payment", payment_id))
        })
        .await
    }
}
