//! Booking ledger
//!
//! Owns seat allocation and the booking status state machine.
//!
//! Creation is serialized per `(seat, mode)` inside this process and the write
//! itself is a conditional insert, so two callers can never both hold a live
//! booking for the same allocation. Status changes are compare-and-set on the
//! status the caller observed; the status graph is acyclic, so a losing writer
//! re-reads at most a couple of times before the edge is either still legal
//! or rejected.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{DomainError, DomainResult};
use super::library::LibraryService;
use super::notification::{BookingEvent, NotificationSink};
use super::statistics::StatisticsAggregator;
use crate::db::{BookingRepository, DbPool, SeatRepository, TimeSlotRepository};
use crate::models::{
    Booking, BookingPeriod, BookingQuery, BookingStatistics, BookingStatus, NewBooking,
    PaymentStatus, Seat, SeatMode, StatisticsFilter, TimeSlot,
};
use crate::utils::validation::is_positive_amount;

/// Who is booking, and in which library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingContext {
    pub library_id: Uuid,
    pub user_id: Uuid,
}

type SeatLocks = Arc<RwLock<HashMap<(Uuid, SeatMode), Arc<Mutex<()>>>>>;

#[derive(Clone)]
pub struct BookingLedger {
    db: DbPool,
    libraries: LibraryService,
    notifier: Arc<dyn NotificationSink>,
    /// One entry per existing seat that has been booked through this process
    seat_locks: SeatLocks,
}

impl BookingLedger {
    pub fn new(db: DbPool, libraries: LibraryService, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            db,
            libraries,
            notifier,
            seat_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn seat_lock(&self, seat_id: Uuid, mode: SeatMode) -> Arc<Mutex<()>> {
        {
            let locks = self.seat_locks.read().await;
            if let Some(lock) = locks.get(&(seat_id, mode)) {
                return lock.clone();
            }
        }

        let mut locks = self.seat_locks.write().await;
        locks
            .entry((seat_id, mode))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the allocation locks of a deleted seat
    pub async fn forget_seat(&self, seat_id: Uuid) {
        self.seat_locks
            .write()
            .await
            .retain(|(id, _), _| *id != seat_id);
    }

    #[cfg(test)]
    pub(crate) async fn locked_seats(&self) -> Vec<Uuid> {
        self.seat_locks.read().await.keys().map(|(id, _)| *id).collect()
    }

    /// Book a daily seat for one time slot on one date.
    ///
    /// The amount is the slot price at the time of booking.
    pub async fn create_daily_booking(
        &self,
        ctx: BookingContext,
        seat_id: Uuid,
        time_slot_id: Uuid,
        booking_date: NaiveDate,
    ) -> DomainResult<Booking> {
        let period = BookingPeriod::Daily {
            time_slot_id,
            booking_date,
        };

        let lock = self.seat_lock(seat_id, period.seat_mode()).await;
        let _guard = lock.lock().await;

        let (_, slot) = self.validate_daily(ctx, seat_id, time_slot_id).await?;

        let booking = NewBooking {
            library_id: ctx.library_id,
            user_id: ctx.user_id,
            seat_id,
            period,
            amount: slot.price,
        };
        self.insert(booking).await
    }

    /// Book a monthly seat for an inclusive date range.
    ///
    /// When `amount` is omitted the library's monthly fee is charged.
    pub async fn create_monthly_booking(
        &self,
        ctx: BookingContext,
        seat_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        amount: Option<f64>,
    ) -> DomainResult<Booking> {
        if start_date > end_date {
            return Err(DomainError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }
        if let Some(amount) = amount {
            if !is_positive_amount(amount) {
                return Err(DomainError::InvalidPrice(amount));
            }
        }

        let period = BookingPeriod::Monthly {
            start_date,
            end_date,
        };
        let lock = self.seat_lock(seat_id, period.seat_mode()).await;
        let _guard = lock.lock().await;

        let library = self.libraries.require_active(ctx.library_id).await?;
        self.require_bookable_seat(ctx.library_id, seat_id, period.seat_mode())
            .await?;

        let amount = amount.unwrap_or(library.monthly_fee);
        if !is_positive_amount(amount) {
            return Err(DomainError::InvalidPrice(amount));
        }

        let booking = NewBooking {
            library_id: ctx.library_id,
            user_id: ctx.user_id,
            seat_id,
            period,
            amount,
        };
        self.insert(booking).await
    }

    async fn insert(&self, booking: NewBooking) -> DomainResult<Booking> {
        let repo = BookingRepository::new(&self.db);
        let Some(created) = repo.insert_if_no_conflict(&booking).await? else {
            debug!(seat_id = %booking.seat_id, "Allocation conflict");
            return Err(self.explain_conflict(&booking).await);
        };

        info!(
            booking_id = %created.id,
            seat_id = %created.seat_id,
            user_id = %created.user_id,
            kind = created.period.kind(),
            amount = created.amount,
            "Booking created"
        );
        self.notifier.notify(BookingEvent::Created {
            booking: created.clone(),
        });
        Ok(created)
    }

    /// Re-run validation after a refused insert so the caller learns why.
    ///
    /// The seat may have been deactivated or unassigned by another writer; if
    /// everything still checks out the refusal was an allocation conflict.
    async fn explain_conflict(&self, booking: &NewBooking) -> DomainError {
        let ctx = BookingContext {
            library_id: booking.library_id,
            user_id: booking.user_id,
        };
        let revalidated = match booking.period {
            BookingPeriod::Daily { time_slot_id, .. } => self
                .validate_daily(ctx, booking.seat_id, time_slot_id)
                .await
                .map(|_| ()),
            BookingPeriod::Monthly { .. } => self
                .require_bookable_seat(booking.library_id, booking.seat_id, booking.period.seat_mode())
                .await
                .map(|_| ()),
        };

        match revalidated {
            Ok(()) => DomainError::SeatUnavailable {
                seat_id: booking.seat_id,
            },
            Err(err) => err,
        }
    }

    async fn validate_daily(
        &self,
        ctx: BookingContext,
        seat_id: Uuid,
        time_slot_id: Uuid,
    ) -> DomainResult<(Seat, TimeSlot)> {
        self.libraries.require_active(ctx.library_id).await?;
        let seat = self
            .require_bookable_seat(ctx.library_id, seat_id, SeatMode::DailyBooking)
            .await?;

        let slot = TimeSlotRepository::new(&self.db)
            .get_by_id(time_slot_id)
            .await?
            .filter(|slot| slot.library_id == ctx.library_id)
            .ok_or(DomainError::TimeSlotNotFound(time_slot_id))?;
        if !slot.is_active {
            return Err(DomainError::TimeSlotInactive(time_slot_id));
        }
        if !slot.has_seat(seat_id) {
            return Err(DomainError::SeatNotAssigned {
                seat_id,
                time_slot_id,
            });
        }

        Ok((seat, slot))
    }

    async fn require_bookable_seat(
        &self,
        library_id: Uuid,
        seat_id: Uuid,
        mode: SeatMode,
    ) -> DomainResult<Seat> {
        let seat = SeatRepository::new(&self.db)
            .get_by_id(seat_id)
            .await?
            .filter(|seat| seat.library_id == library_id)
            .ok_or(DomainError::SeatNotFound(seat_id))?;
        if seat.seat_for != mode {
            return Err(DomainError::WrongSeatMode {
                seat_id,
                expected: mode,
                actual: seat.seat_for,
            });
        }
        if !seat.is_active {
            return Err(DomainError::SeatInactive(seat_id));
        }
        Ok(seat)
    }

    pub async fn get(&self, library_id: Uuid, booking_id: Uuid) -> DomainResult<Booking> {
        BookingRepository::new(&self.db)
            .get_by_id(booking_id)
            .await?
            .filter(|booking| booking.library_id == library_id)
            .ok_or(DomainError::BookingNotFound(booking_id))
    }

    /// Bookings matching `query`. Callers scope it to a library.
    pub async fn find(&self, query: &BookingQuery) -> DomainResult<Vec<Booking>> {
        Ok(BookingRepository::new(&self.db).find(query).await?)
    }

    /// Whether a monthly seat has no live booking overlapping the range
    pub async fn is_monthly_range_free(
        &self,
        library_id: Uuid,
        seat_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> DomainResult<bool> {
        if start_date > end_date {
            return Err(DomainError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }
        self.require_bookable_seat(library_id, seat_id, SeatMode::MonthlyBooking)
            .await?;

        let period = BookingPeriod::Monthly {
            start_date,
            end_date,
        };
        let taken = BookingRepository::new(&self.db)
            .has_conflict(seat_id, &period)
            .await?;
        Ok(!taken)
    }

    /// Move a booking along one edge of the status table
    pub async fn transition(
        &self,
        library_id: Uuid,
        booking_id: Uuid,
        target: BookingStatus,
    ) -> DomainResult<Booking> {
        self.transition_from(library_id, booking_id, target, None)
            .await
    }

    /// Like [`transition`](Self::transition), additionally requiring the
    /// current status to be one of `allowed_from`
    async fn transition_from(
        &self,
        library_id: Uuid,
        booking_id: Uuid,
        target: BookingStatus,
        allowed_from: Option<&[BookingStatus]>,
    ) -> DomainResult<Booking> {
        let repo = BookingRepository::new(&self.db);
        let mut current = self.get(library_id, booking_id).await?;

        loop {
            let from = current.status;
            let permitted = allowed_from.map_or(true, |allowed| allowed.contains(&from));
            if !permitted || !from.can_transition_to(target) {
                return Err(DomainError::IllegalTransition { from, to: target });
            }

            if let Some(updated) = repo.update_status(booking_id, from, target).await? {
                info!(booking_id = %booking_id, from = %from, to = %target, "Booking status changed");
                self.notifier.notify(BookingEvent::StatusChanged {
                    booking_id,
                    library_id: updated.library_id,
                    user_id: updated.user_id,
                    from,
                    to: target,
                });
                return Ok(updated);
            }

            // Someone else moved the booking first; decide again from its new status
            warn!(booking_id = %booking_id, expected = %from, "Concurrent status change");
            current = self.get(library_id, booking_id).await?;
        }
    }

    pub async fn confirm(&self, library_id: Uuid, booking_id: Uuid) -> DomainResult<Booking> {
        self.transition(library_id, booking_id, BookingStatus::Confirmed)
            .await
    }

    /// Cancel from any live status
    pub async fn cancel(&self, library_id: Uuid, booking_id: Uuid) -> DomainResult<Booking> {
        self.transition(library_id, booking_id, BookingStatus::Cancelled)
            .await
    }

    /// Reject a pending or confirmed booking
    pub async fn reject(&self, library_id: Uuid, booking_id: Uuid) -> DomainResult<Booking> {
        self.transition(library_id, booking_id, BookingStatus::Rejected)
            .await
    }

    pub async fn check_in(&self, library_id: Uuid, booking_id: Uuid) -> DomainResult<Booking> {
        self.transition(library_id, booking_id, BookingStatus::CheckedIn)
            .await
    }

    /// Record a check-out; only a checked-in booking can check out
    pub async fn check_out(&self, library_id: Uuid, booking_id: Uuid) -> DomainResult<Booking> {
        self.transition_from(
            library_id,
            booking_id,
            BookingStatus::Completed,
            Some(&[BookingStatus::CheckedIn]),
        )
        .await
    }

    pub async fn complete(&self, library_id: Uuid, booking_id: Uuid) -> DomainResult<Booking> {
        self.transition(library_id, booking_id, BookingStatus::Completed)
            .await
    }

    /// Set the payment status. Neither `status` nor `amount` is touched.
    pub async fn set_payment_status(
        &self,
        library_id: Uuid,
        booking_id: Uuid,
        payment_status: PaymentStatus,
    ) -> DomainResult<Booking> {
        let before = self.get(library_id, booking_id).await?;

        let updated = BookingRepository::new(&self.db)
            .update_payment_status(booking_id, payment_status)
            .await?
            .ok_or(DomainError::BookingNotFound(booking_id))?;

        if before.payment_status != payment_status {
            info!(
                booking_id = %booking_id,
                from = %before.payment_status,
                to = %payment_status,
                "Payment status changed"
            );
            self.notifier.notify(BookingEvent::PaymentChanged {
                booking_id,
                library_id: updated.library_id,
                user_id: updated.user_id,
                from: before.payment_status,
                to: payment_status,
            });
        }
        Ok(updated)
    }

    /// Aggregate the library's bookings, always from the stored collection
    pub async fn statistics(
        &self,
        library_id: Uuid,
        filter: &StatisticsFilter,
    ) -> DomainResult<BookingStatistics> {
        let query = BookingQuery {
            library_id: Some(library_id),
            status: filter.status,
            from: filter.from,
            to: filter.to,
            ..Default::default()
        };
        let bookings = self.find(&query).await?;
        Ok(StatisticsAggregator::compute(&bookings, filter))
    }
}
