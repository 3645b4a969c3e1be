//! Time slot catalog
//!
//! Time slots are recurring daily intervals. Each slot owns the set of
//! daily-booking seats that may be booked in it.

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use super::error::{DomainError, DomainResult};
use super::library::LibraryService;
use crate::db::{
    is_foreign_key_violation, BookingRepository, DbPool, SeatRepository, TimeSlotRepository,
};
use crate::models::{Seat, SeatMode, TimeSlot};
use crate::utils::validation::{is_positive_amount, is_valid_time_range};

#[derive(Clone)]
pub struct TimeSlotCatalog {
    db: DbPool,
    libraries: LibraryService,
}

impl TimeSlotCatalog {
    pub fn new(db: DbPool, libraries: LibraryService) -> Self {
        Self { db, libraries }
    }

    pub async fn create_time_slot(
        &self,
        library_id: Uuid,
        start_time: &str,
        end_time: &str,
        price: f64,
    ) -> DomainResult<TimeSlot> {
        if !is_valid_time_range(start_time, end_time) {
            return Err(DomainError::InvalidTimeRange {
                start: start_time.to_string(),
                end: end_time.to_string(),
            });
        }
        if !is_positive_amount(price) {
            return Err(DomainError::InvalidPrice(price));
        }
        self.libraries.require_active(library_id).await?;

        let slot = TimeSlotRepository::new(&self.db)
            .create(library_id, start_time, end_time, price)
            .await?;

        info!(
            time_slot_id = %slot.id,
            start = %slot.start_time,
            end = %slot.end_time,
            "Time slot created"
        );
        Ok(slot)
    }

    pub async fn get_time_slot(&self, library_id: Uuid, time_slot_id: Uuid) -> DomainResult<TimeSlot> {
        TimeSlotRepository::new(&self.db)
            .get_by_id(time_slot_id)
            .await?
            .filter(|slot| slot.library_id == library_id)
            .ok_or(DomainError::TimeSlotNotFound(time_slot_id))
    }

    pub async fn list_time_slots(&self, library_id: Uuid) -> DomainResult<Vec<TimeSlot>> {
        Ok(TimeSlotRepository::new(&self.db).list(library_id).await?)
    }

    /// Assign daily-booking seats to a slot.
    ///
    /// Idempotent. If any seat is unknown or not a daily-booking seat the whole
    /// call is rejected and nothing is assigned.
    pub async fn assign_seats(
        &self,
        library_id: Uuid,
        time_slot_id: Uuid,
        seat_ids: &[Uuid],
    ) -> DomainResult<TimeSlot> {
        self.get_time_slot(library_id, time_slot_id).await?;

        let seats = SeatRepository::new(&self.db);
        let mut to_assign: Vec<Uuid> = Vec::with_capacity(seat_ids.len());
        for &seat_id in seat_ids {
            let seat = seats
                .get_by_id(seat_id)
                .await?
                .filter(|seat| seat.library_id == library_id)
                .ok_or(DomainError::SeatNotFound(seat_id))?;
            if seat.seat_for != SeatMode::DailyBooking {
                return Err(DomainError::WrongSeatMode {
                    seat_id,
                    expected: SeatMode::DailyBooking,
                    actual: seat.seat_for,
                });
            }
            if !to_assign.contains(&seat_id) {
                to_assign.push(seat_id);
            }
        }

        TimeSlotRepository::new(&self.db)
            .add_seats(time_slot_id, &to_assign)
            .await?;

        info!(time_slot_id = %time_slot_id, count = to_assign.len(), "Seats assigned");
        self.get_time_slot(library_id, time_slot_id).await
    }

    /// Remove seats from a slot. Existing bookings are left as they are.
    pub async fn unassign_seats(
        &self,
        library_id: Uuid,
        time_slot_id: Uuid,
        seat_ids: &[Uuid],
    ) -> DomainResult<TimeSlot> {
        self.get_time_slot(library_id, time_slot_id).await?;

        TimeSlotRepository::new(&self.db)
            .remove_seats(time_slot_id, seat_ids)
            .await?;

        info!(time_slot_id = %time_slot_id, count = seat_ids.len(), "Seats unassigned");
        self.get_time_slot(library_id, time_slot_id).await
    }

    pub async fn toggle_active(&self, library_id: Uuid, time_slot_id: Uuid) -> DomainResult<TimeSlot> {
        self.get_time_slot(library_id, time_slot_id).await?;

        let slot = TimeSlotRepository::new(&self.db)
            .toggle_active(time_slot_id)
            .await?
            .ok_or(DomainError::TimeSlotNotFound(time_slot_id))?;

        info!(time_slot_id = %time_slot_id, is_active = slot.is_active, "Time slot toggled");
        Ok(slot)
    }

    /// Delete a slot that no booking has ever referenced
    pub async fn delete_time_slot(&self, library_id: Uuid, time_slot_id: Uuid) -> DomainResult<()> {
        self.get_time_slot(library_id, time_slot_id).await?;

        let bookings = BookingRepository::new(&self.db);
        let count = bookings.count_for_time_slot(time_slot_id).await?;
        if count > 0 {
            return Err(DomainError::TimeSlotHasBookings {
                time_slot_id,
                count,
            });
        }

        match TimeSlotRepository::new(&self.db).delete(time_slot_id).await {
            Ok(true) => {}
            Ok(false) => return Err(DomainError::TimeSlotNotFound(time_slot_id)),
            // A booking landed between the count and the delete
            Err(err) if is_foreign_key_violation(&err) => {
                let count = bookings.count_for_time_slot(time_slot_id).await?;
                return Err(DomainError::TimeSlotHasBookings {
                    time_slot_id,
                    count,
                });
            }
            Err(err) => return Err(err.into()),
        }

        info!(time_slot_id = %time_slot_id, "Time slot deleted");
        Ok(())
    }

    /// Assigned, active seats with no live booking in the slot on `date`,
    /// in assignment order
    pub async fn available_seats(
        &self,
        library_id: Uuid,
        time_slot_id: Uuid,
        date: NaiveDate,
    ) -> DomainResult<Vec<Seat>> {
        let slot = self.get_time_slot(library_id, time_slot_id).await?;
        if !slot.is_active {
            return Ok(Vec::new());
        }

        let occupied = BookingRepository::new(&self.db)
            .occupied_seat_ids(time_slot_id, date)
            .await?;

        let seats = SeatRepository::new(&self.db);
        let mut available = Vec::new();
        for seat_id in slot.seat_ids.iter().filter(|id| !occupied.contains(id)) {
            if let Some(seat) = seats.get_by_id(*seat_id).await? {
                if seat.is_active && seat.seat_for == SeatMode::DailyBooking {
                    available.push(seat);
                }
            }
        }

        Ok(available)
    }
}
