//! Seat registry
//!
//! Seats are created in all-or-nothing batches. A seat's booking mode is fixed
//! at creation because time slot assignments and bookings depend on it.

use std::collections::HashSet;

use tracing::{info, warn};
use uuid::Uuid;

use super::booking_ledger::BookingLedger;
use super::error::{DomainError, DomainResult};
use super::library::LibraryService;
use crate::db::seat_repository::NewSeat;
use crate::db::{
    is_foreign_key_violation, is_unique_violation, BookingRepository, DbPool, SeatRepository,
};
use crate::models::{Seat, SeatMode, SeatQuery, SeatSpec, UpdateSeatRequest};
use crate::utils::validation::validate_seat_number;

/// Trimmed seat number, or `InvalidSeatNumber` when what is left is unusable
fn normalize_seat_number(raw: &str) -> DomainResult<String> {
    let seat_number = raw.trim();
    if !validate_seat_number(seat_number) {
        return Err(DomainError::InvalidSeatNumber(raw.to_string()));
    }
    Ok(seat_number.to_string())
}

#[derive(Clone)]
pub struct SeatRegistry {
    db: DbPool,
    libraries: LibraryService,
    ledger: BookingLedger,
    max_bulk_seats: usize,
}

impl SeatRegistry {
    pub fn new(
        db: DbPool,
        libraries: LibraryService,
        ledger: BookingLedger,
        max_bulk_seats: usize,
    ) -> Self {
        Self {
            db,
            libraries,
            ledger,
            max_bulk_seats,
        }
    }

    pub async fn create_seat(&self, library_id: Uuid, spec: &SeatSpec) -> DomainResult<Seat> {
        let mut seats = self
            .bulk_create_seats(library_id, std::slice::from_ref(spec))
            .await?;
        seats
            .pop()
            .ok_or_else(|| DomainError::Storage(anyhow::anyhow!("Seat was not created")))
    }

    /// Create every seat in `specs` or none of them
    pub async fn bulk_create_seats(
        &self,
        library_id: Uuid,
        specs: &[SeatSpec],
    ) -> DomainResult<Vec<Seat>> {
        self.libraries.require_active(library_id).await?;

        if specs.len() > self.max_bulk_seats {
            return Err(DomainError::BatchTooLarge {
                size: specs.len(),
                max: self.max_bulk_seats,
            });
        }

        let mut seen = HashSet::new();
        let mut seats = Vec::with_capacity(specs.len());
        for spec in specs {
            let seat_number = normalize_seat_number(&spec.seat_number)?;
            let seat_for = SeatMode::parse(&spec.seat_for)
                .ok_or_else(|| DomainError::InvalidSeatFor(spec.seat_for.clone()))?;
            if !seen.insert(seat_number.clone()) {
                return Err(DomainError::DuplicateSeatNumber(seat_number));
            }
            seats.push(NewSeat {
                seat_number,
                seat_name: spec.seat_name.trim().to_string(),
                seat_for,
            });
        }

        let repo = SeatRepository::new(&self.db);
        let numbers: Vec<String> = seats.iter().map(|s| s.seat_number.clone()).collect();
        if let Some(taken) = repo.existing_numbers(library_id, &numbers).await?.pop() {
            return Err(DomainError::DuplicateSeatNumber(taken));
        }

        match repo.create_many(library_id, &seats).await {
            Ok(created) => {
                info!(library_id = %library_id, count = created.len(), "Seats created");
                Ok(created)
            }
            Err(err) if is_unique_violation(&err) => {
                // Another writer took a number between the check and the insert
                warn!(library_id = %library_id, "Seat number taken concurrently");
                let taken = repo
                    .existing_numbers(library_id, &numbers)
                    .await?
                    .pop()
                    .unwrap_or_default();
                Err(DomainError::DuplicateSeatNumber(taken))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_seat(&self, library_id: Uuid, seat_id: Uuid) -> DomainResult<Seat> {
        SeatRepository::new(&self.db)
            .get_by_id(seat_id)
            .await?
            .filter(|seat| seat.library_id == library_id)
            .ok_or(DomainError::SeatNotFound(seat_id))
    }

    pub async fn list_seats(&self, library_id: Uuid, query: &SeatQuery) -> DomainResult<Vec<Seat>> {
        Ok(SeatRepository::new(&self.db).list(library_id, query).await?)
    }

    /// Rename or renumber a seat. The booking mode cannot change.
    pub async fn update_seat(
        &self,
        library_id: Uuid,
        seat_id: Uuid,
        req: &UpdateSeatRequest,
    ) -> DomainResult<Seat> {
        let seat = self.get_seat(library_id, seat_id).await?;

        if let Some(seat_for) = &req.seat_for {
            let mode = SeatMode::parse(seat_for)
                .ok_or_else(|| DomainError::InvalidSeatFor(seat_for.clone()))?;
            if mode != seat.seat_for {
                return Err(DomainError::SeatModeImmutable(seat_id));
            }
        }

        let repo = SeatRepository::new(&self.db);
        let seat_number = match req.seat_number.as_deref() {
            Some(raw) => normalize_seat_number(raw)?,
            None => seat.seat_number.clone(),
        };
        if seat_number != seat.seat_number
            && !repo
                .existing_numbers(library_id, std::slice::from_ref(&seat_number))
                .await?
                .is_empty()
        {
            return Err(DomainError::DuplicateSeatNumber(seat_number));
        }
        let seat_name = req
            .seat_name
            .as_deref()
            .map(str::trim)
            .unwrap_or(seat.seat_name.as_str())
            .to_string();

        match repo.update(seat_id, &seat_number, &seat_name).await {
            Ok(updated) => updated.ok_or(DomainError::SeatNotFound(seat_id)),
            Err(err) if is_unique_violation(&err) => {
                Err(DomainError::DuplicateSeatNumber(seat_number))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Flip the seat's active flag.
    ///
    /// Deactivation only blocks new bookings; existing ones keep their status.
    pub async fn toggle_active(&self, library_id: Uuid, seat_id: Uuid) -> DomainResult<Seat> {
        self.get_seat(library_id, seat_id).await?;

        let seat = SeatRepository::new(&self.db)
            .toggle_active(seat_id)
            .await?
            .ok_or(DomainError::SeatNotFound(seat_id))?;

        info!(seat_id = %seat_id, is_active = seat.is_active, "Seat toggled");
        Ok(seat)
    }

    /// Delete a seat that no booking has ever referenced
    pub async fn delete_seat(&self, library_id: Uuid, seat_id: Uuid) -> DomainResult<()> {
        self.get_seat(library_id, seat_id).await?;

        let bookings = BookingRepository::new(&self.db);
        let count = bookings.count_for_seat(seat_id).await?;
        if count > 0 {
            return Err(DomainError::SeatHasBookings { seat_id, count });
        }

        match SeatRepository::new(&self.db).delete(seat_id).await {
            Ok(true) => {}
            Ok(false) => return Err(DomainError::SeatNotFound(seat_id)),
            // A booking landed between the count and the delete
            Err(err) if is_foreign_key_violation(&err) => {
                let count = bookings.count_for_seat(seat_id).await?;
                return Err(DomainError::SeatHasBookings { seat_id, count });
            }
            Err(err) => return Err(err.into()),
        }

        self.ledger.forget_seat(seat_id).await;
        info!(seat_id = %seat_id, "Seat deleted");
        Ok(())
    }
}
