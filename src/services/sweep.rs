//! Time-based status sweep
//!
//! Bookings whose period has ended without the expected check-in or
//! check-out are closed: `confirmed -> missed`, `checked-in -> no-checkout`.
//! Every change goes through [`BookingLedger::transition`], so a booking that
//! was checked in while the sweep ran is left alone.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::booking_ledger::BookingLedger;
use super::error::{DomainError, DomainResult};
use crate::db::{DbPool, TimeSlotRepository};
use crate::models::{Booking, BookingPeriod, BookingQuery, BookingStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub examined: usize,
    pub missed: usize,
    pub no_checkout: usize,
    /// Moved by someone else between the scan and the transition
    pub skipped: usize,
    pub failed: usize,
}

/// Status an overdue booking should move to, if it is overdue.
///
/// A daily booking is overdue once its slot has ended on its date; a monthly
/// booking once its end date has passed. `slot_end` is only read for daily
/// bookings.
pub fn overdue_target(
    booking: &Booking,
    slot_end: Option<NaiveTime>,
    now_local: NaiveDateTime,
) -> Option<BookingStatus> {
    let target = match booking.status {
        BookingStatus::Confirmed => BookingStatus::Missed,
        BookingStatus::CheckedIn => BookingStatus::NoCheckout,
        _ => return None,
    };

    let overdue = match booking.period {
        BookingPeriod::Daily { booking_date, .. } => {
            slot_end.is_some_and(|end| booking_date.and_time(end) <= now_local)
        }
        BookingPeriod::Monthly { end_date, .. } => end_date < now_local.date(),
    };

    overdue.then_some(target)
}

pub struct StatusSweeper {
    db: DbPool,
    ledger: BookingLedger,
    offset: FixedOffset,
}

impl StatusSweeper {
    /// `offset` is the libraries' wall-clock offset from UTC
    pub fn new(db: DbPool, ledger: BookingLedger, offset: FixedOffset) -> Self {
        Self { db, ledger, offset }
    }

    pub async fn sweep(&self, now: DateTime<Utc>, dry_run: bool) -> DomainResult<SweepReport> {
        let now_local = now.with_timezone(&self.offset).naive_local();
        let mut report = SweepReport::default();
        let mut slot_ends: HashMap<Uuid, Option<NaiveTime>> = HashMap::new();

        for status in [BookingStatus::Confirmed, BookingStatus::CheckedIn] {
            let candidates = self
                .ledger
                .find(&BookingQuery {
                    status: Some(status),
                    to: Some(now_local.date()),
                    ..Default::default()
                })
                .await?;

            for booking in candidates {
                report.examined += 1;

                let slot_end = match booking.period.time_slot_id() {
                    Some(slot_id) => self.slot_end(&mut slot_ends, slot_id).await?,
                    None => None,
                };
                let Some(target) = overdue_target(&booking, slot_end, now_local) else {
                    continue;
                };

                if dry_run {
                    info!(booking_id = %booking.id, from = %booking.status, to = %target, "Would transition");
                    report.count(target);
                    continue;
                }

                match self
                    .ledger
                    .transition(booking.library_id, booking.id, target)
                    .await
                {
                    Ok(_) => report.count(target),
                    Err(DomainError::IllegalTransition { from, .. }) => {
                        debug!(booking_id = %booking.id, status = %from, "Booking moved during sweep");
                        report.skipped += 1;
                    }
                    Err(err) => {
                        error!(booking_id = %booking.id, error = %err, "Sweep transition failed");
                        report.failed += 1;
                    }
                }
            }
        }

        if report.failed > 0 {
            warn!(failed = report.failed, "Sweep finished with failures");
        }
        Ok(report)
    }

    async fn slot_end(
        &self,
        cache: &mut HashMap<Uuid, Option<NaiveTime>>,
        slot_id: Uuid,
    ) -> DomainResult<Option<NaiveTime>> {
        if let Some(end) = cache.get(&slot_id) {
            return Ok(*end);
        }
        let end = TimeSlotRepository::new(&self.db)
            .get_by_id(slot_id)
            .await?
            .and_then(|slot| slot.end_naive_time());
        cache.insert(slot_id, end);
        Ok(end)
    }
}

impl SweepReport {
    fn count(&mut self, target: BookingStatus) {
        match target {
            BookingStatus::Missed => self.missed += 1,
            BookingStatus::NoCheckout => self.no_checkout += 1,
            _ => {}
        }
    }
}
