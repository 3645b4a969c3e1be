//! Library profile management

use tracing::info;
use uuid::Uuid;

use super::error::{DomainError, DomainResult};
use crate::config::BookingConfig;
use crate::db::{DbPool, LibraryRepository};
use crate::models::{CreateLibraryRequest, Library, UpdateLibraryRequest};
use crate::utils::validation::is_positive_amount;

#[derive(Clone)]
pub struct LibraryService {
    db: DbPool,
    default_hourly_fee: f64,
    default_monthly_fee: f64,
}

impl LibraryService {
    pub fn new(db: DbPool, config: &BookingConfig) -> Self {
        Self {
            db,
            default_hourly_fee: config.default_hourly_fee,
            default_monthly_fee: config.default_monthly_fee,
        }
    }

    /// Register a library; omitted fees fall back to the configured defaults
    pub async fn register(&self, req: &CreateLibraryRequest) -> DomainResult<Library> {
        let hourly_fee = req.hourly_fee.unwrap_or(self.default_hourly_fee);
        let monthly_fee = req.monthly_fee.unwrap_or(self.default_monthly_fee);
        if !is_positive_amount(monthly_fee) {
            return Err(DomainError::InvalidPrice(monthly_fee));
        }
        if !hourly_fee.is_finite() || hourly_fee < 0.0 {
            return Err(DomainError::InvalidPrice(hourly_fee));
        }

        let library = LibraryRepository::new(&self.db)
            .create(&req.name, hourly_fee, monthly_fee)
            .await?;

        info!(library_id = %library.id, name = %library.name, "Library registered");
        Ok(library)
    }

    pub async fn get(&self, library_id: Uuid) -> DomainResult<Library> {
        LibraryRepository::new(&self.db)
            .get_by_id(library_id)
            .await?
            .ok_or(DomainError::LibraryNotFound(library_id))
    }

    /// The library, provided it still accepts new seats, slots and bookings
    pub async fn require_active(&self, library_id: Uuid) -> DomainResult<Library> {
        let library = self.get(library_id).await?;
        if !library.is_active {
            return Err(DomainError::LibraryInactive(library_id));
        }
        Ok(library)
    }

    pub async fn update(
        &self,
        library_id: Uuid,
        req: &UpdateLibraryRequest,
    ) -> DomainResult<Library> {
        if let Some(fee) = req.monthly_fee {
            if !is_positive_amount(fee) {
                return Err(DomainError::InvalidPrice(fee));
            }
        }

        LibraryRepository::new(&self.db)
            .update(library_id, req)
            .await?
            .ok_or(DomainError::LibraryNotFound(library_id))
    }

    /// Stop accepting new seats, slots and bookings. Existing bookings are untouched.
    pub async fn deactivate(&self, library_id: Uuid) -> DomainResult<Library> {
        let library = LibraryRepository::new(&self.db)
            .set_active(library_id, false)
            .await?
            .ok_or(DomainError::LibraryNotFound(library_id))?;

        info!(library_id = %library_id, "Library deactivated");
        Ok(library)
    }
}
