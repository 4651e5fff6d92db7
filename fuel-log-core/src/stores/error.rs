use thiserror::Error;
use uuid::Uuid;

use crate::backend::BackendError;

/// Errors returned by store actions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Reported by the backend, message unchanged.
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("No vehicle selected for the fuel record")]
    MissingVehicleId,

    #[error("Fuel amount must be greater than zero: {0}")]
    InvalidFuelAmount(f64),

    #[error("Price per liter must not be negative: {0}")]
    InvalidPrice(f64),

    #[error("Record to delete was not found: {0}")]
    NotFound(Uuid),

    #[error("User is not signed in")]
    NotAuthenticated,
}

impl StoreError {
    /// True for failures detected before any backend call.
    pub fn is_validation(&self) -> bool {
        !matches!(self, StoreError::Backend(_))
    }
}
