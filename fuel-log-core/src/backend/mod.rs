//! Contracts for the hosted backend.
//!
//! The application never talks to the network directly; the session holder
//! and the record stores go through these traits. [`supabase::SupabaseClient`]
//! implements both against a Supabase project.

mod error;
#[cfg(test)]
pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{
    FuelRecord, FuelRecordPayload, NewVehicle, Session, SignUpResponse, Vehicle, VehicleChanges,
};

pub use error::{error_message, BackendError};

/// Auth events pushed by the backend client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// A session change, carrying the session in effect after the event.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

impl AuthChange {
    pub fn signed_in(session: Session) -> Self {
        Self {
            event: AuthEvent::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            event: AuthEvent::SignedOut,
            session: None,
        }
    }
}

/// Authentication service.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Returns the current session, refreshing it if it is about to expire.
    async fn get_session(&self) -> Result<Option<Session>, BackendError>;

    /// Subscribes to session changes. Dropping the receiver unsubscribes.
    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthChange>;

    /// Registers a new account. Never signs the caller in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, BackendError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError>;

    /// Ends the session. A `SignedOut` event follows a successful call.
    async fn sign_out(&self) -> Result<(), BackendError>;
}

/// Table access for vehicles and fuel records.
///
/// List operations return rows in display order: vehicles newest-created
/// first, fuel records by date then creation time, both descending. Fuel
/// records carry the joined vehicle name and license plate.
#[async_trait]
pub trait DataBackend: Send + Sync {
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, BackendError>;

    async fn insert_vehicle(&self, vehicle: &NewVehicle) -> Result<Vehicle, BackendError>;

    async fn update_vehicle(
        &self,
        id: Uuid,
        changes: &VehicleChanges,
    ) -> Result<Vehicle, BackendError>;

    async fn delete_vehicle(&self, id: Uuid) -> Result<(), BackendError>;

    async fn list_fuel_records(
        &self,
        vehicle_id: Option<Uuid>,
    ) -> Result<Vec<FuelRecord>, BackendError>;

    async fn insert_fuel_record(
        &self,
        payload: &FuelRecordPayload,
    ) -> Result<FuelRecord, BackendError>;

    async fn update_fuel_record(
        &self,
        id: Uuid,
        payload: &FuelRecordPayload,
    ) -> Result<FuelRecord, BackendError>;

    async fn delete_fuel_record(&self, id: Uuid) -> Result<(), BackendError>;
}
