//! In-memory backend used by tests.
//!
//! Behaves like the hosted service for the parts the application relies on:
//! ordering of listings, the vehicle join on fuel records, returned rows, and
//! auth events after sign-in and sign-out.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{AuthBackend, AuthChange, BackendError, DataBackend};
use crate::models::{
    FuelRecord, FuelRecordPayload, NewVehicle, Session, SignUpResponse, User, Vehicle,
    VehicleChanges, VehicleSummary,
};

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, (String, User)>,
    session: Option<Session>,
    vehicles: Vec<Vehicle>,
    records: Vec<FuelRecord>,
    fail_next: Option<BackendError>,
    data_calls: usize,
    sign_out_delay: Option<Duration>,
    sign_out_silent: bool,
}

pub struct MemoryBackend {
    inner: Mutex<Inner>,
    events: broadcast::Sender<AuthChange>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: Mutex::new(Inner::default()),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a confirmed account.
    pub fn add_account(&self, email: &str, password: &str) -> User {
        let user = test_user(email);
        self.lock()
            .accounts
            .insert(email.to_string(), (password.to_string(), user.clone()));
        user
    }

    /// Starts with `session` already persisted, as after an earlier run.
    pub fn set_session(&self, session: Option<Session>) {
        self.lock().session = session;
    }

    /// Makes the next call fail with `error`.
    pub fn fail_next(&self, error: BackendError) {
        self.lock().fail_next = Some(error);
    }

    /// Delivers the `SignedOut` event this long after `sign_out` returns.
    pub fn delay_sign_out_event(&self, delay: Duration) {
        self.lock().sign_out_delay = Some(delay);
    }

    /// Makes `sign_out` succeed without ever emitting `SignedOut`.
    pub fn suppress_sign_out_event(&self) {
        self.lock().sign_out_silent = true;
    }

    /// Pushes an event as if it came from another tab or a token refresh.
    pub fn push_event(&self, change: AuthChange) {
        self.lock().session = change.session.clone();
        let _ = self.events.send(change);
    }

    /// Number of table calls made so far.
    pub fn data_calls(&self) -> usize {
        self.lock().data_calls
    }

    pub fn seed_vehicle(&self, user_id: Uuid, name: &str, license_plate: &str) -> Vehicle {
        let now = Utc::now();
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            license_plate: license_plate.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.lock().vehicles.push(vehicle.clone());
        vehicle
    }

    pub fn seed_record(&self, payload: FuelRecordPayload) -> FuelRecord {
        let mut inner = self.lock();
        let record = new_record(&payload);
        inner.records.push(record.clone());
        with_vehicle(&inner, record)
    }

    fn take_failure(&self) -> Result<(), BackendError> {
        match self.lock().fail_next.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn data_call(&self) -> Result<MutexGuard<'_, Inner>, BackendError> {
        self.take_failure()?;
        let mut inner = self.lock();
        inner.data_calls += 1;
        Ok(inner)
    }
}

pub fn test_user(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        email: Some(email.to_string()),
        email_confirmed_at: Some(Utc::now()),
        last_sign_in_at: None,
        created_at: Some(Utc::now()),
    }
}

pub fn test_session(user: User) -> Session {
    Session {
        access_token: format!("access-{}", user.id),
        refresh_token: format!("refresh-{}", user.id),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        expires_at: Some(Utc::now().timestamp() + 3600),
        user,
    }
}

fn new_record(payload: &FuelRecordPayload) -> FuelRecord {
    let now = Utc::now();
    FuelRecord {
        id: Uuid::new_v4(),
        vehicle_id: payload.vehicle_id,
        date: payload.date,
        fuel_amount: payload.fuel_amount,
        price_per_liter: payload.price_per_liter,
        odometer: payload.odometer,
        created_at: now,
        updated_at: now,
        vehicle: None,
    }
}

fn with_vehicle(inner: &Inner, mut record: FuelRecord) -> FuelRecord {
    record.vehicle = inner
        .vehicles
        .iter()
        .find(|v| v.id == record.vehicle_id)
        .map(|v| VehicleSummary {
            name: v.name.clone(),
            license_plate: v.license_plate.clone(),
        });
    record
}

fn not_found() -> BackendError {
    BackendError::api(406, "JSON object requested, multiple (or no) rows returned")
}

#[async_trait]
impl AuthBackend for MemoryBackend {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        self.take_failure()?;
        Ok(self.lock().session.clone())
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, BackendError> {
        self.take_failure()?;
        let mut inner = self.lock();
        if inner.accounts.contains_key(email) {
            return Err(BackendError::api(422, "User already registered"));
        }
        let user = test_user(email);
        inner
            .accounts
            .insert(email.to_string(), (password.to_string(), user.clone()));
        Ok(SignUpResponse {
            user: Some(user),
            session: None,
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        self.take_failure()?;
        let session = {
            let mut inner = self.lock();
            let user = match inner.accounts.get(email) {
                Some((expected, user)) if expected == password => user.clone(),
                _ => return Err(BackendError::api(400, "Invalid login credentials")),
            };
            let session = test_session(user);
            inner.session = Some(session.clone());
            session
        };
        let _ = self.events.send(AuthChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.take_failure()?;
        let (delay, silent) = {
            let mut inner = self.lock();
            inner.session = None;
            (inner.sign_out_delay, inner.sign_out_silent)
        };
        if silent {
            return Ok(());
        }

        match delay {
            Some(delay) => {
                let events = self.events.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = events.send(AuthChange::signed_out());
                });
            }
            None => {
                let _ = self.events.send(AuthChange::signed_out());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DataBackend for MemoryBackend {
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, BackendError> {
        let inner = self.data_call()?;
        let mut vehicles = inner.vehicles.clone();
        vehicles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(vehicles)
    }

    async fn insert_vehicle(&self, vehicle: &NewVehicle) -> Result<Vehicle, BackendError> {
        let mut inner = self.data_call()?;
        let now = Utc::now();
        let row = Vehicle {
            id: Uuid::new_v4(),
            user_id: vehicle.user_id,
            name: vehicle.name.clone(),
            license_plate: vehicle.license_plate.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.vehicles.push(row.clone());
        Ok(row)
    }

    async fn update_vehicle(
        &self,
        id: Uuid,
        changes: &VehicleChanges,
    ) -> Result<Vehicle, BackendError> {
        let mut inner = self.data_call()?;
        let row = inner
            .vehicles
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(not_found)?;
        row.name = changes.name.clone();
        row.license_plate = changes.license_plate.clone();
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_vehicle(&self, id: Uuid) -> Result<(), BackendError> {
        let mut inner = self.data_call()?;
        inner.vehicles.retain(|v| v.id != id);
        inner.records.retain(|r| r.vehicle_id != id);
        Ok(())
    }

    async fn list_fuel_records(
        &self,
        vehicle_id: Option<Uuid>,
    ) -> Result<Vec<FuelRecord>, BackendError> {
        let inner = self.data_call()?;
        let mut records: Vec<FuelRecord> = inner
            .records
            .iter()
            .filter(|r| vehicle_id.map_or(true, |id| r.vehicle_id == id))
            .map(|r| with_vehicle(&inner, r.clone()))
            .collect();
        records.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(records)
    }

    async fn insert_fuel_record(
        &self,
        payload: &FuelRecordPayload,
    ) -> Result<FuelRecord, BackendError> {
        let mut inner = self.data_call()?;
        let record = new_record(payload);
        inner.records.push(record.clone());
        Ok(with_vehicle(&inner, record))
    }

    async fn update_fuel_record(
        &self,
        id: Uuid,
        payload: &FuelRecordPayload,
    ) -> Result<FuelRecord, BackendError> {
        let mut inner = self.data_call()?;
        let row = inner
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(not_found)?;
        row.vehicle_id = payload.vehicle_id;
        row.date = payload.date;
        row.fuel_amount = payload.fuel_amount;
        row.price_per_liter = payload.price_per_liter;
        row.odometer = payload.odometer;
        row.updated_at = Utc::now();
        let row = row.clone();
        Ok(with_vehicle(&inner, row))
    }

    async fn delete_fuel_record(&self, id: Uuid) -> Result<(), BackendError> {
        let mut inner = self.data_call()?;
        inner.records.retain(|r| r.id != id);
        Ok(())
    }
}
