use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::{begin, finish, lock, StoreError, StoreState};
use crate::backend::DataBackend;
use crate::efficiency::{calculate_fuel_efficiency, sort_newest_first};
use crate::models::{CalculatedRecord, FuelRecord, FuelRecordDraft, FuelRecordPayload};

/// Fill-ups with derived fields, newest first.
///
/// Derived fields are recomputed per vehicle after every mutation; a change
/// to one vehicle's records never touches another vehicle's.
pub struct FuelRecordStore {
    backend: Arc<dyn DataBackend>,
    state: Mutex<StoreState<CalculatedRecord>>,
}

impl FuelRecordStore {
    pub fn new(backend: Arc<dyn DataBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn records(&self) -> Vec<CalculatedRecord> {
        lock(&self.state).items.clone()
    }

    pub fn records_by_vehicle(&self, vehicle_id: Uuid) -> Vec<CalculatedRecord> {
        lock(&self.state)
            .items
            .iter()
            .filter(|r| r.vehicle_id() == vehicle_id)
            .cloned()
            .collect()
    }

    pub fn record(&self, id: Uuid) -> Option<CalculatedRecord> {
        lock(&self.state).items.iter().find(|r| r.id() == id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).loading
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.state).error.clone()
    }

    pub fn clear_error(&self) {
        lock(&self.state).error = None;
    }

    /// Replaces the cache with all records, or only those of `vehicle_id`.
    pub async fn fetch_records(
        &self,
        vehicle_id: Option<Uuid>,
    ) -> Result<Vec<CalculatedRecord>, StoreError> {
        begin(&self.state);
        let result = self
            .backend
            .list_fuel_records(vehicle_id)
            .await
            .map(calculate_per_vehicle)
            .map_err(StoreError::from);
        if let Ok(records) = &result {
            lock(&self.state).items = records.clone();
        }
        finish(&self.state, result, "Error fetching fuel records")
    }

    pub async fn create_record(
        &self,
        draft: &FuelRecordDraft,
    ) -> Result<CalculatedRecord, StoreError> {
        begin(&self.state);
        let result = self.insert(draft).await;
        let result = result.and_then(|row| {
            let id = row.id;
            let mut state = lock(&self.state);
            recompute_vehicle(&mut state.items, row.vehicle_id, |records| {
                records.push(row)
            });
            calculated(&state.items, id)
        });
        finish(&self.state, result, "Error creating fuel record")
    }

    async fn insert(&self, draft: &FuelRecordDraft) -> Result<FuelRecord, StoreError> {
        let payload = validate(draft)?;
        Ok(self.backend.insert_fuel_record(&payload).await?)
    }

    /// Updates a record. If it moved to another vehicle, both vehicles'
    /// records are recomputed.
    pub async fn update_record(
        &self,
        id: Uuid,
        draft: &FuelRecordDraft,
    ) -> Result<CalculatedRecord, StoreError> {
        begin(&self.state);
        let result = self.update(id, draft).await;
        let result = result.and_then(|row| {
            let mut state = lock(&self.state);
            let previous_vehicle = state
                .items
                .iter()
                .find(|r| r.id() == id)
                .map(|r| r.vehicle_id());

            let vehicle_id = row.vehicle_id;
            recompute_vehicle(&mut state.items, vehicle_id, |records| {
                records.retain(|r| r.id != id);
                records.push(row);
            });
            if let Some(previous) = previous_vehicle.filter(|v| *v != vehicle_id) {
                recompute_vehicle(&mut state.items, previous, |records| {
                    records.retain(|r| r.id != id)
                });
            }
            calculated(&state.items, id)
        });
        finish(&self.state, result, "Error updating fuel record")
    }

    async fn update(&self, id: Uuid, draft: &FuelRecordDraft) -> Result<FuelRecord, StoreError> {
        let payload = validate(draft)?;
        Ok(self.backend.update_fuel_record(id, &payload).await?)
    }

    /// Drops the cached records of a deleted vehicle. The backend removes
    /// them together with the vehicle; other vehicles are untouched.
    pub fn forget_vehicle(&self, vehicle_id: Uuid) {
        lock(&self.state)
            .items
            .retain(|r| r.vehicle_id() != vehicle_id);
    }

    /// Deletes a record that is present in the cache.
    pub async fn delete_record(&self, id: Uuid) -> Result<(), StoreError> {
        begin(&self.state);
        let result = self.delete(id).await;
        let result = result.map(|vehicle_id| {
            let mut state = lock(&self.state);
            recompute_vehicle(&mut state.items, vehicle_id, |records| {
                records.retain(|r| r.id != id)
            });
        });
        finish(&self.state, result, "Error deleting fuel record")
    }

    async fn delete(&self, id: Uuid) -> Result<Uuid, StoreError> {
        let vehicle_id = self
            .record(id)
            .map(|r| r.vehicle_id())
            .ok_or(StoreError::NotFound(id))?;
        self.backend.delete_fuel_record(id).await?;
        Ok(vehicle_id)
    }
}

/// Checks a draft before it is sent to the backend.
fn validate(draft: &FuelRecordDraft) -> Result<FuelRecordPayload, StoreError> {
    let vehicle_id = draft.vehicle().ok_or(StoreError::MissingVehicleId)?;
    if !draft.fuel_amount.is_finite() || draft.fuel_amount <= 0.0 {
        return Err(StoreError::InvalidFuelAmount(draft.fuel_amount));
    }
    if !draft.price_per_liter.is_finite() || draft.price_per_liter < 0.0 {
        return Err(StoreError::InvalidPrice(draft.price_per_liter));
    }
    Ok(FuelRecordPayload::from_draft(vehicle_id, draft))
}

/// Runs the efficiency transform separately for each vehicle in `records`.
fn calculate_per_vehicle(records: Vec<FuelRecord>) -> Vec<CalculatedRecord> {
    let mut by_vehicle: BTreeMap<Uuid, Vec<FuelRecord>> = BTreeMap::new();
    for record in records {
        by_vehicle.entry(record.vehicle_id).or_default().push(record);
    }

    let mut calculated: Vec<CalculatedRecord> = by_vehicle
        .into_values()
        .flat_map(calculate_fuel_efficiency)
        .collect();
    sort_newest_first(&mut calculated);
    calculated
}

/// Edits one vehicle's raw records, recomputes them and reassembles the list.
fn recompute_vehicle(
    items: &mut Vec<CalculatedRecord>,
    vehicle_id: Uuid,
    edit: impl FnOnce(&mut Vec<FuelRecord>),
) {
    let (vehicle, others): (Vec<_>, Vec<_>) = std::mem::take(items)
        .into_iter()
        .partition(|r| r.vehicle_id() == vehicle_id);

    let mut raw: Vec<FuelRecord> = vehicle.into_iter().map(|r| r.record).collect();
    edit(&mut raw);

    let mut merged = calculate_fuel_efficiency(raw);
    merged.extend(others);
    sort_newest_first(&mut merged);
    *items = merged;
}

fn calculated(items: &[CalculatedRecord], id: Uuid) -> Result<CalculatedRecord, StoreError> {
    items
        .iter()
        .find(|r| r.id() == id)
        .cloned()
        .ok_or(StoreError::NotFound(id))
}
