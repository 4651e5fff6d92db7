use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::{begin, finish, lock, StoreError, StoreState};
use crate::backend::DataBackend;
use crate::models::{NewVehicle, Vehicle, VehicleChanges};
use crate::session::SessionHandle;

/// The signed-in user's vehicles, newest first.
pub struct VehicleStore {
    backend: Arc<dyn DataBackend>,
    session: SessionHandle,
    state: Mutex<StoreState<Vehicle>>,
}

impl VehicleStore {
    pub fn new(backend: Arc<dyn DataBackend>, session: SessionHandle) -> Self {
        Self {
            backend,
            session,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn vehicles(&self) -> Vec<Vehicle> {
        lock(&self.state).items.clone()
    }

    pub fn vehicle(&self, id: Uuid) -> Option<Vehicle> {
        lock(&self.state).items.iter().find(|v| v.id == id).cloned()
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

    /// Replaces the cache with all vehicles, newest-created first.
    pub async fn fetch_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        begin(&self.state);
        let result = self.backend.list_vehicles().await.map_err(StoreError::from);
        if let Ok(vehicles) = &result {
            lock(&self.state).items = vehicles.clone();
        }
        finish(&self.state, result, "Error fetching vehicles")
    }

    /// Creates a vehicle owned by the signed-in user.
    pub async fn create_vehicle(
        &self,
        name: &str,
        license_plate: &str,
    ) -> Result<Vehicle, StoreError> {
        begin(&self.state);
        let result = self.insert(name, license_plate).await;
        if let Ok(vehicle) = &result {
            lock(&self.state).items.insert(0, vehicle.clone());
        }
        finish(&self.state, result, "Error creating vehicle")
    }

    async fn insert(&self, name: &str, license_plate: &str) -> Result<Vehicle, StoreError> {
        let user = self.session.user().ok_or(StoreError::NotAuthenticated)?;
        let vehicle = NewVehicle {
            user_id: user.id,
            name: name.to_string(),
            license_plate: license_plate.to_string(),
        };
        Ok(self.backend.insert_vehicle(&vehicle).await?)
    }

    /// Updates name and plate; the cached row is replaced in place.
    pub async fn update_vehicle(
        &self,
        id: Uuid,
        name: &str,
        license_plate: &str,
    ) -> Result<Vehicle, StoreError> {
        begin(&self.state);
        let changes = VehicleChanges {
            name: name.to_string(),
            license_plate: license_plate.to_string(),
        };
        let result = self
            .backend
            .update_vehicle(id, &changes)
            .await
            .map_err(StoreError::from);
        if let Ok(vehicle) = &result {
            let mut state = lock(&self.state);
            if let Some(slot) = state.items.iter_mut().find(|v| v.id == id) {
                *slot = vehicle.clone();
            }
        }
        finish(&self.state, result, "Error updating vehicle")
    }

    /// Deletes a vehicle. The backend deletes its fuel records too, so a
    /// [`FuelRecordStore`](super::FuelRecordStore) holding them must call
    /// `forget_vehicle` or re-fetch.
    pub async fn delete_vehicle(&self, id: Uuid) -> Result<(), StoreError> {
        begin(&self.state);
        let result = self
            .backend
            .delete_vehicle(id)
            .await
            .map_err(StoreError::from);
        if result.is_ok() {
            lock(&self.state).items.retain(|v| v.id != id);
        }
        finish(&self.state, result, "Error deleting vehicle")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::backend::BackendError;
    use crate::models::FuelRecordPayload;
    use crate::stores::FuelRecordStore;

    async fn setup(signed_in: bool) -> (Arc<MemoryBackend>, VehicleStore) {
        let backend = Arc::new(MemoryBackend::new());
        let session = SessionHandle::spawn(backend.clone());
        session.initialize().await;
        if signed_in {
            backend.add_account("driver@example.com", "secret");
            session
                .sign_in("driver@example.com", "secret")
                .await
                .unwrap();
        }
        let store = VehicleStore::new(backend.clone(), session);
        (backend, store)
    }

    #[tokio::test]
    async fn test_create_stamps_signed_in_user() {
        let (_backend, store) = setup(true).await;
        let user_id = store.session.user().unwrap().id;

        let vehicle = store.create_vehicle("Kei Van", "ABC-123").await.unwrap();

        assert_eq!(vehicle.user_id, user_id);
        assert_eq!(store.vehicles(), vec![vehicle]);
        assert!(!store.is_loading());
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_create_requires_identity() {
        let (backend, store) = setup(false).await;

        let err = store.create_vehicle("Kei Van", "ABC-123").await.unwrap_err();

        assert_eq!(err, StoreError::NotAuthenticated);
        assert_eq!(backend.data_calls(), 0);
        assert_eq!(store.error(), Some("User is not signed in".to_string()));
        assert!(store.vehicles().is_empty());
    }

    #[tokio::test]
    async fn test_create_prepends_to_cache() {
        let (backend, store) = setup(true).await;
        let user_id = store.session.user().unwrap().id;
        backend.seed_vehicle(user_id, "Old Car", "OLD-1");
        store.fetch_vehicles().await.unwrap();

        store.create_vehicle("New Car", "NEW-1").await.unwrap();

        let names: Vec<String> = store.vehicles().into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["New Car", "Old Car"]);
    }

    #[tokio::test]
    async fn test_fetch_newest_first() {
        let (backend, store) = setup(true).await;
        let user_id = store.session.user().unwrap().id;
        backend.seed_vehicle(user_id, "First", "A-1");
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        backend.seed_vehicle(user_id, "Second", "B-2");

        let vehicles = store.fetch_vehicles().await.unwrap();

        assert_eq!(vehicles[0].name, "Second");
        assert_eq!(vehicles[1].name, "First");
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let (backend, store) = setup(true).await;
        let user_id = store.session.user().unwrap().id;
        let first = backend.seed_vehicle(user_id, "First", "A-1");
        backend.seed_vehicle(user_id, "Second", "B-2");
        store.fetch_vehicles().await.unwrap();
        let position = store
            .vehicles()
            .iter()
            .position(|v| v.id == first.id)
            .unwrap();

        let updated = store
            .update_vehicle(first.id, "Renamed", "A-9")
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(store.vehicles()[position], updated);
        assert_eq!(store.vehicle(first.id).unwrap().license_plate, "A-9");
    }

    #[tokio::test]
    async fn test_delete_removes_from_cache() {
        let (backend, store) = setup(true).await;
        let user_id = store.session.user().unwrap().id;
        let vehicle = backend.seed_vehicle(user_id, "Car", "C-1");
        store.fetch_vehicles().await.unwrap();

        store.delete_vehicle(vehicle.id).await.unwrap();

        assert!(store.vehicles().is_empty());
        assert!(store.vehicle(vehicle.id).is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_fuel_records() {
        let (backend, store) = setup(true).await;
        let user_id = store.session.user().unwrap().id;
        let car = backend.seed_vehicle(user_id, "Car", "C-1");
        let van = backend.seed_vehicle(user_id, "Van", "V-1");
        for (vehicle_id, odometer) in [(car.id, 1000.0), (car.id, 1400.0), (van.id, 500.0)] {
            backend.seed_record(FuelRecordPayload {
                vehicle_id,
                date: chrono::NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                fuel_amount: 40.0,
                price_per_liter: 170.0,
                odometer,
            });
        }
        let records = FuelRecordStore::new(backend.clone());
        records.fetch_records(None).await.unwrap();
        store.fetch_vehicles().await.unwrap();

        store.delete_vehicle(car.id).await.unwrap();
        records.forget_vehicle(car.id);

        assert!(records.records_by_vehicle(car.id).is_empty());
        assert_eq!(records.records_by_vehicle(van.id).len(), 1);
        assert_eq!(records.fetch_records(None).await.unwrap(), records.records());
    }

    #[tokio::test]
    async fn test_backend_error_recorded_and_propagated() {
        let (backend, store) = setup(true).await;
        backend.fail_next(BackendError::api(500, "relation \"vehicles\" does not exist"));

        let err = store.fetch_vehicles().await.unwrap_err();

        assert_eq!(err.to_string(), "relation \"vehicles\" does not exist");
        assert_eq!(store.error(), Some(err.to_string()));
        assert!(!store.is_loading());

        store.clear_error();
        assert!(store.error().is_none());
    }
}
