//! Record collections backed by the data backend.
//!
//! Each store caches the rows it has seen and mutates that cache from the
//! rows the backend returns instead of re-fetching. A `loading` flag and an
//! error slot describe the last action for whoever renders the store.
//!
//! Concurrent calls to the same action are not serialized; two overlapping
//! creates both reach the backend and both land in the cache.

mod error;
mod fuel_record;
mod vehicle;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use error::StoreError;
pub use fuel_record::FuelRecordStore;
pub use vehicle::VehicleStore;

/// Cached rows plus the status of the last action.
#[derive(Debug)]
struct StoreState<T> {
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
}

impl<T> Default for StoreState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

fn lock<T>(state: &Mutex<StoreState<T>>) -> MutexGuard<'_, StoreState<T>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks an action as started: loading, error slot cleared.
fn begin<T>(state: &Mutex<StoreState<T>>) {
    let mut state = lock(state);
    state.loading = true;
    state.error = None;
}

/// Marks an action as finished, recording and logging a failure.
fn finish<T, R>(
    state: &Mutex<StoreState<T>>,
    result: Result<R, StoreError>,
    context: &str,
) -> Result<R, StoreError> {
    let mut state = lock(state);
    state.loading = false;
    if let Err(e) = &result {
        tracing::error!("{}: {}", context, e);
        state.error = Some(e.to_string());
    }
    result
}
