//! Fuel Log Core Library
//!
//! Vehicles, fill-up records and the efficiency derivation, plus the session
//! holder and stores shared by Fuel Log front ends.

pub mod backend;
pub mod efficiency;
pub mod models;
pub mod navigation;
pub mod session;
pub mod stats;
pub mod stores;

pub use backend::supabase::{SessionFile, SupabaseClient};
pub use backend::{AuthBackend, AuthChange, AuthEvent, BackendError, DataBackend};
pub use efficiency::{calculate_fuel_efficiency, sort_newest_first};
pub use models::{
    CalculatedRecord, FuelRecord, FuelRecordDraft, Session, SignUpResponse, User, Vehicle,
};
pub use navigation::{guard, Navigation, Route};
pub use session::{SessionHandle, SessionSnapshot, SessionState};
pub use stats::{summarize_by_vehicle, VehicleStats};
pub use stores::{FuelRecordStore, StoreError, VehicleStore};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
