mod auth;
mod fuel_record;
mod vehicle;

pub use auth::{Session, SignUpResponse, User};
pub use fuel_record::{
    CalculatedRecord, FuelRecord, FuelRecordDraft, FuelRecordPayload, VehicleSummary,
};
pub use vehicle::{NewVehicle, Vehicle, VehicleChanges};
