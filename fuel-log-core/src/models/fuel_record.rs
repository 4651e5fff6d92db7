use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Vehicle columns joined onto a fuel record (`vehicles(name, license_plate)`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleSummary {
    pub name: String,
    pub license_plate: String,
}

/// A single fill-up as stored in the `fuel_records` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuelRecord {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub date: NaiveDate,
    /// Litres
    pub fuel_amount: f64,
    pub price_per_liter: f64,
    /// Kilometres
    pub odometer: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "vehicles", default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<VehicleSummary>,
}

impl FuelRecord {
    pub fn total_cost(&self) -> f64 {
        self.fuel_amount * self.price_per_liter
    }
}

/// User-entered values for creating or updating a fuel record.
///
/// `vehicle_id` is optional because a form may be submitted before a vehicle
/// is chosen; stores reject a missing (or nil) vehicle before any backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct FuelRecordDraft {
    pub vehicle_id: Option<Uuid>,
    pub date: NaiveDate,
    pub fuel_amount: f64,
    pub price_per_liter: f64,
    pub odometer: f64,
}

impl FuelRecordDraft {
    pub fn new(
        vehicle_id: Uuid,
        date: NaiveDate,
        fuel_amount: f64,
        price_per_liter: f64,
        odometer: f64,
    ) -> Self {
        Self {
            vehicle_id: Some(vehicle_id),
            date,
            fuel_amount,
            price_per_liter,
            odometer,
        }
    }

    /// Returns the vehicle reference if one has been chosen.
    pub fn vehicle(&self) -> Option<Uuid> {
        self.vehicle_id.filter(|id| !id.is_nil())
    }
}

/// Insert/update payload for the `fuel_records` table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FuelRecordPayload {
    pub vehicle_id: Uuid,
    pub date: NaiveDate,
    pub fuel_amount: f64,
    pub price_per_liter: f64,
    pub odometer: f64,
}

impl FuelRecordPayload {
    pub fn from_draft(vehicle_id: Uuid, draft: &FuelRecordDraft) -> Self {
        Self {
            vehicle_id,
            date: draft.date,
            fuel_amount: draft.fuel_amount,
            price_per_liter: draft.price_per_liter,
            odometer: draft.odometer,
        }
    }
}

/// A fuel record with its derived fields.
///
/// The derived fields are computed by [`crate::efficiency::calculate_fuel_efficiency`]
/// relative to the previous fill-up of the same vehicle and are never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CalculatedRecord {
    #[serde(flatten)]
    pub record: FuelRecord,
    pub total_cost: f64,
    pub distance_from_previous: Option<f64>,
    /// km/L
    pub fuel_efficiency: Option<f64>,
}

impl CalculatedRecord {
    pub fn id(&self) -> Uuid {
        self.record.id
    }

    pub fn vehicle_id(&self) -> Uuid {
        self.record.vehicle_id
    }
}

impl fmt::Display for CalculatedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = &self.record;
        write!(
            f,
            "{}  {:>7.2} L @ {:.2}  = {:>9.2}  odo {:>9.1}",
            record.date, record.fuel_amount, record.price_per_liter, self.total_cost, record.odometer
        )?;
        if let Some(distance) = self.distance_from_previous {
            write!(f, "  +{:.1} km", distance)?;
        }
        if let Some(efficiency) = self.fuel_efficiency {
            write!(f, "  {:.2} km/L", efficiency)?;
        }
        Ok(())
    }
}
