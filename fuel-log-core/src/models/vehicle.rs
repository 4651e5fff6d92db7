use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A vehicle owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vehicle {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub license_plate: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.license_plate)
    }
}

/// Insert payload for the `vehicles` table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewVehicle {
    pub user_id: Uuid,
    pub name: String,
    pub license_plate: String,
}

/// Update payload for the `vehicles` table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VehicleChanges {
    pub name: String,
    pub license_plate: String,
}
