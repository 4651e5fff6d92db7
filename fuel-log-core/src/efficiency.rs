//! Fuel-efficiency derivation.
//!
//! Given the fill-ups of one vehicle, each record is compared with the
//! chronologically preceding one to find the distance driven and the
//! resulting km/L. The first fill-up of a vehicle has nothing to compare
//! against, so its distance and efficiency are `None`.

use std::cmp::Ordering;

use crate::models::{CalculatedRecord, FuelRecord};

/// Computes derived fields for the records of a single vehicle.
///
/// Output is sorted ascending by date (ties by `created_at`). Efficiency is
/// only reported when the odometer advanced and the amount is positive; a
/// zero or negative distance (a data entry error) yields `None` rather than a
/// negative or infinite ratio.
pub fn calculate_fuel_efficiency(records: Vec<FuelRecord>) -> Vec<CalculatedRecord> {
    let mut sorted = records;
    sorted.sort_by(chronological);

    let mut previous_odometer: Option<f64> = None;
    sorted
        .into_iter()
        .map(|record| {
            let total_cost = record.total_cost();
            let distance_from_previous = previous_odometer.map(|prev| record.odometer - prev);
            let fuel_efficiency = distance_from_previous
                .filter(|distance| *distance > 0.0 && record.fuel_amount > 0.0)
                .map(|distance| distance / record.fuel_amount);

            previous_odometer = Some(record.odometer);

            CalculatedRecord {
                record,
                total_cost,
                distance_from_previous,
                fuel_efficiency,
            }
        })
        .collect()
}

/// Sorts records newest first (date, then creation time), the display order.
pub fn sort_newest_first(records: &mut [CalculatedRecord]) {
    records.sort_by(|a, b| chronological(&b.record, &a.record));
}

fn chronological(a: &FuelRecord, b: &FuelRecord) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.created_at.cmp(&b.created_at))
}
