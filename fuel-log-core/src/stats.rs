//! Per-vehicle summaries built from calculated fuel records.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::models::CalculatedRecord;

/// Totals and averages for one vehicle's fill-ups.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VehicleStats {
    pub vehicle_id: Uuid,
    pub record_count: usize,
    pub total_fuel: f64,
    pub total_cost: f64,
    /// Sum of positive distances between consecutive fill-ups.
    pub total_distance: f64,
    /// Cost of the fill-ups counted in `total_distance`.
    pub distance_cost: f64,
    /// Total distance over the fuel of fill-ups that have an efficiency.
    pub average_efficiency: Option<f64>,
    pub best_efficiency: Option<f64>,
    pub latest_odometer: Option<f64>,
    pub first_fill_up: Option<NaiveDate>,
    pub last_fill_up: Option<NaiveDate>,
}

impl VehicleStats {
    /// Summarizes records of a single vehicle. Order of `records` does not matter.
    pub fn from_records(vehicle_id: Uuid, records: &[CalculatedRecord]) -> Self {
        let mut stats = Self {
            vehicle_id,
            record_count: 0,
            total_fuel: 0.0,
            total_cost: 0.0,
            total_distance: 0.0,
            distance_cost: 0.0,
            average_efficiency: None,
            best_efficiency: None,
            latest_odometer: None,
            first_fill_up: None,
            last_fill_up: None,
        };

        let mut efficient_fuel = 0.0;
        let mut latest: Option<&CalculatedRecord> = None;

        for r in records.iter().filter(|r| r.vehicle_id() == vehicle_id) {
            stats.record_count += 1;
            stats.total_fuel += r.record.fuel_amount;
            stats.total_cost += r.total_cost;

            if let (Some(distance), Some(efficiency)) = (r.distance_from_previous, r.fuel_efficiency)
            {
                stats.total_distance += distance;
                efficient_fuel += r.record.fuel_amount;
                stats.distance_cost += r.total_cost;
                stats.best_efficiency = Some(match stats.best_efficiency {
                    Some(best) if best >= efficiency => best,
                    _ => efficiency,
                });
            }

            stats.first_fill_up = Some(match stats.first_fill_up {
                Some(first) if first <= r.record.date => first,
                _ => r.record.date,
            });

            let is_later = latest.map_or(true, |l| {
                (r.record.date, r.record.created_at) > (l.record.date, l.record.created_at)
            });
            if is_later {
                latest = Some(r);
            }
        }

        if let Some(l) = latest {
            stats.last_fill_up = Some(l.record.date);
            stats.latest_odometer = Some(l.record.odometer);
        }
        if efficient_fuel > 0.0 {
            stats.average_efficiency = Some(stats.total_distance / efficient_fuel);
        }

        stats
    }

    pub fn average_cost_per_km(&self) -> Option<f64> {
        if self.total_distance > 0.0 {
            Some(self.distance_cost / self.total_distance)
        } else {
            None
        }
    }
}

/// Summarizes a mixed list of records, one entry per vehicle.
pub fn summarize_by_vehicle(records: &[CalculatedRecord]) -> Vec<VehicleStats> {
    let vehicle_ids: BTreeSet<Uuid> = records.iter().map(|r| r.vehicle_id()).collect();

    vehicle_ids
        .into_iter()
        .map(|id| VehicleStats::from_records(id, records))
        .collect()
}
