use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use fuel_log_core::{summarize_by_vehicle, CalculatedRecord, Route, Vehicle, VehicleStats};

use super::{App, OutputFormat};

/// Dashboard: per-vehicle statistics and recent fill-ups
#[derive(Args)]
pub struct HomeCommand {
    /// Only this vehicle
    #[arg(long, short)]
    vehicle: Option<Uuid>,

    /// Number of recent fill-ups to show per vehicle
    #[arg(long, short, default_value = "3")]
    limit: usize,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Serialize)]
struct VehicleOverview<'a> {
    vehicle: &'a Vehicle,
    stats: VehicleStats,
    recent: Vec<&'a CalculatedRecord>,
}

impl HomeCommand {
    pub fn route(&self) -> Route {
        Route::Home
    }

    pub async fn run(&self, app: &App) -> Result<(), Box<dyn std::error::Error>> {
        let vehicles = app.vehicles.fetch_vehicles().await?;
        let records = app.records.fetch_records(self.vehicle).await?;
        let mut stats = summarize_by_vehicle(&records);

        let overview: Vec<VehicleOverview> = vehicles
            .iter()
            .filter(|v| self.vehicle.map_or(true, |id| v.id == id))
            .map(|vehicle| {
                let stats = match stats.iter().position(|s| s.vehicle_id == vehicle.id) {
                    Some(i) => stats.swap_remove(i),
                    None => VehicleStats::from_records(vehicle.id, &[]),
                };
                let recent = records
                    .iter()
                    .filter(|r| r.vehicle_id() == vehicle.id)
                    .take(self.limit)
                    .collect();
                VehicleOverview {
                    vehicle,
                    stats,
                    recent,
                }
            })
            .collect();

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            }
            OutputFormat::Text => print_overview(&overview),
        }
        Ok(())
    }
}

fn print_overview(overview: &[VehicleOverview<'_>]) {
    if overview.is_empty() {
        println!("No vehicles yet. Add one with 'fuel vehicle create'.");
        return;
    }

    for (i, item) in overview.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let stats = &item.stats;
        println!("{}", item.vehicle);
        println!("{}", "=".repeat(72));
        println!("  Fill-ups:        {}", stats.record_count);
        println!("  Total fuel:      {:.2} L", stats.total_fuel);
        println!("  Total cost:      {:.2}", stats.total_cost);
        println!("  Distance:        {:.1} km", stats.total_distance);
        if let Some(avg) = stats.average_efficiency {
            println!("  Avg efficiency:  {:.2} km/L", avg);
        }
        if let Some(best) = stats.best_efficiency {
            println!("  Best efficiency: {:.2} km/L", best);
        }
        if let Some(cost) = stats.average_cost_per_km() {
            println!("  Cost per km:     {:.2}", cost);
        }
        if let Some(odometer) = stats.latest_odometer {
            println!("  Odometer:        {:.1} km", odometer);
        }

        if !item.recent.is_empty() {
            println!("\n  Recent fill-ups:");
            for r in &item.recent {
                println!("    {}", r);
            }
        }
    }
}
