use clap::{Args, Subcommand};
use uuid::Uuid;

use fuel_log_core::{Route, Vehicle};

use super::{App, OutputFormat};

#[derive(Args)]
pub struct VehicleCommand {
    #[command(subcommand)]
    pub command: VehicleSubcommand,
}

#[derive(Subcommand)]
pub enum VehicleSubcommand {
    /// List your vehicles
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Register a vehicle
    Create {
        /// Display name
        #[arg(long, short)]
        name: String,

        /// License plate
        #[arg(long, short)]
        plate: String,
    },

    /// Change a vehicle's name or plate
    Update {
        /// Vehicle ID
        id: Uuid,

        /// New display name
        #[arg(long, short)]
        name: Option<String>,

        /// New license plate
        #[arg(long, short)]
        plate: Option<String>,
    },

    /// Delete a vehicle and its fuel records
    Delete {
        /// Vehicle ID
        id: Uuid,
    },
}

impl VehicleCommand {
    pub fn route(&self) -> Route {
        match &self.command {
            VehicleSubcommand::List { .. } | VehicleSubcommand::Delete { .. } => Route::Vehicles,
            VehicleSubcommand::Create { .. } => Route::VehicleCreate,
            VehicleSubcommand::Update { id, .. } => Route::VehicleEdit(*id),
        }
    }

    pub async fn run(&self, app: &App) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            VehicleSubcommand::List { format } => {
                let vehicles = app.vehicles.fetch_vehicles().await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&vehicles)?);
                    }
                    OutputFormat::Text => print_vehicles(&vehicles),
                }
                Ok(())
            }

            VehicleSubcommand::Create { name, plate } => {
                let vehicle = app.vehicles.create_vehicle(name, plate).await?;
                println!("Created vehicle: {}", vehicle);
                println!("ID: {}", vehicle.id);
                Ok(())
            }

            VehicleSubcommand::Update { id, name, plate } => {
                app.vehicles.fetch_vehicles().await?;
                let existing = app
                    .vehicles
                    .vehicle(*id)
                    .ok_or_else(|| format!("Vehicle not found: {}", id))?;

                let name = name.as_deref().unwrap_or(&existing.name);
                let plate = plate.as_deref().unwrap_or(&existing.license_plate);
                let vehicle = app.vehicles.update_vehicle(*id, name, plate).await?;
                println!("Updated vehicle: {}", vehicle);
                Ok(())
            }

            VehicleSubcommand::Delete { id } => {
                app.vehicles.delete_vehicle(*id).await?;
                app.records.forget_vehicle(*id);
                println!("Deleted vehicle: {}", id);
                Ok(())
            }
        }
    }
}

fn print_vehicles(vehicles: &[Vehicle]) {
    if vehicles.is_empty() {
        println!("No vehicles yet. Add one with 'fuel vehicle create'.");
        return;
    }

    println!("{:<36}  {:<24}  {:<12}  Added", "ID", "Name", "Plate");
    println!("{}", "-".repeat(90));
    for v in vehicles {
        println!(
            "{:<36}  {:<24}  {:<12}  {}",
            v.id,
            v.name,
            v.license_plate,
            v.created_at.format("%Y-%m-%d")
        );
    }
    println!("\nTotal: {} vehicle(s)", vehicles.len());
}
