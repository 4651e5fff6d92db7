use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};
use uuid::Uuid;

use fuel_log_core::{CalculatedRecord, FuelRecordDraft, Route};

use super::{App, OutputFormat};

#[derive(Args)]
pub struct RecordCommand {
    #[command(subcommand)]
    pub command: RecordSubcommand,
}

#[derive(Subcommand)]
pub enum RecordSubcommand {
    /// List fill-ups, newest first, with distance and efficiency
    List {
        /// Only this vehicle's records
        #[arg(long, short)]
        vehicle: Option<Uuid>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Record a fill-up
    Add {
        /// Vehicle ID
        #[arg(long, short)]
        vehicle: Uuid,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<NaiveDate>,

        /// Fuel amount in liters
        #[arg(long, short)]
        amount: f64,

        /// Price per liter
        #[arg(long, short)]
        price: f64,

        /// Odometer reading in km
        #[arg(long, short)]
        odometer: f64,
    },

    /// Change a fill-up; omitted fields keep their value
    Update {
        /// Record ID
        id: Uuid,

        /// Move the record to another vehicle
        #[arg(long, short)]
        vehicle: Option<Uuid>,

        /// Date (YYYY-MM-DD)
        #[arg(long, short)]
        date: Option<NaiveDate>,

        /// Fuel amount in liters
        #[arg(long, short)]
        amount: Option<f64>,

        /// Price per liter
        #[arg(long, short)]
        price: Option<f64>,

        /// Odometer reading in km
        #[arg(long, short)]
        odometer: Option<f64>,
    },

    /// Delete a fill-up
    Delete {
        /// Record ID
        id: Uuid,
    },
}

impl RecordCommand {
    pub fn route(&self) -> Route {
        match &self.command {
            RecordSubcommand::List { .. } | RecordSubcommand::Delete { .. } => Route::FuelRecords,
            RecordSubcommand::Add { .. } => Route::FuelRecordCreate,
            RecordSubcommand::Update { id, .. } => Route::FuelRecordEdit(*id),
        }
    }

    pub async fn run(&self, app: &App) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            RecordSubcommand::List { vehicle, format } => {
                let records = app.records.fetch_records(*vehicle).await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&records)?);
                    }
                    OutputFormat::Text => print_records(&records),
                }
                Ok(())
            }

            RecordSubcommand::Add {
                vehicle,
                date,
                amount,
                price,
                odometer,
            } => {
                // Load the vehicle's history so the new record gets its distance
                app.records.fetch_records(Some(*vehicle)).await?;

                let date = date.unwrap_or_else(|| Local::now().date_naive());
                let draft = FuelRecordDraft::new(*vehicle, date, *amount, *price, *odometer);
                let record = app.records.create_record(&draft).await?;

                println!("Recorded fill-up:");
                println!("  {}", record);
                println!("\nRecord ID: {}", record.id());
                Ok(())
            }

            RecordSubcommand::Update {
                id,
                vehicle,
                date,
                amount,
                price,
                odometer,
            } => {
                app.records.fetch_records(None).await?;
                let existing = app
                    .records
                    .record(*id)
                    .ok_or_else(|| format!("Fuel record not found: {}", id))?
                    .record;

                let draft = FuelRecordDraft {
                    vehicle_id: Some(vehicle.unwrap_or(existing.vehicle_id)),
                    date: date.unwrap_or(existing.date),
                    fuel_amount: amount.unwrap_or(existing.fuel_amount),
                    price_per_liter: price.unwrap_or(existing.price_per_liter),
                    odometer: odometer.unwrap_or(existing.odometer),
                };
                let record = app.records.update_record(*id, &draft).await?;

                println!("Updated fill-up:");
                println!("  {}", record);
                Ok(())
            }

            RecordSubcommand::Delete { id } => {
                app.records.fetch_records(None).await?;
                app.records.delete_record(*id).await?;
                println!("Deleted fuel record: {}", id);
                Ok(())
            }
        }
    }
}

pub fn print_records(records: &[CalculatedRecord]) {
    if records.is_empty() {
        println!("No fuel records found. Add one with 'fuel record add'.");
        return;
    }

    let mut current_vehicle: Option<Uuid> = None;
    for r in records {
        // records are grouped visually only when consecutive
        if current_vehicle != Some(r.vehicle_id()) {
            if current_vehicle.is_some() {
                println!();
            }
            match &r.record.vehicle {
                Some(v) => println!("{} ({})", v.name, v.license_plate),
                None => println!("Vehicle {}", r.vehicle_id()),
            }
            println!("{}", "-".repeat(72));
            current_vehicle = Some(r.vehicle_id());
        }
        println!("  {}", r);
        println!("    ID: {}", r.id());
    }

    println!("\nTotal: {} record(s)", records.len());
}
