mod about;
mod auth;
mod config_cmd;
mod home;
mod record;
mod vehicle;

use clap::ValueEnum;
use std::io::{self, Write};
use std::sync::Arc;

use fuel_log_core::{FuelRecordStore, SessionHandle, SupabaseClient, VehicleStore};

pub use about::about;
pub use auth::AuthCommand;
pub use config_cmd::ConfigCommand;
pub use home::HomeCommand;
pub use record::RecordCommand;
pub use vehicle::VehicleCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Backend client, session holder and stores shared by the commands
pub struct App {
    pub session: SessionHandle,
    pub vehicles: VehicleStore,
    pub records: FuelRecordStore,
}

impl App {
    pub fn new(client: Arc<SupabaseClient>, session: SessionHandle) -> Self {
        Self {
            vehicles: VehicleStore::new(client.clone(), session.clone()),
            records: FuelRecordStore::new(client),
            session,
        }
    }
}

/// Errors raised by the navigation guard
#[derive(Debug)]
pub enum CommandError {
    /// Command needs a signed-in user
    NotSignedIn,
    /// Command is only for signed-out users
    AlreadySignedIn(String),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::NotSignedIn => {
                write!(f, "Not signed in. Run 'fuel auth login' first.")
            }
            CommandError::AlreadySignedIn(user) => {
                write!(
                    f,
                    "Already signed in as {}. Run 'fuel auth logout' first.",
                    user
                )
            }
        }
    }
}

impl std::error::Error for CommandError {}

/// Returns `value` or reads a line from stdin after printing `label`.
pub fn prompt(label: &str, value: &Option<String>) -> io::Result<String> {
    if let Some(v) = value {
        return Ok(v.clone());
    }

    print!("{}: ", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_string();

    if input.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} cannot be empty", label),
        ));
    }
    Ok(input)
}
