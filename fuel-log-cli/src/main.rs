use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    about, App, AuthCommand, CommandError, ConfigCommand, HomeCommand, RecordCommand,
    VehicleCommand,
};
use config::Config;
use fuel_log_core::{guard, Navigation, Route, SessionFile, SessionHandle, SupabaseClient};

#[derive(Parser)]
#[command(name = "fuel")]
#[command(version)]
#[command(about = "Track fuel fill-ups and efficiency per vehicle", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign up, log in and out
    Auth(AuthCommand),

    /// Manage vehicles
    Vehicle(VehicleCommand),

    /// Manage fuel records
    Record(RecordCommand),

    /// Show statistics and recent fill-ups
    Home(HomeCommand),

    /// Show version information
    About,

    /// Manage configuration
    Config(ConfigCommand),
}

impl Commands {
    /// Route guarded before the command runs
    fn route(&self) -> Option<Route> {
        match self {
            Commands::Auth(cmd) => cmd.route(),
            Commands::Vehicle(cmd) => Some(cmd.route()),
            Commands::Record(cmd) => Some(cmd.route()),
            Commands::Home(cmd) => Some(cmd.route()),
            Commands::About => Some(Route::About),
            Commands::Config(_) => None,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("FUEL_LOG")
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Save config path for init command
    let cli_config_path = cli.config.clone();

    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config, cli_config_path),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let (url, anon_key) = config.supabase.credentials()?;
    let client = Arc::new(
        SupabaseClient::new(url, anon_key)
            .with_session_file(SessionFile::new(config.session_path())),
    );

    // The guard below reads the holder's snapshot, so it must be initialized first
    let session = SessionHandle::spawn(client.clone());
    let state = session.initialize().await;
    tracing::debug!("Session initialized: {}", state);

    if let Some(route) = command.route() {
        match guard(route, &session.snapshot()) {
            Navigation::Proceed(_) => {}
            Navigation::Redirect(Route::Home) => {
                let user = session
                    .user()
                    .map(|u| u.display_name())
                    .unwrap_or_default();
                return Err(CommandError::AlreadySignedIn(user).into());
            }
            Navigation::Redirect(_) => return Err(CommandError::NotSignedIn.into()),
        }
    }

    let app = App::new(client, session);
    execute_command(&command, &app).await
}

async fn execute_command(command: &Commands, app: &App) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Auth(cmd) => cmd.run(app).await?,
        Commands::Vehicle(cmd) => cmd.run(app).await?,
        Commands::Record(cmd) => cmd.run(app).await?,
        Commands::Home(cmd) => cmd.run(app).await?,
        Commands::About => about(app),
        Commands::Config(_) => {}
    }

    Ok(())
}
