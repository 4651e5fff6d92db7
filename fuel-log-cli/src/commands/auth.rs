//! Account commands: sign-up, login, logout and status.

use clap::{Args, Subcommand};

use fuel_log_core::Route;

use super::{prompt, App, OutputFormat};

/// Authentication commands
#[derive(Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand)]
pub enum AuthSubcommand {
    /// Create an account (confirm it by email, then log in)
    Signup {
        /// Email address (prompted if omitted)
        #[arg(long, short)]
        email: Option<String>,

        /// Password (prompted if omitted)
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Log in with email and password
    Login {
        /// Email address (prompted if omitted)
        #[arg(long, short)]
        email: Option<String>,

        /// Password (prompted if omitted)
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Log out and forget the saved session
    Logout,

    /// Show authentication status
    Status {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl AuthCommand {
    /// Route this command stands for; status and logout are unguarded.
    pub fn route(&self) -> Option<Route> {
        match &self.command {
            AuthSubcommand::Signup { .. } => Some(Route::Register),
            AuthSubcommand::Login { .. } => Some(Route::Login),
            AuthSubcommand::Logout | AuthSubcommand::Status { .. } => None,
        }
    }

    pub async fn run(&self, app: &App) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            AuthSubcommand::Signup { email, password } => {
                let email = prompt("Email", email)?;
                let password = prompt("Password", password)?;

                let response = app.session.sign_up(&email, &password).await?;
                if response.needs_confirmation() {
                    println!("Account created for {}.", email);
                    println!("Check your inbox to confirm it, then run 'fuel auth login'.");
                } else {
                    println!("Account created for {}. Run 'fuel auth login' to sign in.", email);
                }
                Ok(())
            }

            AuthSubcommand::Login { email, password } => {
                let email = prompt("Email", email)?;
                let password = prompt("Password", password)?;

                let session = app.session.sign_in(&email, &password).await?;
                println!("Signed in as {}", session.user.display_name());
                Ok(())
            }

            AuthSubcommand::Logout => {
                if !app.session.is_authenticated() {
                    println!("Not signed in.");
                    return Ok(());
                }
                app.session.sign_out().await?;
                println!("Signed out.");
                Ok(())
            }

            AuthSubcommand::Status { format } => {
                let snapshot = app.session.snapshot();
                match format {
                    OutputFormat::Json => {
                        let status = serde_json::json!({
                            "state": snapshot.state.to_string(),
                            "user": snapshot.user(),
                            "expires_at": snapshot.session.as_ref().and_then(|s| s.expires_at),
                        });
                        println!("{}", serde_json::to_string_pretty(&status)?);
                    }
                    OutputFormat::Text => match snapshot.user() {
                        Some(user) => {
                            println!("Status: signed in");
                            println!("User: {}", user.display_name());
                            println!("User ID: {}", user.id);
                        }
                        None => {
                            println!("Status: signed out");
                            println!("\nRun 'fuel auth login' to sign in.");
                        }
                    },
                }
                Ok(())
            }
        }
    }
}
