use super::App;

/// Prints version and account information
pub fn about(app: &App) {
    println!("Fuel Log {}", env!("CARGO_PKG_VERSION"));
    println!("core library {}", fuel_log_core::version());
    println!();
    println!("Track fill-ups per vehicle and see distance and km/L between them.");
    if let Some(user) = app.session.user() {
        println!();
        println!("Signed in as {}", user.display_name());
    }
}
