//! SpotOn Demo
//!
//! Authenticates with the configured credentials, fetches one location and
//! its menus, and prints them.
//!
//! # Running
//!
//! ```bash
//! SPOTON_API_KEY=your-api-key cargo run -p spoton-demo
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use spoton_core::{ErrorKind, Location, Menu, SpotOnClient, SpotOnError};
use tokio::sync::oneshot;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

mod settings;

use settings::DemoSettings;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let settings = DemoSettings::load()?;
    init_logging(&settings.log_level);

    if let Some(path) = &settings.config_path {
        info!("Loaded settings from {:?}", path);
    }

    let config = settings.client_config()?;
    let client = SpotOnClient::new(config).context("Failed to create client")?;
    info!(
        "Using {} authentication against {}",
        client.config().credential().mode(),
        client.config().base_url()
    );

    match run(&client, &settings.location_id).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            report_error(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt().with_env_filter(filter).with_target(false).init();
}

async fn run(client: &SpotOnClient, location_id: &str) -> spoton_core::Result<()> {
    client.authenticate().await?;
    println!("Authenticated.");

    match client.business().get_location(location_id).await? {
        Some(location) => print_location(&location),
        None => println!("Location {} not found.", location_id),
    }

    // Menus go through the callback form.
    let (tx, rx) = oneshot::channel();
    let handle = client.menus().get_menus_with(location_id, move |result| {
        let _ = tx.send(result);
    });
    debug!("Menu request in flight: {:?}", handle);

    let menus = match rx.await {
        Ok(result) => result?,
        Err(_) => return Err(SpotOnError::network("menu request was cancelled")),
    };
    match menus {
        Some(menus) => print_menus(&menus),
        None => println!("No menus found for {}.", location_id),
    }

    Ok(())
}

fn print_location(location: &Location) {
    println!("Location: {} ({})", location.name, location.id);
    if let Some(email) = &location.email {
        println!("  Email:    {}", email);
    }
    if let Some(phone) = &location.phone {
        println!("  Phone:    {}", phone);
    }
    if let Some(address) = &location.address {
        let mut street = address.address_line1.clone();
        if let Some(line2) = &address.address_line2 {
            street.push_str(", ");
            street.push_str(line2);
        }
        println!(
            "  Address:  {}, {}, {} {}, {}",
            street, address.city, address.state, address.zip, address.country
        );
    }
    if let Some(geo) = &location.geolocation {
        println!("  Geo:      {}, {}", geo.latitude, geo.longitude);
    }
    if let Some(timezone) = &location.timezone {
        println!("  Timezone: {}", timezone);
    }
}

fn print_menus(menus: &[Menu]) {
    println!("Menus ({}):", menus.len());
    for menu in menus {
        let status = match menu.active {
            Some(true) => "active",
            Some(false) => "inactive",
            None => "unknown",
        };
        println!("  - {} [{}] ({})", menu.name, menu.id, status);
        if let Some(description) = &menu.description {
            println!("      {}", description);
        }
    }
}

fn report_error(e: &SpotOnError) {
    match e.kind() {
        ErrorKind::Authentication => {
            eprintln!("Authentication failed: {}", e.message());
            eprintln!("Check the configured API key or client credentials.");
        }
        ErrorKind::Network => eprintln!("Network error: {}", e.message()),
        ErrorKind::Api => eprintln!(
            "API error (status {}): {}",
            e.status().map(|s| s.to_string()).unwrap_or_default(),
            e.message()
        ),
        ErrorKind::Serialization => eprintln!("Unexpected response: {}", e.message()),
        ErrorKind::Validation => eprintln!("Invalid input: {}", e.message()),
    }
    if let Some(code) = e.code() {
        eprintln!("Error code: {}", code);
    }
}
