//! # Seed Data Generator
//!
//! Populates a development database with reference billing methods and
//! opens today's register.
//!
//! ## Usage
//! ```bash
//! # Defaults + PARKING_* environment
//! cargo run -p parking-db --bin seed
//!
//! # Specify database path
//! cargo run -p parking-db --bin seed -- --db ./data/parking_dev.db
//!
//! # Load settings from a TOML file first
//! cargo run -p parking-db --bin seed -- --config ./parking.toml
//! ```
//!
//! ## Generated Data
//! - Hourly: R$ 5,00 car / R$ 3,00 motorcycle per hour, 10 min tolerance
//! - Per minute: R$ 0,50 car / R$ 0,30 motorcycle every 15 min, 5 min tolerance
//! - Fixed: R$ 20,00 car / R$ 10,00 motorcycle
//! - An OPEN register for the current business day with a R$ 100,00 float

use parking_core::{Actor, Money, NewBillingMethod, Role};
use parking_db::{Database, ParkingConfig};
use std::env;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

const SEED_ACTOR_ID: &str = "seed";
const OPENING_FLOAT_CENTS: i64 = 10_000;

/// Reference pricing rules: (category, time, tolerance, car, moto)
const METHODS: &[(&str, Option<&str>, i64, i64, i64)] = &[
    ("POR_HORA", Some("01:00:00"), 10, 500, 300),
    ("POR_MINUTO", Some("00:15:00"), 5, 50, 30),
    ("VALOR_FIXO", None, 0, 2_000, 1_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Parking Till Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  TOML settings file (optional)");
                println!("  -d, --db <PATH>      Database file path (overrides config)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = ParkingConfig::load(config_path.as_deref())?;
    if let Some(path) = db_path {
        config.database_path = path;
    }
    let clock = config.clock()?;

    println!("🌱 Parking Till Seed Data Generator");
    println!("===================================");
    println!("Database: {}", config.database_path.display());
    println!("Time zone: {}", config.timezone);
    println!();

    let db = Database::new(config.db_config()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let seeder = Actor::new(SEED_ACTOR_ID, Role::Admin);

    // Billing methods
    let existing = db.billing_methods().list(false).await?;
    if existing.is_empty() {
        for (category, time, tolerance, car, moto) in METHODS {
            let method = db
                .billing_methods()
                .create(
                    &seeder,
                    &NewBillingMethod {
                        category: category.to_string(),
                        time: time.map(str::to_string),
                        tolerance_minutes: *tolerance,
                        car_value_cents: *car,
                        moto_value_cents: *moto,
                    },
                    &clock,
                )
                .await?;
            println!("✓ {}", method.description);
        }
    } else {
        println!("⚠ Database already has {} billing methods, skipping", existing.len());
    }

    // Today's register
    match db.registers().find_open_for_day(&clock).await? {
        Some(register) => {
            println!(
                "⚠ Register {} already open for {} (balance {})",
                register.id,
                register.opening_day,
                register.final_value()
            );
        }
        None => {
            let register = db
                .registers()
                .open(&seeder, Money::from_cents(OPENING_FLOAT_CENTS), &clock)
                .await?;
            println!(
                "✓ Opened register {} for {} with {}",
                register.id,
                register.opening_day,
                register.initial_value()
            );
        }
    }

    info!("Seed complete");
    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,parking_db=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}
