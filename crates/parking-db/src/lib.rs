//! # parking-db: Database Layer for the Parking Till
//!
//! SQLite storage for registers, vehicles, sales and expenses, using sqlx
//! for async operations. Every multi-row flow runs in one transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Parking Till Data Flow                             │
//! │                                                                         │
//! │  Request handler (check_out, close_register, ...)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   parking-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ BillingMethod  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Register       │    │ 001_initial  │  │   │
//! │  │   │ ParkingConfig │    │ Vehicle        │    │ _schema.sql  │  │   │
//! │  │   │               │    │ Ledger         │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (PARKING_DATABASE_PATH)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - TOML + environment configuration
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use parking_db::{Database, ParkingConfig};
//!
//! let config = ParkingConfig::from_env()?;
//! let clock = config.clock()?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let register = db.registers().open(&actor, Money::from_cents(10_000), &clock).await?;
//! let entry = db.vehicles().check_in(&actor, &new_entry, &clock).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, ParkingConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::billing_method::BillingMethodRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::register::RegisterRepository;
pub use repository::vehicle::{CheckOut, VehicleRepository};
