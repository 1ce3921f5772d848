//! # Repository Module
//!
//! Repository implementations for the parking till.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request handler                                                        │
//! │       │                                                                 │
//! │       │  db.vehicles().check_out(&actor, entry_id, &clock)              │
//! │       ▼                                                                 │
//! │  VehicleRepository                                                      │
//! │  ├── rules from parking-core (billing, guards, notes)                   │
//! │  ├── one sqlx transaction per flow                                      │
//! │  └── register deltas through register::apply_delta                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BillingMethodRepository`](billing_method::BillingMethodRepository) - pricing rules
//! - [`RegisterRepository`](register::RegisterRepository) - open, close, reopen, deltas
//! - [`VehicleRepository`](vehicle::VehicleRepository) - check-in/out and corrections
//! - [`LedgerRepository`](ledger::LedgerRepository) - sales and expenses

pub mod billing_method;
pub mod ledger;
pub mod register;
pub mod vehicle;
