//! # Vehicle Repository
//!
//! Check-in, check-out and the staff corrections around them.
//!
//! ## Entry Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  check_in ──► INSIDE ──► outstanding (read-only amount due)            │
//! │                  │                                                      │
//! │                  ├── check_out  ──► EXITED + vehicle transaction        │
//! │                  │                   + vehicleEntry delta (one tx)      │
//! │                  │                                                      │
//! │                  ├── change_billing_method (still INSIDE)               │
//! │                  │                                                      │
//! │                  └── soft_delete ──► DELETED ──► reactivate ──► INSIDE  │
//! │                                                                         │
//! │  void_transaction: voided_at stamp + vehicleEntry decrement (one tx)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use parking_core::billing::AmountDue;
use parking_core::register::{append_note, ensure_open, DeltaCategory, FinancialDelta};
use parking_core::validation::normalize_plate;
use parking_core::vehicle::{
    deletion_note, ensure_assignable, ensure_inside, ensure_reactivatable, exit_charge,
    outstanding, reactivation_note, ExitCharge, VEHICLE_ENTITY,
};
use parking_core::{
    Actor, BusinessClock, CoreError, NewVehicleEntry, Role, VehicleEntry, VehicleStatus,
    VehicleTransaction,
};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::billing_method::require_method;
use crate::repository::register::{apply_delta, require_register};

const TRANSACTION_ENTITY: &str = "Vehicle transaction";

/// Result of a check-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOut {
    pub entry: VehicleEntry,
    pub transaction: VehicleTransaction,
    pub charge: ExitCharge,
}

/// Repository for vehicle entry database operations.
#[derive(Debug, Clone)]
pub struct VehicleRepository {
    pool: SqlitePool,
}

impl VehicleRepository {
    /// Creates a new VehicleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VehicleRepository { pool }
    }

    /// Registers a vehicle entering the lot.
    ///
    /// ## Rejections
    /// - plate malformed → Validation
    /// - billing method disabled → Validation
    /// - register missing or not OPEN → NotFound
    /// - plate already INSIDE → Conflict
    pub async fn check_in(
        &self,
        actor: &Actor,
        input: &NewVehicleEntry,
        clock: &BusinessClock,
    ) -> DbResult<VehicleEntry> {
        actor.require(Role::Operator, "check vehicles in")?;
        let plate = normalize_plate(&input.plate)?;
        let description = input
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        let mut tx = self.pool.begin().await?;

        let register = require_register(&mut *tx, &input.register_id).await?;
        ensure_open(&register)?;

        let method = require_method(&mut *tx, &input.billing_method_id).await?;
        ensure_assignable(&method)?;

        if let Some(existing_id) = find_inside_by_plate(&mut *tx, &plate).await? {
            warn!(plate = %plate, entry_id = %existing_id, "Plate already inside");
            return Err(CoreError::VehicleAlreadyInside {
                plate,
                entry_id: existing_id,
            }
            .into());
        }

        let id = Uuid::new_v4().to_string();
        let now = clock.now();

        let inserted = sqlx::query(
            r#"
            INSERT INTO vehicle_entries (
                id, register_id, plate, category, billing_method_id,
                entry_time, exit_time, status, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, 'inside', ?7, ?6, ?6)
            "#,
        )
        .bind(&id)
        .bind(&register.id)
        .bind(&plate)
        .bind(input.category)
        .bind(&method.id)
        .bind(now)
        .bind(&description)
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            drop(tx);
            return Err(plate_inside_conflict(&self.pool, &plate, err.into()).await);
        }

        let entry = require_entry(&mut *tx, &id).await?;
        tx.commit().await?;

        info!(id = %id, plate = %plate, register_id = %register.id, "Vehicle checked in");
        Ok(entry)
    }

    /// Amount owed right now by a vehicle still inside.
    ///
    /// Within the tolerance this is an `InsufficientTime` rejection, which
    /// callers show as "no charge yet".
    pub async fn outstanding(&self, entry_id: &str, clock: &BusinessClock) -> DbResult<AmountDue> {
        let entry = self.get(entry_id).await?;
        ensure_inside(&entry)?;

        // a method disabled after check-in still prices the stay
        let method = require_method(&self.pool, &entry.billing_method_id).await?;
        Ok(outstanding(&entry, &method, clock)?)
    }

    /// Charges and releases a vehicle.
    ///
    /// Transaction row, register delta and status change commit together.
    /// A stay within the tolerance exits with a zero charge and no delta.
    pub async fn check_out(
        &self,
        actor: &Actor,
        entry_id: &str,
        clock: &BusinessClock,
    ) -> DbResult<CheckOut> {
        actor.require(Role::Operator, "check vehicles out")?;

        let mut tx = self.pool.begin().await?;

        let entry = require_entry(&mut *tx, entry_id).await?;
        ensure_inside(&entry)?;

        let register = require_register(&mut *tx, &entry.register_id).await?;
        ensure_open(&register)?;

        let method = require_method(&mut *tx, &entry.billing_method_id).await?;
        let charge = exit_charge(&entry, &method, clock)?;
        let now = clock.now();

        let transaction_id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO vehicle_transactions (
                id, register_id, vehicle_entry_id, amount_cents,
                stay_minutes, blocks, operator_id, created_at, voided_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)
            "#,
        )
        .bind(&transaction_id)
        .bind(&register.id)
        .bind(&entry.id)
        .bind(charge.amount.cents())
        .bind(charge.stay_minutes)
        .bind(charge.blocks)
        .bind(&actor.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if charge.amount.is_positive() {
            let delta = FinancialDelta::increment(DeltaCategory::VehicleEntry, charge.amount)?;
            apply_delta(&mut *tx, &register.id, &delta, clock).await?;
        }

        sqlx::query(
            r#"
            UPDATE vehicle_entries SET
                status = 'exited',
                exit_time = ?2,
                updated_at = ?2
            WHERE id = ?1 AND status = 'inside'
            "#,
        )
        .bind(&entry.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let entry = require_entry(&mut *tx, entry_id).await?;
        let transaction = require_transaction(&mut *tx, &transaction_id).await?;
        tx.commit().await?;

        info!(
            id = %entry_id,
            plate = %entry.plate,
            amount = %charge.amount,
            stay_minutes = charge.stay_minutes,
            "Vehicle checked out"
        );

        Ok(CheckOut {
            entry,
            transaction,
            charge,
        })
    }

    /// Voids an exit charge and takes it back out of the register.
    pub async fn void_transaction(
        &self,
        actor: &Actor,
        transaction_id: &str,
        clock: &BusinessClock,
    ) -> DbResult<VehicleTransaction> {
        actor.require(Role::Operator, "void vehicle transactions")?;

        let mut tx = self.pool.begin().await?;

        let transaction = require_transaction(&mut *tx, transaction_id).await?;
        if transaction.voided_at.is_some() {
            return Err(CoreError::AlreadyVoided {
                entity: TRANSACTION_ENTITY.to_string(),
                id: transaction_id.to_string(),
            }
            .into());
        }

        let register = require_register(&mut *tx, &transaction.register_id).await?;
        ensure_open(&register)?;

        sqlx::query("UPDATE vehicle_transactions SET voided_at = ?2 WHERE id = ?1 AND voided_at IS NULL")
            .bind(transaction_id)
            .bind(clock.now())
            .execute(&mut *tx)
            .await?;

        if transaction.amount().is_positive() {
            let delta = FinancialDelta::decrement(DeltaCategory::VehicleEntry, transaction.amount())?;
            apply_delta(&mut *tx, &register.id, &delta, clock).await?;
        }

        let voided = require_transaction(&mut *tx, transaction_id).await?;
        tx.commit().await?;

        info!(id = %transaction_id, amount = %voided.amount(), "Vehicle transaction voided");
        Ok(voided)
    }

    /// Moves a vehicle still inside to another active billing method.
    pub async fn change_billing_method(
        &self,
        actor: &Actor,
        entry_id: &str,
        billing_method_id: &str,
        clock: &BusinessClock,
    ) -> DbResult<VehicleEntry> {
        actor.require(Role::Operator, "change a vehicle's billing method")?;

        let mut tx = self.pool.begin().await?;

        let entry = require_entry(&mut *tx, entry_id).await?;
        ensure_inside(&entry)?;

        let method = require_method(&mut *tx, billing_method_id).await?;
        ensure_assignable(&method)?;

        sqlx::query("UPDATE vehicle_entries SET billing_method_id = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(entry_id)
            .bind(&method.id)
            .bind(clock.now())
            .execute(&mut *tx)
            .await?;

        let entry = require_entry(&mut *tx, entry_id).await?;
        tx.commit().await?;

        debug!(id = %entry_id, billing_method_id = %billing_method_id, "Billing method changed");
        Ok(entry)
    }

    /// Staff removal of a vehicle still inside: INSIDE → DELETED.
    pub async fn soft_delete(
        &self,
        actor: &Actor,
        entry_id: &str,
        reason: &str,
        clock: &BusinessClock,
    ) -> DbResult<VehicleEntry> {
        actor.require(Role::Operator, "delete vehicle entries")?;

        let mut tx = self.pool.begin().await?;

        let entry = require_entry(&mut *tx, entry_id).await?;
        ensure_inside(&entry)?;

        let now = clock.now();
        let note = deletion_note(clock.local(now), reason);

        sqlx::query(
            r#"
            UPDATE vehicle_entries SET
                status = 'deleted',
                description = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(entry_id)
        .bind(append_note(&entry.description, &note))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let entry = require_entry(&mut *tx, entry_id).await?;
        tx.commit().await?;

        info!(id = %entry_id, plate = %entry.plate, operator = %actor.id, "Vehicle entry deleted");
        Ok(entry)
    }

    /// Brings a DELETED or SYSTEM_DELETED entry back inside.
    ///
    /// The plate must not be inside under another entry and the entry's
    /// register must be OPEN again.
    pub async fn reactivate(
        &self,
        actor: &Actor,
        entry_id: &str,
        clock: &BusinessClock,
    ) -> DbResult<VehicleEntry> {
        actor.require(Role::Operator, "reactivate vehicle entries")?;

        let mut tx = self.pool.begin().await?;

        let entry = require_entry(&mut *tx, entry_id).await?;
        ensure_reactivatable(&entry)?;

        if let Some(existing_id) = find_inside_by_plate(&mut *tx, &entry.plate).await? {
            warn!(plate = %entry.plate, entry_id = %existing_id, "Plate already inside");
            return Err(CoreError::VehicleAlreadyInside {
                plate: entry.plate,
                entry_id: existing_id,
            }
            .into());
        }

        let register = require_register(&mut *tx, &entry.register_id).await?;
        ensure_open(&register)?;

        let now = clock.now();
        let updated = sqlx::query(
            r#"
            UPDATE vehicle_entries SET
                status = 'inside',
                exit_time = NULL,
                description = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(entry_id)
        .bind(append_note(&entry.description, &reactivation_note(clock.local(now))))
        .bind(now)
        .execute(&mut *tx)
        .await;

        if let Err(err) = updated {
            drop(tx);
            return Err(plate_inside_conflict(&self.pool, &entry.plate, err.into()).await);
        }

        let entry = require_entry(&mut *tx, entry_id).await?;
        tx.commit().await?;

        info!(id = %entry_id, plate = %entry.plate, "Vehicle entry reactivated");
        Ok(entry)
    }

    /// Gets an entry by ID.
    pub async fn get(&self, id: &str) -> DbResult<VehicleEntry> {
        require_entry(&self.pool, id).await
    }

    /// Gets an exit transaction by ID.
    pub async fn get_transaction(&self, id: &str) -> DbResult<VehicleTransaction> {
        require_transaction(&self.pool, id).await
    }

    /// Entries of a register, optionally filtered by status, by entry time.
    pub async fn list_by_register(
        &self,
        register_id: &str,
        status: Option<VehicleStatus>,
    ) -> DbResult<Vec<VehicleEntry>> {
        let entries = sqlx::query_as::<_, VehicleEntry>(
            r#"
            SELECT
                id, register_id, plate, category, billing_method_id,
                entry_time, exit_time, status, description, created_at, updated_at
            FROM vehicle_entries
            WHERE register_id = ?1 AND (?2 IS NULL OR status = ?2)
            ORDER BY entry_time, id
            "#,
        )
        .bind(register_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        debug!(register_id = %register_id, count = entries.len(), "Listed vehicle entries");
        Ok(entries)
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

async fn fetch_entry<'e, E>(executor: E, id: &str) -> DbResult<Option<VehicleEntry>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let entry = sqlx::query_as::<_, VehicleEntry>(
        r#"
        SELECT
            id, register_id, plate, category, billing_method_id,
            entry_time, exit_time, status, description, created_at, updated_at
        FROM vehicle_entries
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(entry)
}

async fn require_entry<'e, E>(executor: E, id: &str) -> DbResult<VehicleEntry>
where
    E: Executor<'e, Database = Sqlite>,
{
    fetch_entry(executor, id)
        .await?
        .ok_or_else(|| DbError::from(CoreError::not_found(VEHICLE_ENTITY, id)))
}

async fn require_transaction<'e, E>(executor: E, id: &str) -> DbResult<VehicleTransaction>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, VehicleTransaction>(
        r#"
        SELECT
            id, register_id, vehicle_entry_id, amount_cents, stay_minutes,
            blocks, operator_id, created_at, voided_at
        FROM vehicle_transactions
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DbError::from(CoreError::not_found(TRANSACTION_ENTITY, id)))
}

/// Turns a unique-index rejection on the plate into the domain conflict.
/// Other errors pass through.
async fn plate_inside_conflict(pool: &SqlitePool, plate: &str, err: DbError) -> DbError {
    if !matches!(err, DbError::UniqueViolation { .. }) {
        return err;
    }

    match find_inside_by_plate(pool, plate).await {
        Ok(Some(entry_id)) => {
            warn!(plate = %plate, entry_id = %entry_id, "Concurrent check-in rejected by unique index");
            CoreError::VehicleAlreadyInside {
                plate: plate.to_string(),
                entry_id,
            }
            .into()
        }
        _ => err,
    }
}

/// ID of the INSIDE entry for `plate`, if any.
async fn find_inside_by_plate<'e, E>(executor: E, plate: &str) -> DbResult<Option<String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = sqlx::query_scalar::<_, String>(
        "SELECT id FROM vehicle_entries WHERE plate = ?1 AND status = 'inside'",
    )
    .bind(plate)
    .fetch_optional(executor)
    .await?;

    Ok(id)
}
