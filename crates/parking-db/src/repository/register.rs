//! # Cash Register Repository
//!
//! Storage side of the register lifecycle.
//!
//! ## Close Is One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    load register, require OPEN                                         │
//! │    for each vehicle_entries row of this register with status inside:   │
//! │        status = system_deleted, description += eviction note           │
//! │    status = closed, closing_date = now                                 │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: SQLite rolls back the  │
//! │  evictions already written, the register stays OPEN.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One OPEN Register Per Day
//! `opening_day` stores the business-zone calendar day. A partial unique
//! index on `opening_day WHERE status = 'open'` backs the pre-check, so two
//! concurrent opens can't both commit.

use chrono::NaiveDate;
use parking_core::register::{
    append_note, eviction_note, transition, validate_initial_value, FinancialDelta,
    RegisterAction, REGISTER_ENTITY,
};
use parking_core::{Actor, BusinessClock, CashRegister, CoreError, Money, Role};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Repository for cash register database operations.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
}

impl RegisterRepository {
    /// Creates a new RegisterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterRepository { pool }
    }

    /// Opens today's register.
    ///
    /// ## Returns
    /// * `Ok(CashRegister)` - OPEN, `final_value == initial_value`
    /// * `Err` with kind Conflict - a register is already OPEN for this day
    pub async fn open(
        &self,
        actor: &Actor,
        initial_value: Money,
        clock: &BusinessClock,
    ) -> DbResult<CashRegister> {
        actor.require(Role::Operator, "open a cash register")?;
        validate_initial_value(initial_value)?;

        let now = clock.now();
        let day = clock.local_day(now);

        if let Some(existing) = fetch_open_for_day(&self.pool, day).await? {
            warn!(day = %day, register_id = %existing.id, "Register already open for day");
            return Err(CoreError::RegisterAlreadyOpen {
                day,
                register_id: existing.id,
            }
            .into());
        }

        let id = Uuid::new_v4().to_string();
        debug!(id = %id, day = %day, initial = %initial_value, "Opening register");

        let inserted = sqlx::query(
            r#"
            INSERT INTO cash_registers (
                id, operator_id, status, opening_date, opening_day, closing_date,
                initial_value_cents, final_value_cents,
                vehicle_entry_total_cents, general_sale_total_cents,
                outgoing_expense_total_cents, created_at, updated_at
            ) VALUES (?1, ?2, 'open', ?3, ?4, NULL, ?5, ?5, 0, 0, 0, ?3, ?3)
            "#,
        )
        .bind(&id)
        .bind(&actor.id)
        .bind(now)
        .bind(day)
        .bind(initial_value.cents())
        .execute(&self.pool)
        .await;

        if let Err(err) = inserted {
            // lost a race with a concurrent open
            return Err(open_day_conflict(&self.pool, day, err.into()).await);
        }

        info!(id = %id, day = %day, operator = %actor.id, "Register opened");
        self.get(&id).await
    }

    /// Closes a register, evicting every vehicle still inside.
    ///
    /// ## Returns
    /// * `Ok(CashRegister)` - CLOSED with `closing_date` set
    /// * `Err` with kind NotFound - missing, or not OPEN
    pub async fn close(
        &self,
        actor: &Actor,
        register_id: &str,
        clock: &BusinessClock,
    ) -> DbResult<CashRegister> {
        actor.require(Role::Operator, "close a cash register")?;

        let now = clock.now();
        let note = eviction_note(clock.local(now));

        let mut tx = self.pool.begin().await?;

        let register = require_register(&mut *tx, register_id).await?;
        let target = transition(&register, RegisterAction::Close)?;

        let inside: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT id, description
            FROM vehicle_entries
            WHERE register_id = ?1 AND status = 'inside'
            ORDER BY entry_time
            "#,
        )
        .bind(register_id)
        .fetch_all(&mut *tx)
        .await?;

        for (entry_id, description) in &inside {
            sqlx::query(
                r#"
                UPDATE vehicle_entries SET
                    status = 'system_deleted',
                    description = ?2,
                    updated_at = ?3
                WHERE id = ?1 AND status = 'inside'
                "#,
            )
            .bind(entry_id)
            .bind(append_note(description, &note))
            .bind(now)
            .execute(&mut *tx)
            .await?;

            debug!(entry_id = %entry_id, register_id = %register_id, "Vehicle evicted");
        }

        sqlx::query(
            r#"
            UPDATE cash_registers SET
                status = ?2,
                closing_date = ?3,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(register_id)
        .bind(target)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let closed = require_register(&mut *tx, register_id).await?;
        tx.commit().await?;

        info!(
            id = %register_id,
            evicted = inside.len(),
            final_value = %closed.final_value(),
            "Register closed"
        );
        Ok(closed)
    }

    /// Reopens a CLOSED register. Evicted vehicles stay evicted.
    ///
    /// ## Returns
    /// * `Ok(CashRegister)` - OPEN, `closing_date` cleared
    /// * `Err` with kind NotFound - missing, or not CLOSED
    /// * `Err` with kind Conflict - another register is OPEN for the same day
    pub async fn reopen(
        &self,
        actor: &Actor,
        register_id: &str,
        clock: &BusinessClock,
    ) -> DbResult<CashRegister> {
        actor.require(Role::Manager, "reopen a cash register")?;

        let mut tx = self.pool.begin().await?;

        let register = require_register(&mut *tx, register_id).await?;
        let target = transition(&register, RegisterAction::Reopen)?;

        if let Some(other) = fetch_open_for_day(&mut *tx, register.opening_day).await? {
            warn!(
                id = %register_id,
                other = %other.id,
                day = %register.opening_day,
                "Cannot reopen: another register is open for the day"
            );
            return Err(CoreError::RegisterAlreadyOpen {
                day: register.opening_day,
                register_id: other.id,
            }
            .into());
        }

        let reopened = sqlx::query(
            r#"
            UPDATE cash_registers SET
                status = ?2,
                closing_date = NULL,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(register_id)
        .bind(target)
        .bind(clock.now())
        .execute(&mut *tx)
        .await;

        if let Err(err) = reopened {
            drop(tx);
            return Err(open_day_conflict(&self.pool, register.opening_day, err.into()).await);
        }

        let reopened = require_register(&mut *tx, register_id).await?;
        tx.commit().await?;

        info!(id = %register_id, operator = %actor.id, "Register reopened");
        Ok(reopened)
    }

    /// Applies one financial delta in its own transaction.
    ///
    /// No status guard: the flows that record sales, expenses and exits check
    /// for an OPEN register before they get here.
    pub async fn apply_financial_delta(
        &self,
        register_id: &str,
        delta: &FinancialDelta,
        clock: &BusinessClock,
    ) -> DbResult<CashRegister> {
        let mut tx = self.pool.begin().await?;
        apply_delta(&mut *tx, register_id, delta, clock).await?;
        let register = require_register(&mut *tx, register_id).await?;
        tx.commit().await?;
        Ok(register)
    }

    /// Gets a register by ID.
    pub async fn get(&self, id: &str) -> DbResult<CashRegister> {
        require_register(&self.pool, id).await
    }

    /// The OPEN register for today's business day, if any.
    pub async fn find_open_for_day(&self, clock: &BusinessClock) -> DbResult<Option<CashRegister>> {
        fetch_open_for_day(&self.pool, clock.local_day(clock.now())).await
    }

    /// Most recently opened registers first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<CashRegister>> {
        let registers = sqlx::query_as::<_, CashRegister>(
            r#"
            SELECT
                id, operator_id, status, opening_date, opening_day, closing_date,
                initial_value_cents, final_value_cents,
                vehicle_entry_total_cents, general_sale_total_cents,
                outgoing_expense_total_cents, created_at, updated_at
            FROM cash_registers
            ORDER BY opening_date DESC, id
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(registers)
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Loads one register through any executor (pool or open transaction).
pub(crate) async fn fetch_register<'e, E>(executor: E, id: &str) -> DbResult<Option<CashRegister>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let register = sqlx::query_as::<_, CashRegister>(
        r#"
        SELECT
            id, operator_id, status, opening_date, opening_day, closing_date,
            initial_value_cents, final_value_cents,
            vehicle_entry_total_cents, general_sale_total_cents,
            outgoing_expense_total_cents, created_at, updated_at
        FROM cash_registers
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(register)
}

/// Loads a register that must exist.
pub(crate) async fn require_register<'e, E>(executor: E, id: &str) -> DbResult<CashRegister>
where
    E: Executor<'e, Database = Sqlite>,
{
    fetch_register(executor, id)
        .await?
        .ok_or_else(|| DbError::from(CoreError::not_found(REGISTER_ENTITY, id)))
}

async fn fetch_open_for_day<'e, E>(
    executor: E,
    day: NaiveDate,
) -> DbResult<Option<CashRegister>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let register = sqlx::query_as::<_, CashRegister>(
        r#"
        SELECT
            id, operator_id, status, opening_date, opening_day, closing_date,
            initial_value_cents, final_value_cents,
            vehicle_entry_total_cents, general_sale_total_cents,
            outgoing_expense_total_cents, created_at, updated_at
        FROM cash_registers
        WHERE opening_day = ?1 AND status = 'open'
        "#,
    )
    .bind(day)
    .fetch_optional(executor)
    .await?;

    Ok(register)
}

/// Turns a unique-index rejection on `opening_day` into the domain conflict,
/// naming the register that won. Other errors pass through.
async fn open_day_conflict(pool: &SqlitePool, day: NaiveDate, err: DbError) -> DbError {
    if !matches!(err, DbError::UniqueViolation { .. }) {
        return err;
    }

    match fetch_open_for_day(pool, day).await {
        Ok(Some(winner)) => {
            warn!(day = %day, register_id = %winner.id, "Concurrent open rejected by unique index");
            CoreError::RegisterAlreadyOpen {
                day,
                register_id: winner.id,
            }
            .into()
        }
        _ => err,
    }
}

/// Adjusts one subtotal and the running balance, inside the caller's
/// transaction so the delta commits with the record it accounts for.
pub(crate) async fn apply_delta(
    conn: &mut SqliteConnection,
    register_id: &str,
    delta: &FinancialDelta,
    clock: &BusinessClock,
) -> DbResult<()> {
    let column = delta.category.subtotal_column();
    let sql = format!(
        "UPDATE cash_registers SET {col} = {col} + ?2, final_value_cents = final_value_cents + ?3, updated_at = ?4 WHERE id = ?1",
        col = column
    );

    let result = sqlx::query(&sql)
        .bind(register_id)
        .bind(delta.subtotal_change().cents())
        .bind(delta.balance_change().cents())
        .bind(clock.now())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::not_found(REGISTER_ENTITY, register_id).into());
    }

    debug!(
        register_id = %register_id,
        category = %delta.category,
        balance_change = delta.balance_change().cents(),
        "Financial delta applied"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone, Utc};
    use parking_core::register::DeltaCategory;
    use parking_core::{ErrorKind, RegisterStatus};

    fn clock() -> BusinessClock {
        BusinessClock::fixed(
            chrono_tz::America::Sao_Paulo,
            Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap(),
        )
    }

    fn operator() -> Actor {
        Actor::new("op-1", Role::Operator)
    }

    #[tokio::test]
    async fn test_open_sets_balance() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let register = db
            .registers()
            .open(&operator(), Money::from_cents(10_000), &clock())
            .await
            .unwrap();

        assert_eq!(register.status, RegisterStatus::Open);
        assert_eq!(register.initial_value_cents, 10_000);
        assert_eq!(register.final_value_cents, 10_000);
        assert!(register.closing_date.is_none());
        assert_eq!(register.opening_day.to_string(), "2026-10-16");
    }

    #[tokio::test]
    async fn test_open_rejects_negative_float() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .registers()
            .open(&operator(), Money::from_cents(-1), &clock())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn test_day_boundary_uses_business_zone() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.registers();

        // 23:30 local on the 16th, already the 17th in UTC
        let late = clock().at(Utc.with_ymd_and_hms(2026, 10, 17, 2, 30, 0).unwrap());
        repo.open(&operator(), Money::zero(), &clock()).await.unwrap();

        let err = repo.open(&operator(), Money::zero(), &late).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Conflict));

        // 00:30 local on the 17th is a new business day
        let next_day = clock().at(Utc.with_ymd_and_hms(2026, 10, 17, 3, 30, 0).unwrap());
        assert!(repo.open(&operator(), Money::zero(), &next_day).await.is_ok());
    }

    #[tokio::test]
    async fn test_close_and_reopen() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.registers();
        let manager = Actor::new("mgr-1", Role::Manager);

        let register = repo.open(&operator(), Money::zero(), &clock()).await.unwrap();
        let later = clock().at(clock().now() + Duration::hours(8));

        let closed = repo.close(&operator(), &register.id, &later).await.unwrap();
        assert_eq!(closed.status, RegisterStatus::Closed);
        assert_eq!(closed.closing_date, Some(later.now()));

        let err = repo.close(&operator(), &register.id, &later).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));

        let err = repo.reopen(&operator(), &register.id, &later).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Forbidden));

        let reopened = repo.reopen(&manager, &register.id, &later).await.unwrap();
        assert_eq!(reopened.status, RegisterStatus::Open);
        assert!(reopened.closing_date.is_none());

        let err = repo.reopen(&manager, &register.id, &later).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_reopen_conflicts_with_other_open_register() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.registers();
        let manager = Actor::new("mgr-1", Role::Manager);

        let first = repo.open(&operator(), Money::zero(), &clock()).await.unwrap();
        repo.close(&operator(), &first.id, &clock()).await.unwrap();
        let second = repo.open(&operator(), Money::zero(), &clock()).await.unwrap();

        let err = repo.reopen(&manager, &first.id, &clock()).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Conflict));
        assert_eq!(repo.get(&first.id).await.unwrap().status, RegisterStatus::Closed);
        assert_eq!(repo.get(&second.id).await.unwrap().status, RegisterStatus::Open);
    }

    #[tokio::test]
    async fn test_apply_financial_delta() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.registers();
        let register = repo
            .open(&operator(), Money::from_cents(1_000), &clock())
            .await
            .unwrap();

        let sale = FinancialDelta::increment(DeltaCategory::GeneralSale, Money::from_cents(250))
            .unwrap();
        let updated = repo
            .apply_financial_delta(&register.id, &sale, &clock())
            .await
            .unwrap();
        assert_eq!(updated.general_sale_total_cents, 250);
        assert_eq!(updated.final_value_cents, 1_250);

        let expense =
            FinancialDelta::increment(DeltaCategory::OutgoingExpense, Money::from_cents(400))
                .unwrap();
        let updated = repo
            .apply_financial_delta(&register.id, &expense, &clock())
            .await
            .unwrap();
        assert_eq!(updated.outgoing_expense_total_cents, 400);
        assert_eq!(updated.final_value_cents, 850);

        let err = repo
            .apply_financial_delta("missing", &sale, &clock())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_find_open_and_list_recent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.registers();

        assert!(repo.find_open_for_day(&clock()).await.unwrap().is_none());

        let yesterday = clock().at(clock().now() - Duration::days(1));
        let old = repo.open(&operator(), Money::zero(), &yesterday).await.unwrap();
        let today = repo.open(&operator(), Money::zero(), &clock()).await.unwrap();

        let open = repo.find_open_for_day(&clock()).await.unwrap().unwrap();
        assert_eq!(open.id, today.id);

        let recent = repo.list_recent(10).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![today.id.as_str(), old.id.as_str()]);
    }
}
