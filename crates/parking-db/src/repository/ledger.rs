//! # Ledger Repository
//!
//! General sales and outgoing expenses booked against a register.
//!
//! ## Booking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_sale     ──► sales row     + generalSale increment      (1 tx) │
//! │  record_expense  ──► expenses row  + outgoingExpense increment  (1 tx) │
//! │                                                                         │
//! │  void_sale       ──► voided_at     + generalSale decrement      (1 tx) │
//! │  void_expense    ──► voided_at     + outgoingExpense decrement  (1 tx) │
//! │                                                                         │
//! │  The register must be OPEN for every write. Rows are never deleted.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use parking_core::register::{ensure_open, DeltaCategory, FinancialDelta};
use parking_core::validation::{
    validate_description, validate_positive_amount, validate_price_cents, validate_quantity,
};
use parking_core::{
    Actor, BusinessClock, CoreError, Expense, Money, NewExpense, NewSale, Role, Sale,
    ValidationError,
};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::register::{apply_delta, require_register};

const SALE_ENTITY: &str = "Sale";
const EXPENSE_ENTITY: &str = "Expense";

/// Repository for sales and expenses.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Books a counter sale (`quantity × unit price`) into the register.
    pub async fn record_sale(
        &self,
        actor: &Actor,
        register_id: &str,
        input: &NewSale,
        clock: &BusinessClock,
    ) -> DbResult<Sale> {
        actor.require(Role::Operator, "record sales")?;

        let description = validate_description(&input.description)?;
        validate_quantity(input.quantity)?;
        validate_price_cents(input.unit_price_cents, "unit_price")?;
        // bounded price and quantity keep this far from overflow
        let total = Money::from_cents(input.unit_price_cents)
            .multiply_blocks(input.quantity)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "total".to_string(),
                min: 0,
                max: i64::MAX,
            })?;

        let mut tx = self.pool.begin().await?;

        let register = require_register(&mut *tx, register_id).await?;
        ensure_open(&register)?;

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, register_id, description, quantity, unit_price_cents,
                total_cents, operator_id, created_at, voided_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)
            "#,
        )
        .bind(&id)
        .bind(&register.id)
        .bind(&description)
        .bind(input.quantity)
        .bind(input.unit_price_cents)
        .bind(total.cents())
        .bind(&actor.id)
        .bind(clock.now())
        .execute(&mut *tx)
        .await?;

        if total.is_positive() {
            let delta = FinancialDelta::increment(DeltaCategory::GeneralSale, total)?;
            apply_delta(&mut *tx, &register.id, &delta, clock).await?;
        }

        let sale = require_sale(&mut *tx, &id).await?;
        tx.commit().await?;

        info!(id = %id, register_id = %register_id, total = %total, "Sale recorded");
        Ok(sale)
    }

    /// Voids a sale once and takes its total back out of the register.
    pub async fn void_sale(
        &self,
        actor: &Actor,
        sale_id: &str,
        clock: &BusinessClock,
    ) -> DbResult<Sale> {
        actor.require(Role::Operator, "void sales")?;

        let mut tx = self.pool.begin().await?;

        let sale = require_sale(&mut *tx, sale_id).await?;
        if sale.voided_at.is_some() {
            return Err(already_voided(SALE_ENTITY, sale_id));
        }

        let register = require_register(&mut *tx, &sale.register_id).await?;
        ensure_open(&register)?;

        sqlx::query("UPDATE sales SET voided_at = ?2 WHERE id = ?1 AND voided_at IS NULL")
            .bind(sale_id)
            .bind(clock.now())
            .execute(&mut *tx)
            .await?;

        if sale.total().is_positive() {
            let delta = FinancialDelta::decrement(DeltaCategory::GeneralSale, sale.total())?;
            apply_delta(&mut *tx, &register.id, &delta, clock).await?;
        }

        let sale = require_sale(&mut *tx, sale_id).await?;
        tx.commit().await?;

        info!(id = %sale_id, total = %sale.total(), "Sale voided");
        Ok(sale)
    }

    /// Sales of a register, voided ones included, oldest first.
    pub async fn list_sales(&self, register_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT
                id, register_id, description, quantity, unit_price_cents,
                total_cents, operator_id, created_at, voided_at
            FROM sales
            WHERE register_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(register_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(register_id = %register_id, count = sales.len(), "Listed sales");
        Ok(sales)
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    /// Books money taken out of the drawer.
    pub async fn record_expense(
        &self,
        actor: &Actor,
        register_id: &str,
        input: &NewExpense,
        clock: &BusinessClock,
    ) -> DbResult<Expense> {
        actor.require(Role::Operator, "record expenses")?;

        let description = validate_description(&input.description)?;
        validate_positive_amount(input.amount_cents, "amount")?;
        let amount = Money::from_cents(input.amount_cents);

        let mut tx = self.pool.begin().await?;

        let register = require_register(&mut *tx, register_id).await?;
        ensure_open(&register)?;

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, register_id, description, amount_cents,
                operator_id, created_at, voided_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)
            "#,
        )
        .bind(&id)
        .bind(&register.id)
        .bind(&description)
        .bind(amount.cents())
        .bind(&actor.id)
        .bind(clock.now())
        .execute(&mut *tx)
        .await?;

        let delta = FinancialDelta::increment(DeltaCategory::OutgoingExpense, amount)?;
        apply_delta(&mut *tx, &register.id, &delta, clock).await?;

        let expense = require_expense(&mut *tx, &id).await?;
        tx.commit().await?;

        info!(id = %id, register_id = %register_id, amount = %amount, "Expense recorded");
        Ok(expense)
    }

    /// Voids an expense once and gives the money back to the register.
    pub async fn void_expense(
        &self,
        actor: &Actor,
        expense_id: &str,
        clock: &BusinessClock,
    ) -> DbResult<Expense> {
        actor.require(Role::Operator, "void expenses")?;

        let mut tx = self.pool.begin().await?;

        let expense = require_expense(&mut *tx, expense_id).await?;
        if expense.voided_at.is_some() {
            return Err(already_voided(EXPENSE_ENTITY, expense_id));
        }

        let register = require_register(&mut *tx, &expense.register_id).await?;
        ensure_open(&register)?;

        sqlx::query("UPDATE expenses SET voided_at = ?2 WHERE id = ?1 AND voided_at IS NULL")
            .bind(expense_id)
            .bind(clock.now())
            .execute(&mut *tx)
            .await?;

        let delta = FinancialDelta::decrement(DeltaCategory::OutgoingExpense, expense.amount())?;
        apply_delta(&mut *tx, &register.id, &delta, clock).await?;

        let expense = require_expense(&mut *tx, expense_id).await?;
        tx.commit().await?;

        info!(id = %expense_id, amount = %expense.amount(), "Expense voided");
        Ok(expense)
    }

    /// Expenses of a register, voided ones included, oldest first.
    pub async fn list_expenses(&self, register_id: &str) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT
                id, register_id, description, amount_cents,
                operator_id, created_at, voided_at
            FROM expenses
            WHERE register_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(register_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(register_id = %register_id, count = expenses.len(), "Listed expenses");
        Ok(expenses)
    }
}

fn already_voided(entity: &str, id: &str) -> DbError {
    CoreError::AlreadyVoided {
        entity: entity.to_string(),
        id: id.to_string(),
    }
    .into()
}

async fn require_sale<'e, E>(executor: E, id: &str) -> DbResult<Sale>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Sale>(
        r#"
        SELECT
            id, register_id, description, quantity, unit_price_cents,
            total_cents, operator_id, created_at, voided_at
        FROM sales
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DbError::from(CoreError::not_found(SALE_ENTITY, id)))
}

async fn require_expense<'e, E>(executor: E, id: &str) -> DbResult<Expense>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Expense>(
        r#"
        SELECT
            id, register_id, description, amount_cents,
            operator_id, created_at, voided_at
        FROM expenses
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DbError::from(CoreError::not_found(EXPENSE_ENTITY, id)))
}
