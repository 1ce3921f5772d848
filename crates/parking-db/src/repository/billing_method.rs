//! # Billing Method Repository
//!
//! Manager-only configuration of pricing rules.
//!
//! ## Lifecycle
//! ```text
//! create ──► active ──► set_active(false) ──► disabled ──► set_active(true) ...
//!               │
//!               └── update (re-validated, description regenerated)
//!
//! Never hard-deleted: historical vehicle entries keep pointing at them.
//! ```

use parking_core::billing::validate_configuration;
use parking_core::vehicle::BILLING_METHOD_ENTITY;
use parking_core::{Actor, BillingMethod, BusinessClock, CoreError, Money, NewBillingMethod, Role};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Repository for billing method database operations.
#[derive(Debug, Clone)]
pub struct BillingMethodRepository {
    pool: SqlitePool,
}

impl BillingMethodRepository {
    /// Creates a new BillingMethodRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillingMethodRepository { pool }
    }

    /// Validates and stores a new billing method.
    ///
    /// ## Returns
    /// * `Ok(BillingMethod)` - active, with the computed block length and description
    /// * `Err(DbError::Core)` - Forbidden below Manager, or a configuration rejection
    pub async fn create(
        &self,
        actor: &Actor,
        input: &NewBillingMethod,
        clock: &BusinessClock,
    ) -> DbResult<BillingMethod> {
        actor.require(Role::Manager, "create billing methods")?;

        let config = validate_configuration(
            &input.category,
            input.time.as_deref(),
            input.tolerance_minutes,
            Money::from_cents(input.car_value_cents),
            Money::from_cents(input.moto_value_cents),
        )?;

        let id = Uuid::new_v4().to_string();
        let now = clock.now();

        debug!(id = %id, category = %config.category, "Creating billing method");

        sqlx::query(
            r#"
            INSERT INTO billing_methods (
                id, category, tolerance_minutes, time_unit_minutes,
                car_value_cents, moto_value_cents, description, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)
            "#,
        )
        .bind(&id)
        .bind(config.category)
        .bind(config.tolerance_minutes)
        .bind(config.time_unit_minutes)
        .bind(input.car_value_cents)
        .bind(input.moto_value_cents)
        .bind(&config.description)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(id = %id, description = %config.description, "Billing method created");

        self.get(&id).await
    }

    /// Re-validates and rewrites an existing method. Its active flag is kept.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        input: &NewBillingMethod,
        clock: &BusinessClock,
    ) -> DbResult<BillingMethod> {
        actor.require(Role::Manager, "edit billing methods")?;

        let config = validate_configuration(
            &input.category,
            input.time.as_deref(),
            input.tolerance_minutes,
            Money::from_cents(input.car_value_cents),
            Money::from_cents(input.moto_value_cents),
        )?;

        debug!(id = %id, category = %config.category, "Updating billing method");

        let result = sqlx::query(
            r#"
            UPDATE billing_methods SET
                category = ?2,
                tolerance_minutes = ?3,
                time_unit_minutes = ?4,
                car_value_cents = ?5,
                moto_value_cents = ?6,
                description = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(config.category)
        .bind(config.tolerance_minutes)
        .bind(config.time_unit_minutes)
        .bind(input.car_value_cents)
        .bind(input.moto_value_cents)
        .bind(&config.description)
        .bind(clock.now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(BILLING_METHOD_ENTITY, id).into());
        }

        self.get(id).await
    }

    /// Soft-disables (or re-enables) a method.
    pub async fn set_active(
        &self,
        actor: &Actor,
        id: &str,
        active: bool,
        clock: &BusinessClock,
    ) -> DbResult<BillingMethod> {
        actor.require(Role::Manager, "enable or disable billing methods")?;

        let result = sqlx::query(
            "UPDATE billing_methods SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(active)
        .bind(clock.now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(BILLING_METHOD_ENTITY, id).into());
        }

        info!(id = %id, active, "Billing method availability changed");
        self.get(id).await
    }

    /// Gets a method by ID, active or not.
    pub async fn get(&self, id: &str) -> DbResult<BillingMethod> {
        fetch_method(&self.pool, id)
            .await?
            .ok_or_else(|| CoreError::not_found(BILLING_METHOD_ENTITY, id).into())
    }

    /// Lists methods, oldest first.
    pub async fn list(&self, active_only: bool) -> DbResult<Vec<BillingMethod>> {
        let methods = sqlx::query_as::<_, BillingMethod>(
            r#"
            SELECT
                id, category, tolerance_minutes, time_unit_minutes,
                car_value_cents, moto_value_cents, description, is_active,
                created_at, updated_at
            FROM billing_methods
            WHERE (?1 = 0 OR is_active = 1)
            ORDER BY created_at, id
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = methods.len(), active_only, "Listed billing methods");
        Ok(methods)
    }
}

/// Loads one method through any executor (pool or open transaction).
pub(crate) async fn fetch_method<'e, E>(executor: E, id: &str) -> DbResult<Option<BillingMethod>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let method = sqlx::query_as::<_, BillingMethod>(
        r#"
        SELECT
            id, category, tolerance_minutes, time_unit_minutes,
            car_value_cents, moto_value_cents, description, is_active,
            created_at, updated_at
        FROM billing_methods
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(method)
}

/// Loads a method that must exist.
pub(crate) async fn require_method<'e, E>(executor: E, id: &str) -> DbResult<BillingMethod>
where
    E: Executor<'e, Database = Sqlite>,
{
    fetch_method(executor, id)
        .await?
        .ok_or_else(|| DbError::from(CoreError::not_found(BILLING_METHOD_ENTITY, id)))
}
