//! # Vehicle Entry Rules
//!
//! Status guards for vehicle entries and the exit charge.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::billing::{compute_amount_due, AmountDue};
use crate::clock::BusinessClock;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::register::AUDIT_TIMESTAMP_FORMAT;
use crate::types::{BillingMethod, VehicleEntry, VehicleStatus};

pub const VEHICLE_ENTITY: &str = "Vehicle entry";
pub const BILLING_METHOD_ENTITY: &str = "Billing method";

/// What a vehicle pays when it leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExitCharge {
    pub amount: Money,
    pub blocks: i64,
    pub stay_minutes: i64,
}

impl ExitCharge {
    /// Still inside the tolerance: leaves without paying.
    pub fn free(stay_minutes: i64) -> Self {
        ExitCharge {
            amount: Money::zero(),
            blocks: 0,
            stay_minutes,
        }
    }
}

pub fn ensure_inside(entry: &VehicleEntry) -> CoreResult<()> {
    if entry.status != VehicleStatus::Inside {
        return Err(CoreError::invalid_state(
            VEHICLE_ENTITY,
            entry.id.clone(),
            entry.status,
            VehicleStatus::Inside,
        ));
    }
    Ok(())
}

/// Only staff-deleted and system-evicted entries can come back.
pub fn ensure_reactivatable(entry: &VehicleEntry) -> CoreResult<()> {
    match entry.status {
        VehicleStatus::Deleted | VehicleStatus::SystemDeleted => Ok(()),
        current => Err(CoreError::invalid_state(
            VEHICLE_ENTITY,
            entry.id.clone(),
            current,
            "deleted or system_deleted",
        )),
    }
}

/// Disabled methods can't be assigned to new or edited entries.
pub fn ensure_assignable(method: &BillingMethod) -> CoreResult<()> {
    if !method.is_active {
        return Err(CoreError::BillingMethodInactive {
            id: method.id.clone(),
        });
    }
    Ok(())
}

/// Amount owed at `clock.now()`, with both instants in the business zone.
pub fn outstanding(
    entry: &VehicleEntry,
    method: &BillingMethod,
    clock: &BusinessClock,
) -> CoreResult<AmountDue> {
    compute_amount_due(
        clock.local(entry.entry_time),
        entry.category,
        &method.rates(),
        clock.local(clock.now()),
    )
}

/// Charge applied at check-out.
///
/// A stay within the tolerance exits for free; a negative stay is still an
/// error because the entry time is wrong.
pub fn exit_charge(
    entry: &VehicleEntry,
    method: &BillingMethod,
    clock: &BusinessClock,
) -> CoreResult<ExitCharge> {
    match outstanding(entry, method, clock) {
        Ok(due) => Ok(ExitCharge {
            amount: due.amount,
            blocks: due.blocks,
            stay_minutes: due.stay_minutes,
        }),
        Err(CoreError::InsufficientTime { stay_minutes, .. }) if stay_minutes >= 0 => {
            Ok(ExitCharge::free(stay_minutes))
        }
        Err(e) => Err(e),
    }
}

pub fn deletion_note(at: DateTime<Tz>, reason: &str) -> String {
    let reason = reason.trim();
    if reason.is_empty() {
        format!("deleted at {}", at.format(AUDIT_TIMESTAMP_FORMAT))
    } else {
        format!("deleted at {}: {}", at.format(AUDIT_TIMESTAMP_FORMAT), reason)
    }
}

pub fn reactivation_note(at: DateTime<Tz>) -> String {
    format!("reactivated at {}", at.format(AUDIT_TIMESTAMP_FORMAT))
}
