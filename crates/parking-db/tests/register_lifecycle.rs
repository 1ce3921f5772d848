//! End-to-end register lifecycle, mostly against an in-memory database.

use chrono::{Duration, TimeZone, Utc};
use parking_core::{
    Actor, BillingMethod, BusinessClock, CashRegister, CoreError, ErrorKind, Money, NewBillingMethod,
    NewExpense, NewSale, NewVehicleEntry, RegisterStatus, Role, VehicleCategory, VehicleStatus,
};
use parking_db::{Database, DbConfig};

fn clock() -> BusinessClock {
    // 09:00 in São Paulo
    BusinessClock::fixed(
        chrono_tz::America::Sao_Paulo,
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap(),
    )
}

fn after(minutes: i64) -> BusinessClock {
    clock().at(clock().now() + Duration::minutes(minutes))
}

fn operator() -> Actor {
    Actor::new("op-1", Role::Operator)
}

fn manager() -> Actor {
    Actor::new("mgr-1", Role::Manager)
}

async fn setup() -> (Database, BillingMethod) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let method = db
        .billing_methods()
        .create(
            &manager(),
            &NewBillingMethod {
                category: "POR_HORA".to_string(),
                time: Some("01:00:00".to_string()),
                tolerance_minutes: 10,
                car_value_cents: 500,
                moto_value_cents: 300,
            },
            &clock(),
        )
        .await
        .unwrap();
    (db, method)
}

async fn check_in(
    db: &Database,
    register: &CashRegister,
    method: &BillingMethod,
    plate: &str,
    at: &BusinessClock,
) -> String {
    db.vehicles()
        .check_in(
            &operator(),
            &NewVehicleEntry {
                register_id: register.id.clone(),
                plate: plate.to_string(),
                category: VehicleCategory::Car,
                billing_method_id: method.id.clone(),
                description: None,
            },
            at,
        )
        .await
        .unwrap()
        .id
}

async fn register_count(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM cash_registers")
        .fetch_one(db.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn second_open_for_the_same_day_is_rejected() {
    let (db, _) = setup().await;
    let first = db
        .registers()
        .open(&operator(), Money::from_cents(10_000), &clock())
        .await
        .unwrap();

    // later the same local day, different operator
    let err = db
        .registers()
        .open(&Actor::new("op-2", Role::Operator), Money::from_cents(0), &after(300))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::Conflict));
    assert_eq!(register_count(&db).await, 1);

    let open = db.registers().find_open_for_day(&after(300)).await.unwrap();
    assert_eq!(open.map(|r| r.id), Some(first.id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_opens_leave_one_register() {
    let path = std::env::temp_dir().join(format!("parking-open-race-{}.db", uuid::Uuid::new_v4()));
    let db = Database::new(DbConfig::new(&path)).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let db = db.clone();
            tokio::spawn(async move {
                let actor = Actor::new(format!("op-{n}"), Role::Operator);
                db.registers()
                    .open(&actor, Money::from_cents(1_000), &clock())
                    .await
            })
        })
        .collect();

    let mut opened = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(register) => opened.push(register),
            Err(err) => {
                assert_eq!(err.kind(), Some(ErrorKind::Conflict), "{err}");
                assert!(
                    matches!(err.as_core(), Some(CoreError::RegisterAlreadyOpen { .. })),
                    "{err}"
                );
            }
        }
    }

    assert_eq!(opened.len(), 1);
    assert_eq!(register_count(&db).await, 1);

    db.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

#[tokio::test]
async fn close_evicts_every_vehicle_inside() {
    let (db, method) = setup().await;
    let register = db
        .registers()
        .open(&operator(), Money::from_cents(10_000), &clock())
        .await
        .unwrap();

    let a = check_in(&db, &register, &method, "AAA1111", &after(1)).await;
    let b = check_in(&db, &register, &method, "BBB2222", &after(2)).await;
    let c = check_in(&db, &register, &method, "CCC3333", &after(3)).await;
    db.vehicles().check_out(&operator(), &c, &after(90)).await.unwrap();

    let closed = db
        .registers()
        .close(&operator(), &register.id, &after(600))
        .await
        .unwrap();
    assert_eq!(closed.status, RegisterStatus::Closed);
    assert_eq!(closed.closing_date, Some(after(600).now()));

    for id in [&a, &b] {
        let entry = db.vehicles().get(id).await.unwrap();
        assert_eq!(entry.status, VehicleStatus::SystemDeleted);
        assert!(entry.description.contains("vehicle removed by system at 16/10/2026 19:00:00"));
    }

    // already exited vehicles are left alone
    let exited = db.vehicles().get(&c).await.unwrap();
    assert_eq!(exited.status, VehicleStatus::Exited);
    assert!(exited.description.is_empty());

    let inside = db
        .vehicles()
        .list_by_register(&register.id, Some(VehicleStatus::Inside))
        .await
        .unwrap();
    assert!(inside.is_empty());
}

#[tokio::test]
async fn failed_eviction_rolls_back_the_whole_close() {
    let (db, method) = setup().await;
    let register = db
        .registers()
        .open(&operator(), Money::from_cents(10_000), &clock())
        .await
        .unwrap();

    let a = check_in(&db, &register, &method, "AAA1111", &after(1)).await;
    let b = check_in(&db, &register, &method, "BOOM123", &after(2)).await;

    sqlx::query(
        r#"
        CREATE TRIGGER fail_eviction BEFORE UPDATE ON vehicle_entries
        WHEN NEW.plate = 'BOOM123' AND NEW.status = 'system_deleted'
        BEGIN
            SELECT RAISE(ABORT, 'simulated eviction failure');
        END
        "#,
    )
    .execute(db.pool())
    .await
    .unwrap();

    let result = db
        .registers()
        .close(&operator(), &register.id, &after(600))
        .await;
    assert!(result.is_err());

    let register = db.registers().get(&register.id).await.unwrap();
    assert_eq!(register.status, RegisterStatus::Open);
    assert!(register.closing_date.is_none());

    for id in [&a, &b] {
        let entry = db.vehicles().get(id).await.unwrap();
        assert_eq!(entry.status, VehicleStatus::Inside);
        assert!(entry.description.is_empty());
    }
}

#[tokio::test]
async fn reopen_then_close_only_evicts_new_arrivals() {
    let (db, method) = setup().await;
    let register = db
        .registers()
        .open(&operator(), Money::from_cents(10_000), &clock())
        .await
        .unwrap();

    let early = check_in(&db, &register, &method, "AAA1111", &after(1)).await;
    db.registers()
        .close(&operator(), &register.id, &after(60))
        .await
        .unwrap();

    let err = db
        .registers()
        .reopen(&operator(), &register.id, &after(61))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Forbidden));

    let reopened = db
        .registers()
        .reopen(&manager(), &register.id, &after(62))
        .await
        .unwrap();
    assert_eq!(reopened.status, RegisterStatus::Open);
    assert!(reopened.closing_date.is_none());

    let early_entry = db.vehicles().get(&early).await.unwrap();
    assert_eq!(early_entry.status, VehicleStatus::SystemDeleted);
    let first_note = early_entry.description.clone();

    let late = check_in(&db, &register, &method, "BBB2222", &after(70)).await;
    db.registers()
        .close(&operator(), &register.id, &after(120))
        .await
        .unwrap();

    assert_eq!(
        db.vehicles().get(&late).await.unwrap().status,
        VehicleStatus::SystemDeleted
    );
    // the earlier eviction is not stamped a second time
    assert_eq!(db.vehicles().get(&early).await.unwrap().description, first_note);
}

#[tokio::test]
async fn every_booking_flows_into_the_balance() {
    let (db, method) = setup().await;
    let register = db
        .registers()
        .open(&operator(), Money::from_cents(10_000), &clock())
        .await
        .unwrap();

    // 65 minutes with a 60 + 10 block is a single hour
    let car = check_in(&db, &register, &method, "ABC1234", &clock()).await;
    let out = db.vehicles().check_out(&operator(), &car, &after(65)).await.unwrap();
    assert_eq!(out.charge.amount, Money::from_cents(500));

    db.ledger()
        .record_sale(
            &operator(),
            &register.id,
            &NewSale {
                description: "Water".to_string(),
                quantity: 2,
                unit_price_cents: 300,
            },
            &after(70),
        )
        .await
        .unwrap();

    db.ledger()
        .record_expense(
            &operator(),
            &register.id,
            &NewExpense {
                description: "Change for the drawer".to_string(),
                amount_cents: 250,
            },
            &after(75),
        )
        .await
        .unwrap();

    let register = db.registers().get(&register.id).await.unwrap();
    assert_eq!(register.vehicle_entry_total_cents, 500);
    assert_eq!(register.general_sale_total_cents, 600);
    assert_eq!(register.outgoing_expense_total_cents, 250);
    assert_eq!(register.final_value(), Money::from_cents(10_000 + 500 + 600 - 250));
}

#[tokio::test]
async fn next_day_gets_its_own_register() {
    let (db, _) = setup().await;
    db.registers()
        .open(&operator(), Money::from_cents(10_000), &clock())
        .await
        .unwrap();

    let tomorrow = after(24 * 60);
    let second = db
        .registers()
        .open(&operator(), Money::from_cents(5_000), &tomorrow)
        .await
        .unwrap();

    assert_eq!(second.opening_day, tomorrow.local_day(tomorrow.now()));
    assert_eq!(register_count(&db).await, 2);
}
