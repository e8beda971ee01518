//! End-to-end tests for the Staff Incentive Engine.
//!
//! This test suite covers:
//! - Billing sync over HTTP and its idempotence
//! - Daily incentive scenarios A, B, and C
//! - Rule snapshot immutability after rule changes
//! - Monthly incentives resolved at month end
//! - Balance reconciliation (scenario D) and monotonicity
//! - Error cases

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;

use incentive_engine::api::{AppState, create_router};
use incentive_engine::config::EngineConfig;
use incentive_engine::error::EngineError;
use incentive_engine::models::{
    IncentivePayout, IncentiveTier, Invoice, ItemType, LineItem, PayoutStatus, RuleDraft,
    RuleSet, RuleSubmission, Staff, YearMonth,
};
use incentive_engine::services::IncentiveEngine;
use incentive_engine::store::{MemoryStore, RuleStore, Stores};

// =============================================================================
// Test Helpers
// =============================================================================

const TENANT: &str = "tenant_a";

struct TestApp {
    store: Arc<MemoryStore>,
    engine: IncentiveEngine,
    router: Router,
}

async fn create_test_app() -> TestApp {
    let config = EngineConfig::default();
    let store = Arc::new(MemoryStore::new());
    let stores = Stores::in_memory(store.clone(), config.store_timeout());
    let engine = IncentiveEngine::new(stores, &config);
    let router = create_router(AppState::new(engine.clone(), &config));

    store
        .put_staff(Staff {
            id: "stf_001".to_string(),
            tenant_id: TENANT.to_string(),
            salary: Some(decimal("30000")),
            position: "Senior Stylist".to_string(),
        })
        .await;
    store
        .put_staff(Staff {
            id: "stf_002".to_string(),
            tenant_id: TENANT.to_string(),
            salary: None,
            position: "Trainee".to_string(),
        })
        .await;

    TestApp {
        store,
        engine,
        router,
    }
}

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn json_decimal(value: &Value) -> Decimal {
    decimal(value.as_str().unwrap())
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::from_str(s).unwrap()
}

/// A day far enough ahead that rules stored "now" are already in effect.
fn future_day() -> NaiveDate {
    date("2099-04-10")
}

fn at(day: NaiveDate, hour: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(hour, 0, 0).unwrap())
}

fn invoice(id: &str, customer: &str, created_at: DateTime<Utc>, items: &[(&str, ItemType, &str)]) -> Invoice {
    Invoice {
        id: id.to_string(),
        tenant_id: TENANT.to_string(),
        created_at,
        customer_id: customer.to_string(),
        line_items: items
            .iter()
            .map(|(staff_id, item_type, price)| LineItem {
                staff_id: staff_id.to_string(),
                item_type: *item_type,
                final_price: decimal(price),
            })
            .collect(),
    }
}

fn payout(id: &str, amount: &str, status: PayoutStatus) -> IncentivePayout {
    IncentivePayout {
        id: id.to_string(),
        tenant_id: TENANT.to_string(),
        staff_id: "stf_001".to_string(),
        amount: decimal(amount),
        status,
        requested_at: Utc::now(),
        decided_at: None,
    }
}

fn full_rules(daily_rate: &str) -> Value {
    json!({
        "daily": { "incentive": { "rate": daily_rate } },
        "monthly": { "target": { "multiplier": "3" } },
        "package": { "target": { "target_value": "1000" } },
        "gift_card": {}
    })
}

async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

async fn sync(app: &TestApp, day: NaiveDate, staff_ids: &[&str]) -> (StatusCode, Value) {
    send(
        app.router.clone(),
        "POST",
        &format!("/tenants/{}/sync", TENANT),
        Some(json!({ "date": day.to_string(), "staff_ids": staff_ids })),
    )
    .await
}

async fn daily_incentive(app: &TestApp, staff_id: &str, day: NaiveDate) -> (StatusCode, Value) {
    send(
        app.router.clone(),
        "GET",
        &format!("/tenants/{}/staff/{}/incentives/daily/{}", TENANT, staff_id, day),
        None,
    )
    .await
}

async fn balance(app: &TestApp) -> Value {
    let (status, body) = send(
        app.router.clone(),
        "GET",
        &format!("/tenants/{}/staff/stf_001/balance", TENANT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "unexpected balance response: {}", body);
    body
}

/// Seeds one day of invoices for stf_001 with the given service/product totals.
async fn seed_day(app: &TestApp, day: NaiveDate, service: &str, product: &str) {
    app.store
        .put_invoice(invoice(
            &format!("inv_{}_1", day),
            "cus_1",
            at(day, 10),
            &[("stf_001", ItemType::Service, service)],
        ))
        .await;
    app.store
        .put_invoice(invoice(
            &format!("inv_{}_2", day),
            "cus_2",
            at(day, 16),
            &[
                ("stf_001", ItemType::Product, product),
                ("stf_001", ItemType::Package, "999"),
            ],
        ))
        .await;
}

// =============================================================================
// Sync
// =============================================================================

#[tokio::test]
async fn test_sync_aggregates_service_and_product_sales() {
    let app = create_test_app().await;
    seed_day(&app, future_day(), "4000", "2000").await;

    let (status, report) = sync(&app, future_day(), &["stf_001"]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["updated"], json!(["stf_001"]));
    assert!(report.get("failed").is_none());
    assert_eq!(report["invoices_scanned"], 2);

    let (_, records) = send(
        app.router.clone(),
        "GET",
        &format!("/tenants/{}/staff/stf_001/daily-sales", TENANT),
        None,
    )
    .await;
    let record = &records[0];
    assert_eq!(json_decimal(&record["service_sale"]), decimal("4000"));
    assert_eq!(json_decimal(&record["product_sale"]), decimal("2000"));
    assert_eq!(record["customer_count"], 2);
}

#[tokio::test]
async fn test_sync_twice_is_idempotent() {
    let app = create_test_app().await;
    seed_day(&app, future_day(), "4000", "2000").await;

    sync(&app, future_day(), &["stf_001"]).await;
    let first = app.engine.list_daily_sales(TENANT, "stf_001").await.unwrap();
    sync(&app, future_day(), &["stf_001"]).await;
    let second = app.engine.list_daily_sales(TENANT, "stf_001").await.unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first[0].service_sale, second[0].service_sale);
    assert_eq!(first[0].product_sale, second[0].product_sale);
    assert_eq!(first[0].customer_count, second[0].customer_count);
}

#[tokio::test]
async fn test_reviews_survive_resync() {
    let app = create_test_app().await;
    seed_day(&app, future_day(), "4000", "0").await;
    sync(&app, future_day(), &["stf_001"]).await;

    let (status, _) = send(
        app.router.clone(),
        "PUT",
        &format!("/tenants/{}/staff/stf_001/reviews/{}", TENANT, future_day()),
        Some(json!({ "with_name": 2, "with_photo": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    sync(&app, future_day(), &["stf_001"]).await;
    let (_, daily) = daily_incentive(&app, "stf_001", future_day()).await;

    // 4000 + 2 * 200 + 2 * 300 = 5000, exactly the target
    assert_eq!(daily["record"]["reviews_with_name"], 2);
    assert_eq!(json_decimal(&daily["calculation"]["achieved"]), decimal("5000"));
    assert_eq!(json_decimal(&daily["calculation"]["amount"]), decimal("250"));
}

#[tokio::test]
async fn test_sync_with_empty_staff_list_is_rejected() {
    let app = create_test_app().await;

    let (status, body) = sync(&app, future_day(), &[]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_sync_write_failure_for_one_staff_writes_nothing() {
    let app = create_test_app().await;
    seed_day(&app, future_day(), "4000", "2000").await;
    app.store
        .put_invoice(invoice(
            "inv_trainee",
            "cus_9",
            at(future_day(), 11),
            &[("stf_002", ItemType::Service, "100")],
        ))
        .await;
    app.store.set_fail_upsert_for("stf_002", true).await;

    let (status, body) = sync(&app, future_day(), &["stf_001", "stf_002"]).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "STORE_UNAVAILABLE");
    assert_eq!(body["retryable"], true);
    assert_eq!(app.store.daily_sale_count().await, 0);

    app.store.set_fail_upsert_for("stf_002", false).await;
    let (status, report) = sync(&app, future_day(), &["stf_001", "stf_002"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["updated"], json!(["stf_001", "stf_002"]));
}

// =============================================================================
// Daily incentive scenarios (salary 30000, multiplier 5, 30-day month)
// =============================================================================

async fn scenario(service: &str, product: &str) -> Value {
    let app = create_test_app().await;
    seed_day(&app, future_day(), service, product).await;
    sync(&app, future_day(), &["stf_001"]).await;
    let (status, body) = daily_incentive(&app, "stf_001", future_day()).await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_scenario_a_standard_rate() {
    let body = scenario("4000", "2000").await;

    assert_eq!(json_decimal(&body["calculation"]["target"]), decimal("5000"));
    assert_eq!(json_decimal(&body["calculation"]["achieved"]), decimal("6000"));
    assert_eq!(body["calculation"]["tier"], "standard");
    assert_eq!(json_decimal(&body["calculation"]["amount"]), decimal("300"));
}

#[tokio::test]
async fn test_scenario_b_double_rate() {
    let body = scenario("8000", "4000").await;

    assert_eq!(body["calculation"]["tier"], "double");
    assert_eq!(json_decimal(&body["calculation"]["amount"]), decimal("1200"));
}

#[tokio::test]
async fn test_scenario_c_below_target() {
    let body = scenario("3000", "1000").await;

    assert_eq!(body["calculation"]["tier"], "below_target");
    assert_eq!(json_decimal(&body["calculation"]["amount"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_daily_incentive_for_unsynced_day_is_404() {
    let app = create_test_app().await;
    let (status, _) = daily_incentive(&app, "stf_001", future_day()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_staff_without_salary_is_not_configured() {
    let app = create_test_app().await;
    app.store
        .put_invoice(invoice(
            "inv_trainee",
            "cus_9",
            at(future_day(), 11),
            &[("stf_002", ItemType::Service, "100")],
        ))
        .await;
    sync(&app, future_day(), &["stf_002"]).await;

    let (status, body) = daily_incentive(&app, "stf_002", future_day()).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "NOT_CONFIGURED");
    assert_eq!(body["retryable"], false);
}

// =============================================================================
// Rules
// =============================================================================

#[tokio::test]
async fn test_set_rules_then_get_rules() {
    let app = create_test_app().await;

    let (status, body) = send(
        app.router.clone(),
        "PUT",
        &format!("/tenants/{}/rules", TENANT),
        Some(full_rules("0.07")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["versions"].as_array().unwrap().len(), 4);

    let (status, rules) = send(
        app.router.clone(),
        "GET",
        &format!("/tenants/{}/rules", TENANT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_decimal(&rules["daily"]["rule"]["incentive"]["rate"]), decimal("0.07"));
    // Missing fields are filled from the built-in default
    assert_eq!(
        json_decimal(&rules["daily"]["rule"]["incentive"]["double_rate"]),
        decimal("0.10")
    );
    assert_eq!(
        json_decimal(&rules["monthly"]["rule"]["target"]["multiplier"]),
        decimal("3")
    );
}

#[tokio::test]
async fn test_partial_rule_set_is_rejected_and_nothing_stored() {
    let app = create_test_app().await;

    let (status, body) = send(
        app.router.clone(),
        "PUT",
        &format!("/tenants/{}/rules", TENANT),
        Some(json!({ "daily": {}, "monthly": {} })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("package, gift_card"));

    let (_, history) = send(
        app.router.clone(),
        "GET",
        &format!("/tenants/{}/rules/daily/history", TENANT),
        None,
    )
    .await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_oversized_multiplier_is_rejected() {
    let app = create_test_app().await;
    let mut rules = full_rules("0.07");
    rules["daily"]["target"] = json!({ "multiplier": "10000000000000000000000000" });

    let (status, body) = send(
        app.router.clone(),
        "PUT",
        &format!("/tenants/{}/rules", TENANT),
        Some(rules),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "daily.target.multiplier");

    // The balance stays computable with the built-in rule.
    seed_day(&app, future_day(), "4000", "2000").await;
    sync(&app, future_day(), &["stf_001"]).await;
    assert_eq!(json_decimal(&balance(&app).await["total_earned"]), decimal("300"));
}

#[tokio::test]
async fn test_snapshot_survives_rule_change() {
    let app = create_test_app().await;
    seed_day(&app, future_day(), "4000", "2000").await;
    send(
        app.router.clone(),
        "PUT",
        &format!("/tenants/{}/rules", TENANT),
        Some(full_rules("0.05")),
    )
    .await;
    sync(&app, future_day(), &["stf_001"]).await;

    let (_, before) = daily_incentive(&app, "stf_001", future_day()).await;

    send(
        app.router.clone(),
        "PUT",
        &format!("/tenants/{}/rules", TENANT),
        Some(full_rules("0.09")),
    )
    .await;
    let (_, after) = daily_incentive(&app, "stf_001", future_day()).await;

    assert_eq!(json_decimal(&before["calculation"]["amount"]), decimal("300"));
    assert_eq!(before["calculation"], after["calculation"]);

    // A fresh sync snapshots the newer rule.
    sync(&app, future_day(), &["stf_001"]).await;
    let (_, resynced) = daily_incentive(&app, "stf_001", future_day()).await;
    assert_eq!(json_decimal(&resynced["calculation"]["amount"]), decimal("540"));
}

#[tokio::test]
async fn test_rule_history_lists_versions_oldest_first() {
    let app = create_test_app().await;
    for rate in ["0.05", "0.06", "0.07"] {
        send(
            app.router.clone(),
            "PUT",
            &format!("/tenants/{}/rules", TENANT),
            Some(full_rules(rate)),
        )
        .await;
    }

    let (status, history) = send(
        app.router.clone(),
        "GET",
        &format!("/tenants/{}/rules/daily/history", TENANT),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rates: Vec<Decimal> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|v| json_decimal(&v["draft"]["incentive"]["rate"]))
        .collect();
    assert_eq!(rates, vec![decimal("0.05"), decimal("0.06"), decimal("0.07")]);
}

// =============================================================================
// Monthly incentive
// =============================================================================

fn monthly_rule_set(multiplier: &str) -> RuleSet {
    let mut monthly = RuleDraft::default();
    monthly.target.multiplier = Some(decimal(multiplier));
    RuleSet {
        daily: RuleDraft::default(),
        monthly,
        package: RuleDraft::default(),
        gift_card: RuleDraft::default(),
    }
}

#[tokio::test]
async fn test_monthly_incentive_resolves_rule_at_month_end() {
    let app = create_test_app().await;
    let april = date("2026-04-10");
    seed_day(&app, april, "50000", "10000").await;
    seed_day(&app, date("2026-04-20"), "30000", "0").await;
    app.engine
        .sync(TENANT, april, &["stf_001".to_string()])
        .await
        .unwrap();
    app.engine
        .sync(TENANT, date("2026-04-20"), &["stf_001".to_string()])
        .await
        .unwrap();

    // In effect for April: multiplier 2 => target 60000
    app.store
        .insert_rule_set(TENANT, monthly_rule_set("2"), at(date("2026-03-01"), 0))
        .await
        .unwrap();
    // Created after April closed; ignored for April
    app.store
        .insert_rule_set(TENANT, monthly_rule_set("10"), at(date("2026-05-02"), 0))
        .await
        .unwrap();

    let monthly = app
        .engine
        .get_monthly_incentive(TENANT, "stf_001", YearMonth::new(2026, 4).unwrap())
        .await
        .unwrap();

    assert_eq!(monthly.sales.days_recorded, 2);
    assert_eq!(monthly.calculation.target, decimal("60000"));
    assert_eq!(monthly.calculation.achieved, decimal("90000"));
    assert_eq!(monthly.calculation.tier, IncentiveTier::Standard);
    assert_eq!(monthly.calculation.amount, decimal("4500"));
}

#[tokio::test]
async fn test_monthly_incentive_without_rule_is_zero_over_http() {
    let app = create_test_app().await;
    seed_day(&app, future_day(), "4000", "2000").await;
    sync(&app, future_day(), &["stf_001"]).await;

    let (status, body) = send(
        app.router.clone(),
        "GET",
        &format!("/tenants/{}/staff/stf_001/incentives/monthly/2099-04", TENANT),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["rule"].is_null());
    assert_eq!(body["year_month"], "2099-04");
    assert_eq!(json_decimal(&body["calculation"]["amount"]), Decimal::ZERO);
}

// =============================================================================
// Balance
// =============================================================================

#[tokio::test]
async fn test_scenario_d_total_paid_counts_only_approved() {
    let app = create_test_app().await;
    app.store.put_payout(payout("p1", "500", PayoutStatus::Approved)).await;
    app.store.put_payout(payout("p2", "300", PayoutStatus::Approved)).await;
    app.store.put_payout(payout("p3", "1000", PayoutStatus::Pending)).await;

    let body = balance(&app).await;

    assert_eq!(json_decimal(&body["total_paid"]), decimal("800"));
    assert_eq!(json_decimal(&body["balance"]), decimal("-800"));
}

#[tokio::test]
async fn test_balance_combines_daily_and_monthly() {
    let app = create_test_app().await;
    let april = date("2026-04-10");
    seed_day(&app, april, "4000", "2000").await; // daily 300
    app.engine
        .sync(TENANT, april, &["stf_001".to_string()])
        .await
        .unwrap();
    // Monthly target 30000 * 0.1 = 3000; achieved 6000 => double: 600
    app.store
        .insert_rule_set(TENANT, monthly_rule_set("0.1"), at(date("2026-01-01"), 0))
        .await
        .unwrap();
    app.store.put_payout(payout("p1", "100", PayoutStatus::Approved)).await;

    let body = balance(&app).await;

    assert_eq!(json_decimal(&body["daily_earned"]), decimal("300"));
    assert_eq!(json_decimal(&body["monthly_earned"]), decimal("600"));
    assert_eq!(json_decimal(&body["total_earned"]), decimal("900"));
    assert_eq!(json_decimal(&body["balance"]), decimal("800"));
    assert_eq!(body["months_counted"], 1);
}

#[tokio::test]
async fn test_approving_payout_lowers_balance_by_exactly_its_amount() {
    let app = create_test_app().await;
    seed_day(&app, future_day(), "4000", "2000").await;
    sync(&app, future_day(), &["stf_001"]).await;
    app.store.put_payout(payout("p1", "123.45", PayoutStatus::Pending)).await;
    app.store.put_payout(payout("p2", "50", PayoutStatus::Rejected)).await;

    let before = json_decimal(&balance(&app).await["balance"]);
    assert_eq!(before, decimal("300"));

    assert!(app.store.set_payout_status("p1", PayoutStatus::Approved).await);
    let after = json_decimal(&balance(&app).await["balance"]);

    assert_eq!(before - after, decimal("123.45"));

    assert!(app.store.set_payout_status("p2", PayoutStatus::Rejected).await);
    assert_eq!(json_decimal(&balance(&app).await["balance"]), after);
}

#[tokio::test]
async fn test_balance_for_unknown_staff_is_not_found() {
    let app = create_test_app().await;
    let error = app.engine.get_balance(TENANT, "stf_404").await.unwrap_err();
    assert!(matches!(error, EngineError::NotFound { .. }));
}

#[tokio::test]
async fn test_engine_rejects_partial_submission() {
    let app = create_test_app().await;
    let submission = RuleSubmission {
        daily: Some(RuleDraft::default()),
        ..RuleSubmission::default()
    };

    let error = app.engine.set_rules(TENANT, submission).await.unwrap_err();

    assert!(matches!(error, EngineError::Validation { .. }));
    assert!(!error.is_retryable());
}
