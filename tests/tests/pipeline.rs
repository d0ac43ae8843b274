//! End-to-end pipeline runs against in-memory stores.

use chrono::{Datelike, Weekday};
use etl_core::{Error, Table, DATE_FORMAT};
use integration_tests::fixtures::{order, small_source};
use integration_tests::mocks::SourceQuery;
use integration_tests::setup::{reference_date, TestContext};
use worker::job::SUCCESS_MARKER;
use worker::Command;

#[tokio::test]
async fn test_full_run_writes_every_table() {
    let ctx = TestContext::new();

    let report = ctx.run(Command::Full).await;
    assert!(report.is_success(), "{:?}", report.failure);
    assert_eq!(report.completed.len(), 7);

    for table in Table::ALL {
        assert!(
            ctx.table_dir(table).join(SUCCESS_MARKER).exists(),
            "{} has no success marker",
            table
        );
        for record in ctx.records(table).await {
            assert_eq!(record.len(), table.column_count(), "{}", table);
        }
    }

    assert_eq!(ctx.lines(Table::Customer).await.len(), 7);
    assert_eq!(ctx.lines(Table::Restaurant).await.len(), 3);
    assert_eq!(ctx.lines(Table::Location).await.len(), 50);
    assert_eq!(ctx.lines(Table::TimeSlot).await.len(), 48);
    assert_eq!(ctx.lines(Table::DeliveryPerson).await.len(), 30);
    assert_eq!(ctx.lines(Table::FactOrders).await.len(), 7);
    // One read per source-backed step plus one per restaurant map task.
    assert_eq!(ctx.source.connect_count(), 7);
    assert_eq!(ctx.source.open_connections(), 0);
}

#[tokio::test]
async fn test_reference_order_fact() {
    let ctx = TestContext::new();
    assert!(ctx.run(Command::Full).await.is_success());

    let facts = ctx.records(Table::FactOrders).await;
    let first = facts.iter().find(|f| f[0] == "1").expect("order 1 missing");

    assert_eq!(first[1], "7");
    assert_eq!(first[2], "2");
    assert_eq!(first[4], "2");
    assert_eq!(first[9], "12.50");
    assert_eq!(first[10], "NULL");
    assert_eq!(first[13], "30");

    let order_date = chrono::NaiveDate::parse_from_str(&first[7], DATE_FORMAT).unwrap();
    assert_eq!(order_date.weekday(), Weekday::Wed);
    assert!(order_date <= reference_date());
}

#[tokio::test]
async fn test_restaurant_averages_and_segments() {
    let ctx = TestContext::new();
    assert!(ctx.run(Command::Dimensions).await.is_success());

    let restaurants = ctx.records(Table::Restaurant).await;
    let rating = |id: &str| {
        restaurants
            .iter()
            .find(|r| r[0] == id)
            .map(|r| r[3].clone())
            .unwrap()
    };
    assert_eq!(rating("1"), "4.00");
    assert_eq!(rating("2"), "4.00");
    assert_eq!(rating("3"), "0.00");

    let customers = ctx.records(Table::Customer).await;
    let segment = |id: &str| {
        customers
            .iter()
            .find(|c| c[0] == id)
            .map(|c| c[2].clone())
            .unwrap()
    };
    assert_eq!(segment("3"), "Premium");
    assert_eq!(segment("6"), "Premium");
    assert_eq!(segment("4"), "Regular");
    assert_eq!(segment("7"), "Basic");
}

#[tokio::test]
async fn test_complete_run_loads_with_integrity() {
    let ctx = TestContext::new();

    let report = ctx.run(Command::Complete).await;
    assert!(report.is_success(), "{:?}", report.failure);
    assert_eq!(report.completed.len(), 8);
    assert_eq!(report.completed.last().map(String::as_str), Some("export"));

    assert_eq!(ctx.warehouse.table_count(), 7);
    assert_eq!(ctx.warehouse.row_count(Table::FactOrders), 7);
    assert_eq!(ctx.warehouse.row_count(Table::Customer), 7);
    assert_eq!(ctx.warehouse.row_count(Table::TimeSlot), 48);

    for fact in ctx.warehouse.rows(Table::FactOrders) {
        let prep: i64 = fact[11].as_deref().unwrap().parse().unwrap();
        let delivery: i64 = fact[12].as_deref().unwrap().parse().unwrap();
        let total: i64 = fact[13].as_deref().unwrap().parse().unwrap();
        assert_eq!(total, prep + delivery);
    }
}

#[tokio::test]
async fn test_days_query_failure_stops_at_date_step() {
    let ctx = TestContext::new();
    ctx.source.fail_query(SourceQuery::Days);

    let report = ctx.run(Command::Full).await;
    let failure = report.failure.as_ref().expect("run should fail");

    assert_eq!(failure.position, 3);
    assert_eq!(failure.name, "dim_date");
    assert!(matches!(failure.error, Error::Extraction(_)));
    assert_eq!(report.completed, vec!["dim_customer", "dim_restaurant"]);
    assert_eq!(report.exit_code(), 1);

    assert!(!ctx.table_dir(Table::Location).exists());
    assert!(!ctx.table_dir(Table::FactOrders).exists());
    assert_eq!(ctx.source.open_connections(), 0);
}

#[tokio::test]
async fn test_rating_query_failure_stops_at_restaurant_step() {
    let ctx = TestContext::new();
    ctx.source.fail_query(SourceQuery::AverageRating);

    let report = ctx.run(Command::Full).await;
    let failure = report.failure.as_ref().expect("run should fail");

    assert_eq!(failure.position, 2);
    assert_eq!(failure.name, "dim_restaurant");
    assert!(matches!(failure.error, Error::Extraction(_)));
    assert_eq!(report.completed, vec!["dim_customer"]);
    assert_eq!(report.exit_code(), 1);

    let dir = ctx.table_dir(Table::Restaurant);
    assert!(!dir.join(SUCCESS_MARKER).exists());
    assert!(ctx.lines(Table::Restaurant).await.is_empty());
    assert!(!ctx.table_dir(Table::Date).exists());
    assert_eq!(ctx.source.open_connections(), 0);
}

#[tokio::test]
async fn test_orders_query_failure_fails_fact_run() {
    let ctx = TestContext::new();
    ctx.source.fail_query(SourceQuery::Orders);

    let report = ctx.run(Command::Fact).await;
    let failure = report.failure.as_ref().expect("run should fail");

    assert_eq!(failure.position, 1);
    assert_eq!(failure.name, "fact_orders");
    assert!(matches!(failure.error, Error::Extraction(_)));
    assert_eq!(report.exit_code(), 1);
    assert!(!ctx.table_dir(Table::FactOrders).join(SUCCESS_MARKER).exists());
}

#[tokio::test]
async fn test_customer_query_failure_stops_first_step() {
    let ctx = TestContext::new();
    ctx.source.fail_query(SourceQuery::CustomerIds);

    let report = ctx.run(Command::Dimensions).await;
    let failure = report.failure.as_ref().expect("run should fail");
    assert_eq!(failure.position, 1);
    assert_eq!(failure.name, "dim_customer");
    assert!(report.completed.is_empty());
}

#[tokio::test]
async fn test_restaurant_query_failure_stops_second_step() {
    let ctx = TestContext::new();
    ctx.source.fail_query(SourceQuery::Restaurants);

    let report = ctx.run(Command::Dimensions).await;
    let failure = report.failure.as_ref().expect("run should fail");
    assert_eq!(failure.position, 2);
    assert!(matches!(failure.error, Error::Extraction(_)));
}

#[tokio::test]
async fn test_unreachable_source_fails_first_step() {
    let ctx = TestContext::new();
    ctx.source.set_unreachable(true);

    let report = ctx.run(Command::Complete).await;
    let failure = report.failure.as_ref().expect("run should fail");

    assert_eq!(failure.position, 1);
    assert!(matches!(failure.error, Error::Connection(_)));
    assert!(report.completed.is_empty());
    assert_eq!(ctx.warehouse.table_count(), 0);
}

#[tokio::test]
async fn test_fact_only_run_needs_no_dimensions() {
    let ctx = TestContext::new();

    let report = ctx.run(Command::Fact).await;
    assert!(report.is_success());
    assert_eq!(report.completed, vec!["fact_orders"]);
    assert!(!ctx.table_dir(Table::Customer).exists());
    assert_eq!(ctx.lines(Table::FactOrders).await.len(), 7);
}

#[tokio::test]
async fn test_unknown_day_name_dates_on_monday() {
    let mut fixture = small_source();
    fixture.orders.push(order(8, 7, 1, None, "Someday"));
    let ctx = TestContext::with_source(fixture);

    assert!(ctx.run(Command::Fact).await.is_success());

    let facts = ctx.records(Table::FactOrders).await;
    let odd = facts.iter().find(|f| f[0] == "8").unwrap();
    let order_date = chrono::NaiveDate::parse_from_str(&odd[7], DATE_FORMAT).unwrap();
    assert_eq!(order_date.weekday(), Weekday::Mon);
}

#[tokio::test]
async fn test_seeded_runs_are_reproducible() {
    let first = TestContext::new();
    let second = TestContext::new();

    assert!(first.run(Command::Full).await.is_success());
    assert!(second.run(Command::Full).await.is_success());

    for table in Table::ALL {
        assert_eq!(first.lines(table).await, second.lines(table).await, "{}", table);
    }
}

#[tokio::test]
async fn test_rerun_overwrites_output() {
    let ctx = TestContext::new();
    assert!(ctx.run(Command::Dimensions).await.is_success());
    let before = ctx.lines(Table::Location).await;

    assert!(ctx.run(Command::Dimensions).await.is_success());
    assert_eq!(ctx.lines(Table::Location).await, before);
}
