//! Tests against a real MySQL server.
//!
//! These start a MySQL container (or use `STAR_ETL_TEST_MYSQL_URL`) and are
//! ignored by default. Run with `cargo test -- --ignored`.

use etl_core::{Error, Table};
use integration_tests::fixtures::small_source;
use integration_tests::setup::MySqlTestContext;
use mysql_async::prelude::*;
use mysql_store::{health, query, MySqlClient, MySqlWarehouse, WarehouseStore};
use worker::Command;

#[tokio::test]
#[ignore = "requires docker"]
async fn test_schema_creation_is_idempotent() {
    let ctx = MySqlTestContext::new(&small_source()).await;
    assert!(health::check_connection(&ctx.warehouse).await);

    let exporter = ctx.orchestrator.exporter();
    exporter.create_schema().await.unwrap();
    exporter.create_schema().await.unwrap();

    let mut tables = query::list_tables(&ctx.warehouse).await.unwrap();
    tables.sort();
    let mut expected: Vec<String> = Table::ALL.iter().map(|t| t.name().to_string()).collect();
    expected.sort();
    assert_eq!(tables, expected);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_complete_etl_loads_warehouse() {
    let ctx = MySqlTestContext::new(&small_source()).await;

    let report = ctx.orchestrator.run(Command::Complete).await;
    assert!(report.is_success(), "{:?}", report.failure);

    assert_eq!(query::count_rows(&ctx.warehouse, Table::Customer).await.unwrap(), 7);
    assert_eq!(query::count_rows(&ctx.warehouse, Table::Restaurant).await.unwrap(), 3);
    assert_eq!(query::count_rows(&ctx.warehouse, Table::Location).await.unwrap(), 50);
    assert_eq!(query::count_rows(&ctx.warehouse, Table::TimeSlot).await.unwrap(), 48);
    assert_eq!(query::count_rows(&ctx.warehouse, Table::DeliveryPerson).await.unwrap(), 30);
    assert_eq!(query::count_rows(&ctx.warehouse, Table::FactOrders).await.unwrap(), 7);

    let facts = query::fetch_rows(&ctx.warehouse, Table::FactOrders).await.unwrap();
    let first = &facts[0];
    assert_eq!(first[0].as_deref(), Some("1"));
    assert_eq!(first[1].as_deref(), Some("7"));
    assert_eq!(first[10], None);
    assert_eq!(first[13].as_deref(), Some("30"));

    let restaurants = query::fetch_rows(&ctx.warehouse, Table::Restaurant).await.unwrap();
    assert_eq!(restaurants[0][3].as_deref(), Some("4.00"));
    assert_eq!(restaurants[2][3].as_deref(), Some("0.00"));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_foreign_keys_are_enforced() {
    let ctx = MySqlTestContext::new(&small_source()).await;
    ctx.orchestrator.exporter().create_schema().await.unwrap();

    let warehouse = MySqlWarehouse::new(ctx.warehouse.clone());
    let fact: Vec<Option<String>> = [
        "1", "7", "2", "3", "2", "4", "7", "2024-03-06", "13:05:09", "12.50", "NULL", "10", "20",
        "30",
    ]
    .iter()
    .map(|v| if *v == "NULL" { None } else { Some(v.to_string()) })
    .collect();

    let result = warehouse.insert_rows(Table::FactOrders, &[fact]).await;
    assert!(matches!(result, Err(Error::Load { .. })), "{:?}", result);
    assert_eq!(query::count_rows(&ctx.warehouse, Table::FactOrders).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_unreachable_source_fails_first_step() {
    let ctx = MySqlTestContext::new(&small_source()).await;

    let mut config = ctx.config.source.clone();
    config.url = "mysql://127.0.0.1:1".to_string();
    let client = MySqlClient::new(config).unwrap();
    assert!(!health::check_connection(&client).await);

    let orchestrator = worker::PipelineOrchestrator::new(
        &ctx.config,
        std::sync::Arc::new(mysql_store::MySqlSource::new(client)),
        std::sync::Arc::new(MySqlWarehouse::new(ctx.warehouse.clone())),
    );
    let report = orchestrator.run(Command::Full).await;
    let failure = report.failure.expect("run should fail");
    assert_eq!(failure.position, 1);
    assert!(matches!(failure.error, Error::Connection(_)));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_null_source_columns_load_with_defaults() {
    let ctx = MySqlTestContext::new(&small_source()).await;
    {
        let mut conn = ctx.source.conn().await.unwrap();
        conn.query_drop("INSERT INTO days VALUES (10, NULL)").await.unwrap();
        conn.query_drop("INSERT INTO orders VALUES (8, 7, 1, 10, NULL, NULL, NULL, NULL)")
            .await
            .unwrap();
    }

    let report = ctx.orchestrator.run(Command::Complete).await;
    assert!(report.is_success(), "{:?}", report.failure);

    let facts = query::fetch_rows(&ctx.warehouse, Table::FactOrders).await.unwrap();
    let odd = facts
        .iter()
        .find(|f| f[0].as_deref() == Some("8"))
        .expect("order 8 missing");
    assert_eq!(odd[9].as_deref(), Some("0.00"));
    assert_eq!(odd[10], None);
    assert_eq!(odd[11].as_deref(), Some("0"));
    assert_eq!(odd[13].as_deref(), Some("0"));

    let order_date = chrono::NaiveDate::parse_from_str(odd[7].as_deref().unwrap(), "%Y-%m-%d").unwrap();
    assert_eq!(chrono::Datelike::weekday(&order_date), chrono::Weekday::Mon);
}
