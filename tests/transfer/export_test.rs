//! Preview and export workflows against an in-memory database.

#[path = "../common/mod.rs"]
mod common;

use std::fs;

use serde_json::{json, Value};
use tempfile::tempdir;

use common::{config, numbered_rows, orchestrator, MockDatabase};
use flatbridge::flatfile::Delimiter;
use flatbridge::transfer::{ColumnRef, JoinSpec, Selection, Stage, TransferError};

fn selection(tables: &[&str], columns: &[(&str, &str)], join: Option<&str>) -> Selection {
    Selection {
        tables: tables.iter().map(|s| s.to_string()).collect(),
        columns: columns
            .iter()
            .map(|(t, c)| ColumnRef::new(*t, *c))
            .collect(),
        join_condition: join.map(String::from),
        joins: None,
    }
}

#[tokio::test]
async fn test_export_single_table() {
    let dir = tempdir().unwrap();
    let db = MockDatabase::new().with_rows(vec![
        json!({"id": "1", "amount": 9.5}),
        json!({"id": "2", "amount": null}),
    ]);
    let orch = orchestrator(&db, dir.path());

    let result = orch
        .export(
            &config(),
            &selection(&["orders"], &[("orders", "id"), ("orders", "amount")], None),
            Delimiter::COMMA,
        )
        .await
        .unwrap();

    assert_eq!(
        db.queries(),
        vec!["SELECT `orders`.`id` AS `id`, `orders`.`amount` AS `amount` FROM `db`.`orders`"]
    );
    assert_eq!(result.row_count, 2);
    assert!(result.file_name.starts_with("export_") && result.file_name.ends_with(".csv"));
    assert_eq!(result.file_path, dir.path().join(&result.file_name));
    assert_eq!(
        fs::read_to_string(&result.file_path).unwrap(),
        "id,amount\n1,9.5\n2,\n"
    );
}

#[tokio::test]
async fn test_export_two_tables_with_join() {
    let dir = tempdir().unwrap();
    let db = MockDatabase::new().with_rows(vec![
        json!({"orders_id": "7", "customers_name": "Ann, Jr."}),
    ]);
    let orch = orchestrator(&db, dir.path());

    let result = orch
        .export(
            &config(),
            &selection(
                &["orders", "customers"],
                &[("orders", "id"), ("customers", "name")],
                Some("orders.cust_id = customers.id"),
            ),
            Delimiter::COMMA,
        )
        .await
        .unwrap();

    let queries = db.queries();
    assert_eq!(queries.len(), 1);
    let sql = &queries[0];
    assert_eq!(sql.matches("JOIN").count(), 1);
    assert!(sql.contains("INNER JOIN `db`.`customers` ON orders.cust_id = customers.id"));
    assert!(sql.contains("AS `orders_id`") && sql.contains("AS `customers_name`"));

    assert_eq!(
        fs::read_to_string(&result.file_path).unwrap(),
        "orders_id,customers_name\n7,\"Ann, Jr.\"\n"
    );
}

#[tokio::test]
async fn test_export_two_tables_without_join_runs_nothing() {
    let dir = tempdir().unwrap();
    let db = MockDatabase::new().with_rows(numbered_rows(3));
    let orch = orchestrator(&db, dir.path());

    let err = orch
        .export(
            &config(),
            &selection(&["orders", "customers"], &[("orders", "id")], None),
            Delimiter::COMMA,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::MissingJoinCondition));
    assert!(db.queries().is_empty());
    assert_eq!(db.state().connects, 0);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_export_explicit_joins_and_tab_delimiter() {
    let dir = tempdir().unwrap();
    let db = MockDatabase::new().with_rows(vec![json!({"a_x": 1, "c_y": "z"})]);
    let orch = orchestrator(&db, dir.path());

    let mut sel = selection(&["a", "b", "c"], &[("a", "x"), ("c", "y")], None);
    sel.joins = Some(vec![
        JoinSpec::new("b", "a.id = b.a_id"),
        JoinSpec::new("c", "b.id = c.b_id"),
    ]);
    let result = orch
        .export(&config(), &sel, Delimiter::parse("tab").unwrap())
        .await
        .unwrap();

    let sql = &db.queries()[0];
    assert!(sql.contains("INNER JOIN `db`.`b` ON a.id = b.a_id INNER JOIN `db`.`c` ON b.id = c.b_id"));
    assert_eq!(
        fs::read_to_string(&result.file_path).unwrap(),
        "a_x\tc_y\n1\tz\n"
    );
}

#[tokio::test]
async fn test_concurrent_exports_get_distinct_files() {
    let dir = tempdir().unwrap();
    let db = MockDatabase::new().with_rows(numbered_rows(2));
    let orch = orchestrator(&db, dir.path());
    let sel = selection(&["t"], &[("t", "id")], None);

    let (cfg_a, cfg_b) = (config(), config());
    let (a, b) = tokio::join!(
        orch.export(&cfg_a, &sel, Delimiter::COMMA),
        orch.export(&cfg_b, &sel, Delimiter::COMMA)
    );
    assert_ne!(a.unwrap().file_path, b.unwrap().file_path);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[tokio::test]
async fn test_preview_caps_at_100_rows() {
    let dir = tempdir().unwrap();
    let db = MockDatabase::new().with_rows(numbered_rows(500));
    let orch = orchestrator(&db, dir.path());
    let sel = selection(&["orders"], &[("orders", "id"), ("orders", "amount")], None);

    let preview = orch.preview(&config(), &sel).await.unwrap();
    assert_eq!(preview.row_count, 100);
    assert_eq!(preview.rows.len(), 100);
    assert!(db.queries()[0].ends_with(" LIMIT 100"));
    assert_eq!(preview.rows[0]["id"], json!("1"));

    let export = orch.export(&config(), &sel, Delimiter::COMMA).await.unwrap();
    assert_eq!(export.row_count, 500);
    assert!(!db.queries()[1].contains("LIMIT"));
}

#[tokio::test]
async fn test_preview_maps_missing_columns_to_null() {
    let dir = tempdir().unwrap();
    let db = MockDatabase::new().with_rows(vec![json!({"name": "ann"})]);
    let orch = orchestrator(&db, dir.path());
    let sel = selection(
        &["a", "b"],
        &[("b", "name"), ("a", "id")],
        Some("a.id = b.a_id"),
    );

    let preview = orch.preview(&config(), &sel).await.unwrap();
    assert_eq!(
        Value::Object(preview.rows[0].clone()),
        json!({"b_name": "ann", "a_id": null})
    );
}

#[tokio::test]
async fn test_preview_requires_connection_details() {
    let dir = tempdir().unwrap();
    let db = MockDatabase::new();
    let orch = orchestrator(&db, dir.path());
    let mut cfg = config();
    cfg.host.clear();

    let err = orch
        .preview(&cfg, &selection(&["t"], &[("t", "id")], None))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Configuration(_)));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_rejects_unsafe_names_before_querying() {
    let dir = tempdir().unwrap();
    let db = MockDatabase::new();
    let orch = orchestrator(&db, dir.path());

    let err = orch
        .preview(
            &config(),
            &selection(&["t"], &[("t", "id` FROM x; --")], None),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::InvalidIdentifier(_)));

    let err = orch
        .preview(
            &config(),
            &selection(&["a", "b"], &[("a", "id")], Some("a.id = b.id; DROP TABLE a")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::InvalidJoinPredicate(_)));
    assert!(db.queries().is_empty());
}

#[tokio::test]
async fn test_query_failure_reports_stage() {
    struct Failing;

    #[async_trait::async_trait]
    impl flatbridge::database::DatabaseProvider for Failing {
        async fn list_tables(&self, _: &str) -> flatbridge::database::DatabaseResult<Vec<String>> {
            Ok(vec![])
        }
        async fn list_columns(
            &self,
            _: &str,
            _: &[String],
        ) -> flatbridge::database::DatabaseResult<Vec<flatbridge::database::ColumnInfo>> {
            Ok(vec![])
        }
        async fn execute_query(
            &self,
            _: &str,
        ) -> flatbridge::database::DatabaseResult<Vec<flatbridge::database::Row>> {
            Err(flatbridge::database::DatabaseError::server(
                404,
                "Code: 60. DB::Exception: Table db.orders does not exist",
            ))
        }
        async fn execute_statement(&self, _: &str) -> flatbridge::database::DatabaseResult<()> {
            Ok(())
        }
    }

    struct FailingFactory;
    impl flatbridge::database::ConnectionFactory for FailingFactory {
        fn connect(
            &self,
            _: &flatbridge::config::ConnectionConfig,
        ) -> flatbridge::database::DatabaseResult<Box<dyn flatbridge::database::DatabaseProvider>>
        {
            Ok(Box::new(Failing))
        }
    }

    let orch = flatbridge::Orchestrator::new(
        std::sync::Arc::new(FailingFactory),
        flatbridge::transfer::TransferOptions::default(),
    );
    let err = orch
        .preview(&config(), &selection(&["orders"], &[("orders", "id")], None))
        .await
        .unwrap_err();

    match err {
        TransferError::QueryExecution { stage, message } => {
            assert_eq!(stage, Stage::Preview);
            assert!(message.contains("does not exist"));
        }
        other => panic!("expected QueryExecution, got {other:?}"),
    }
}
