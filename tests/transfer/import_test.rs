//! Import workflow against an in-memory database.

#[path = "../common/mod.rs"]
mod common;

use std::fs;
use std::path::PathBuf;

use tempfile::{tempdir, TempDir};

use common::{config, orchestrator, MockDatabase};
use flatbridge::flatfile::Delimiter;
use flatbridge::transfer::{FileFormat, ImportRequest, Stage, TempUpload, TransferError};

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn request(columns: &[&str], table: &str) -> ImportRequest {
    ImportRequest {
        format: FileFormat::default(),
        columns: columns.iter().map(|s| s.to_string()).collect(),
        target_table: table.to_string(),
    }
}

#[tokio::test]
async fn test_import_infers_schema_and_inserts_all_rows() {
    let dir = tempdir().unwrap();
    let file = write_file(&dir, "data.csv", "id,amount\n1,9.5\n2,7.0\n");
    let db = MockDatabase::new();
    let orch = orchestrator(&db, dir.path());

    let result = orch
        .import(&config(), &file, &request(&["id", "amount"], "t"))
        .await
        .unwrap();

    assert_eq!(result.row_count, 2);
    assert_eq!(result.table, "t");
    assert_eq!(
        db.statements(),
        vec![
            "CREATE TABLE IF NOT EXISTS `db`.`t` (`id` Float64, `amount` Float64) ENGINE = MergeTree() ORDER BY tuple()",
            "INSERT INTO `db`.`t` (`id`, `amount`) VALUES (1, 9.5), (2, 7.0)",
        ]
    );
}

#[tokio::test]
async fn test_import_twice_is_idempotent() {
    let dir = tempdir().unwrap();
    let file = write_file(&dir, "data.csv", "id,amount\n1,9.5\n2,7.0\n");
    let db = MockDatabase::new();
    let orch = orchestrator(&db, dir.path());
    let req = request(&["id", "amount"], "t");

    orch.import(&config(), &file, &req).await.unwrap();
    orch.import(&config(), &file, &req).await.unwrap();

    let statements = db.statements();
    assert_eq!(statements.len(), 4);
    assert_eq!(statements[0], statements[2]);
    assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS"));
}

#[tokio::test]
async fn test_import_selected_columns_case_insensitive() {
    let dir = tempdir().unwrap();
    let file = write_file(
        &dir,
        "people.csv",
        "Name , Joined, Active\nann,2024-01-01,true\nbob,2024-02-01,false",
    );
    let db = MockDatabase::new();
    let orch = orchestrator(&db, dir.path());

    let result = orch
        .import(&config(), &file, &request(&["ACTIVE", "name"], "people"))
        .await
        .unwrap();

    assert_eq!(result.row_count, 2);
    let statements = db.statements();
    assert_eq!(
        statements[0],
        "CREATE TABLE IF NOT EXISTS `db`.`people` (`active` UInt8, `name` String) ENGINE = MergeTree() ORDER BY tuple()"
    );
    assert_eq!(
        statements[1],
        "INSERT INTO `db`.`people` (`active`, `name`) VALUES (true, 'ann'), (false, 'bob')"
    );
}

#[tokio::test]
async fn test_import_headerless_file() {
    let dir = tempdir().unwrap();
    let file = write_file(&dir, "raw.psv", "1|x\n2|y");
    let db = MockDatabase::new();
    let orch = orchestrator(&db, dir.path());
    let req = ImportRequest {
        format: FileFormat {
            delimiter: Delimiter::parse("|").unwrap(),
            has_header: false,
        },
        columns: vec!["column1".into(), "column2".into()],
        target_table: "raw".into(),
    };

    let result = orch.import(&config(), &file, &req).await.unwrap();
    assert_eq!(result.row_count, 2);
    assert!(db.statements()[1].ends_with("VALUES (1, 'x'), (2, 'y')"));
}

#[tokio::test]
async fn test_import_empty_file() {
    let dir = tempdir().unwrap();
    let db = MockDatabase::new();
    let orch = orchestrator(&db, dir.path());

    let empty = write_file(&dir, "empty.csv", "  \n\n");
    let err = orch
        .import(&config(), &empty, &request(&["id"], "t"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::EmptyFile));

    let header_only = write_file(&dir, "header.csv", "id,amount\n");
    let err = orch
        .import(&config(), &header_only, &request(&["id"], "t"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::EmptyFile));
    assert!(db.statements().is_empty());
}

#[tokio::test]
async fn test_import_validates_request() {
    let dir = tempdir().unwrap();
    let file = write_file(&dir, "data.csv", "id\n1");
    let db = MockDatabase::new();
    let orch = orchestrator(&db, dir.path());

    let err = orch
        .import(&config(), &file, &request(&[], "t"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Configuration(_)));

    let err = orch
        .import(&config(), &file, &request(&["id"], "  "))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Configuration(_)));

    let err = orch
        .import(&config(), &file, &request(&["id"], "t; DROP TABLE x"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::InvalidIdentifier(_)));
    assert!(db.statements().is_empty());
}

#[tokio::test]
async fn test_import_rejects_columns_equal_after_normalization() {
    let dir = tempdir().unwrap();
    let file = write_file(&dir, "data.csv", "Amount,amount\n1,2");
    let db = MockDatabase::new();
    let orch = orchestrator(&db, dir.path());

    let err = orch
        .import(&config(), &file, &request(&["Amount", "amount"], "payments"))
        .await
        .unwrap_err();
    match err {
        TransferError::Configuration(message) => assert!(message.contains("amount"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(db.statements().is_empty());
}

#[tokio::test]
async fn test_insert_failure_keeps_created_table() {
    let dir = tempdir().unwrap();
    let file = write_file(&dir, "data.csv", "qty\n5\nmany");
    let db = MockDatabase::new().failing_on("INSERT", "Code: 27. Cannot parse input");
    let orch = orchestrator(&db, dir.path());

    let err = orch
        .import(&config(), &file, &request(&["qty"], "stock"))
        .await
        .unwrap_err();

    match err {
        TransferError::QueryExecution { stage, message } => {
            assert_eq!(stage, Stage::Insert);
            assert!(message.contains("Cannot parse input"));
        }
        other => panic!("expected QueryExecution, got {other:?}"),
    }
    let statements = db.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].contains("`qty` Float64"));
    assert!(statements[1].ends_with("VALUES (5), ('many')"));
}

#[tokio::test]
async fn test_create_failure_reports_stage() {
    let dir = tempdir().unwrap();
    let file = write_file(&dir, "data.csv", "id\n1");
    let db = MockDatabase::new().failing_on("CREATE", "Code: 497. Not enough privileges");
    let orch = orchestrator(&db, dir.path());

    let err = orch
        .import(&config(), &file, &request(&["id"], "t"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransferError::QueryExecution { stage: Stage::CreateTable, .. }
    ));
    assert_eq!(db.statements().len(), 1);
}

#[tokio::test]
async fn test_import_upload_removes_file_on_success_and_failure() {
    let dir = tempdir().unwrap();
    let db = MockDatabase::new();
    let orch = orchestrator(&db, dir.path());

    let ok = write_file(&dir, "ok.csv", "id\n1");
    let upload = TempUpload::new(&ok, Some("ok.csv".into()));
    orch.import_upload(&config(), upload, &request(&["id"], "t"))
        .await
        .unwrap();
    assert!(!ok.exists());

    let bad = write_file(&dir, "bad.csv", "");
    let upload = TempUpload::new(&bad, None);
    let err = orch
        .import_upload(&config(), upload, &request(&["id"], "t"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::EmptyFile));
    assert!(!bad.exists());
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let db = MockDatabase::new();
    let orch = orchestrator(&db, dir.path());

    let err = orch
        .import(&config(), &dir.path().join("nope.csv"), &request(&["id"], "t"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Io { .. }));
    assert!(!err.is_client_error());
}
