//! Sandbox execution against a real file.

use pretty_assertions::assert_eq;
use querygate::db::{SandboxExecutor, Value};
use querygate::error::ErrorKind;
use querygate::safety::validate_sql;

use super::fixtures::ShopDb;

#[tokio::test]
async fn test_join_across_tables() {
    let db = ShopDb::create().await;
    let statement = validate_sql(
        "SELECT e.last_name, p.name FROM employee e JOIN product p ON p.price > e.salary / 1000 ORDER BY e.last_name, p.name",
    )
    .unwrap();

    let result = SandboxExecutor::new()
        .execute(&statement, &db.handle())
        .await
        .unwrap();

    assert_eq!(result.columns, vec!["last_name", "name"]);
    assert_eq!(
        result.rows,
        vec![
            vec![Value::from("Hopper"), Value::from("Laptop")],
            vec![Value::from("Hopper"), Value::from("Monitor")],
            vec![Value::from("Lovelace"), Value::from("Laptop")],
            vec![Value::from("Lovelace"), Value::from("Monitor")],
            vec![Value::from("Pauling"), Value::from("Laptop")],
            vec![Value::from("Pauling"), Value::from("Monitor")],
        ]
    );
    assert_eq!(result.row_count, 6);
}

#[tokio::test]
async fn test_storage_classes() {
    let db = ShopDb::create().await;
    let statement =
        validate_sql("SELECT NULL AS missing, 42 AS answer, 2.5 AS ratio, 'x' AS label, X'CAFE' AS raw")
            .unwrap();

    let result = SandboxExecutor::new()
        .execute(&statement, &db.handle())
        .await
        .unwrap();

    assert_eq!(
        result.rows,
        vec![vec![
            Value::Null,
            Value::Integer(42),
            Value::Real(2.5),
            Value::from("x"),
            Value::Blob(vec![0xCA, 0xFE]),
        ]]
    );
}

#[tokio::test]
async fn test_unknown_table_is_execution_error() {
    let db = ShopDb::create().await;
    let statement = validate_sql("SELECT * FROM orders").unwrap();

    let err = SandboxExecutor::new()
        .execute(&statement, &db.handle())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ExecutionError);
    assert!(err.to_string().contains("no such table: orders"));
}

#[tokio::test]
async fn test_repeated_execution_leaves_file_untouched() {
    let db = ShopDb::create().await;
    let before = db.bytes();
    let executor = SandboxExecutor::new();
    let statement = validate_sql("SELECT * FROM product").unwrap();

    for _ in 0..3 {
        let result = executor.execute(&statement, &db.handle()).await.unwrap();
        assert_eq!(result.row_count, 3);
    }

    assert_eq!(db.bytes(), before);
}
