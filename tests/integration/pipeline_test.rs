//! End-to-end pipeline tests: generation, extraction, validation, execution.

use pretty_assertions::assert_eq;
use querygate::db::{DataSourceHandle, Value};
use querygate::error::ErrorKind;
use querygate::llm::MockGenerator;

use super::fixtures::{gateway_with, mock_gateway, ShopDb};

fn text_column(values: Vec<&Value>) -> Vec<String> {
    let mut names: Vec<String> = values.into_iter().map(Value::to_display_string).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_fenced_answer_with_chatter() {
    let db = ShopDb::create().await;
    let gateway = mock_gateway();

    let outcome = gateway
        .ask("Which products are expensive?", Some(&db.handle()))
        .await
        .unwrap();

    assert_eq!(outcome.question.as_deref(), Some("Which products are expensive?"));
    assert_eq!(outcome.sql, "SELECT name FROM product WHERE price > 100");
    assert_eq!(outcome.result.columns, vec!["name"]);
    assert_eq!(
        text_column(outcome.result.column_values("name").unwrap()),
        vec!["Laptop", "Monitor"]
    );
}

#[tokio::test]
async fn test_labeled_answer_with_explanation() {
    let db = ShopDb::create().await;
    let gateway = mock_gateway();

    let outcome = gateway
        .ask("What is the average salary per department?", Some(&db.handle()))
        .await
        .unwrap();

    assert_eq!(outcome.result.columns, vec!["department", "avg_salary"]);
    assert_eq!(outcome.result.row_count, 2);
    assert_eq!(
        text_column(outcome.result.column_values("department").unwrap()),
        vec!["Engineering", "Research"]
    );
}

#[tokio::test]
async fn test_bare_statement_ordered_rows() {
    let db = ShopDb::create().await;
    let gateway = mock_gateway();

    let outcome = gateway
        .ask("List all employees", Some(&db.handle()))
        .await
        .unwrap();

    let last_names: Vec<String> = outcome
        .result
        .column_values("last_name")
        .unwrap()
        .into_iter()
        .map(Value::to_display_string)
        .collect();
    assert_eq!(last_names, vec!["Hopper", "Lovelace", "Pauling"]);
}

#[tokio::test]
async fn test_count_returns_integer() {
    let db = ShopDb::create().await;
    let gateway = mock_gateway();

    let outcome = gateway
        .ask("count the products", Some(&db.handle()))
        .await
        .unwrap();

    assert_eq!(outcome.sql, "SELECT COUNT(*) AS total FROM product");
    assert_eq!(outcome.result.rows, vec![vec![Value::Integer(3)]]);
}

#[tokio::test]
async fn test_stacked_statements_rejected() {
    let db = ShopDb::create().await;
    let before = db.bytes();
    let gateway = mock_gateway();

    let err = gateway
        .run_raw(
            "SELECT * FROM employee; DROP TABLE employee;",
            Some(&db.handle()),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MultiStatement);
    assert_eq!(db.bytes(), before);
}

#[tokio::test]
async fn test_generated_delete_rejected() {
    let db = ShopDb::create().await;
    let before = db.bytes();
    let gateway = mock_gateway();

    let err = gateway
        .ask("remove the out of stock products", Some(&db.handle()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ForbiddenCommand);
    assert!(err.is_rejection());
    assert_eq!(db.bytes(), before);
}

#[tokio::test]
async fn test_narration_only_yields_no_candidate() {
    let db = ShopDb::create().await;
    let gateway = mock_gateway();

    let err = gateway
        .ask("What is the meaning of life?", Some(&db.handle()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoCandidateFound);
}

#[tokio::test]
async fn test_missing_file_fails_before_generation() {
    let dir = tempfile::tempdir().unwrap();
    let source = DataSourceHandle::new(dir.path().join("absent.db"));
    let gateway = gateway_with(MockGenerator::failing("must not be called"));

    let err = gateway
        .ask("count the products", Some(&source))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataSourceMissing);

    let err = gateway
        .run_raw("SELECT * FROM product", Some(&source))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataSourceMissing);
    assert!(!source.path().exists());
}

#[tokio::test]
async fn test_generation_failure_surfaces() {
    let db = ShopDb::create().await;
    let gateway = gateway_with(MockGenerator::failing("connection refused"));

    let err = gateway
        .ask("count the products", Some(&db.handle()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GenerationError);
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_keyword_inside_literal_is_data() {
    let db = ShopDb::create().await;
    let gateway = mock_gateway();

    let outcome = gateway
        .run_raw(
            "SELECT name FROM product WHERE name = 'DROP TABLE product'",
            Some(&db.handle()),
        )
        .await
        .unwrap();

    assert_eq!(outcome.result.columns, vec!["name"]);
    assert!(outcome.result.is_empty());
}

#[tokio::test]
async fn test_custom_response_with_cte() {
    let db = ShopDb::create().await;
    let gateway = gateway_with(MockGenerator::new().with_response(
        "stock",
        "Here you go:\n```sql\nWITH low AS (SELECT name, stock_quantity FROM product WHERE stock_quantity < 10)\nSELECT name FROM low ORDER BY name\n```",
    ));

    let outcome = gateway
        .ask("Which items are low on stock?", Some(&db.handle()))
        .await
        .unwrap();

    assert!(outcome.sql.starts_with("WITH low AS"));
    assert_eq!(
        outcome.result.rows,
        vec![vec![Value::from("Laptop")], vec![Value::from("Monitor")]]
    );
}

#[tokio::test]
async fn test_database_unchanged_after_answers() {
    let db = ShopDb::create().await;
    let before = db.bytes();
    let gateway = mock_gateway();

    for question in ["Show all products", "count the products", "List all employees"] {
        gateway.ask(question, Some(&db.handle())).await.unwrap();
    }

    assert_eq!(db.bytes(), before);
}

#[tokio::test]
async fn test_commentary_line_after_statement() {
    let db = ShopDb::create().await;
    let gateway = gateway_with(MockGenerator::new().with_response(
        "cheap",
        "SELECT name FROM product WHERE price < 10\nThis returns the cheap products.",
    ));

    let outcome = gateway
        .ask("Which products are cheap?", Some(&db.handle()))
        .await
        .unwrap();

    assert_eq!(outcome.sql, "SELECT name FROM product WHERE price < 10");
    assert_eq!(outcome.result.rows, vec![vec![Value::from("Pen")]]);
}

#[tokio::test]
async fn test_keyword_prose_after_terminator_is_accepted() {
    let db = ShopDb::create().await;
    let gateway = mock_gateway();

    for raw in [
        "SELECT name FROM product WHERE price > 100; Replace 100 with any threshold you like.",
        "SELECT name FROM product WHERE price > 100; With this query you get every name.",
    ] {
        let outcome = gateway.run_raw(raw, Some(&db.handle())).await.unwrap();
        assert_eq!(outcome.sql, "SELECT name FROM product WHERE price > 100");
        assert_eq!(outcome.result.row_count, 2);
    }
}

#[tokio::test]
async fn test_prebuilt_prompt_is_used() {
    let db = ShopDb::create().await;
    let gateway = mock_gateway();

    let prompt = gateway
        .prompt_for("count the products", &db.handle())
        .await
        .unwrap();
    assert!(prompt.contains("CREATE TABLE product ("));

    let outcome = gateway
        .ask_with_prompt("How many products are there?", &prompt, &db.handle())
        .await
        .unwrap();

    assert_eq!(outcome.question.as_deref(), Some("How many products are there?"));
    assert_eq!(outcome.sql, "SELECT COUNT(*) AS total FROM product");
    assert_eq!(outcome.result.rows, vec![vec![Value::Integer(3)]]);
}
