//! Schema introspection tests.

use querygate::db::{schema_ddl, DataSourceHandle};
use querygate::error::ErrorKind;
use querygate::llm::build_prompt;

use super::fixtures::ShopDb;

#[tokio::test]
async fn test_schema_lists_both_tables() {
    let db = ShopDb::create().await;

    let ddl = schema_ddl(&db.handle()).await.unwrap();

    assert!(ddl.contains("CREATE TABLE employee ("));
    assert!(ddl.contains("CREATE TABLE product ("));
    assert!(ddl.contains("stock_quantity INTEGER"));
    assert!(!ddl.contains("INSERT"));
}

#[tokio::test]
async fn test_prompt_embeds_schema_and_question() {
    let db = ShopDb::create().await;
    let ddl = schema_ddl(&db.handle()).await.unwrap();

    let prompt = build_prompt(&ddl, "How many products are out of stock?");

    assert!(prompt.contains("CREATE TABLE product ("));
    assert!(prompt.contains("<|user|>\nHow many products are out of stock?<|end|>"));
    assert!(prompt.ends_with("<|assistant|>\n"));
}

#[tokio::test]
async fn test_schema_of_missing_file() {
    let err = schema_ddl(&DataSourceHandle::new("/nonexistent/shop.db"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataSourceMissing);
}
