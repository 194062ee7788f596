//! Shared test database.

use std::path::PathBuf;
use std::sync::Arc;

use querygate::db::DataSourceHandle;
use querygate::gateway::{Gateway, GeneratorHandle};
use querygate::llm::{Generator, MockGenerator};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection, Executor};
use tempfile::TempDir;

const SHOP_SCHEMA: &str = "
CREATE TABLE employee (
    id INTEGER PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    job_title TEXT,
    department TEXT,
    salary REAL,
    hire_date TEXT
);
CREATE TABLE product (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT,
    stock_quantity INTEGER NOT NULL DEFAULT 0,
    price REAL NOT NULL
);
INSERT INTO employee (first_name, last_name, job_title, department, salary, hire_date) VALUES
    ('Ada', 'Lovelace', 'Engineer', 'Engineering', 120000, '2019-03-01'),
    ('Grace', 'Hopper', 'Engineer', 'Engineering', 130000, '2018-07-15'),
    ('Linus', 'Pauling', 'Analyst', 'Research', 90000, '2021-01-10');
INSERT INTO product (name, category, stock_quantity, price) VALUES
    ('Laptop', 'Electronics', 5, 1200.0),
    ('Monitor', 'Electronics', 0, 300.0),
    ('Pen', 'Office', 250, 1.5);
";

/// A populated shop database that lives as long as the fixture.
pub struct ShopDb {
    _dir: TempDir,
    pub path: PathBuf,
}

impl ShopDb {
    pub async fn create() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shop.db");

        let mut conn = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();
        conn.execute(SHOP_SCHEMA).await.unwrap();
        conn.close().await.unwrap();

        Self { _dir: dir, path }
    }

    pub fn handle(&self) -> DataSourceHandle {
        DataSourceHandle::new(&self.path)
    }

    pub fn bytes(&self) -> Vec<u8> {
        std::fs::read(&self.path).unwrap()
    }
}

/// A gateway backed by the mock generator.
pub fn mock_gateway() -> Gateway {
    gateway_with(MockGenerator::new())
}

pub fn gateway_with(generator: MockGenerator) -> Gateway {
    Gateway::new(GeneratorHandle::preloaded(
        Arc::new(generator) as Arc<dyn Generator>
    ))
}
