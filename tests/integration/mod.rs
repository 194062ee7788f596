//! Integration tests for querygate.

pub mod fixtures;
pub mod pipeline_test;
pub mod sandbox_test;
pub mod schema_test;
