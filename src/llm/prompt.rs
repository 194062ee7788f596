//! Prompt construction for generator requests.
//!
//! Builds a Phi-3 chat-format prompt with the data file's table DDL as
//! context.

use crate::db::EMPTY_SCHEMA;

/// System block for the SQL analyst role.
const SYSTEM_PROMPT_TEMPLATE: &str = "You are an expert SQLite data analyst. You must generate a single, valid SQLite query based on the provided schema and user question.
- Output only the raw SQL query.
- Do not add any explanations, comments, or markdown formatting like ```sql.

Database Schema:
---
{schema}
---";

/// Builds the system block with the schema DDL injected.
pub fn build_system_prompt(schema_ddl: &str) -> String {
    let schema = if schema_ddl.trim().is_empty() {
        EMPTY_SCHEMA
    } else {
        schema_ddl.trim()
    };
    SYSTEM_PROMPT_TEMPLATE.replace("{schema}", schema)
}

/// Builds the complete prompt for one question.
///
/// The prompt ends with an open assistant turn so the model's reply is the
/// raw output handed to the extractor.
pub fn build_prompt(schema_ddl: &str, question: &str) -> String {
    format!(
        "<|system|>\n{}<|end|>\n<|user|>\n{}<|end|>\n<|assistant|>\n",
        build_system_prompt(schema_ddl),
        question.trim()
    )
}
