//! Mock generator for testing.
//!
//! Provides deterministic raw output based on the question in the prompt,
//! including the kinds of noise real models produce.

use async_trait::async_trait;

use crate::error::{GatewayError, Result};
use crate::llm::Generator;

/// Mock generator that returns canned output based on question patterns.
///
/// Used for unit testing and offline runs without a model server.
#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// When set, every call fails with this message.
    failure: Option<String>,
}

impl MockGenerator {
    /// Creates a new mock generator with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock generator whose every call fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Adds a custom response mapping.
    ///
    /// When the question contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Generates a mock response based on the question.
    fn mock_response(&self, question: &str) -> String {
        let question = question.to_lowercase();

        // Check custom responses first
        for (pattern, response) in &self.custom_responses {
            if question.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if question.contains("all products") || question.contains("show products") {
            return "```sql\nSELECT * FROM product;\n```".to_string();
        }

        if question.contains("expensive") && question.contains("product") {
            return "Sure! Here's the SQL:\n```sql\nSELECT name FROM product WHERE price > 100\n```\nLet me know if you need more.".to_string();
        }

        if question.contains("count") && question.contains("product") {
            return "SELECT COUNT(*) AS total FROM product;".to_string();
        }

        if question.contains("average salary") {
            return "**SQL Query:**\nSELECT department, AVG(salary) AS avg_salary\nFROM employee\nGROUP BY department;\n\nThis groups employees by department.".to_string();
        }

        if question.contains("employees") {
            return "SELECT first_name, last_name FROM employee ORDER BY last_name".to_string();
        }

        if question.contains("out of stock") && question.contains("remove") {
            return "DELETE FROM product WHERE stock_quantity = 0".to_string();
        }

        "First, I need to figure out which table holds that. Then I'll think about the columns."
            .to_string()
    }
}

/// Returns the last user turn of a Phi-3 style prompt, or the whole prompt.
fn question_of(prompt: &str) -> &str {
    let Some(start) = prompt.rfind("<|user|>") else {
        return prompt;
    };
    let turn = &prompt[start + "<|user|>".len()..];
    turn.split("<|end|>").next().unwrap_or(turn).trim()
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Some(message) = &self.failure {
            return Err(GatewayError::generation(message.clone()));
        }
        Ok(self.mock_response(question_of(prompt)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
