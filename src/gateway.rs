//! The question-to-result pipeline.
//!
//! Wires generator, extractor, validator, and sandbox executor together,
//! short-circuiting on the first failure. The generator is created once per
//! process and shared by every request.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::db::{schema_ddl, DataSourceHandle, QueryResult, SandboxExecutor};
use crate::error::{GatewayError, Result};
use crate::extract::Extractor;
use crate::llm::{build_prompt, create_generator, Generator};
use crate::safety::SqlValidator;

type GeneratorFactory = Box<dyn Fn() -> Result<Arc<dyn Generator>> + Send + Sync>;

/// A generator that is built at most once, on first use or on preload.
///
/// Concurrent first calls wait on the same initialization instead of each
/// building their own instance.
pub struct GeneratorHandle {
    cell: OnceCell<Arc<dyn Generator>>,
    factory: Option<GeneratorFactory>,
}

impl GeneratorHandle {
    /// Creates a handle that builds its generator from the LLM config.
    pub fn from_config(config: LlmConfig) -> Self {
        Self::with_factory(move || create_generator(&config))
    }

    /// Creates a handle that builds its generator with `factory`.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Generator>> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            factory: Some(Box::new(factory)),
        }
    }

    /// Creates a handle around an already built generator.
    pub fn preloaded(generator: Arc<dyn Generator>) -> Self {
        Self {
            cell: OnceCell::new_with(Some(generator)),
            factory: None,
        }
    }

    /// Returns the generator, building it on first call.
    pub async fn get(&self) -> Result<Arc<dyn Generator>> {
        let generator = self
            .cell
            .get_or_try_init(|| async {
                let factory = self
                    .factory
                    .as_ref()
                    .ok_or_else(|| GatewayError::generation("No generator configured"))?;
                let generator = factory()?;
                info!(generator = generator.name(), "Generator initialized");
                Ok::<_, GatewayError>(generator)
            })
            .await?;
        Ok(Arc::clone(generator))
    }

    /// Builds the generator now so the first request does not pay for it.
    pub async fn preload(&self) -> Result<()> {
        self.get().await.map(|_| ())
    }

    /// Returns true once the generator has been built.
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}

impl fmt::Debug for GeneratorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorHandle")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

/// The successful result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayOutcome {
    /// The natural-language question, when the run started from one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// The statement that was validated and executed.
    pub sql: String,
    #[serde(flatten)]
    pub result: QueryResult,
}

/// Extraction, validation, and sandboxed execution behind one call.
#[derive(Debug)]
pub struct Gateway {
    generator: GeneratorHandle,
    extractor: Extractor,
    validator: SqlValidator,
    executor: SandboxExecutor,
}

impl Gateway {
    pub fn new(generator: GeneratorHandle) -> Self {
        Self {
            generator,
            extractor: Extractor::new(),
            validator: SqlValidator::new(),
            executor: SandboxExecutor::new(),
        }
    }

    /// Replaces the extractor, e.g. to use a different candidate policy.
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Returns the generator handle.
    pub fn generator(&self) -> &GeneratorHandle {
        &self.generator
    }

    /// Builds the prompt for a question against a data source.
    pub async fn prompt_for(&self, question: &str, source: &DataSourceHandle) -> Result<String> {
        let ddl = schema_ddl(source).await?;
        Ok(build_prompt(&ddl, question))
    }

    /// Answers a natural-language question against a data source.
    pub async fn ask(
        &self,
        question: &str,
        source: Option<&DataSourceHandle>,
    ) -> Result<GatewayOutcome> {
        let source = require_source(source)?;
        let prompt = self.prompt_for(question, source).await?;
        self.ask_with_prompt(question, &prompt, source).await
    }

    /// Answers a question using a prompt already built by [`Gateway::prompt_for`].
    pub async fn ask_with_prompt(
        &self,
        question: &str,
        prompt: &str,
        source: &DataSourceHandle,
    ) -> Result<GatewayOutcome> {
        let generator = self.generator.get().await?;
        let raw = generator.generate(prompt).await?;
        debug!(generator = generator.name(), chars = raw.len(), "Generated raw output");

        let mut outcome = self.run_raw(&raw, Some(source)).await?;
        outcome.question = Some(question.to_string());
        Ok(outcome)
    }

    /// Runs raw model output through extraction, validation, and execution.
    pub async fn run_raw(
        &self,
        raw: &str,
        source: Option<&DataSourceHandle>,
    ) -> Result<GatewayOutcome> {
        let source = require_source(source)?;

        let candidate = self
            .extractor
            .extract(raw)
            .ok_or_else(|| GatewayError::no_candidate("No SQL statement found in model output"))?;
        debug!(path = ?candidate.path(), sql = %candidate, "Extracted candidate");

        let statement = self.validator.validate(candidate.as_str()).inspect_err(|e| {
            warn!(kind = %e.kind(), sql = %candidate, "Rejected candidate: {}", e);
        })?;
        info!(sql = statement.sql(), "Statement accepted");

        let result = self.executor.execute(&statement, source).await?;
        info!(rows = result.row_count, "Statement executed");

        Ok(GatewayOutcome {
            question: None,
            sql: statement.sql().to_string(),
            result,
        })
    }
}

fn require_source(source: Option<&DataSourceHandle>) -> Result<&DataSourceHandle> {
    source.ok_or_else(|| {
        GatewayError::data_source_missing("No database file is associated with this request")
    })
}
