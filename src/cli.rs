//! Command-line argument parsing and output rendering for querygate.

use clap::Parser;
use querygate::db::{QueryResult, Value};
use querygate::error::GatewayError;
use querygate::gateway::GatewayOutcome;
use serde::Serialize;
use std::path::PathBuf;

/// Output format for results and errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned text table.
    #[default]
    Text,
    /// JSON object with the statement, columns, and rows.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid output format: {s}. Expected: text or json"
            )),
        }
    }
}

/// Answer a question about a SQLite file with a single read-only query.
#[derive(Parser, Debug)]
#[command(name = "querygate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Natural-language question about the data
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// SQLite database file to query (opened read-only)
    #[arg(short = 'd', long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// LLM provider to use (overrides config)
    #[arg(long, value_name = "PROVIDER")]
    pub llm: Option<String>,

    /// Treat TEXT as raw model output and skip generation
    #[arg(long, value_name = "TEXT")]
    pub sql: Option<String>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Print the generated prompt to stderr before generation
    #[arg(long)]
    pub show_prompt: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(querygate::config::Config::default_path)
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Validates argument combinations.
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.question.is_none() && self.sql.is_none() {
            return Err("a QUESTION or --sql is required".to_string());
        }

        if self.show_prompt && self.sql.is_some() {
            return Err("--show-prompt cannot be combined with --sql".to_string());
        }

        self.parse_output_format()?;

        Ok(())
    }
}

#[derive(Serialize)]
struct ErrorOutput<'a> {
    error_kind: &'a str,
    message: String,
    detail: String,
}

/// Renders a successful outcome.
pub fn render_outcome(
    outcome: &GatewayOutcome,
    format: OutputFormat,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(outcome),
        OutputFormat::Text => Ok(format!(
            "SQL: {}\n\n{}",
            outcome.sql,
            format_table(&outcome.result)
        )),
    }
}

/// Renders a gateway error with its user-facing message.
pub fn render_error(error: &GatewayError, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&ErrorOutput {
            error_kind: error.kind().as_str(),
            message: error.user_message(),
            detail: error.to_string(),
        }),
        OutputFormat::Text => Ok(format!(
            "{} [{}]: {}\n  {}",
            error.category(),
            error.kind(),
            error.user_message(),
            error
        )),
    }
}

/// Formats a result as an aligned text table.
pub fn format_table(result: &QueryResult) -> String {
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(Value::to_display_string).collect())
        .collect();

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, &width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![
        format_line(&result.columns),
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    ];
    lines.extend(cells.iter().map(|row| format_line(row)));

    let noun = if result.row_count == 1 { "row" } else { "rows" };
    lines.push(format!("({} {})", result.row_count, noun));

    lines.join("\n")
}
