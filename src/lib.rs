//! querygate - a read-only gateway from natural-language questions to
//! SQLite query results.
//!
//! Raw model output passes through three stages, stopping at the first
//! failure: [`extract`] recovers one SQL candidate, [`safety`] proves it is a
//! single pure read, and [`db`] runs it against a file opened read-only.
//! [`gateway`] wires the stages to a text generator from [`llm`].

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod llm;
pub mod logging;
pub mod safety;
