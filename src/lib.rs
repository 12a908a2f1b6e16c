//! rdf-glance - Ask questions of an RDF triple store in plain language.
//!
//! This library exposes the core modules for use in integration tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod store;
