//! Integration tests for rdf-glance.

pub mod config_test;
pub mod normalizer_test;
pub mod pipeline_test;
pub mod store_test;
