//! # Ingredients
//!
//! Turns free-text recipe ingredient lines into structured data, resolves
//! them against a canonical ingredient directory with a confidence score,
//! and converts or scales quantities between measurement systems for display.
//!
//! - [`ingredient_parser`]: one raw line into a [`ingredient_model::ParsedIngredient`]
//! - [`matcher`]: tiered directory matching and "X or Y" equivalence
//! - [`conversion`]: scaling, metric/imperial conversion and fraction display
//! - [`ingredient_integration`]: concurrent recipe ingestion

pub mod circuit_breaker;
pub mod config;
pub mod conversion;
pub mod db;
pub mod decision_log;
pub mod directory;
pub mod errors;
pub mod ingredient_integration;
pub mod ingredient_model;
pub mod ingredient_parser;
pub mod matcher;
pub mod measurement_patterns;
pub mod similarity;
pub mod text_processing;
pub mod unit_catalog;
