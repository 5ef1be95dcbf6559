// src/core/mod.rs — Itinerary generation and normalization pipeline

pub mod cost;
pub mod currency;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod route;
pub mod trip;
pub mod types;
pub mod validate;
pub mod weather;
