// src/lib.rs

pub mod api;
pub mod config;
pub mod context;
pub mod knowledge;
pub mod orchestrator;
pub mod provider;
pub mod records;
pub mod registry;
pub mod routing;
pub mod state;
pub mod stats;
