// crates/fundamentals-config/src/lib.rs
// ============================================================================
// Module: Fundamentals Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for fundamentals.toml semantics.
// Dependencies: fundamentals-core, fundamentals-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `fundamentals-config` defines the configuration model for the fundamentals
//! ledger: where the store lives, which relation collects observations, and
//! where audit events go. Validation is strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
