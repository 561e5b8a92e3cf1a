//! Configuration module for rank tracking
//!
//! This module provides the `RankConfig` struct, its builder, and loaders
//! for JSON files and environment overrides.

pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

pub use builder::RankConfigBuilder;
pub use types::{FetcherKind, PaceThreshold, RankConfig, SelectorTable};
