//! Core components, types, and utilities for the tracker-bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Runtime statistics and uptime formatting.
//! - The word filter used by the `say` skill.
//! - Common types and result handling.

pub mod config;
pub mod filter;
pub mod stats;
pub mod types;
