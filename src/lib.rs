//! # Streakboard
//!
//! Check-in streaks, weekly challenge scores and ranked leaderboards for
//! small fitness groups.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (check-ins, activity records, challenges, scores)
//! - **calculate**: Streaks, metric aggregation, scoring and leaderboard ranking
//! - **storage**: Activity repository backed by JSONL files or memory
//! - **checkin**: Check-in workflow with per-user serialized updates
//! - **standings**: Leaderboards and score generation over the repository
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod checkin;
pub mod config;
pub mod models;
pub mod standings;
pub mod storage;

pub use models::*;
