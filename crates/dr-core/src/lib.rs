//! # dr-core
//!
//! Core types shared by every DeepResearch crate:
//! - Session status and task status enums with their allowed transitions
//! - Session entities (log entries, tasks, plan items, the report buffer)
//! - Thread identity generation
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
