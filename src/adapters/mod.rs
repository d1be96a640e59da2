//! Adapters - Implementations of port interfaces.
//!
//! - `ai` - upstream conversation API client and test double
//! - `cache` - in-process conversation cache
//! - `http` - axum routes and handlers

pub mod ai;
pub mod cache;
pub mod http;
