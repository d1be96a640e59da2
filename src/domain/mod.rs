//! Domain layer containing the relay's pure logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, validation errors)
//! - `relay` - Stream reduction and response extraction

pub mod foundation;
pub mod relay;
