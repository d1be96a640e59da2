//! Chat Relay - backend between a chat frontend and a conversational-AI app API
//!
//! The relay opens provider conversations, forwards user messages, reduces
//! streamed replies into a single answer and keeps a short-lived registry of
//! the conversations it has seen.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
