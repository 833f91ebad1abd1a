//! Core types, configuration, and index logic for the tag bot
//!
//! This crate provides:
//! - Configuration management (`Config`, environment parsing, the `BotConfig` snapshot)
//! - Data models (`Submission`, `Comment`, `Message`) and the `Forum` collaborator trait
//! - Index line parsing, rendering, and per-tag mutation
//! - The authorization and locking gate, reply texts, and the watermark
//! - Common error types

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod forum;
pub mod gate;
pub mod index;
pub mod models;
pub mod mutate;
pub mod replies;
pub mod snapshot;
pub mod tags;
pub mod watermark;

// Re-export key types for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use forum::Forum;
pub use gate::{Approved, AuthorizationContext, GateDecision};
pub use index::{IndexEntry, ParsedLine, parse_index, parse_line, render_index, rerender};
pub use models::{Comment, Message, ReplyTarget, Submission};
pub use mutate::{TagOperation, entry_line, mutate_index, plan_mutations};
pub use snapshot::{BotConfig, render_locked};
pub use tags::{TagName, TagRequest, parse_tag_command};
pub use watermark::Watermark;
