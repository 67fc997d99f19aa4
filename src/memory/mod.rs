//! Agent Memory System
//!
//! Keeps the model's context window bounded as the workflow history grows.

pub mod context_manager;

pub use context_manager::{prune_messages, ALLOCATOR_MAX_MESSAGES, DEFAULT_MAX_MESSAGES};
