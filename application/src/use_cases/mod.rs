//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod chat_completion_stream;
pub mod end_chat;
pub mod session_locks;
