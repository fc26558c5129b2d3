//! Interactive chat module
//!
//! Provides a line-editor based interactive chat interface.

mod repl;

pub use repl::ChatRepl;
