//! Output formatting for turns and sessions

pub mod console;
pub mod stream_printer;
