//! Chat storage adapters implementing the
//! [`ChatGateway`](chat_service_application::ChatGateway) port.
//!
//! - [`InMemoryChatGateway`]: process-local map
//! - [`JsonFileChatGateway`]: one JSON file per chat

mod json_file;
mod memory;

pub use json_file::JsonFileChatGateway;
pub use memory::InMemoryChatGateway;
