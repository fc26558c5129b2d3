//! Chat domain.
//!
//! - [`entities::Chat`]: the aggregate: turn window, eviction log, lifecycle
//! - [`message::Message`]: a single immutable turn
//! - [`config::ChatConfig`]: model and sampling parameters
//! - [`stream::StreamEvent`]: incremental output of a completion provider

pub mod config;
pub mod entities;
pub mod message;
pub mod stream;
pub mod value_objects;
