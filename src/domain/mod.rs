//! Domain types and pure helpers with no I/O dependencies.

pub mod chatbot;
pub mod entities;
pub mod error;
pub mod media;
pub mod slug;
pub mod stats;
