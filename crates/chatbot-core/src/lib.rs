pub mod client;
pub mod config;
pub mod error;
pub mod state;

// Re-export main types for convenience
pub use client::ChatClient;
pub use config::{Config, DEFAULT_ENDPOINT};
pub use error::{SendError, StatusCode, STATUS_ERROR_TEXT, TRANSPORT_ERROR_TEXT};
pub use state::{Attachment, Author, ChatSession, Draft, Message, FILE_ATTACHED_LABEL};
