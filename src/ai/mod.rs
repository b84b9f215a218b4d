pub mod client;
pub mod prompts;
mod types;

pub use client::{ModelClient, OpenAiClient};
pub use types::{format_transcript, ChatTurn, ModelReply};
#[cfg(test)]
pub use types::Role;
