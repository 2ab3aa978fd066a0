//! Chat with data: ask questions in plain English and get values or charts back.

mod client;
mod executor;
mod plan;
mod session;

pub use client::{ChatMessage, ChatModel, GroqClient, Role, DEFAULT_API_BASE, DEFAULT_MODEL};
pub use executor::Answer;
pub use session::{ChatSession, NO_OUTPUT};
