//! Core logic including the application controller, the conversation
//! client, and the image encoder.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod app;
pub mod conversation;
pub mod image;
mod model_client;

pub use app::{App, AppEvent, IDENTIFY_PROMPT, Screen};
pub use model_client::ConversationClient;
