//! An abstraction layer for multimodal conversation models.
//!
//! This crate establishes an unified protocol for the application to
//! interact with hosted vision-capable LLMs, so that the rest of the
//! codebase can seamlessly switch between them (or a local fake used
//! in tests) without modification.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to. A provider is
//! reachable through exactly one operation: send a message history
//! (whose first turn may carry an image) and get the assistant's reply
//! text back.

#![deny(missing_docs)]

mod error;
mod provider;
mod reply;
mod request;

pub use error::*;
pub use provider::*;
pub use reply::*;
pub use request::*;
