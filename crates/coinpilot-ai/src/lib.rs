//! coinpilot-ai: Chat completion client for the coinpilot assistant
//!
//! This crate turns a streamed chat completion response into sanitized text
//! fragments, and provides the request types, the OpenAI-compatible provider,
//! and the one-shot market analysis requests.

pub mod analysis;
pub mod attachment;
pub mod coin;
pub mod delta;
pub mod error;
pub mod framing;
pub mod models;
pub mod providers;
pub mod sanitize;
pub mod stream;
pub mod types;

pub use attachment::{Attachment, AttachmentError};
pub use error::{Error, Result};
pub use stream::{FragmentStream, StreamAccumulator};
pub use types::*;
