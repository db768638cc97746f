//! coinpilot-chat: Chat sessions over a streaming completion service
//!
//! This crate owns the conversation: it submits user turns, streams the
//! reply into a visible exchange, and remembers completed exchanges so they
//! are replayed with later requests.

pub mod conversation;
pub mod error;
pub mod events;
pub mod exchange;
pub mod handle;
pub mod session;
pub mod transport;

pub use conversation::ConversationContext;
pub use error::{Error, Result};
pub use events::{ChatEvent, SessionState};
pub use exchange::Exchange;
pub use handle::SessionHandle;
pub use session::{ChatSession, SessionConfig};
pub use transport::{ProviderTransport, Transport};
