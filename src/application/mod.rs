//! Application layer - Orchestrates domain logic and ports.
//!
//! - `assistant` - Model-first reply generation with simulator fallback
//! - `session` - Caller-held conversation state and stage progression

mod assistant;
mod session;

pub use assistant::{AssistantReply, AuditAssistant, GenerationSettings, ReplySource};
pub use session::{AuditSession, SessionUpdate};
