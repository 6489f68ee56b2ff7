//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Language model providers (OpenAI-compatible, mock)

pub mod ai;

pub use ai::{MockAIProvider, OpenAIConfig, OpenAIProvider};
