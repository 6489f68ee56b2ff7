//! Energy audit conversation domain.
//!
//! A guided dialogue collects the user's profile, energy consumption and
//! property details in three stages. This module holds the typed field
//! model, the rule-based extractor that stands in for the language model,
//! the parser for the model's own replies, and the prompt templates.

mod extractor;
mod fields;
mod profile;
mod prompts;
mod reply_parser;
mod rules;
mod stage;
mod turn;

pub use extractor::{
    ConsumptionLevel, ExtractionResult, HeuristicExtractor, ELECTRICITY_HIGH_THRESHOLD,
    ELECTRICITY_LOW_THRESHOLD, GAS_HIGH_THRESHOLD, GAS_LOW_THRESHOLD,
};
pub use fields::{
    EnergyProvider, ExtractedFields, HeatingType, InsulationStatus, PropertyType, Region,
    UserType, FIELD_KEYS,
};
pub use profile::AuditProfile;
pub use prompts::{
    opening_message_for_stage, system_prompt_for_stage, transition_message_into,
    AUDIT_COMPLETE_MESSAGE,
};
pub use reply_parser::parse_model_reply;
pub use rules::expresses_uncertainty;
pub use stage::{ConversationStage, UnknownStage};
pub use turn::{last_assistant_text, ConversationTurn, Speaker};
