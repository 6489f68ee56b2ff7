//! Running audit profile accumulated over a conversation.

use serde::{Deserialize, Serialize};

use super::fields::ExtractedFields;
use super::stage::ConversationStage;

/// Everything learned about the user so far.
///
/// Partial records from successive turns are merged in; a later value for
/// the same field replaces the earlier one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditProfile {
    fields: ExtractedFields,
}

impl AuditProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &ExtractedFields {
        &self.fields
    }

    /// Merges a partial record into the profile.
    pub fn merge(&mut self, update: &ExtractedFields) {
        self.fields.merge(update);
    }

    /// Wire keys a stage asks for before the dialogue can move on.
    ///
    /// Profile and property need all of them. Consumption needs any one,
    /// since many homes use only electricity or only gas.
    pub fn required_fields(stage: ConversationStage) -> &'static [&'static str] {
        match stage {
            ConversationStage::Profile => &["userType", "region"],
            ConversationStage::Consumption => &["electricityUsage", "gasUsage"],
            ConversationStage::Property => &["propertyType", "propertySize", "yearBuilt"],
        }
    }

    /// Required keys of `stage` that are still unknown.
    ///
    /// Empty once the stage is satisfied, even if an alternative key of
    /// the consumption stage was never given.
    pub fn missing_fields(&self, stage: ConversationStage) -> Vec<&'static str> {
        let required = Self::required_fields(stage);
        let present = self.fields.present_keys();
        let missing: Vec<&'static str> = required
            .iter()
            .copied()
            .filter(|key| !present.contains(key))
            .collect();

        let any_suffices = stage == ConversationStage::Consumption;
        if any_suffices && missing.len() < required.len() {
            Vec::new()
        } else {
            missing
        }
    }

    /// Returns true when every required field of `stage` is known.
    pub fn is_stage_complete(&self, stage: ConversationStage) -> bool {
        self.missing_fields(stage).is_empty()
    }

    /// Returns true when all stages are complete.
    pub fn is_complete(&self) -> bool {
        ConversationStage::all()
            .iter()
            .all(|stage| self.is_stage_complete(*stage))
    }
}
