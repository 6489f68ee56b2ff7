//! ConversationStage enum representing the three audit topics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three sequential topics of a guided energy audit.
///
/// Stages are chosen by the caller; the extractor never advances them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    /// Who the user is and where they live.
    Profile,
    /// Annual electricity and gas figures.
    Consumption,
    /// Characteristics of the building.
    Property,
}

impl ConversationStage {
    /// Returns all stages in dialogue order.
    pub fn all() -> &'static [ConversationStage] {
        &[
            ConversationStage::Profile,
            ConversationStage::Consumption,
            ConversationStage::Property,
        ]
    }

    /// Returns the next stage in order, if any.
    pub fn next(&self) -> Option<ConversationStage> {
        match self {
            Self::Profile => Some(Self::Consumption),
            Self::Consumption => Some(Self::Property),
            Self::Property => None,
        }
    }

    /// Returns true for the last stage of the dialogue.
    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }

    /// Wire name of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Consumption => "consumption",
            Self::Property => "property",
        }
    }

    /// Returns a label suitable for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Profile => "Profil",
            Self::Consumption => "Consommation",
            Self::Property => "Propriété",
        }
    }
}

impl Default for ConversationStage {
    fn default() -> Self {
        Self::Profile
    }
}

impl fmt::Display for ConversationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stage name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown conversation stage: {0}")]
pub struct UnknownStage(pub String);

impl FromStr for ConversationStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}
