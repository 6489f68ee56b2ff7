//! One audit conversation held by the caller.
//!
//! The session owns the transcript, the running profile and the current
//! stage. It moves to the next stage as soon as the profile satisfies the
//! current one. A user who does not know their consumption figures moves
//! on to the property questions with that stage left open.

use std::sync::Arc;

use super::assistant::{AssistantReply, AuditAssistant};
use crate::domain::audit::{
    expresses_uncertainty, opening_message_for_stage, transition_message_into, AuditProfile, ConversationStage,
    ConversationTurn, AUDIT_COMPLETE_MESSAGE,
};
use crate::ports::AIProvider;

/// Outcome of a single [`AuditSession::send`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUpdate {
    pub reply: AssistantReply,
    /// Stage entered after this message, if the previous one completed.
    pub advanced_to: Option<ConversationStage>,
    /// Message appended after the reply (stage transition or closing).
    pub announcement: Option<&'static str>,
    pub finished: bool,
}

/// Caller-held state for one audit conversation.
pub struct AuditSession<A: AIProvider> {
    assistant: Arc<AuditAssistant<A>>,
    stage: ConversationStage,
    history: Vec<ConversationTurn>,
    profile: AuditProfile,
    finished: bool,
}

impl<A: AIProvider> AuditSession<A> {
    /// Starts at the profile stage with the opening message in the transcript.
    pub fn new(assistant: Arc<AuditAssistant<A>>) -> Self {
        let stage = ConversationStage::default();
        Self {
            assistant,
            stage,
            history: vec![ConversationTurn::assistant(opening_message_for_stage(stage))],
            profile: AuditProfile::new(),
            finished: false,
        }
    }

    pub fn stage(&self) -> ConversationStage {
        self.stage
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn profile(&self) -> &AuditProfile {
        &self.profile
    }

    /// True once every stage has all of its required fields.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Answers `message`, records both turns and advances the stage if due.
    pub async fn send(&mut self, message: &str) -> SessionUpdate {
        let reply = self.assistant.reply(message, self.stage, &self.history).await;

        self.history.push(ConversationTurn::user(message));
        self.history
            .push(ConversationTurn::assistant(reply.result.reply_text.clone()));
        self.profile.merge(&reply.result.fields);

        let mut advanced_to = None;
        let mut announcement = None;

        let deferred = self.stage == ConversationStage::Consumption
            && !self.profile.is_stage_complete(self.stage)
            && expresses_uncertainty(message);
        if deferred {
            tracing::info!(stage = %self.stage, "figures unknown, moving on");
        }

        if !self.finished && (deferred || self.profile.is_stage_complete(self.stage)) {
            match self.stage.next() {
                Some(next) => {
                    tracing::info!(from = %self.stage, to = %next, "stage complete");
                    self.stage = next;
                    advanced_to = Some(next);
                    announcement = Some(transition_message_into(next));
                }
                None => {
                    tracing::info!("audit complete");
                    self.finished = true;
                    announcement = Some(AUDIT_COMPLETE_MESSAGE);
                }
            }
        }

        if let Some(text) = announcement {
            self.history.push(ConversationTurn::assistant(text));
        }

        SessionUpdate {
            reply,
            advanced_to,
            announcement,
            finished: self.finished,
        }
    }
}
