//! Reply generation with model-first, simulator-fallback semantics.
//!
//! Each user message is sent to the configured [`AIProvider`] along with the
//! stage's system prompt and the conversation so far. Any provider failure,
//! or a reply that is empty once its JSON block is stripped, is answered by
//! the [`HeuristicExtractor`] instead. Callers therefore always get a reply.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::audit::{
    parse_model_reply, system_prompt_for_stage, ConversationStage, ConversationTurn,
    ExtractionResult, HeuristicExtractor, Speaker,
};
use crate::ports::{AIError, AIProvider, CompletionRequest, MessageRole};

/// Which path produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    /// Parsed from the language model's answer.
    Model,
    /// Produced by the heuristic extractor.
    Simulator,
}

/// A reply plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    #[serde(flatten)]
    pub result: ExtractionResult,
    pub source: ReplySource,
}

/// Generation parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 600,
        }
    }
}

/// Produces assistant replies for the audit conversation.
pub struct AuditAssistant<A: AIProvider> {
    provider: Option<Arc<A>>,
    extractor: HeuristicExtractor,
    settings: GenerationSettings,
}

impl<A: AIProvider> AuditAssistant<A> {
    /// Creates an assistant that queries `provider` first.
    pub fn new(provider: Arc<A>) -> Self {
        Self {
            provider: Some(provider),
            extractor: HeuristicExtractor::new(),
            settings: GenerationSettings::default(),
        }
    }

    /// Creates an assistant that always answers with the simulator.
    pub fn simulator_only() -> Self {
        Self {
            provider: None,
            extractor: HeuristicExtractor::new(),
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns true if a model provider is configured.
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Answers one user message.
    ///
    /// `history` is the conversation before `message`; it must not already
    /// contain it.
    pub async fn reply(
        &self,
        message: &str,
        stage: ConversationStage,
        history: &[ConversationTurn],
    ) -> AssistantReply {
        let Some(provider) = self.provider.as_ref() else {
            return self.simulate(message, stage, history);
        };

        let request_id = Uuid::new_v4().to_string();
        match self
            .ask_model(provider.as_ref(), &request_id, message, stage, history)
            .await
        {
            Ok(result) => {
                tracing::debug!(
                    request_id = %request_id,
                    stage = %stage,
                    fields = result.fields.len(),
                    "model reply parsed"
                );
                AssistantReply {
                    result,
                    source: ReplySource::Model,
                }
            }
            Err(err) => {
                tracing::warn!(
                    request_id = %request_id,
                    stage = %stage,
                    error = %err,
                    "model unavailable, using simulator"
                );
                self.simulate(message, stage, history)
            }
        }
    }

    async fn ask_model(
        &self,
        provider: &A,
        request_id: &str,
        message: &str,
        stage: ConversationStage,
        history: &[ConversationTurn],
    ) -> Result<ExtractionResult, AIError> {
        let request = build_request(request_id, message, stage, history, self.settings);
        let response = provider.complete(request).await?;

        let result = parse_model_reply(&response.content);
        if result.reply_text.trim().is_empty() {
            return Err(AIError::parse("model reply has no text outside its JSON block"));
        }
        Ok(result)
    }

    fn simulate(
        &self,
        message: &str,
        stage: ConversationStage,
        history: &[ConversationTurn],
    ) -> AssistantReply {
        let result = self.extractor.extract(message, stage, history);
        tracing::debug!(stage = %stage, fields = result.fields.len(), "simulated reply");
        AssistantReply {
            result,
            source: ReplySource::Simulator,
        }
    }
}

fn build_request(
    request_id: &str,
    message: &str,
    stage: ConversationStage,
    history: &[ConversationTurn],
    settings: GenerationSettings,
) -> CompletionRequest {
    let request = CompletionRequest::new(request_id)
        .with_system_prompt(system_prompt_for_stage(stage))
        .with_stage(stage)
        .with_temperature(settings.temperature)
        .with_max_tokens(settings.max_tokens);

    history
        .iter()
        .fold(request, |request, turn| {
            let role = match turn.speaker {
                Speaker::User => MessageRole::User,
                Speaker::Assistant => MessageRole::Assistant,
            };
            request.with_message(role, turn.text.as_str())
        })
        .with_message(MessageRole::User, message)
}
