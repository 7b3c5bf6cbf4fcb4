//! Inference gateway: turns one chat request into a completion call

use reelchat_core::config::Config;
use reelchat_core::session::{HistoryStore, Turn};
use reelchat_providers::{LLMProvider, Message, ProviderResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one chat request
#[derive(Debug)]
pub struct ChatExchange {
    /// Supplied or freshly generated session id
    pub session_id: String,
    /// Trimmed reply text, or why the completion call failed
    pub outcome: ProviderResult<String>,
}

impl ChatExchange {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Reply text with failures masked behind `fallback`
    pub fn reply_or(self, fallback: &str) -> (String, String) {
        let reply = self.outcome.unwrap_or_else(|_| fallback.to_string());
        (reply, self.session_id)
    }
}

/// Sends system prompt, session history and the new message to the provider
pub struct InferenceGateway {
    provider: Arc<dyn LLMProvider>,
    store: Arc<HistoryStore>,
    system_prompt: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl InferenceGateway {
    pub fn new(provider: Arc<dyn LLMProvider>, store: Arc<HistoryStore>, config: &Config) -> Self {
        Self {
            provider,
            store,
            system_prompt: config.chat.system_prompt.clone(),
            model: config.provider.model.clone(),
            max_tokens: config.provider.max_tokens,
            temperature: config.provider.temperature,
        }
    }

    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    /// `[system prompt] + history + [new user message]`
    pub fn build_messages(&self, history: &[Turn], user_message: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(&self.system_prompt));
        messages.extend(history.iter().map(Message::from));
        messages.push(Message::user(user_message));
        messages
    }

    /// Run one chat request.
    ///
    /// On success the user message and the reply are appended to the
    /// session. On failure the session is left exactly as it was.
    pub async fn chat(&self, user_message: &str, session_id: Option<String>) -> ChatExchange {
        let session_id = match session_id {
            Some(id) if !id.is_empty() => id,
            _ => {
                let id = uuid::Uuid::new_v4().to_string();
                info!(session_id = %id, "Starting new session");
                id
            }
        };

        let mut session = self.store.lock_session(&session_id).await;
        let messages = self.build_messages(&session.turns, user_message);
        debug!(
            session_id = %session_id,
            history = session.turns.len(),
            "Sending conversation to provider"
        );

        let outcome = match self
            .provider
            .chat(
                messages,
                Some(self.model.clone()),
                self.max_tokens,
                self.temperature,
            )
            .await
            .and_then(|response| response.trimmed_text())
        {
            Ok(reply) => {
                session.append_exchange(user_message, reply.as_str());
                Ok(reply)
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Inference call failed");
                Err(e)
            }
        };

        drop(session);
        ChatExchange {
            session_id,
            outcome,
        }
    }
}
