// chat.rs - Conversational session against the same provider as the storyboard
use crate::provider::GenerativeProvider;
use crate::types::ChatMessage;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};

pub const CHAT_FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("Message must not be empty")]
    EmptyMessage,
}

/// Result of one exchange: the model's reply and the full log after it
#[derive(Debug, Clone)]
pub struct ChatExchange {
    pub reply: ChatMessage,
    pub messages: Vec<ChatMessage>,
}

/// Append-only conversation log.
///
/// The lock is held for the whole exchange, so a submission is only accepted
/// once the previous reply has been appended. The user message and the reply
/// are appended together.
pub struct ChatSession {
    provider: Arc<dyn GenerativeProvider>,
    messages: Mutex<Vec<ChatMessage>>,
}

impl ChatSession {
    pub fn new(provider: Arc<dyn GenerativeProvider>) -> Self {
        Self {
            provider,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.messages.lock().await.clone()
    }

    pub async fn send(&self, input: &str) -> Result<ChatExchange, ChatError> {
        if input.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let mut messages = self.messages.lock().await;
        let history = messages.clone();

        // Nothing is appended until the reply is in hand, so a cancelled
        // exchange leaves the log as it was
        let reply = match self.provider.chat_reply(&history, input).await {
            Ok(text) => ChatMessage::model(text),
            Err(e) => {
                tracing::error!("Chat error: {}", e);
                ChatMessage::model(CHAT_FALLBACK_REPLY)
            }
        };
        messages.push(ChatMessage::user(input));
        messages.push(reply.clone());

        tracing::debug!(messages = messages.len(), "💬 Chat exchange completed");
        Ok(ChatExchange {
            reply,
            messages: messages.clone(),
        })
    }
}

/// Process-wide chat session: created on first use, never reset
pub struct SharedChat {
    provider: Arc<dyn GenerativeProvider>,
    session: OnceCell<ChatSession>,
}

impl SharedChat {
    pub fn new(provider: Arc<dyn GenerativeProvider>) -> Self {
        Self {
            provider,
            session: OnceCell::new(),
        }
    }

    pub async fn session(&self) -> &ChatSession {
        self.session
            .get_or_init(|| async {
                tracing::info!("💬 Chat session created");
                ChatSession::new(self.provider.clone())
            })
            .await
    }

    pub fn is_started(&self) -> bool {
        self.session.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use crate::types::ChatRole;

    fn provider(replies: Vec<Result<String, String>>) -> Arc<ScriptedProvider> {
        Arc::new(ScriptedProvider::new(Ok(vec![])).with_chat_replies(replies))
    }

    #[tokio::test]
    async fn test_exchange_appends_user_then_model() {
        let provider = provider(vec![Ok("Try a wide establishing shot.".into())]);
        let session = ChatSession::new(provider.clone());

        let exchange = session.send("How should scene 1 open?").await.unwrap();

        assert_eq!(exchange.reply.text(), "Try a wide establishing shot.");
        assert_eq!(exchange.messages.len(), 2);
        assert_eq!(exchange.messages[0].role, ChatRole::User);
        assert_eq!(exchange.messages[1].role, ChatRole::Model);
    }

    #[tokio::test]
    async fn test_full_history_is_sent_each_turn() {
        let provider = provider(vec![Ok("first".into()), Ok("second".into())]);
        let session = ChatSession::new(provider.clone());

        session.send("one").await.unwrap();
        session.send("two").await.unwrap();

        let histories = provider.chat_histories();
        assert_eq!(histories.len(), 2);
        assert!(histories[0].is_empty());
        assert_eq!(histories[1].len(), 2);
        assert_eq!(histories[1][1].text(), "first");
        assert_eq!(session.history().await.len(), 4);
    }

    #[tokio::test]
    async fn test_provider_failure_appends_fallback() {
        let provider = provider(vec![Err("boom".into()), Ok("recovered".into())]);
        let session = ChatSession::new(provider);

        let exchange = session.send("hello").await.unwrap();
        assert_eq!(exchange.reply.text(), CHAT_FALLBACK_REPLY);

        // The session keeps working after a failed exchange
        let exchange = session.send("again").await.unwrap();
        assert_eq!(exchange.reply.text(), "recovered");
        assert_eq!(exchange.messages.len(), 4);
    }

    #[tokio::test]
    async fn test_cancelled_exchange_leaves_log_untouched() {
        let provider = Arc::new(
            ScriptedProvider::new(Ok(vec![]))
                .with_chat_replies(vec![Ok("late".into()), Ok("on time".into())])
                .with_chat_delay_ms(200),
        );
        let session = ChatSession::new(provider.clone());

        let cancelled =
            tokio::time::timeout(std::time::Duration::from_millis(20), session.send("hello")).await;
        assert!(cancelled.is_err());
        assert!(session.history().await.is_empty());

        // The next exchange sees no orphaned user message
        let exchange = session.send("hello again").await.unwrap();
        assert_eq!(exchange.messages.len(), 2);
        assert_eq!(exchange.messages[0].text(), "hello again");
        assert!(provider.chat_histories()[1].is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let session = ChatSession::new(provider(vec![]));
        assert_eq!(session.send("   ").await.unwrap_err(), ChatError::EmptyMessage);
        assert!(session.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_shared_session_created_once() {
        let shared = SharedChat::new(provider(vec![]));
        assert!(!shared.is_started());

        shared.session().await.send("hi").await.unwrap();
        shared.session().await.send("there").await.unwrap();

        assert!(shared.is_started());
        assert_eq!(shared.session().await.history().await.len(), 4);
    }
}
