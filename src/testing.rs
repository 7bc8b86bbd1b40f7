//! Scripted in-memory provider used by unit and integration tests

use crate::error::ProviderError;
use crate::provider::GenerativeProvider;
use crate::types::{ChatMessage, Scene};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const FAKE_JPEG_BASE64: &str = "/9j/4AAQSkZJRg==";

#[derive(Debug, Default)]
pub struct ScriptedProvider {
    extraction: Option<Result<Vec<Scene>, String>>,
    failing_prompts: HashSet<String>,
    extract_delay: Duration,
    image_delay: Duration,
    chat_delay: Duration,
    chat_replies: Mutex<VecDeque<Result<String, String>>>,
    extract_calls: AtomicUsize,
    image_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    chat_histories: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new(extraction: Result<Vec<Scene>, ProviderError>) -> Self {
        Self {
            extraction: Some(extraction.map_err(|e| e.to_string())),
            ..Self::default()
        }
    }

    /// `n` sequential scenes whose prompts are `prompt 1` .. `prompt n`
    pub fn scenes(n: i64) -> Vec<Scene> {
        (1..=n)
            .map(|i| Scene {
                scene_number: i,
                description: format!("Scene {} description", i),
                image_prompt: format!("prompt {}", i),
            })
            .collect()
    }

    pub fn failing_prompt(mut self, prompt: &str) -> Self {
        self.failing_prompts.insert(prompt.to_string());
        self
    }

    pub fn with_extract_delay_ms(mut self, ms: u64) -> Self {
        self.extract_delay = Duration::from_millis(ms);
        self
    }

    pub fn with_image_delay_ms(mut self, ms: u64) -> Self {
        self.image_delay = Duration::from_millis(ms);
        self
    }

    pub fn with_chat_delay_ms(mut self, ms: u64) -> Self {
        self.chat_delay = Duration::from_millis(ms);
        self
    }

    /// Queue chat outcomes; once drained, replies echo the message
    pub fn with_chat_replies(self, replies: Vec<Result<String, String>>) -> Self {
        if let Ok(mut queue) = self.chat_replies.lock() {
            queue.extend(replies);
        }
        self
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// History passed to each chat call, in call order
    pub fn chat_histories(&self) -> Vec<Vec<ChatMessage>> {
        self.chat_histories
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GenerativeProvider for ScriptedProvider {
    async fn extract_scenes(&self, _script: &str) -> Result<Vec<Scene>, ProviderError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if !self.extract_delay.is_zero() {
            tokio::time::sleep(self.extract_delay).await;
        }
        match &self.extraction {
            Some(Ok(scenes)) => Ok(scenes.clone()),
            Some(Err(message)) => Err(ProviderError::Malformed(message.clone())),
            None => Err(ProviderError::Malformed("no extraction scripted".to_string())),
        }
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, ProviderError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.image_delay.is_zero() {
            tokio::time::sleep(self.image_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_prompts.contains(prompt) {
            Err(ProviderError::NoImage)
        } else {
            Ok(format!("data:image/jpeg;base64,{}", FAKE_JPEG_BASE64))
        }
    }

    async fn chat_reply(
        &self,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<String, ProviderError> {
        if let Ok(mut histories) = self.chat_histories.lock() {
            histories.push(history.to_vec());
        }
        if !self.chat_delay.is_zero() {
            tokio::time::sleep(self.chat_delay).await;
        }
        let scripted = self
            .chat_replies
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());
        match scripted {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(body)) => Err(ProviderError::Api { status: 500, body }),
            None => Ok(format!("You said: {}", message)),
        }
    }
}
