use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::domain::errors::DomainError;

const ASSISTANT_BRIEF: &str = "You are Artie, the shop assistant for ArtCraft, an online store \
for art and craft supplies. Help with products, materials, orders, shipping and returns. \
Answer in at most five short lines and steer unrelated questions back to art and craft.";

pub const FALLBACK_REPLIES: [&str; 3] = [
    "Hi there! I'm Artie from ArtCraft. I'm having some technical difficulties at the moment, but I'd love to help you with any questions about our art supplies!",
    "Hello! I'm currently experiencing some connection issues. Please feel free to browse our art supplies collection or contact our support team at support@artcraft.com.",
    "I apologize for the inconvenience. I'm temporarily unavailable, but our website has plenty of information about our art and craft products. How can I help you once I'm back online?",
];

#[derive(Debug, Error)]
pub enum ChatbotError {
    #[error("chatbot transport error: {0}")]
    Transport(String),
    #[error("chatbot service answered with status {0}")]
    Status(u16),
    #[error("chatbot service returned no text")]
    EmptyResponse,
}

/// A remote model that turns a prompt into reply text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ChatbotError>;
}

pub struct ChatbotService {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl ChatbotService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    /// Used when no API key is configured; every reply is a fallback.
    pub fn offline() -> Self {
        Self { generator: None }
    }

    pub async fn reply(&self, message: &str) -> Result<String, DomainError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(DomainError::InvalidInput("Message is required".into()));
        }

        let Some(generator) = &self.generator else {
            return Ok(fallback_reply().to_string());
        };

        match generator.generate(&prompt_for(message)).await {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) => {
                log::warn!("Chatbot returned an empty reply, using fallback");
                Ok(fallback_reply().to_string())
            }
            Err(e) => {
                log::warn!("Chatbot request failed, using fallback: {}", e);
                Ok(fallback_reply().to_string())
            }
        }
    }
}

fn prompt_for(message: &str) -> String {
    format!("{}\n\nCustomer query: {}", ASSISTANT_BRIEF, message)
}

fn fallback_reply() -> &'static str {
    FALLBACK_REPLIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_REPLIES[0])
}
