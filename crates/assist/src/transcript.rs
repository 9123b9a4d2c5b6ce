use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::envelope::{parse_envelope, ShaderSuggestion};
use crate::models::ModelConfig;

pub const WELCOME: &str = "Hi! I can help you write and tweak shaders. Mention #vs or #fs to \
include the current vertex or fragment shader in your message.";
pub const NO_MODEL: &str = "Please add and select an AI model before chatting.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<ShaderSuggestion>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            suggestion: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
            suggestion: None,
        }
    }
}

/// Chat history shown to the user. Messages are stored as typed; reference
/// expansion happens only on the outgoing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: vec![Message::assistant(WELCOME)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Records `text`, asks `send` for a reply and records that too. Failures
    /// become assistant messages instead of errors. Returns the reply.
    pub fn exchange<F>(&mut self, text: &str, model: Option<&ModelConfig>, send: F) -> &Message
    where
        F: FnOnce(&ModelConfig) -> Result<String>,
    {
        self.messages.push(Message::user(text));
        let reply = match model {
            None => Message::assistant(NO_MODEL),
            Some(model) => match send(model) {
                Ok(reply) => {
                    let suggestion = match parse_envelope(&reply) {
                        Ok(suggestion) => suggestion,
                        Err(err) => {
                            warn!(error = %err, "assistant reply has a malformed format block");
                            None
                        }
                    };
                    Message {
                        text: reply,
                        sender: Sender::Assistant,
                        suggestion,
                    }
                }
                Err(err) => {
                    warn!(model = %model.name, error = %err, "chat request failed");
                    Message::assistant(format!("Sorry, the model call failed: {err:#}"))
                }
            },
        };
        self.messages.push(reply);
        &self.messages[self.messages.len() - 1]
    }

    /// Drops everything except the welcome message.
    pub fn clear(&mut self) {
        self.messages.truncate(1);
    }
}
