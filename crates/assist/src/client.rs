use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::ModelConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Blocking client for OpenAI-compatible `chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    options: ChatOptions,
    system_prompt: Option<String>,
}

impl ChatClient {
    pub fn new(options: ChatOptions) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            options,
            system_prompt: None,
        })
    }

    /// Prepends a system message to every request.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn options(&self) -> ChatOptions {
        self.options
    }

    /// Sends a single prompt and returns the first choice's content.
    pub fn complete(&self, model: &ModelConfig, prompt: &str) -> Result<String> {
        let url = completions_url(&model.address)?;
        let messages = self.messages(prompt);
        let body = CompletionRequest {
            model: &model.model,
            messages: &messages,
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };
        debug!(%url, model = %model.model, "sending chat completion");

        let response = self
            .http
            .post(url.clone())
            .bearer_auth(&model.api_key)
            .json(&body)
            .send()
            .with_context(|| format!("requesting {url}"))?;
        let status = response.status();
        let text = response
            .text()
            .with_context(|| format!("reading response from {url}"))?;
        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<ApiError>(&text) {
                bail!("chat API error {status}: {}", err.error.message);
            }
            bail!("chat API returned {status}");
        }
        extract_reply(&text)
    }

    fn messages(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage::new(Role::System, system.clone()));
        }
        messages.push(ChatMessage::new(Role::User, prompt));
        messages
    }
}

/// Resolves the completions endpoint for a configured base address.
/// `api.openai.com` addresses are used as given; anything else is treated as
/// an OpenAI-compatible server rooted at `/v1`.
pub fn completions_url(address: &str) -> Result<Url> {
    let base = address.trim().trim_end_matches('/');
    if base.is_empty() {
        bail!("model address must not be empty");
    }
    let endpoint = if base.contains("openai.com") || base.ends_with("/v1") {
        format!("{base}/chat/completions")
    } else {
        format!("{base}/v1/chat/completions")
    };
    Url::parse(&endpoint).with_context(|| format!("invalid model address '{address}'"))
}

fn extract_reply(body: &str) -> Result<String> {
    let payload: CompletionResponse = match serde_json::from_str(body) {
        Ok(payload) => payload,
        Err(err) => {
            let snippet = body.chars().take(200).collect::<String>();
            bail!("unexpected chat API response ({err}). First 200 bytes: {snippet}");
        }
    };
    payload
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("chat API response contained no choices"))
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_addresses_are_used_verbatim() {
        assert_eq!(
            completions_url("https://api.openai.com/v1").unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn compatible_servers_get_v1_prefix() {
        assert_eq!(
            completions_url("http://localhost:11434/").unwrap().as_str(),
            "http://localhost:11434/v1/chat/completions"
        );
        assert_eq!(
            completions_url("https://llm.internal/v1").unwrap().as_str(),
            "https://llm.internal/v1/chat/completions"
        );
    }

    #[test]
    fn rejects_unusable_addresses() {
        assert!(completions_url("   ").is_err());
        assert!(completions_url("not a url").is_err());
    }

    #[test]
    fn request_body_matches_chat_completions_shape() {
        let messages = vec![ChatMessage::new(Role::User, "hi")];
        let body = CompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            max_tokens: 2000,
            temperature: 0.5,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "hi"}],
                "max_tokens": 2000,
                "temperature": 0.5,
            })
        );
    }

    #[test]
    fn system_prompt_precedes_user_message() {
        let client = ChatClient::new(ChatOptions::default())
            .unwrap()
            .with_system_prompt("be terse");
        let messages = client.messages("hello");
        assert_eq!(messages[0], ChatMessage::new(Role::System, "be terse"));
        assert_eq!(messages[1], ChatMessage::new(Role::User, "hello"));
    }

    #[test]
    fn extracts_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"ok"}},{"message":{"content":"no"}}]}"#;
        assert_eq!(extract_reply(body).unwrap(), "ok");
        assert!(extract_reply(r#"{"choices":[]}"#).is_err());
        assert!(extract_reply("<html>").is_err());
    }
}
