mod client;
mod envelope;
mod models;
mod prompt;
mod transcript;

pub use client::{completions_url, ChatClient, ChatMessage, ChatOptions, Role};
pub use envelope::{parse_envelope, EnvelopeError, ShaderSuggestion, FORMAT_END, FORMAT_START};
pub use models::{obfuscate, reveal, ModelConfig, ModelStore, ModelStoreError};
pub use prompt::{expand_references, format_instructions, FRAGMENT_REFERENCE, VERTEX_REFERENCE};
pub use transcript::{Message, Sender, Transcript, NO_MODEL, WELCOME};
