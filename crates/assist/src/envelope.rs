//! Parser for the structured block the assistant is asked to reply with.
//!
//! ```text
//! === FORMAT START ===
//! DESCRIPTION: what the change does
//! VERTEX SHADER:
//! <glsl>
//! FRAGMENT SHADER:
//! <glsl>
//! CHANGES:
//! - one bullet per change
//! === FORMAT END ===
//! ```
//!
//! Headers are matched case-insensitively and may carry markdown decoration
//! (`### Fragment Shader:`, `**Changes:**`). Code sections may be fenced.
use serde::{Deserialize, Serialize};

pub const FORMAT_START: &str = "=== FORMAT START ===";
pub const FORMAT_END: &str = "=== FORMAT END ===";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("reply opens a format block but never closes it")]
    Unterminated,
    #[error("format block contains no recognised sections")]
    Empty,
}

/// Shader edit proposed by the assistant. Missing code sections mean the
/// corresponding shader stays as it is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShaderSuggestion {
    pub description: String,
    pub vertex: Option<String>,
    pub fragment: Option<String>,
    pub changes: Vec<String>,
}

impl ShaderSuggestion {
    pub fn has_code(&self) -> bool {
        self.vertex.is_some() || self.fragment.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Description,
    Vertex,
    Fragment,
    Changes,
}

/// Extracts a suggestion from an assistant reply. Replies without a format
/// block are ordinary chat and yield `Ok(None)`.
pub fn parse_envelope(text: &str) -> Result<Option<ShaderSuggestion>, EnvelopeError> {
    let Some(start) = text.find(FORMAT_START) else {
        return Ok(None);
    };
    let body_start = start + FORMAT_START.len();
    let end = text[body_start..]
        .find(FORMAT_END)
        .ok_or(EnvelopeError::Unterminated)?;
    let body = &text[body_start..body_start + end];

    let mut sections: Vec<(Section, Vec<&str>)> = Vec::new();
    for line in body.lines() {
        if let Some((section, inline)) = section_header(line) {
            let mut lines = Vec::new();
            if !inline.is_empty() {
                lines.push(inline);
            }
            sections.push((section, lines));
        } else if let Some((_, lines)) = sections.last_mut() {
            lines.push(line);
        }
    }

    if sections.is_empty() {
        return Err(EnvelopeError::Empty);
    }

    let mut suggestion = ShaderSuggestion::default();
    for (section, lines) in sections {
        match section {
            Section::Description => suggestion.description = lines.join("\n").trim().to_string(),
            Section::Vertex => suggestion.vertex = code_block(&lines),
            Section::Fragment => suggestion.fragment = code_block(&lines),
            Section::Changes => suggestion.changes = change_list(&lines),
        }
    }
    Ok(Some(suggestion))
}

fn section_header(line: &str) -> Option<(Section, &str)> {
    let (label, rest) = line.split_once(':')?;
    let label = label
        .trim()
        .trim_start_matches('#')
        .trim_matches('*')
        .trim()
        .to_ascii_uppercase();
    let section = match label.as_str() {
        "DESCRIPTION" => Section::Description,
        "VERTEX" | "VERTEX SHADER" => Section::Vertex,
        "FRAGMENT" | "FRAGMENT SHADER" => Section::Fragment,
        "CHANGES" | "CHANGE LIST" => Section::Changes,
        _ => return None,
    };
    Some((section, rest.trim().trim_matches('*').trim()))
}

fn code_block(lines: &[&str]) -> Option<String> {
    let mut body: &[&str] = lines;
    while let Some((first, rest)) = body.split_first() {
        if first.trim().is_empty() {
            body = rest;
        } else {
            break;
        }
    }
    while let Some((last, rest)) = body.split_last() {
        if last.trim().is_empty() {
            body = rest;
        } else {
            break;
        }
    }
    if let Some((first, rest)) = body.split_first() {
        if first.trim_start().starts_with("```") {
            body = rest;
        }
    }
    if let Some((last, rest)) = body.split_last() {
        if last.trim() == "```" {
            body = rest;
        }
    }
    let code = body.join("\n");
    if code.trim().is_empty() {
        None
    } else {
        Some(code)
    }
}

fn change_list(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .map(|line| strip_bullet(line.trim()))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_bullet(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix('-').or_else(|| line.strip_prefix('*')) {
        return rest.trim_start();
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim_start();
        }
    }
    line
}
