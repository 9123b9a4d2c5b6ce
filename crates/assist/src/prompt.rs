use crate::envelope::{FORMAT_END, FORMAT_START};

pub const VERTEX_REFERENCE: &str = "#vs";
pub const FRAGMENT_REFERENCE: &str = "#fs";

/// Inlines the current shader sources wherever the message mentions `#vs` or
/// `#fs`. Replacement text is never rescanned, so shader code containing the
/// tokens is left alone.
pub fn expand_references(message: &str, vertex: &str, fragment: &str) -> String {
    let vertex_block = format!("\n=== Vertex Shader ===\n{vertex}\n=== End Vertex Shader ===\n");
    let fragment_block =
        format!("\n=== Fragment Shader ===\n{fragment}\n=== End Fragment Shader ===\n");
    let tokens = [
        (VERTEX_REFERENCE, vertex_block.as_str()),
        (FRAGMENT_REFERENCE, fragment_block.as_str()),
    ];

    let mut expanded = String::with_capacity(message.len());
    let mut rest = message;
    loop {
        let next = tokens
            .iter()
            .filter_map(|(token, block)| rest.find(token).map(|at| (at, *token, *block)))
            .min_by_key(|(at, _, _)| *at);
        match next {
            Some((at, token, block)) => {
                expanded.push_str(&rest[..at]);
                expanded.push_str(block);
                rest = &rest[at + token.len()..];
            }
            None => {
                expanded.push_str(rest);
                break;
            }
        }
    }
    expanded
}

/// System prompt asking the model to wrap shader edits in the envelope that
/// [`crate::parse_envelope`] understands.
pub fn format_instructions() -> String {
    format!(
        "You are a GLSL shader assistant for a live WebGL editor. The fragment shader receives \
`uniform float iTime` (seconds) and `uniform vec2 iResolution` (pixels). Any other \
`uniform float`, `uniform vec3`, `uniform vec4` or `uniform sampler2D` you declare becomes an \
editable control; vec3 and vec4 uniforms are edited as colours.\n\
When you propose shader code, answer with exactly one block in this format:\n\
{FORMAT_START}\n\
DESCRIPTION: one or two sentences\n\
VERTEX SHADER:\n\
<complete vertex shader, or leave empty to keep the current one>\n\
FRAGMENT SHADER:\n\
<complete fragment shader, or leave empty to keep the current one>\n\
CHANGES:\n\
- one line per change\n\
{FORMAT_END}\n\
Always send complete shaders, never fragments of them. Plain questions may be answered \
without the block."
    )
}
