//! Pattern-based discovery of `uniform <type> <name>;` declarations.
//!
//! This is not a GLSL parser. Each supported type is searched independently
//! for a single `uniform <type> <name>;` statement: array forms and comma
//! lists go unnoticed, and a declaration inside a comment is still found.
use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::value::GlslType;

/// Names owned by the renderer or the 3D pipeline. They are never surfaced
/// as editable uniforms even when the shader declares them.
pub const EXCLUDED_UNIFORMS: [&str; 7] = [
    "iTime",
    "iResolution",
    "projectionMatrix",
    "modelViewMatrix",
    "viewMatrix",
    "normalMatrix",
    "cameraPosition",
];

/// Priority used both for the scan passes and for resolving a name declared
/// with more than one type.
pub const SCAN_ORDER: [GlslType; 4] = [
    GlslType::Float,
    GlslType::Vec3,
    GlslType::Vec4,
    GlslType::Sampler2D,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredUniform {
    pub name: String,
    pub ty: GlslType,
}

impl DiscoveredUniform {
    pub fn new(name: impl Into<String>, ty: GlslType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

fn declaration_patterns() -> &'static [(GlslType, Regex)] {
    static PATTERNS: OnceLock<Vec<(GlslType, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        SCAN_ORDER
            .iter()
            .map(|ty| {
                let pattern = format!(r"uniform\s+{}\s+([a-zA-Z_][a-zA-Z0-9_]*);", ty.as_str());
                let regex = Regex::new(&pattern).expect("uniform declaration pattern is valid");
                (*ty, regex)
            })
            .collect()
    })
}

fn declared_names<'a>(regex: &'a Regex, source: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    regex
        .captures_iter(source)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Returns every user-declared uniform name, first match per type pass,
/// without duplicates.
pub fn discover_uniform_names(source: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for (_, regex) in declaration_patterns() {
        for name in declared_names(regex, source) {
            if EXCLUDED_UNIFORMS.contains(&name) {
                continue;
            }
            if seen.insert(name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Looks up the declared type of a single name. When the name is declared
/// with several types the first one in [`SCAN_ORDER`] wins.
pub fn uniform_type(source: &str, name: &str) -> Option<GlslType> {
    declaration_patterns()
        .iter()
        .find(|(_, regex)| declared_names(regex, source).any(|declared| declared == name))
        .map(|(ty, _)| *ty)
}

/// Discovers uniform names and resolves each one's type.
pub fn scan(source: &str) -> Vec<DiscoveredUniform> {
    discover_uniform_names(source)
        .into_iter()
        .filter_map(|name| uniform_type(source, &name).map(|ty| DiscoveredUniform { name, ty }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"
uniform float iTime;
uniform vec2 iResolution;
uniform float u_custom_float; // example
uniform float u_scale;
uniform vec3 uTint;
uniform vec4 uOverlay;
uniform sampler2D uTexture;

varying vec2 vUv;

void main() {
    gl_FragColor = vec4(uTint, 1.0) * uOverlay * u_scale;
}
"#;

    #[test]
    fn discovers_each_supported_type() {
        let discovered = scan(TEMPLATE);
        assert_eq!(
            discovered,
            vec![
                DiscoveredUniform::new("u_custom_float", GlslType::Float),
                DiscoveredUniform::new("u_scale", GlslType::Float),
                DiscoveredUniform::new("uTint", GlslType::Vec3),
                DiscoveredUniform::new("uOverlay", GlslType::Vec4),
                DiscoveredUniform::new("uTexture", GlslType::Sampler2D),
            ]
        );
    }

    #[test]
    fn excludes_builtins_even_when_declared() {
        let source = "uniform float iTime;\nuniform mat4 viewMatrix;\nuniform vec3 cameraPosition;\nuniform vec3 iResolution;";
        assert!(discover_uniform_names(source).is_empty());
    }

    #[test]
    fn ignores_unsupported_and_malformed_declarations() {
        let source = r#"
uniform vec2 uOffset;
uniform mat3 uBasis;
uniform float uArray[4];
uniform float uFirst, uSecond;
uniform float 9bad;
uniform float uMissingSemicolon
"#;
        assert!(scan(source).is_empty());
    }

    #[test]
    fn tolerates_extra_whitespace_between_tokens() {
        let discovered = scan("uniform   vec3\tuGlow;\nuniform float\n    uWrapped;");
        assert_eq!(
            discovered,
            vec![
                DiscoveredUniform::new("uWrapped", GlslType::Float),
                DiscoveredUniform::new("uGlow", GlslType::Vec3),
            ]
        );
    }

    #[test]
    fn commented_declarations_are_still_found() {
        let discovered = scan("// uniform float uLegacy;\n");
        assert_eq!(discovered, vec![DiscoveredUniform::new("uLegacy", GlslType::Float)]);
    }

    #[test]
    fn conflicting_types_resolve_by_priority() {
        let source = "uniform vec4 uMix;\nuniform float uMix;";
        let discovered = scan(source);
        assert_eq!(discovered, vec![DiscoveredUniform::new("uMix", GlslType::Float)]);
        assert_eq!(uniform_type(source, "uMix"), Some(GlslType::Float));
    }

    #[test]
    fn type_lookup_requires_exact_identifier() {
        let source = "uniform float uScaleX;";
        assert_eq!(uniform_type(source, "uScale"), None);
        assert_eq!(uniform_type(source, "uScaleX"), Some(GlslType::Float));
    }

    #[test]
    fn duplicate_declarations_are_reported_once() {
        let source = "uniform float a;\nuniform float a;\nuniform float b;";
        assert_eq!(discover_uniform_names(source), vec!["a", "b"]);
    }
}
