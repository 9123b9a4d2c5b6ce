use clap::ValueEnum;

pub const DEFAULT_VERTEX: &str = "\
varying vec2 vUv;
void main() {
    vUv = uv;
    gl_Position = projectionMatrix * modelViewMatrix * vec4(position, 1.0);
}
";

pub const DEFAULT_FRAGMENT: &str = "\
uniform float iTime;
uniform vec2 iResolution;
uniform float u_custom_float;
uniform float u_scale;

varying vec2 vUv;

void main() {
    vec2 uv = vUv - 0.5;
    vec3 col = 0.5 + 0.5 * cos(iTime + uv.xyx * 6.0 + vec3(0, 2, 4));
    float effect = sin(length(uv) * 20.0 + iTime * u_scale) * 0.1 * u_custom_float;
    col.r += effect;
    col.b -= effect;
    gl_FragColor = vec4(col, 1.0);
}
";

pub const COLOR_FRAGMENT: &str = "\
uniform float iTime;
uniform vec2 iResolution;
uniform vec3 uBackgroundColor;
uniform vec3 uForegroundColor;
uniform vec3 uAccentColor;

varying vec2 vUv;

void main() {
    vec2 uv = vUv;
    vec3 bg = mix(uBackgroundColor, uForegroundColor, uv.y);
    float wave = sin(uv.x * 10.0 + iTime) * 0.1;
    bg += uAccentColor * wave;
    float dist = distance(uv, vec2(0.5));
    vec3 finalColor = mix(bg, uAccentColor, smoothstep(0.3, 0.2, dist));
    gl_FragColor = vec4(finalColor, 1.0);
}
";

/// Starter shaders a fresh session can be reset to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Template {
    #[default]
    Default,
    Colors,
}

impl Template {
    pub fn sources(self) -> (&'static str, &'static str) {
        match self {
            Template::Default => (DEFAULT_VERTEX, DEFAULT_FRAGMENT),
            Template::Colors => (DEFAULT_VERTEX, COLOR_FRAGMENT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uniforms::{scan, GlslType};

    #[test]
    fn default_template_exposes_two_controls() {
        let discovered = scan(Template::Default.sources().1);
        let names: Vec<_> = discovered.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["u_custom_float", "u_scale"]);
    }

    #[test]
    fn color_template_declares_colours() {
        let discovered = scan(Template::Colors.sources().1);
        assert_eq!(discovered.len(), 3);
        assert!(discovered.iter().all(|d| d.ty == GlslType::Vec3));
    }
}
