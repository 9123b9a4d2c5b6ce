use serde::Serialize;

use crate::table::{is_built_in, CustomUniforms};
use crate::value::{GlslType, UniformValue};

/// Editor widget the control panel should show for a uniform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Editor {
    Slider { min: f32, max: f32 },
    Color { alpha: bool },
    Vector,
    Texture,
}

impl Editor {
    pub fn for_type(ty: GlslType) -> Self {
        match ty {
            GlslType::Float => Editor::Slider { min: 0.0, max: 1.0 },
            GlslType::Vec2 => Editor::Vector,
            GlslType::Vec3 => Editor::Color { alpha: false },
            GlslType::Vec4 => Editor::Color { alpha: true },
            GlslType::Sampler2D => Editor::Texture,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Control {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: GlslType,
    pub value: UniformValue,
    pub editor: Editor,
}

/// Lists one control per custom uniform, ordered by name.
pub fn controls(custom: &CustomUniforms) -> Vec<Control> {
    custom
        .iter()
        .filter(|(name, _)| !is_built_in(name))
        .map(|(name, uniform)| {
            let ty = uniform.effective_type().unwrap_or(GlslType::Float);
            Control {
                name: name.clone(),
                ty,
                value: uniform.value.clone(),
                editor: Editor::for_type(ty),
            }
        })
        .collect()
}
