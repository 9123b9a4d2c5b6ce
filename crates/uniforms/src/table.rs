use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::{GlslType, Uniform, UniformValue, ValueError, Vec2};

pub const TIME_UNIFORM: &str = "iTime";
pub const RESOLUTION_UNIFORM: &str = "iResolution";

/// Uniforms the renderer always receives and that shader edits never own.
pub const BUILT_IN_UNIFORMS: [&str; 2] = [TIME_UNIFORM, RESOLUTION_UNIFORM];

/// Uniforms discovered from shader source, keyed by name.
pub type CustomUniforms = BTreeMap<String, Uniform>;

pub fn is_built_in(name: &str) -> bool {
    BUILT_IN_UNIFORMS.contains(&name)
}

/// Snapshot handed to the renderer and the control panel.
///
/// Tables are replaced wholesale; every `with_*` method returns a new table
/// rather than editing a published one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Uniform>", into = "BTreeMap<String, Uniform>")]
pub struct UniformTable {
    entries: BTreeMap<String, Uniform>,
}

impl UniformTable {
    pub fn new(width: u32, height: u32) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            TIME_UNIFORM.to_string(),
            Uniform::new(UniformValue::Float(0.0), GlslType::Float),
        );
        entries.insert(RESOLUTION_UNIFORM.to_string(), resolution_uniform(width, height));
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Uniform> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Uniform)> {
        self.entries.iter().map(|(name, uniform)| (name.as_str(), uniform))
    }

    /// Entries other than the built-ins.
    pub fn custom(&self) -> impl Iterator<Item = (&str, &Uniform)> {
        self.iter().filter(|(name, _)| !is_built_in(name))
    }

    /// Copy holding only the built-in entries.
    pub fn built_ins(&self) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(name, _)| is_built_in(name))
            .map(|(name, uniform)| (name.clone(), uniform.clone()))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn time(&self) -> f32 {
        match self.get(TIME_UNIFORM).map(|uniform| &uniform.value) {
            Some(UniformValue::Float(seconds)) => *seconds,
            _ => 0.0,
        }
    }

    pub fn resolution(&self) -> Option<Vec2> {
        match self.get(RESOLUTION_UNIFORM).map(|uniform| &uniform.value) {
            Some(UniformValue::Vec2(size)) => Some(*size),
            Some(UniformValue::Vec3(size)) => Some(Vec2 {
                x: size.r,
                y: size.g,
            }),
            _ => None,
        }
    }

    pub fn with_time(&self, seconds: f32) -> Self {
        self.with_entry(
            TIME_UNIFORM,
            Uniform::new(UniformValue::Float(seconds), GlslType::Float),
        )
    }

    pub fn with_resolution(&self, width: u32, height: u32) -> Self {
        self.with_entry(RESOLUTION_UNIFORM, resolution_uniform(width, height))
    }

    pub(crate) fn with_entry(&self, name: &str, uniform: Uniform) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(name.to_string(), uniform);
        Self { entries }
    }
}

impl TryFrom<BTreeMap<String, Uniform>> for UniformTable {
    type Error = ValueError;

    fn try_from(entries: BTreeMap<String, Uniform>) -> Result<Self, Self::Error> {
        for name in BUILT_IN_UNIFORMS {
            if !entries.contains_key(name) {
                return Err(ValueError::MissingBuiltIn(name));
            }
        }
        Ok(Self { entries })
    }
}

impl From<UniformTable> for BTreeMap<String, Uniform> {
    fn from(table: UniformTable) -> Self {
        table.entries
    }
}

fn resolution_uniform(width: u32, height: u32) -> Uniform {
    Uniform::new(
        UniformValue::Vec2(Vec2 {
            x: width as f32,
            y: height as f32,
        }),
        GlslType::Vec2,
    )
}

/// Folds the custom mapping over the current table. Built-ins are always
/// taken from `current`, so a custom entry can never shadow them.
pub fn publish(custom: &CustomUniforms, current: &UniformTable) -> UniformTable {
    let mut entries = current.entries.clone();
    entries.extend(
        custom
            .iter()
            .map(|(name, uniform)| (name.clone(), uniform.clone())),
    );
    for name in BUILT_IN_UNIFORMS {
        if let Some(uniform) = current.entries.get(name) {
            entries.insert(name.to_string(), uniform.clone());
        }
    }
    tracing::trace!(entries = entries.len(), "published uniform table");
    UniformTable { entries }
}
