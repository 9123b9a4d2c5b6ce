//! Value model shared by the scanner, reconciler, publish step, and the
//! control panel.
//!
//! Types:
//!
//! - `GlslType` names the declaration types the editor understands. Only
//!   `float`, `vec3`, `vec4`, and `sampler2D` are discovered from source;
//!   `vec2` exists for the resolution built-in.
//! - `UniformValue` is the payload of a uniform, one variant per shape. `Unset`
//!   is an empty sampler slot and carries no shape of its own.
//! - `Uniform` pairs a value with an optional type tag. When the tag is absent
//!   the type is inferred from the value's shape.
//!
//! Functions:
//!
//! - `UniformValue::from_json` is the single ingestion point for loosely shaped
//!   values (control edits, persisted sessions). It normalizes `{x,y,z}` into
//!   `{r,g,b}` and rejects anything the renderer could not interpret.
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::compat::is_compatible;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("unrecognised uniform value shape: {0}")]
    Shape(String),
    #[error("channel '{channel}' must be within [0, 1], got {value}")]
    ChannelOutOfRange { channel: &'static str, value: f64 },
    #[error("uniform value '{0}' must be a finite number")]
    NonFinite(&'static str),
    #[error("image reference must carry a non-empty src")]
    EmptySource,
    #[error("unknown uniform type '{0}'")]
    UnknownType(String),
    #[error("uniform table is missing built-in '{0}'")]
    MissingBuiltIn(&'static str),
    #[error("uniform tagged {tag} holds a {found} value")]
    TagMismatch { tag: GlslType, found: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GlslType {
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "vec2")]
    Vec2,
    #[serde(rename = "vec3", alias = "color")]
    Vec3,
    #[serde(rename = "vec4")]
    Vec4,
    #[serde(rename = "sampler2D")]
    Sampler2D,
}

impl GlslType {
    pub fn as_str(self) -> &'static str {
        match self {
            GlslType::Float => "float",
            GlslType::Vec2 => "vec2",
            GlslType::Vec3 => "vec3",
            GlslType::Vec4 => "vec4",
            GlslType::Sampler2D => "sampler2D",
        }
    }

    /// Value given to a uniform the first time it is seen, or after its
    /// declared type changes.
    pub fn default_value(self) -> UniformValue {
        match self {
            GlslType::Float => UniformValue::Float(0.5),
            GlslType::Vec2 => UniformValue::Vec2(Vec2 { x: 0.0, y: 0.0 }),
            GlslType::Vec3 => UniformValue::Vec3(Rgb::WHITE),
            GlslType::Vec4 => UniformValue::Vec4(Rgba::WHITE),
            GlslType::Sampler2D => UniformValue::Unset,
        }
    }
}

impl fmt::Display for GlslType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GlslType {
    type Err = ValueError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "float" => Ok(GlslType::Float),
            "vec2" => Ok(GlslType::Vec2),
            "vec3" | "color" => Ok(GlslType::Vec3),
            "vec4" => Ok(GlslType::Vec4),
            "sampler2D" => Ok(GlslType::Sampler2D),
            other => Err(ValueError::UnknownType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
}

/// Texture payload produced by the image upload control. `src` is a data URI
/// or URL; dimensions are informational.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRef {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ImageRef {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            width: None,
            height: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Rgb),
    Vec4(Rgba),
    Image(ImageRef),
    #[default]
    Unset,
}

impl UniformValue {
    /// Structural type of the value, used when a uniform carries no tag.
    pub fn inferred_type(&self) -> Option<GlslType> {
        match self {
            UniformValue::Float(_) => Some(GlslType::Float),
            UniformValue::Vec2(_) => Some(GlslType::Vec2),
            UniformValue::Vec3(_) => Some(GlslType::Vec3),
            UniformValue::Vec4(_) => Some(GlslType::Vec4),
            UniformValue::Image(_) => Some(GlslType::Sampler2D),
            UniformValue::Unset => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, UniformValue::Unset)
    }

    pub fn from_json(raw: &Value) -> Result<Self, ValueError> {
        match raw {
            Value::Null => Ok(UniformValue::Unset),
            Value::Number(_) => Ok(UniformValue::Float(finite(raw, "value")?)),
            Value::Object(map) => from_object(map),
            other => Err(ValueError::Shape(other.to_string())),
        }
    }
}

impl fmt::Display for UniformValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformValue::Float(v) => write!(f, "{v:.3}"),
            UniformValue::Vec2(v) => write!(f, "({:.3}, {:.3})", v.x, v.y),
            UniformValue::Vec3(c) => write!(f, "rgb({:.3}, {:.3}, {:.3})", c.r, c.g, c.b),
            UniformValue::Vec4(c) => {
                write!(f, "rgba({:.3}, {:.3}, {:.3}, {:.3})", c.r, c.g, c.b, c.a)
            }
            UniformValue::Image(image) => match (image.width, image.height) {
                (Some(w), Some(h)) => write!(f, "image {w}x{h} ({} bytes of src)", image.src.len()),
                _ => write!(f, "image ({} bytes of src)", image.src.len()),
            },
            UniformValue::Unset => f.write_str("unset"),
        }
    }
}

impl Serialize for UniformValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            UniformValue::Float(v) => serializer.serialize_f32(*v),
            UniformValue::Vec2(v) => v.serialize(serializer),
            UniformValue::Vec3(c) => c.serialize(serializer),
            UniformValue::Vec4(c) => c.serialize(serializer),
            UniformValue::Image(image) => image.serialize(serializer),
            UniformValue::Unset => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for UniformValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        UniformValue::from_json(&raw).map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "TaggedValue")]
pub struct Uniform {
    #[serde(default)]
    pub value: UniformValue,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<GlslType>,
}

impl Uniform {
    pub fn new(value: UniformValue, ty: GlslType) -> Self {
        Self {
            value,
            ty: Some(ty),
        }
    }

    pub fn untagged(value: UniformValue) -> Self {
        Self { value, ty: None }
    }

    /// Tagged default for a freshly declared uniform.
    pub fn declared(ty: GlslType) -> Self {
        Self::new(ty.default_value(), ty)
    }

    pub fn effective_type(&self) -> Option<GlslType> {
        self.ty.or_else(|| self.value.inferred_type())
    }
}

#[derive(Deserialize)]
struct TaggedValue {
    #[serde(default)]
    value: UniformValue,
    #[serde(rename = "type", default)]
    ty: Option<GlslType>,
}

impl TryFrom<TaggedValue> for Uniform {
    type Error = ValueError;

    fn try_from(raw: TaggedValue) -> Result<Self, Self::Error> {
        if let Some(tag) = raw.ty {
            if !is_compatible(&raw.value, tag) {
                return Err(ValueError::TagMismatch {
                    tag,
                    found: raw
                        .value
                        .inferred_type()
                        .map(|ty| ty.to_string())
                        .unwrap_or_else(|| "unset".to_string()),
                });
            }
        }
        Ok(Self {
            value: raw.value,
            ty: raw.ty,
        })
    }
}

fn from_object(map: &Map<String, Value>) -> Result<UniformValue, ValueError> {
    if let Some(src) = map.get("src") {
        let src = src
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ValueError::EmptySource)?;
        let dimension = |key: &str| {
            map.get(key)
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
        };
        return Ok(UniformValue::Image(ImageRef {
            src: src.to_string(),
            width: dimension("width"),
            height: dimension("height"),
        }));
    }

    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    let field = |key: &'static str| {
        map.get(key)
            .ok_or_else(|| ValueError::Shape(format!("missing '{key}'")))
            .and_then(|v| finite(v, key))
    };
    let channel = |key: &'static str| field(key).and_then(|v| unit_range(v, key));

    match keys.as_slice() {
        ["b", "g", "r"] => Ok(UniformValue::Vec3(Rgb {
            r: channel("r")?,
            g: channel("g")?,
            b: channel("b")?,
        })),
        ["a", "b", "g", "r"] => Ok(UniformValue::Vec4(Rgba {
            r: channel("r")?,
            g: channel("g")?,
            b: channel("b")?,
            a: channel("a")?,
        })),
        // Positional spelling, also used for a vec3 resolution, so no unit range.
        ["x", "y", "z"] => Ok(UniformValue::Vec3(Rgb {
            r: field("x")?,
            g: field("y")?,
            b: field("z")?,
        })),
        ["x", "y"] => Ok(UniformValue::Vec2(Vec2 {
            x: field("x")?,
            y: field("y")?,
        })),
        _ => Err(ValueError::Shape(Value::Object(map.clone()).to_string())),
    }
}

fn finite(raw: &Value, key: &'static str) -> Result<f32, ValueError> {
    let value = raw.as_f64().ok_or(ValueError::NonFinite(key))?;
    if !value.is_finite() || value.abs() > f64::from(f32::MAX) {
        return Err(ValueError::NonFinite(key));
    }
    Ok(value as f32)
}

fn unit_range(value: f32, channel: &'static str) -> Result<f32, ValueError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ValueError::ChannelOutOfRange {
            channel,
            value: f64::from(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_xyz_into_rgb() {
        let value = UniformValue::from_json(&json!({ "x": 0.25, "y": 0.5, "z": 1.0 })).unwrap();
        assert_eq!(
            value,
            UniformValue::Vec3(Rgb {
                r: 0.25,
                g: 0.5,
                b: 1.0
            })
        );
    }

    #[test]
    fn distinguishes_vector_shapes_by_key_set() {
        assert!(matches!(
            UniformValue::from_json(&json!({ "r": 1, "g": 0, "b": 0 })),
            Ok(UniformValue::Vec3(_))
        ));
        assert!(matches!(
            UniformValue::from_json(&json!({ "r": 1, "g": 0, "b": 0, "a": 1 })),
            Ok(UniformValue::Vec4(_))
        ));
        assert!(matches!(
            UniformValue::from_json(&json!({ "x": 1920, "y": 1080 })),
            Ok(UniformValue::Vec2(_))
        ));
        assert!(matches!(
            UniformValue::from_json(&json!({ "r": 1, "g": 0 })),
            Err(ValueError::Shape(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_channels() {
        let err = UniformValue::from_json(&json!({ "r": 1.5, "g": 0, "b": 0 })).unwrap_err();
        assert!(matches!(
            err,
            ValueError::ChannelOutOfRange { channel: "r", .. }
        ));
    }

    #[test]
    fn accepts_image_objects() {
        let value =
            UniformValue::from_json(&json!({ "src": "data:image/png;base64,AA", "width": 4 }))
                .unwrap();
        match value {
            UniformValue::Image(image) => {
                assert_eq!(image.src, "data:image/png;base64,AA");
                assert_eq!(image.width, Some(4));
                assert_eq!(image.height, None);
            }
            other => panic!("expected image, got {other:?}"),
        }
        assert_eq!(
            UniformValue::from_json(&json!({ "src": "" })),
            Err(ValueError::EmptySource)
        );
    }

    #[test]
    fn null_is_unset_and_strings_are_rejected() {
        assert_eq!(UniformValue::from_json(&Value::Null), Ok(UniformValue::Unset));
        assert!(UniformValue::from_json(&json!("0.5")).is_err());
    }

    #[test]
    fn uniform_serializes_with_type_tag() {
        let uniform = Uniform::declared(GlslType::Vec4);
        let encoded = serde_json::to_value(&uniform).unwrap();
        assert_eq!(
            encoded,
            json!({ "value": { "r": 1.0, "g": 1.0, "b": 1.0, "a": 1.0 }, "type": "vec4" })
        );
        let decoded: Uniform = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, uniform);
    }

    #[test]
    fn color_alias_maps_to_vec3() {
        let uniform: Uniform =
            serde_json::from_value(json!({ "value": { "r": 0, "g": 0, "b": 0 }, "type": "color" }))
                .unwrap();
        assert_eq!(uniform.ty, Some(GlslType::Vec3));
        assert_eq!("color".parse::<GlslType>(), Ok(GlslType::Vec3));
    }

    #[test]
    fn untagged_uniform_infers_type_from_shape() {
        let uniform = Uniform::untagged(UniformValue::Float(0.1));
        assert_eq!(uniform.effective_type(), Some(GlslType::Float));
        assert_eq!(Uniform::untagged(UniformValue::Unset).effective_type(), None);
    }

    #[test]
    fn tag_must_fit_value_shape() {
        let err = serde_json::from_value::<Uniform>(
            json!({ "value": { "r": 1, "g": 0, "b": 0 }, "type": "float" }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("tagged float holds a vec3"));

        let unset: Uniform =
            serde_json::from_value(json!({ "value": null, "type": "vec4" })).unwrap();
        assert_eq!(unset.ty, Some(GlslType::Vec4));
        assert!(unset.value.is_unset());
    }
}
