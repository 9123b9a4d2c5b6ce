use crate::value::{GlslType, UniformValue};

/// Decides whether a stored value can be kept under a newly detected type.
///
/// An unset value fits any type. Samplers accept any image.
pub fn is_compatible(existing: &UniformValue, target: GlslType) -> bool {
    match (existing, target) {
        (UniformValue::Unset, _) => true,
        (UniformValue::Float(_), GlslType::Float) => true,
        (UniformValue::Vec2(_), GlslType::Vec2) => true,
        (UniformValue::Vec3(_), GlslType::Vec3) => true,
        (UniformValue::Vec4(_), GlslType::Vec4) => true,
        (UniformValue::Image(_), GlslType::Sampler2D) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ImageRef, Rgb, Rgba, Vec2};

    const ALL: [GlslType; 5] = [
        GlslType::Float,
        GlslType::Vec2,
        GlslType::Vec3,
        GlslType::Vec4,
        GlslType::Sampler2D,
    ];

    #[test]
    fn unset_fits_every_type() {
        for ty in ALL {
            assert!(is_compatible(&UniformValue::Unset, ty), "{ty}");
        }
    }

    #[test]
    fn each_shape_fits_only_its_own_type() {
        let cases = [
            (UniformValue::Float(0.2), GlslType::Float),
            (UniformValue::Vec2(Vec2 { x: 1.0, y: 2.0 }), GlslType::Vec2),
            (UniformValue::Vec3(Rgb::WHITE), GlslType::Vec3),
            (UniformValue::Vec4(Rgba::WHITE), GlslType::Vec4),
            (UniformValue::Image(ImageRef::new("data:x")), GlslType::Sampler2D),
        ];
        for (value, own) in cases {
            for ty in ALL {
                assert_eq!(is_compatible(&value, ty), ty == own, "{value:?} vs {ty}");
            }
        }
    }

    #[test]
    fn rgb_is_not_promoted_to_rgba() {
        assert!(!is_compatible(&UniformValue::Vec3(Rgb::WHITE), GlslType::Vec4));
        assert!(!is_compatible(&UniformValue::Vec4(Rgba::WHITE), GlslType::Vec3));
    }
}
