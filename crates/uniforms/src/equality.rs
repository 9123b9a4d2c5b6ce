use crate::value::UniformValue;

/// Reports whether two uniform values are interchangeable for rendering.
///
/// Images compare by `src` only. Numbers compare exactly.
pub fn equals(a: &UniformValue, b: &UniformValue) -> bool {
    if std::ptr::eq(a, b) {
        return true;
    }
    match (a, b) {
        (UniformValue::Unset, UniformValue::Unset) => true,
        (UniformValue::Unset, _) | (_, UniformValue::Unset) => false,
        (UniformValue::Image(left), UniformValue::Image(right)) => left.src == right.src,
        (UniformValue::Float(left), UniformValue::Float(right)) => left == right,
        (UniformValue::Vec2(left), UniformValue::Vec2(right)) => {
            left.x == right.x && left.y == right.y
        }
        (UniformValue::Vec3(left), UniformValue::Vec3(right)) => {
            left.r == right.r && left.g == right.g && left.b == right.b
        }
        (UniformValue::Vec4(left), UniformValue::Vec4(right)) => {
            left.r == right.r && left.g == right.g && left.b == right.b && left.a == right.a
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ImageRef, Rgb, Rgba, Vec2};

    fn red() -> UniformValue {
        UniformValue::Vec3(Rgb {
            r: 1.0,
            g: 0.0,
            b: 0.0,
        })
    }

    #[test]
    fn same_reference_is_equal() {
        let value = red();
        assert!(equals(&value, &value));
    }

    #[test]
    fn colors_compare_channel_by_channel() {
        assert!(equals(&red(), &red()));
        let green = UniformValue::Vec3(Rgb {
            r: 0.0,
            g: 1.0,
            b: 0.0,
        });
        assert!(!equals(&red(), &green));
    }

    #[test]
    fn differing_key_sets_are_unequal() {
        let red_alpha = UniformValue::Vec4(Rgba {
            r: 1.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        });
        assert!(!equals(&red(), &red_alpha));
        assert!(!equals(&red_alpha, &red()));
        let xy = UniformValue::Vec2(Vec2 { x: 1.0, y: 0.0 });
        assert!(!equals(&xy, &red()));
    }

    #[test]
    fn rgba_compares_alpha() {
        let opaque = UniformValue::Vec4(Rgba::WHITE);
        let translucent = UniformValue::Vec4(Rgba {
            a: 0.5,
            ..Rgba::WHITE
        });
        assert!(equals(&opaque, &UniformValue::Vec4(Rgba::WHITE)));
        assert!(!equals(&opaque, &translucent));
    }

    #[test]
    fn vec2_compares_both_axes() {
        let a = UniformValue::Vec2(Vec2 { x: 640.0, y: 480.0 });
        assert!(equals(&a, &UniformValue::Vec2(Vec2 { x: 640.0, y: 480.0 })));
        assert!(!equals(&a, &UniformValue::Vec2(Vec2 { x: 640.0, y: 481.0 })));
    }

    #[test]
    fn unset_only_equals_unset() {
        assert!(equals(&UniformValue::Unset, &UniformValue::Unset));
        assert!(!equals(&UniformValue::Unset, &UniformValue::Float(1.0)));
        assert!(!equals(&UniformValue::Float(1.0), &UniformValue::Unset));
        let image = UniformValue::Image(ImageRef::new("data:image/png;base64,AA"));
        assert!(!equals(&UniformValue::Unset, &image));
    }

    #[test]
    fn images_compare_by_source_only() {
        let sized = UniformValue::Image(ImageRef::new("data:x").with_size(64, 64));
        let bare = UniformValue::Image(ImageRef::new("data:x"));
        let other = UniformValue::Image(ImageRef::new("data:y").with_size(64, 64));
        assert!(equals(&sized, &bare));
        assert!(equals(&bare, &sized));
        assert!(!equals(&sized, &other));
    }

    #[test]
    fn scalars_compare_exactly() {
        assert!(equals(&UniformValue::Float(0.25), &UniformValue::Float(0.25)));
        assert!(!equals(&UniformValue::Float(0.25), &UniformValue::Float(0.250_001)));
        assert!(!equals(&UniformValue::Float(1.0), &red()));
    }
}
