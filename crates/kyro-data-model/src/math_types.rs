//! Reflection for the math and visual leaf types.
//!
//! Vectors and quaternions serialize as flat component arrays with near-zero
//! snapping on write, rectangles as `[x, y, w, h]`, colors as 4-component
//! arrays.

use serde_json::json;

use crate::{Reflect, ReflectionError, TypeDescriptor};

pub use glam::{Quat, Vec2, Vec3, Vec4};

const SNAP_EPSILON: f32 = 1e-6;

/// Snap denormal noise to exactly zero on write.
fn snap(value: f32) -> f32 {
    if value.abs() < SNAP_EPSILON {
        0.0
    } else {
        value
    }
}

fn parse_components<const N: usize>(
    json: &serde_json::Value,
    type_name: &'static str,
) -> Result<[f32; N], ReflectionError> {
    let items = json
        .as_array()
        .filter(|items| items.len() == N)
        .ok_or(ReflectionError::UnexpectedValue {
            expected: "component array",
            type_name,
        })?;
    let mut components = [0.0_f32; N];
    for (slot, item) in components.iter_mut().zip(items) {
        *slot = item
            .as_f64()
            .ok_or(ReflectionError::UnexpectedValue {
                expected: "number",
                type_name,
            })? as f32;
    }
    Ok(components)
}

// Reads go through the component fields; writes rebuild the whole value, as
// the SIMD-backed glam types only expose their components read-only.
macro_rules! implement_reflect_components {
    ($type_id:ty, $type_name:expr, [$($component:ident),+], $construct:expr) => {
        impl Reflect for $type_id {
            fn type_descriptor(&self) -> &'static TypeDescriptor {
                Self::static_descriptor()
            }
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
            fn static_descriptor() -> &'static TypeDescriptor {
                crate::lazy_static! {
                    static ref TYPE_DESCRIPTOR: TypeDescriptor =
                        TypeDescriptor::new::<$type_id>($type_name)
                            .with_default_constructor::<$type_id>()
                            .with_codec(
                                |value| {
                                    let value = value
                                        .downcast_ref::<$type_id>()
                                        .ok_or(ReflectionError::InvalidOwner($type_name))?;
                                    Ok(json!([$(snap(value.$component)),+]))
                                },
                                |target, json| {
                                    const N: usize = [$(stringify!($component)),+].len();
                                    let components =
                                        parse_components::<N>(json, $type_name)?;
                                    *target
                                        .downcast_mut::<$type_id>()
                                        .ok_or(ReflectionError::InvalidOwner($type_name))? =
                                        $construct(components);
                                    Ok(())
                                },
                            );
                }
                &TYPE_DESCRIPTOR
            }
        }
    };
}

implement_reflect_components!(Vec2, "Vec2", [x, y], |c: [f32; 2]| Vec2::from(c));
implement_reflect_components!(Vec3, "Vec3", [x, y, z], |c: [f32; 3]| Vec3::from(c));
implement_reflect_components!(Vec4, "Vec4", [x, y, z, w], |c: [f32; 4]| Vec4::from(c));
implement_reflect_components!(Quat, "Quat", [x, y, z, w], |c: [f32; 4]| Quat::from_xyzw(
    c[0], c[1], c[2], c[3]
));

/// Axis-aligned rectangle, serialized as `[x, y, w, h]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

implement_reflect_components!(Rect, "Rect", [x, y, width, height], |c: [f32; 4]| Rect {
    x: c[0],
    y: c[1],
    width: c[2],
    height: c[3],
});

/// Floating-point RGBA color, serialized as `[r, g, b, a]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        }
    }
}

implement_reflect_components!(Color, "Color", [r, g, b, a], |c: [f32; 4]| Color {
    r: c[0],
    g: c[1],
    b: c[2],
    a: c[3],
});

/// Byte RGBA color, serialized as `[r, g, b, a]` with 0-255 channels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ByteColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Default for ByteColor {
    fn default() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 255,
        }
    }
}

impl Reflect for ByteColor {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        Self::static_descriptor()
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
    fn static_descriptor() -> &'static TypeDescriptor {
        crate::lazy_static! {
            static ref TYPE_DESCRIPTOR: TypeDescriptor =
                TypeDescriptor::new::<ByteColor>("ByteColor")
                    .with_default_constructor::<ByteColor>()
                    .with_codec(
                        |value| {
                            let value = value
                                .downcast_ref::<ByteColor>()
                                .ok_or(ReflectionError::InvalidOwner("ByteColor"))?;
                            Ok(json!([value.r, value.g, value.b, value.a]))
                        },
                        |target, json| {
                            let items = json
                                .as_array()
                                .filter(|items| items.len() == 4)
                                .ok_or(ReflectionError::UnexpectedValue {
                                    expected: "component array",
                                    type_name: "ByteColor",
                                })?;
                            let mut channels = [0_u8; 4];
                            for (slot, item) in channels.iter_mut().zip(items) {
                                *slot = item
                                    .as_u64()
                                    .and_then(|channel| u8::try_from(channel).ok())
                                    .ok_or(ReflectionError::UnexpectedValue {
                                        expected: "byte channel",
                                        type_name: "ByteColor",
                                    })?;
                            }
                            let target = target
                                .downcast_mut::<ByteColor>()
                                .ok_or(ReflectionError::InvalidOwner("ByteColor"))?;
                            *target = ByteColor {
                                r: channels[0],
                                g: channels[1],
                                b: channels[2],
                                a: channels[3],
                            };
                            Ok(())
                        },
                    );
        }
        &TYPE_DESCRIPTOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: Reflect + Default + PartialEq + std::fmt::Debug + Clone>(value: &T) -> T {
        let descriptor = T::static_descriptor();
        let json = (descriptor.serialize.expect("serializer"))(value).expect("serialize");
        let mut out = T::default();
        (descriptor.deserialize.expect("deserializer"))(&mut out, &json).expect("deserialize");
        out
    }

    #[test]
    fn vectors_round_trip() {
        let v = Vec3::new(1.0, -2.5, 3.25);
        assert_eq!(round_trip(&v), v);
        assert_eq!(round_trip(&Vec3::ZERO), Vec3::ZERO);
        let q = Quat::from_xyzw(0.0, 0.5, 0.0, 1.0);
        assert_eq!(round_trip(&q), q);
    }

    #[test]
    fn near_zero_components_snap_on_write() {
        let v = Vec2::new(1e-9, 4.0);
        let json = (Vec2::static_descriptor().serialize.unwrap())(&v).unwrap();
        assert_eq!(json, serde_json::json!([0.0, 4.0]));
    }

    #[test]
    fn colors_round_trip_at_channel_extremes() {
        let color = ByteColor {
            r: 0,
            g: 255,
            b: 17,
            a: 255,
        };
        assert_eq!(round_trip(&color), color);
        let color = Color {
            r: 0.25,
            g: 0.5,
            b: 1.0,
            a: 0.0,
        };
        assert_eq!(round_trip(&color), color);
    }

    #[test]
    fn rect_serializes_as_flat_array() {
        let rect = Rect {
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
        };
        let json = (Rect::static_descriptor().serialize.unwrap())(&rect).unwrap();
        assert_eq!(json, serde_json::json!([1.0, 2.0, 3.0, 4.0]));
    }
}
