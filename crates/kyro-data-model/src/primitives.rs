//! Reflection for the primitive leaf types and the enum codec path.

use crate::ReflectionError;

/// Map a stored enum string back to its index in the variant table.
pub fn convert_to_enum(enum_strings: &[&str], value: &str) -> Option<usize> {
    enum_strings.iter().position(|variant| *variant == value)
}

/// Implement [`crate::Reflect`] for a primitive with serde-backed codec
/// hooks.
#[macro_export]
macro_rules! implement_reflect_primitive {
    ($type_id:ty, $type_name:expr) => {
        impl $crate::Reflect for $type_id {
            fn type_descriptor(&self) -> &'static $crate::TypeDescriptor {
                Self::static_descriptor()
            }
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
            fn static_descriptor() -> &'static $crate::TypeDescriptor {
                $crate::lazy_static! {
                    static ref TYPE_DESCRIPTOR: $crate::TypeDescriptor =
                        $crate::TypeDescriptor::new::<$type_id>($type_name)
                            .with_default_constructor::<$type_id>()
                            .with_codec(
                                |value| {
                                    let value = value
                                        .downcast_ref::<$type_id>()
                                        .ok_or($crate::ReflectionError::InvalidOwner($type_name))?;
                                    $crate::serde_json::to_value(value).map_err(Into::into)
                                },
                                |target, json| {
                                    let value: $type_id =
                                        $crate::serde_json::from_value(json.clone())?;
                                    *target
                                        .downcast_mut::<$type_id>()
                                        .ok_or($crate::ReflectionError::InvalidOwner($type_name))? =
                                        value;
                                    Ok(())
                                },
                            );
                }
                &TYPE_DESCRIPTOR
            }
        }
    };
}

/// Implement [`crate::Reflect`] for a unit enum.
///
/// The descriptor carries the variant string table; values serialize as the
/// variant name, reads map the stored string back through
/// [`crate::convert_to_enum`] against that table, and a string with no match
/// is logged and leaves the pre-existing value untouched. Requires `Clone`,
/// `Default` and `PartialEq`.
#[macro_export]
macro_rules! implement_reflect_enum {
    ($type_id:ty, $type_name:expr, [$($variant:ident),+ $(,)?]) => {
        impl $crate::Reflect for $type_id {
            fn type_descriptor(&self) -> &'static $crate::TypeDescriptor {
                Self::static_descriptor()
            }
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
            fn static_descriptor() -> &'static $crate::TypeDescriptor {
                $crate::lazy_static! {
                    static ref TYPE_DESCRIPTOR: $crate::TypeDescriptor =
                        $crate::TypeDescriptor::new::<$type_id>($type_name)
                            .with_default_constructor::<$type_id>()
                            .with_enum_strings(vec![$(stringify!($variant)),+])
                            .with_codec(
                                |value| {
                                    let value = value
                                        .downcast_ref::<$type_id>()
                                        .ok_or($crate::ReflectionError::InvalidOwner($type_name))?;
                                    $(
                                        if *value == <$type_id>::$variant {
                                            return Ok($crate::serde_json::Value::String(
                                                stringify!($variant).to_owned(),
                                            ));
                                        }
                                    )+
                                    Err($crate::ReflectionError::MissingSerializer($type_name))
                                },
                                |target, json| {
                                    // Same declaration order as the string table.
                                    const VARIANTS: &[$type_id] = &[$(<$type_id>::$variant),+];
                                    let stored = json.as_str().ok_or(
                                        $crate::ReflectionError::UnexpectedValue {
                                            expected: "string",
                                            type_name: $type_name,
                                        },
                                    )?;
                                    let target = target
                                        .downcast_mut::<$type_id>()
                                        .ok_or($crate::ReflectionError::InvalidOwner($type_name))?;
                                    let strings =
                                        <$type_id as $crate::Reflect>::static_descriptor()
                                            .enum_strings
                                            .as_deref()
                                            .ok_or($crate::ReflectionError::MissingDeserializer(
                                                $type_name,
                                            ))?;
                                    match $crate::convert_to_enum(strings, stored) {
                                        Some(index) => {
                                            *target = VARIANTS[index].clone();
                                            Ok(())
                                        }
                                        None => {
                                            $crate::tracing::error!(
                                                "unknown variant '{}' for enum '{}', keeping current value",
                                                stored,
                                                $type_name
                                            );
                                            Ok(())
                                        }
                                    }
                                },
                            );
                }
                &TYPE_DESCRIPTOR
            }
        }
    };
}

/// Implement [`crate::Reflect`] for a `bitflags` bit-set, serialized as its
/// numeric bits value.
#[macro_export]
macro_rules! implement_reflect_bitset {
    ($type_id:ty, $type_name:expr) => {
        impl $crate::Reflect for $type_id {
            fn type_descriptor(&self) -> &'static $crate::TypeDescriptor {
                Self::static_descriptor()
            }
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
            fn static_descriptor() -> &'static $crate::TypeDescriptor {
                $crate::lazy_static! {
                    static ref TYPE_DESCRIPTOR: $crate::TypeDescriptor =
                        $crate::TypeDescriptor::new::<$type_id>($type_name)
                            .with_default_constructor::<$type_id>()
                            .with_codec(
                                |value| {
                                    let value = value
                                        .downcast_ref::<$type_id>()
                                        .ok_or($crate::ReflectionError::InvalidOwner($type_name))?;
                                    Ok($crate::serde_json::json!(value.bits()))
                                },
                                |target, json| {
                                    let bits = json.as_u64().ok_or(
                                        $crate::ReflectionError::UnexpectedValue {
                                            expected: "number",
                                            type_name: $type_name,
                                        },
                                    )?;
                                    *target
                                        .downcast_mut::<$type_id>()
                                        .ok_or($crate::ReflectionError::InvalidOwner($type_name))? =
                                        <$type_id>::from_bits_truncate(bits as _);
                                    Ok(())
                                },
                            );
                }
                &TYPE_DESCRIPTOR
            }
        }
    };
}

implement_reflect_primitive!(bool, "bool");
implement_reflect_primitive!(u8, "u8");
implement_reflect_primitive!(i8, "i8");
implement_reflect_primitive!(u16, "u16");
implement_reflect_primitive!(i16, "i16");
implement_reflect_primitive!(u32, "u32");
implement_reflect_primitive!(i32, "i32");
implement_reflect_primitive!(u64, "u64");
implement_reflect_primitive!(i64, "i64");
implement_reflect_primitive!(usize, "usize");
implement_reflect_primitive!(f32, "f32");
implement_reflect_primitive!(f64, "f64");
implement_reflect_primitive!(String, "String");
