use std::any::Any;

use crate::{ReflectionError, TypeDescriptor};

/// Trait implemented by every reflected type.
///
/// A `&dyn Reflect` is the referencing half of a value handle: the pair of a
/// type-erased address and the descriptor returned by
/// [`Reflect::type_descriptor`]. The descriptor is always the one of the
/// *concrete* type, so a value reached through a base-typed reference still
/// reports its actual type.
pub trait Reflect: Any + Send + Sync {
    /// Descriptor of the concrete type of `self`.
    fn type_descriptor(&self) -> &'static TypeDescriptor;

    /// Sub-object holding the inherited members, if the type declares a base.
    ///
    /// Single inheritance is modeled as leading-field composition; the
    /// returned reference points inside `self`.
    fn base(&self) -> Option<&dyn Reflect> {
        None
    }

    /// Mutable access to the base sub-object.
    fn base_mut(&mut self) -> Option<&mut dyn Reflect> {
        None
    }

    /// Upcast to `Any` for concrete downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Upcast to `Any` for concrete downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Descriptor singleton of the type itself.
    fn static_descriptor() -> &'static TypeDescriptor
    where
        Self: Sized;
}

impl std::fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reflect")
            .field("type_name", &self.type_descriptor().type_name)
            .finish_non_exhaustive()
    }
}

impl dyn Reflect {
    /// Downcast to a concrete reflected type.
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcast to a concrete reflected type.
    pub fn downcast_mut<T: Reflect>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Returns true if the erased value is a `T`.
    pub fn is_instance_of<T: Reflect>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Walk the base chain of `instance` down to the sub-object described by
/// `declaring`.
///
/// Member accessors are typed against the descriptor that declares them, so
/// inherited members must be accessed through the embedded base sub-object.
pub fn sub_object<'a>(
    instance: &'a dyn Reflect,
    declaring: &TypeDescriptor,
) -> Result<&'a dyn Reflect, ReflectionError> {
    let mut current = instance;
    loop {
        if current.type_descriptor().type_identity == declaring.type_identity {
            return Ok(current);
        }
        current = current.base().ok_or(ReflectionError::TypeMismatch {
            expected: declaring.type_name,
            found: instance.type_descriptor().type_name,
        })?;
    }
}

/// Mutable variant of [`sub_object`].
pub fn sub_object_mut<'a>(
    instance: &'a mut dyn Reflect,
    declaring: &TypeDescriptor,
) -> Result<&'a mut dyn Reflect, ReflectionError> {
    if instance.type_descriptor().type_identity == declaring.type_identity {
        return Ok(instance);
    }
    let found = instance.type_descriptor().type_name;
    let base = instance
        .base_mut()
        .ok_or(ReflectionError::TypeMismatch {
            expected: declaring.type_name,
            found,
        })?;
    sub_object_mut(base, declaring)
}

/// Macro to implement [`Reflect`] for a struct from a descriptor expression.
///
/// The `derived` form additionally wires `base()`/`base_mut()` to the named
/// embedded base field.
#[macro_export]
macro_rules! implement_reflect_struct {
    ($type_id:ty, $descriptor:expr) => {
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
                    static ref TYPE_DESCRIPTOR: $crate::TypeDescriptor = $descriptor;
                }
                &TYPE_DESCRIPTOR
            }
        }
    };
    (derived $type_id:ty, $base_field:ident, $descriptor:expr) => {
        impl $crate::Reflect for $type_id {
            fn type_descriptor(&self) -> &'static $crate::TypeDescriptor {
                Self::static_descriptor()
            }
            fn base(&self) -> Option<&dyn $crate::Reflect> {
                Some(&self.$base_field)
            }
            fn base_mut(&mut self) -> Option<&mut dyn $crate::Reflect> {
                Some(&mut self.$base_field)
            }
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
            fn static_descriptor() -> &'static $crate::TypeDescriptor {
                $crate::lazy_static! {
                    static ref TYPE_DESCRIPTOR: $crate::TypeDescriptor = $descriptor;
                }
                &TYPE_DESCRIPTOR
            }
        }
    };
}
