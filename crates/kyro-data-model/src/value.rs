use crate::{copy_instance, Reflect, ReflectionError, TypeDescriptor};

/// Owning value handle: a descriptor paired with a privately owned instance.
///
/// The handle allocates on construction and releases when dropped.
/// References derived from it ([`ValueRef`], `&dyn Reflect`) are scoped
/// inside its lifetime by the borrow checker, which enforces the LIFO
/// construct/destruct order between a handle and its derived references.
pub struct OwnedValue {
    descriptor: &'static TypeDescriptor,
    value: Box<dyn Reflect>,
}

impl OwnedValue {
    /// Construct a default-initialized instance of the described type.
    /// Abstract and resource types have no constructor and fail here.
    pub fn new(descriptor: &'static TypeDescriptor) -> Result<Self, ReflectionError> {
        let value = descriptor
            .create()
            .ok_or(ReflectionError::MissingConstructor(descriptor.type_name))?;
        Ok(Self { descriptor, value })
    }

    /// Adopt an already constructed instance.
    pub fn from_box(value: Box<dyn Reflect>) -> Self {
        Self {
            descriptor: value.type_descriptor(),
            value,
        }
    }

    /// Descriptor of the held value.
    pub fn descriptor(&self) -> &'static TypeDescriptor {
        self.descriptor
    }

    /// Borrow the held value.
    pub fn get(&self) -> &dyn Reflect {
        self.value.as_ref()
    }

    /// Borrow the held value mutably.
    pub fn get_mut(&mut self) -> &mut dyn Reflect {
        self.value.as_mut()
    }

    /// Referencing handle to the held value.
    pub fn as_ref(&self) -> ValueRef<'_> {
        ValueRef {
            descriptor: self.descriptor,
            value: self.value.as_ref(),
        }
    }

    /// Deep-copy `src` into the handle.
    ///
    /// When `src` has the same descriptor, the existing storage is reused
    /// through an in-place copy. A different descriptor forces
    /// release-then-reallocate: a fresh instance of the source's actual type
    /// is constructed and copied into, then the old storage is dropped.
    pub fn assign(&mut self, src: &dyn Reflect) -> Result<(), ReflectionError> {
        let src_descriptor = src.type_descriptor();
        if src_descriptor.type_identity == self.descriptor.type_identity {
            return copy_instance(self.value.as_mut(), src);
        }

        let mut fresh = src_descriptor
            .create()
            .ok_or(ReflectionError::MissingConstructor(src_descriptor.type_name))?;
        copy_instance(fresh.as_mut(), src)?;
        self.descriptor = src_descriptor;
        self.value = fresh;
        Ok(())
    }

    /// Give up ownership of the held value.
    pub fn into_inner(self) -> Box<dyn Reflect> {
        self.value
    }
}

/// Referencing value handle: a descriptor paired with a borrowed address.
/// Never owns memory.
#[derive(Clone, Copy)]
pub struct ValueRef<'a> {
    descriptor: &'static TypeDescriptor,
    value: &'a dyn Reflect,
}

impl<'a> ValueRef<'a> {
    /// Referencing handle to any reflected value.
    pub fn new(value: &'a dyn Reflect) -> Self {
        Self {
            descriptor: value.type_descriptor(),
            value,
        }
    }

    /// Descriptor of the referenced value.
    pub fn descriptor(&self) -> &'static TypeDescriptor {
        self.descriptor
    }

    /// The referenced value.
    pub fn get(&self) -> &'a dyn Reflect {
        self.value
    }
}
