use std::sync::Arc;

use crate::Reflect;

/// Shared handle to an externally loaded resource.
///
/// Cloning a handle shares the underlying instance; this is the one ownership
/// kind the copy engine and the codec treat as identity, not as a value to
/// duplicate. Resources are produced by the resolver registered on their
/// type descriptor.
#[derive(Clone)]
pub struct ResourceHandle {
    inner: Arc<dyn Reflect>,
}

impl ResourceHandle {
    /// Wrap a loaded resource instance.
    pub fn new<T: Reflect>(resource: T) -> Self {
        Self {
            inner: Arc::new(resource),
        }
    }

    /// Adopt an already boxed instance.
    pub fn from_arc(inner: Arc<dyn Reflect>) -> Self {
        Self { inner }
    }

    /// Borrow the resource as a reflected value.
    pub fn get(&self) -> &dyn Reflect {
        self.inner.as_ref()
    }

    /// Downcast to the concrete resource type.
    pub fn get_as<T: Reflect>(&self) -> Option<&T> {
        self.inner.as_ref().downcast_ref::<T>()
    }

    /// Returns true when both handles share the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of handles sharing the instance.
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl std::fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("type_name", &self.inner.type_descriptor().type_name)
            .finish()
    }
}
