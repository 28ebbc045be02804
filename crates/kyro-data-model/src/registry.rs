use std::any::TypeId;
use std::collections::HashMap;

use crate::{InstanceId, MemberFlags, OverrideTable, ReflectionError, TypeDescriptor};

/// Process-wide table of registered type descriptors.
///
/// The registry is explicit and application-owned: the application registers
/// every type during a single-threaded startup phase, in topological order by
/// inheritance, and then hands the registry by reference to the codec and
/// copy engine. There is no removal; descriptor lifetime equals the
/// process's. The override table is the only part that stays mutable after
/// startup.
#[derive(Default)]
pub struct TypeRegistry {
    by_name: HashMap<&'static str, &'static TypeDescriptor>,
    by_identity: HashMap<TypeId, &'static TypeDescriptor>,
    overrides: OverrideTable,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Duplicate names or identities are rejected,
    /// never overwritten; a duplicate is a programmer error in the startup
    /// registration code.
    pub fn register(
        &mut self,
        descriptor: &'static TypeDescriptor,
    ) -> Result<(), ReflectionError> {
        if self.by_name.contains_key(descriptor.type_name)
            || self.by_identity.contains_key(&descriptor.type_identity)
        {
            return Err(ReflectionError::DuplicateRegistration(descriptor.type_name));
        }
        self.by_name.insert(descriptor.type_name, descriptor);
        self.by_identity.insert(descriptor.type_identity, descriptor);
        Ok(())
    }

    /// Look up a descriptor by registered name.
    pub fn lookup_by_name(&self, type_name: &str) -> Option<&'static TypeDescriptor> {
        self.by_name.get(type_name).copied()
    }

    /// Look up a descriptor by type identity.
    pub fn lookup_by_identity(&self, identity: TypeId) -> Option<&'static TypeDescriptor> {
        self.by_identity.get(&identity).copied()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns true when no type is registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Read access to the override table.
    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    /// Add override flags for a member, type-scoped or instance-scoped.
    pub fn add_override(
        &mut self,
        type_name: &str,
        member: &str,
        flags: MemberFlags,
        instance: Option<InstanceId>,
    ) {
        self.overrides.add_override(type_name, member, flags, instance);
    }

    /// Remove previously added override flags.
    pub fn remove_override(
        &mut self,
        type_name: &str,
        member: &str,
        flags: MemberFlags,
        instance: Option<InstanceId>,
    ) {
        self.overrides
            .remove_override(type_name, member, flags, instance);
    }

    /// Drop every override attached to one instance.
    pub fn clear_instance_overrides(&mut self, instance: InstanceId) {
        self.overrides.clear_instance_overrides(instance);
    }

    /// Drop every instance-scoped override.
    pub fn clear_all_instance_overrides(&mut self) {
        self.overrides.clear_all_instance_overrides();
    }

    /// Check whether a flag is overridden, instance scope first.
    pub fn is_override_set(
        &self,
        type_name: &str,
        member: &str,
        flag: MemberFlags,
        instance: Option<InstanceId>,
    ) -> bool {
        self.overrides
            .is_override_set(type_name, member, flag, instance)
    }
}
