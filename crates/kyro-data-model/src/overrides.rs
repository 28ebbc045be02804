use std::collections::HashMap;

use crate::{MemberFlags, Reflect};

/// Opaque key identifying one live instance for instance-scoped overrides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceId(usize);

impl InstanceId {
    /// Key of a live instance, derived from its address. Valid only while
    /// the instance stays at that address; callers clear instance overrides
    /// when the object goes away.
    pub fn of(instance: &dyn Reflect) -> Self {
        Self((instance as *const dyn Reflect).cast::<()>() as usize)
    }
}

/// Runtime-mutable flag adjustments, scoped per type or per instance.
///
/// Overrides accumulate on top of the declared member flags and never mutate
/// the [`crate::MemberDescriptor`] itself, preserving the type's canonical
/// shape.
#[derive(Default)]
pub struct OverrideTable {
    type_scope: HashMap<String, HashMap<String, MemberFlags>>,
    instance_scope: HashMap<InstanceId, HashMap<String, MemberFlags>>,
}

impl OverrideTable {
    /// Add override flags for a member, type-scoped or instance-scoped.
    pub fn add_override(
        &mut self,
        type_name: &str,
        member: &str,
        flags: MemberFlags,
        instance: Option<InstanceId>,
    ) {
        let members = match instance {
            Some(id) => self.instance_scope.entry(id).or_default(),
            None => self.type_scope.entry(type_name.to_owned()).or_default(),
        };
        *members
            .entry(member.to_owned())
            .or_insert_with(MemberFlags::empty) |= flags;
    }

    /// Remove previously added override flags from the given scope.
    pub fn remove_override(
        &mut self,
        type_name: &str,
        member: &str,
        flags: MemberFlags,
        instance: Option<InstanceId>,
    ) {
        let members = match instance {
            Some(id) => self.instance_scope.get_mut(&id),
            None => self.type_scope.get_mut(type_name),
        };
        if let Some(members) = members {
            if let Some(entry) = members.get_mut(member) {
                entry.remove(flags);
                if entry.is_empty() {
                    members.remove(member);
                }
            }
        }
    }

    /// Drop every override attached to one instance.
    pub fn clear_instance_overrides(&mut self, instance: InstanceId) {
        self.instance_scope.remove(&instance);
    }

    /// Drop every instance-scoped override.
    pub fn clear_all_instance_overrides(&mut self) {
        self.instance_scope.clear();
    }

    /// Check whether a flag is overridden, instance scope first, then type
    /// scope. Declared flags are not consulted.
    pub fn is_override_set(
        &self,
        type_name: &str,
        member: &str,
        flag: MemberFlags,
        instance: Option<InstanceId>,
    ) -> bool {
        if let Some(id) = instance {
            if let Some(flags) = self.instance_scope.get(&id).and_then(|m| m.get(member)) {
                if flags.contains(flag) {
                    return true;
                }
            }
        }
        self.type_scope
            .get(type_name)
            .and_then(|m| m.get(member))
            .map_or(false, |flags| flags.contains(flag))
    }

    /// Effective flags of a member: declared flags plus every applicable
    /// override scope. `type_names` carries the actual type first, then the
    /// declaring type when the member is inherited.
    pub fn effective_flags(
        &self,
        declared: MemberFlags,
        type_names: &[&str],
        member: &str,
        instance: Option<InstanceId>,
    ) -> MemberFlags {
        let mut flags = declared;
        for type_name in type_names {
            if let Some(overrides) = self.type_scope.get(*type_name).and_then(|m| m.get(member)) {
                flags |= *overrides;
            }
        }
        if let Some(id) = instance {
            if let Some(overrides) = self.instance_scope.get(&id).and_then(|m| m.get(member)) {
                flags |= *overrides;
            }
        }
        flags
    }
}
