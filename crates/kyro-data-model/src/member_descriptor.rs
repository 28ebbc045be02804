use crate::{Reflect, ReflectionError, ResourceHandle, TypeDescriptor};

bitflags::bitflags! {
    /// Behavior flags of a member.
    ///
    /// Ownership is not a flag: it is carried by the [`MemberAccess`] variant,
    /// which keeps copy/serialize/deserialize agreement a structural property.
    pub struct MemberFlags: u32 {
        /// Member is hidden from property grids.
        const IGNORE_GUI = 1 << 0;
        /// Member is skipped by the text codec.
        const IGNORE_SERIALIZATION = 1 << 1;
        /// Member is read-only in the editor.
        const CONST = 1 << 2;
        /// Member is edited without a slider even when a range is set.
        const NO_SLIDER = 1 << 3;
        /// Member renders as a collapseable group.
        const COLLAPSEABLE = 1 << 4;
        /// Collapseable member starts collapsed.
        const START_COLLAPSED = 1 << 5;
        /// Member is hidden everywhere.
        const HIDDEN = 1 << 6;
    }
}

/// Lazy accessor to a type descriptor singleton.
///
/// Members reference their field type lazily so self-referential types do not
/// recurse while their own descriptor is being built.
pub type DescriptorFn = fn() -> &'static TypeDescriptor;

/// Callback invoked on the declaring sub-object around a member mutation.
pub type MemberCallback = fn(&mut dyn Reflect);

type ValueGetFn = fn(&dyn Reflect) -> &dyn Reflect;
type ValueGetMutFn = fn(&mut dyn Reflect) -> &mut dyn Reflect;
type ValueAssignFn = fn(&mut dyn Reflect, &dyn Reflect) -> Result<(), ReflectionError>;
type ValueEqFn = fn(&dyn Reflect, &dyn Reflect) -> bool;
type PointerGetFn = fn(&dyn Reflect) -> Option<&dyn Reflect>;
type PointerSetFn = fn(&mut dyn Reflect, Option<Box<dyn Reflect>>) -> Result<(), ReflectionError>;
type ResourceGetFn = fn(&dyn Reflect) -> Option<ResourceHandle>;
type ResourceSetFn = fn(&mut dyn Reflect, Option<ResourceHandle>) -> Result<(), ReflectionError>;
type ListLenFn = fn(&dyn Reflect) -> usize;
type ListGetFn = fn(&dyn Reflect, usize) -> Option<&dyn Reflect>;
type ClearFn = fn(&mut dyn Reflect);
type ListPushFn = fn(&mut dyn Reflect, Box<dyn Reflect>) -> Result<(), ReflectionError>;
type MapEntryFn = fn(&dyn Reflect, usize) -> Option<(&str, &dyn Reflect)>;
type MapInsertFn = fn(&mut dyn Reflect, String, Box<dyn Reflect>) -> Result<(), ReflectionError>;

/// Ownership kind and typed accessors of a member.
///
/// The accessor closures are captured at registration time against the
/// declaring type; callers must hand them the declaring sub-object (see
/// [`crate::sub_object`]). Infallible getters panic on an owner type
/// mismatch, which is a registration bug, never a data error.
pub enum MemberAccess {
    /// Plain value member, including strings, math types and nested value
    /// structs. Copied by assignment.
    Value {
        /// Borrow the field.
        get: ValueGetFn,
        /// Borrow the field mutably.
        get_mut: ValueGetMutFn,
        /// Assign the field of `src` onto the field of `dst`.
        assign: ValueAssignFn,
        /// Compare the live field of the owner against a candidate value.
        eq: ValueEqFn,
    },
    /// Nullable, exclusively owned, polymorphic pointer member
    /// (`Option<Box<dyn Reflect>>` field).
    OwnedPointer {
        /// Borrow the pointee, if any.
        get: PointerGetFn,
        /// Replace the pointee.
        set: PointerSetFn,
    },
    /// Reference-shared resource member (`Option<ResourceHandle>` field).
    /// The one ownership kind that is shared, never duplicated.
    Resource {
        /// Clone the shared handle, if any.
        get: ResourceGetFn,
        /// Replace the shared handle.
        set: ResourceSetFn,
    },
    /// Ordered collection of owned pointers (`Vec<Box<dyn Reflect>>` field).
    PointerList {
        /// Element count.
        len: ListLenFn,
        /// Borrow an element.
        get: ListGetFn,
        /// Remove every element.
        clear: ClearFn,
        /// Append an element.
        push: ListPushFn,
    },
    /// Ordered map of owned pointers (`BTreeMap<String, Box<dyn Reflect>>`
    /// field).
    PointerMap {
        /// Entry count.
        len: ListLenFn,
        /// Borrow the entry at an iteration index.
        entry_at: MapEntryFn,
        /// Remove every entry.
        clear: ClearFn,
        /// Insert an entry.
        insert: MapInsertFn,
    },
}

/// Numeric range driving slider widgets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemberRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

/// Combo-box alternative offered for a polymorphic member.
pub struct ComboAlternative {
    /// Label shown in the editor.
    pub label: &'static str,
    /// Type instantiated when the alternative is picked.
    pub alternative_type: DescriptorFn,
}

/// Descriptor of one member of a reflected type.
pub struct MemberDescriptor {
    /// Name of the member.
    pub name: &'static str,
    /// Declaration-order index within the declaring type.
    pub index: usize,
    /// Descriptor of the declared field type.
    pub field_type: DescriptorFn,
    /// Declared behavior flags. Runtime adjustments live in the override
    /// table and never mutate these.
    pub flags: MemberFlags,
    /// Ownership kind and typed accessors.
    pub access: MemberAccess,
    /// Optional slider range.
    pub range: Option<MemberRange>,
    /// Optional default value; a member equal to its default is elided from
    /// serialized output.
    pub default: Option<fn() -> Box<dyn Reflect>>,
    /// Combo-box alternatives for polymorphic members.
    pub combo_alternatives: Vec<ComboAlternative>,
    /// Callbacks run before an edit mutates the member.
    pub pre_change: Vec<MemberCallback>,
    /// Callbacks run after an edit mutated the member.
    pub post_change: Vec<MemberCallback>,
}

impl MemberDescriptor {
    /// Create a member descriptor. The index is assigned when the member is
    /// added to its type descriptor.
    pub fn new(name: &'static str, field_type: DescriptorFn, access: MemberAccess) -> Self {
        Self {
            name,
            index: 0,
            field_type,
            flags: MemberFlags::empty(),
            access,
            range: None,
            default: None,
            combo_alternatives: Vec::new(),
            pre_change: Vec::new(),
            post_change: Vec::new(),
        }
    }

    /// Set declared flags.
    #[must_use]
    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the slider range.
    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some(MemberRange { min, max });
        self
    }

    /// Set the default value used for output elision.
    #[must_use]
    pub fn with_default(mut self, default: fn() -> Box<dyn Reflect>) -> Self {
        self.default = Some(default);
        self
    }

    /// Add a combo-box alternative.
    #[must_use]
    pub fn with_combo_alternative(
        mut self,
        label: &'static str,
        alternative_type: DescriptorFn,
    ) -> Self {
        self.combo_alternatives.push(ComboAlternative {
            label,
            alternative_type,
        });
        self
    }

    /// Add a pre-change callback.
    #[must_use]
    pub fn with_pre_change(mut self, callback: MemberCallback) -> Self {
        self.pre_change.push(callback);
        self
    }

    /// Add a post-change callback.
    #[must_use]
    pub fn with_post_change(mut self, callback: MemberCallback) -> Self {
        self.post_change.push(callback);
        self
    }
}

/// Declare a plain value member.
#[macro_export]
macro_rules! value_member {
    ($owner:ty, $field:ident, $field_ty:ty) => {
        $crate::MemberDescriptor::new(
            stringify!($field),
            || <$field_ty as $crate::Reflect>::static_descriptor(),
            $crate::MemberAccess::Value {
                get: |owner| {
                    &owner
                        .downcast_ref::<$owner>()
                        .expect(concat!("owner type for ", stringify!($owner), ".", stringify!($field)))
                        .$field
                },
                get_mut: |owner| {
                    &mut owner
                        .downcast_mut::<$owner>()
                        .expect(concat!("owner type for ", stringify!($owner), ".", stringify!($field)))
                        .$field
                },
                assign: |dst, src| {
                    let value = src
                        .downcast_ref::<$owner>()
                        .ok_or($crate::ReflectionError::InvalidOwner(stringify!($owner)))?
                        .$field
                        .clone();
                    dst.downcast_mut::<$owner>()
                        .ok_or($crate::ReflectionError::InvalidOwner(stringify!($owner)))?
                        .$field = value;
                    Ok(())
                },
                eq: |owner, other| {
                    match (
                        owner.downcast_ref::<$owner>(),
                        other.downcast_ref::<$field_ty>(),
                    ) {
                        (Some(owner), Some(other)) => owner.$field == *other,
                        _ => false,
                    }
                },
            },
        )
    };
}

/// Declare an owned, nullable, polymorphic pointer member
/// (`Option<Box<dyn Reflect>>` field).
#[macro_export]
macro_rules! pointer_member {
    ($owner:ty, $field:ident, $declared_ty:ty) => {
        $crate::MemberDescriptor::new(
            stringify!($field),
            || <$declared_ty as $crate::Reflect>::static_descriptor(),
            $crate::MemberAccess::OwnedPointer {
                get: |owner| {
                    owner
                        .downcast_ref::<$owner>()
                        .expect(concat!("owner type for ", stringify!($owner), ".", stringify!($field)))
                        .$field
                        .as_deref()
                },
                set: |owner, value| {
                    owner
                        .downcast_mut::<$owner>()
                        .ok_or($crate::ReflectionError::InvalidOwner(stringify!($owner)))?
                        .$field = value;
                    Ok(())
                },
            },
        )
    };
}

/// Declare a shared resource member (`Option<ResourceHandle>` field).
#[macro_export]
macro_rules! resource_member {
    ($owner:ty, $field:ident, $resource_ty:ty) => {
        $crate::MemberDescriptor::new(
            stringify!($field),
            || <$resource_ty as $crate::Reflect>::static_descriptor(),
            $crate::MemberAccess::Resource {
                get: |owner| {
                    owner
                        .downcast_ref::<$owner>()
                        .expect(concat!("owner type for ", stringify!($owner), ".", stringify!($field)))
                        .$field
                        .clone()
                },
                set: |owner, value| {
                    owner
                        .downcast_mut::<$owner>()
                        .ok_or($crate::ReflectionError::InvalidOwner(stringify!($owner)))?
                        .$field = value;
                    Ok(())
                },
            },
        )
    };
}

/// Declare an ordered collection of owned pointers
/// (`Vec<Box<dyn Reflect>>` field).
#[macro_export]
macro_rules! pointer_list_member {
    ($owner:ty, $field:ident, $declared_ty:ty) => {
        $crate::MemberDescriptor::new(
            stringify!($field),
            || <$declared_ty as $crate::Reflect>::static_descriptor(),
            $crate::MemberAccess::PointerList {
                len: |owner| {
                    owner
                        .downcast_ref::<$owner>()
                        .expect(concat!("owner type for ", stringify!($owner), ".", stringify!($field)))
                        .$field
                        .len()
                },
                get: |owner, index| {
                    owner
                        .downcast_ref::<$owner>()
                        .expect(concat!("owner type for ", stringify!($owner), ".", stringify!($field)))
                        .$field
                        .get(index)
                        .map(|element| &**element)
                },
                clear: |owner| {
                    if let Some(owner) = owner.downcast_mut::<$owner>() {
                        owner.$field.clear();
                    }
                },
                push: |owner, element| {
                    owner
                        .downcast_mut::<$owner>()
                        .ok_or($crate::ReflectionError::InvalidOwner(stringify!($owner)))?
                        .$field
                        .push(element);
                    Ok(())
                },
            },
        )
    };
}

/// Declare an ordered map of owned pointers
/// (`BTreeMap<String, Box<dyn Reflect>>` field).
#[macro_export]
macro_rules! pointer_map_member {
    ($owner:ty, $field:ident, $declared_ty:ty) => {
        $crate::MemberDescriptor::new(
            stringify!($field),
            || <$declared_ty as $crate::Reflect>::static_descriptor(),
            $crate::MemberAccess::PointerMap {
                len: |owner| {
                    owner
                        .downcast_ref::<$owner>()
                        .expect(concat!("owner type for ", stringify!($owner), ".", stringify!($field)))
                        .$field
                        .len()
                },
                entry_at: |owner, index| {
                    owner
                        .downcast_ref::<$owner>()
                        .expect(concat!("owner type for ", stringify!($owner), ".", stringify!($field)))
                        .$field
                        .iter()
                        .nth(index)
                        .map(|(key, value)| (key.as_str(), &**value))
                },
                clear: |owner| {
                    if let Some(owner) = owner.downcast_mut::<$owner>() {
                        owner.$field.clear();
                    }
                },
                insert: |owner, key, value| {
                    owner
                        .downcast_mut::<$owner>()
                        .ok_or($crate::ReflectionError::InvalidOwner(stringify!($owner)))?
                        .$field
                        .insert(key, value);
                    Ok(())
                },
            },
        )
    };
}
