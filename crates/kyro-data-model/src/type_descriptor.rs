use std::any::TypeId;

use crate::{DescriptorFn, MemberDescriptor, Reflect, ReflectionError, ResourceHandle};

/// Function to construct a default instance of the type.
pub type ConstructFn = fn() -> Box<dyn Reflect>;

/// Function to resolve a resource by name into a shared handle. Supplied by
/// the resource type owner; the loading machinery behind it is external.
pub type ResolveFn = fn(&str) -> Option<ResourceHandle>;

/// Hook invoked on a freshly constructed instance before member fill during
/// polymorphic deserialization.
pub type PreLoadFn = fn(&mut dyn Reflect);

/// Function to serialize a leaf value into a JSON value.
pub type SerializeFn = fn(&dyn Reflect) -> Result<serde_json::Value, ReflectionError>;

/// Function to deserialize a leaf value from a JSON value.
pub type DeserializeFn = fn(&mut dyn Reflect, &serde_json::Value) -> Result<(), ReflectionError>;

/// Runtime descriptor of a registered type: its shape and behavior hooks.
///
/// Descriptors are `lazy_static` singletons created on first access and never
/// destroyed; the override table is the only runtime-mutable reflection
/// state.
pub struct TypeDescriptor {
    /// Registered name of the type, used as the serialized discriminator.
    pub type_name: &'static str,
    /// Size of an instance in bytes.
    pub size: usize,
    /// Identity of the Rust type backing the descriptor.
    pub type_identity: TypeId,
    /// Base type, recorded once for single inheritance.
    pub base: Option<DescriptorFn>,
    /// When set, inherited members are excluded from the serialization shape.
    pub ignore_base_members: bool,
    /// Own members, in declaration order.
    pub members: Vec<MemberDescriptor>,
    /// Variant names of enum-backed leaves, used by combo widgets and the
    /// string codec path.
    pub enum_strings: Option<Vec<&'static str>>,
    /// Resource types serialize as weak name references and are constructed
    /// through their resolver, never through `construct`.
    pub is_resource: bool,
    /// Construct a default instance. Absent for abstract and resource types.
    pub construct: Option<ConstructFn>,
    /// Name-to-instance resolver, resource types only.
    pub resolver: Option<ResolveFn>,
    /// Pre-load hook, run before member fill on polymorphic construction.
    pub pre_load: Option<PreLoadFn>,
    /// Leaf serializer. Absent on struct types, which use the member walk.
    pub serialize: Option<SerializeFn>,
    /// Leaf deserializer. Absent on struct types.
    pub deserialize: Option<DeserializeFn>,
}

impl TypeDescriptor {
    /// Create a descriptor for `T` with no members and no hooks.
    pub fn new<T: Reflect>(type_name: &'static str) -> Self {
        Self {
            type_name,
            size: std::mem::size_of::<T>(),
            type_identity: TypeId::of::<T>(),
            base: None,
            ignore_base_members: false,
            members: Vec::new(),
            enum_strings: None,
            is_resource: false,
            construct: None,
            resolver: None,
            pre_load: None,
            serialize: None,
            deserialize: None,
        }
    }

    /// Use `T::default()` as the construction hook.
    #[must_use]
    pub fn with_default_constructor<T: Reflect + Default>(mut self) -> Self {
        self.construct = Some(|| Box::<T>::default());
        self
    }

    /// Record the base type. Inherited members are prepended to the
    /// serialization shape unless [`Self::with_ignored_base_members`] is used.
    #[must_use]
    pub fn with_base(mut self, base: DescriptorFn) -> Self {
        self.base = Some(base);
        self
    }

    /// Exclude inherited members from the serialization shape.
    #[must_use]
    pub fn with_ignored_base_members(mut self) -> Self {
        self.ignore_base_members = true;
        self
    }

    /// Append a member; its declaration-order index is assigned here.
    #[must_use]
    pub fn with_member(mut self, mut member: MemberDescriptor) -> Self {
        member.index = self.members.len();
        self.members.push(member);
        self
    }

    /// Attach the enum string table.
    #[must_use]
    pub fn with_enum_strings(mut self, enum_strings: Vec<&'static str>) -> Self {
        self.enum_strings = Some(enum_strings);
        self
    }

    /// Mark the type as a resource and attach its name resolver.
    #[must_use]
    pub fn as_resource(mut self, resolver: ResolveFn) -> Self {
        self.is_resource = true;
        self.resolver = Some(resolver);
        self
    }

    /// Attach the leaf codec hooks.
    #[must_use]
    pub fn with_codec(mut self, serialize: SerializeFn, deserialize: DeserializeFn) -> Self {
        self.serialize = Some(serialize);
        self.deserialize = Some(deserialize);
        self
    }

    /// Attach the pre-load hook.
    #[must_use]
    pub fn with_pre_load(mut self, pre_load: PreLoadFn) -> Self {
        self.pre_load = Some(pre_load);
        self
    }

    /// Construct a default-initialized instance, when the type has a
    /// constructor. Abstract and resource types return `None` and must go
    /// through their resolver instead.
    pub fn create(&self) -> Option<Box<dyn Reflect>> {
        self.construct.map(|construct| construct())
    }

    /// Descriptor of the base type, if any.
    pub fn base_descriptor(&self) -> Option<&'static TypeDescriptor> {
        self.base.map(|base| base())
    }

    /// Transitive member list, base members first, unless the type opts out
    /// of inherited members.
    pub fn member_chain(
        &'static self,
    ) -> Vec<(&'static TypeDescriptor, &'static MemberDescriptor)> {
        let mut chain = Vec::new();
        if !self.ignore_base_members {
            if let Some(base) = self.base_descriptor() {
                chain = base.member_chain();
            }
        }
        chain.extend(self.members.iter().map(|member| (self, member)));
        chain
    }

    /// Returns true when the type exposes any members, own or inherited.
    /// Distinguishes member-walked struct types from leaf types that need a
    /// codec hook.
    pub fn has_members(&'static self) -> bool {
        !self.members.is_empty()
            || self
                .base_descriptor()
                .map_or(false, TypeDescriptor::has_members)
    }

    /// Find a member by name, checking own members before recursing to the
    /// base.
    pub fn find_member(
        &'static self,
        name: &str,
    ) -> Option<(&'static TypeDescriptor, &'static MemberDescriptor)> {
        if let Some(member) = self.members.iter().find(|member| member.name == name) {
            return Some((self, member));
        }
        self.base_descriptor()
            .and_then(|base| base.find_member(name))
    }

    /// Returns true if the descriptor is `other` or transitively derives from
    /// it.
    pub fn is_or_derives_from(&self, other: &TypeDescriptor) -> bool {
        if self.type_identity == other.type_identity {
            return true;
        }
        self.base_descriptor()
            .map_or(false, |base| base.is_or_derives_from(other))
    }
}
