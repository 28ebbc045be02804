//! Text codec: serialize reflected values into JSON value trees and
//! reconstruct them, polymorphically, from the `CLASS_TYPE` discriminator.
//!
//! The codec consumes and produces parsed [`serde_json::Value`] trees;
//! tokenizing and file I/O belong to external collaborators. Failures
//! degrade field by field: they are logged and the surrounding document
//! keeps parsing; no error aborts a whole document and no panic crosses
//! this boundary.

use serde_json::{Map, Value as JsonValue};
use tracing::error;

use crate::{
    sub_object, sub_object_mut, InstanceId, MemberAccess, MemberDescriptor, MemberFlags, Reflect,
    ReflectionError, ResourceHandle, TypeDescriptor, TypeRegistry,
};

/// Reserved first key carrying the registered type name of the serialized
/// object.
pub const CLASS_TYPE_KEY: &str = "CLASS_TYPE";

/// Serialize a reflected value into a JSON value tree.
///
/// Leaf types go through their codec hook. Everything else becomes an object
/// whose first key is the [`CLASS_TYPE_KEY`] discriminator of the *actual*
/// type, followed by the base-first member chain. Members are skipped when
/// flagged `IGNORE_SERIALIZATION` (declared or overridden), equal to their
/// stored default, or null pointers. A resource root only emits its
/// identifying `name` member, the weak reference other documents reconstruct
/// through the resolver.
pub fn serialize(
    registry: &TypeRegistry,
    value: &dyn Reflect,
) -> Result<JsonValue, ReflectionError> {
    let descriptor = value.type_descriptor();
    if let Some(serialize_leaf) = descriptor.serialize {
        return serialize_leaf(value);
    }

    let instance = InstanceId::of(value);
    let mut object = Map::new();
    object.insert(
        CLASS_TYPE_KEY.to_owned(),
        JsonValue::String(descriptor.type_name.to_owned()),
    );

    for (declaring, member) in descriptor.member_chain() {
        let flags = registry.overrides().effective_flags(
            member.flags,
            &[descriptor.type_name, declaring.type_name],
            member.name,
            Some(instance),
        );
        if flags.contains(MemberFlags::IGNORE_SERIALIZATION) {
            continue;
        }
        if descriptor.is_resource && member.name != "name" {
            continue;
        }

        let owner = sub_object(value, declaring)?;
        match serialize_member(registry, owner, member) {
            Ok(Some(json)) => {
                object.insert(member.name.to_owned(), json);
            }
            Ok(None) => {}
            Err(err) => {
                error!(
                    "failed to serialize member '{}.{}': {}",
                    descriptor.type_name, member.name, err
                );
            }
        }
    }
    Ok(JsonValue::Object(object))
}

fn serialize_member(
    registry: &TypeRegistry,
    owner: &dyn Reflect,
    member: &MemberDescriptor,
) -> Result<Option<JsonValue>, ReflectionError> {
    match &member.access {
        MemberAccess::Value { get, eq, .. } => {
            if let Some(default) = member.default {
                if eq(owner, default().as_ref()) {
                    return Ok(None);
                }
            }
            let field = get(owner);
            let field_descriptor = field.type_descriptor();
            if field_descriptor.serialize.is_none() && !field_descriptor.has_members() {
                return Err(ReflectionError::MissingSerializer(
                    field_descriptor.type_name,
                ));
            }
            serialize(registry, field).map(Some)
        }
        MemberAccess::OwnedPointer { get, .. } => match get(owner) {
            None => Ok(None),
            Some(pointee) => serialize(registry, pointee).map(Some),
        },
        MemberAccess::Resource { get, .. } => match get(owner) {
            None => Ok(None),
            Some(handle) => serialize(registry, handle.get()).map(Some),
        },
        MemberAccess::PointerList { len, get, .. } => {
            let mut items = Vec::with_capacity(len(owner));
            for index in 0..len(owner) {
                if let Some(element) = get(owner, index) {
                    items.push(serialize(registry, element)?);
                }
            }
            Ok(Some(JsonValue::Array(items)))
        }
        MemberAccess::PointerMap { len, entry_at, .. } => {
            let mut items = Vec::with_capacity(len(owner));
            for index in 0..len(owner) {
                if let Some((key, element)) = entry_at(owner, index) {
                    let serialized = serialize(registry, element)?;
                    let mut entry = Map::new();
                    entry.insert(key.to_owned(), serialized);
                    items.push(JsonValue::Object(entry));
                }
            }
            Ok(Some(JsonValue::Array(items)))
        }
    }
}

/// Fill the members of an already constructed destination from a JSON
/// object.
///
/// The discriminator, when present, must match the destination's type. It is
/// deliberately optional here: the destination already fixes the type, so
/// nested value structs written without one stay readable. Polymorphic
/// document roots go through [`deserialize_new`], which requires it.
/// Unknown keys are logged and dropped; a member that fails to fill is
/// logged and the rest of the document keeps parsing.
pub fn deserialize_members(
    registry: &TypeRegistry,
    json: &JsonValue,
    target: &mut dyn Reflect,
) -> Result<(), ReflectionError> {
    let descriptor = target.type_descriptor();
    let object = json.as_object().ok_or(ReflectionError::UnexpectedValue {
        expected: "object",
        type_name: descriptor.type_name,
    })?;

    if let Some(class_type) = object.get(CLASS_TYPE_KEY).and_then(JsonValue::as_str) {
        if class_type != descriptor.type_name {
            return Err(ReflectionError::DiscriminatorMismatch {
                expected: descriptor.type_name,
                found: class_type.to_owned(),
            });
        }
    }

    for (key, value) in object {
        if key == CLASS_TYPE_KEY {
            continue;
        }
        let Some((declaring, member)) = descriptor.find_member(key) else {
            error!(
                "unknown member '{}' on type '{}', dropping key",
                key, descriptor.type_name
            );
            continue;
        };
        let owner = sub_object_mut(&mut *target, declaring)?;
        if let Err(err) = fill_member(registry, owner, member, value) {
            error!(
                "failed to deserialize member '{}.{}': {}",
                descriptor.type_name, key, err
            );
        }
    }
    Ok(())
}

/// Reconstruct an instance whose concrete type is unknown ahead of time.
///
/// Reads the discriminator, resolves the descriptor by registered name,
/// constructs, runs the pre-load hook and fills members. An unregistered
/// name is a forward-compatibility gap: it is logged and `Ok(None)` is
/// returned, never guessed at. Callers must treat `None` as an empty slot.
/// Resource documents denote shared instances owned by their resolver and
/// never construct; they go through [`resolve_reference`] instead.
pub fn deserialize_new(
    registry: &TypeRegistry,
    json: &JsonValue,
) -> Result<Option<Box<dyn Reflect>>, ReflectionError> {
    let object = json.as_object().ok_or(ReflectionError::UnexpectedValue {
        expected: "object",
        type_name: "<document>",
    })?;
    let type_name = object
        .get(CLASS_TYPE_KEY)
        .and_then(JsonValue::as_str)
        .ok_or(ReflectionError::MissingDiscriminator)?;

    let Some(descriptor) = registry.lookup_by_name(type_name) else {
        error!("cannot deserialize unregistered type '{}'", type_name);
        return Ok(None);
    };
    if descriptor.is_resource {
        error!(
            "resource document '{}' denotes a shared instance, resolve it as a reference",
            descriptor.type_name
        );
        return Ok(None);
    }
    let Some(mut instance) = descriptor.create() else {
        error!(
            "type '{}' has no constructor, leaving slot empty",
            descriptor.type_name
        );
        return Ok(None);
    };

    if let Some(pre_load) = descriptor.pre_load {
        pre_load(instance.as_mut());
    }
    deserialize_members(registry, json, instance.as_mut())?;
    Ok(Some(instance))
}

fn fill_member(
    registry: &TypeRegistry,
    owner: &mut dyn Reflect,
    member: &MemberDescriptor,
    json: &JsonValue,
) -> Result<(), ReflectionError> {
    match &member.access {
        MemberAccess::Value { get_mut, .. } => {
            let field = get_mut(owner);
            let field_descriptor = field.type_descriptor();
            if let Some(deserialize_leaf) = field_descriptor.deserialize {
                deserialize_leaf(field, json)
            } else if field_descriptor.has_members() {
                deserialize_members(registry, json, field)
            } else {
                Err(ReflectionError::MissingDeserializer(
                    field_descriptor.type_name,
                ))
            }
        }
        MemberAccess::OwnedPointer { set, .. } => {
            match deserialize_new(registry, json)? {
                Some(instance) => set(owner, Some(instance)),
                // Unregistered type, already logged; the slot stays empty.
                None => Ok(()),
            }
        }
        MemberAccess::Resource { set, .. } => {
            let object = json.as_object().ok_or(ReflectionError::UnexpectedValue {
                expected: "object",
                type_name: "resource reference",
            })?;
            let descriptor = match object.get(CLASS_TYPE_KEY).and_then(JsonValue::as_str) {
                Some(type_name) => registry
                    .lookup_by_name(type_name)
                    .ok_or_else(|| ReflectionError::TypeNotFound(type_name.to_owned()))?,
                None => (member.field_type)(),
            };
            match resolve_named(descriptor, object)? {
                Some(handle) => set(owner, Some(handle)),
                // Unresolved name, already logged; the slot keeps its value.
                None => Ok(()),
            }
        }
        MemberAccess::PointerList { clear, push, .. } => {
            let items = json.as_array().ok_or(ReflectionError::UnexpectedValue {
                expected: "array",
                type_name: member.name,
            })?;
            clear(owner);
            for item in items {
                if let Some(instance) = deserialize_new(registry, item)? {
                    push(owner, instance)?;
                }
            }
            Ok(())
        }
        MemberAccess::PointerMap { clear, insert, .. } => {
            let items = json.as_array().ok_or(ReflectionError::UnexpectedValue {
                expected: "array",
                type_name: member.name,
            })?;
            clear(owner);
            for item in items {
                let entry = item.as_object().filter(|entry| entry.len() == 1).ok_or(
                    ReflectionError::UnexpectedValue {
                        expected: "single-key object",
                        type_name: member.name,
                    },
                )?;
                let (key, value) =
                    entry
                        .iter()
                        .next()
                        .ok_or(ReflectionError::UnexpectedValue {
                            expected: "single-key object",
                            type_name: member.name,
                        })?;
                if let Some(instance) = deserialize_new(registry, value)? {
                    insert(owner, key.clone(), instance)?;
                }
            }
            Ok(())
        }
    }
}

fn resolve_named(
    descriptor: &'static TypeDescriptor,
    object: &Map<String, JsonValue>,
) -> Result<Option<ResourceHandle>, ReflectionError> {
    let name = object.get("name").and_then(JsonValue::as_str).ok_or(
        ReflectionError::UnexpectedValue {
            expected: "resource name",
            type_name: descriptor.type_name,
        },
    )?;
    let resolver = descriptor
        .resolver
        .ok_or(ReflectionError::MissingResolver(descriptor.type_name))?;
    match resolver(name) {
        Some(handle) => Ok(Some(handle)),
        None => {
            error!(
                "resource '{}' of type '{}' could not be resolved",
                name, descriptor.type_name
            );
            Ok(None)
        }
    }
}

/// Resolve a serialized `{CLASS_TYPE, name}` resource reference into its
/// shared handle. The root-level counterpart of resource members: resource
/// documents denote instances owned by their resolver, so they resolve to
/// the shared handle instead of constructing. An unresolved name is logged
/// and yields `Ok(None)`.
pub fn resolve_reference(
    registry: &TypeRegistry,
    json: &JsonValue,
) -> Result<Option<ResourceHandle>, ReflectionError> {
    let object = json.as_object().ok_or(ReflectionError::UnexpectedValue {
        expected: "object",
        type_name: "resource reference",
    })?;
    let type_name = object
        .get(CLASS_TYPE_KEY)
        .and_then(JsonValue::as_str)
        .ok_or(ReflectionError::MissingDiscriminator)?;
    let descriptor = registry
        .lookup_by_name(type_name)
        .ok_or_else(|| ReflectionError::TypeNotFound(type_name.to_owned()))?;
    resolve_named(descriptor, object)
}

/// Apply a single-member edit, running the member's pre/post mutation
/// callbacks around the fill. This is the seam property grids edit through.
pub fn apply_json_edit(
    registry: &TypeRegistry,
    target: &mut dyn Reflect,
    member_name: &str,
    value: &JsonValue,
) -> Result<(), ReflectionError> {
    let descriptor = target.type_descriptor();
    let (declaring, member) = descriptor.find_member(member_name).ok_or_else(|| {
        ReflectionError::MemberNotFound(member_name.to_owned(), descriptor.type_name)
    })?;
    let owner = sub_object_mut(target, declaring)?;
    for callback in &member.pre_change {
        callback(owner);
    }
    let result = fill_member(registry, owner, member, value);
    for callback in &member.post_change {
        callback(owner);
    }
    result
}

/// Serialize a reflected value to a JSON string.
pub fn serialize_to_string(
    registry: &TypeRegistry,
    value: &dyn Reflect,
) -> Result<String, ReflectionError> {
    serde_json::to_string(&serialize(registry, value)?).map_err(Into::into)
}

/// Parse a JSON document and reconstruct the instance it describes.
pub fn deserialize_new_from_str(
    registry: &TypeRegistry,
    text: &str,
) -> Result<Option<Box<dyn Reflect>>, ReflectionError> {
    let json: JsonValue = serde_json::from_str(text)?;
    deserialize_new(registry, &json)
}
