use crate::{sub_object, sub_object_mut, MemberAccess, Reflect, ReflectionError};

/// Deep-copy `src` into the pre-allocated, same-type `dst`.
///
/// Member semantics mirror the text codec exactly: value members are
/// assigned, owned pointers are duplicated through the pointee's *actual*
/// descriptor (a derived object behind a base-typed slot stays derived),
/// resource members share the handle, and pointer collections are rebuilt
/// element by element.
pub fn copy_instance(dst: &mut dyn Reflect, src: &dyn Reflect) -> Result<(), ReflectionError> {
    let descriptor = src.type_descriptor();
    if dst.type_descriptor().type_identity != descriptor.type_identity {
        return Err(ReflectionError::TypeMismatch {
            expected: descriptor.type_name,
            found: dst.type_descriptor().type_name,
        });
    }

    for (declaring, member) in descriptor.member_chain() {
        let src_owner = sub_object(src, declaring)?;
        let dst_owner = sub_object_mut(&mut *dst, declaring)?;
        match &member.access {
            MemberAccess::Value { assign, .. } => {
                assign(dst_owner, src_owner)?;
            }
            MemberAccess::OwnedPointer { get, set } => {
                let duplicate = match get(src_owner) {
                    None => None,
                    Some(pointee) => Some(duplicate_instance(pointee)?),
                };
                set(dst_owner, duplicate)?;
            }
            MemberAccess::Resource { get, set } => {
                // Intentionally shares the handle instead of duplicating.
                set(dst_owner, get(src_owner))?;
            }
            MemberAccess::PointerList {
                len,
                get,
                clear,
                push,
            } => {
                clear(dst_owner);
                for index in 0..len(src_owner) {
                    if let Some(element) = get(src_owner, index) {
                        push(dst_owner, duplicate_instance(element)?)?;
                    }
                }
            }
            MemberAccess::PointerMap {
                len,
                entry_at,
                clear,
                insert,
            } => {
                clear(dst_owner);
                for index in 0..len(src_owner) {
                    if let Some((key, element)) = entry_at(src_owner, index) {
                        insert(dst_owner, key.to_owned(), duplicate_instance(element)?)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Construct a fresh instance from the source's actual descriptor and
/// deep-copy into it.
pub fn duplicate_instance(src: &dyn Reflect) -> Result<Box<dyn Reflect>, ReflectionError> {
    let descriptor = src.type_descriptor();
    let mut duplicate = descriptor
        .create()
        .ok_or(ReflectionError::MissingConstructor(descriptor.type_name))?;
    copy_instance(duplicate.as_mut(), src)?;
    Ok(duplicate)
}
