//! End-to-end coverage of the reflection registry, the JSON codec and the
//! copy engine, exercised through a small zoo of test types.

use std::collections::{BTreeMap, HashMap};

use kyro_data_model::json_utils::{
    apply_json_edit, deserialize_members, deserialize_new, deserialize_new_from_str,
    resolve_reference, serialize, CLASS_TYPE_KEY,
};
use kyro_data_model::{
    copy_instance, implement_reflect_enum, implement_reflect_struct, pointer_list_member,
    pointer_map_member, pointer_member, resource_member, value_member, InstanceId, MemberFlags,
    OwnedValue, Reflect, ReflectionError, ResourceHandle, TypeDescriptor, TypeRegistry, Vec3,
};
use serde_json::json;

// --- test types ------------------------------------------------------------

#[derive(Default)]
struct Widget {
    position: Vec3,
    child: Option<Box<dyn Reflect>>,
}

implement_reflect_struct!(
    Widget,
    TypeDescriptor::new::<Widget>("Widget")
        .with_default_constructor::<Widget>()
        .with_member(value_member!(Widget, position, Vec3).with_default(|| Box::new(Vec3::ZERO)))
        .with_member(pointer_member!(Widget, child, Widget))
);

#[derive(Default)]
struct Entity {
    name: String,
    id: u32,
}

implement_reflect_struct!(
    Entity,
    TypeDescriptor::new::<Entity>("Entity")
        .with_default_constructor::<Entity>()
        .with_member(value_member!(Entity, name, String))
        .with_member(value_member!(Entity, id, u32))
);

#[derive(Default)]
struct Sprite {
    entity: Entity,
    tint: String,
    layer: i32,
}

implement_reflect_struct!(
    derived Sprite,
    entity,
    TypeDescriptor::new::<Sprite>("Sprite")
        .with_default_constructor::<Sprite>()
        .with_base(Entity::static_descriptor)
        .with_member(value_member!(Sprite, tint, String))
        .with_member(value_member!(Sprite, layer, i32))
);

#[derive(Default)]
struct Texture {
    name: String,
    width: u32,
    height: u32,
}

fn resolve_texture(name: &str) -> Option<ResourceHandle> {
    kyro_data_model::lazy_static! {
        static ref TEXTURES: HashMap<&'static str, ResourceHandle> = {
            let mut textures = HashMap::new();
            textures.insert(
                "grass",
                ResourceHandle::new(Texture {
                    name: "grass".to_owned(),
                    width: 64,
                    height: 64,
                }),
            );
            textures
        };
    }
    TEXTURES.get(name).cloned()
}

implement_reflect_struct!(
    Texture,
    TypeDescriptor::new::<Texture>("Texture")
        .with_member(value_member!(Texture, name, String))
        .with_member(value_member!(Texture, width, u32))
        .with_member(value_member!(Texture, height, u32))
        .as_resource(resolve_texture)
);

#[derive(Default)]
struct Material {
    name: String,
    albedo: Option<ResourceHandle>,
    detail: Option<Box<dyn Reflect>>,
}

implement_reflect_struct!(
    Material,
    TypeDescriptor::new::<Material>("Material")
        .with_default_constructor::<Material>()
        .with_member(value_member!(Material, name, String))
        .with_member(resource_member!(Material, albedo, Texture))
        .with_member(pointer_member!(Material, detail, Widget))
);

#[derive(Default)]
struct Scene {
    nodes: Vec<Box<dyn Reflect>>,
    lookup: BTreeMap<String, Box<dyn Reflect>>,
}

implement_reflect_struct!(
    Scene,
    TypeDescriptor::new::<Scene>("Scene")
        .with_default_constructor::<Scene>()
        .with_member(pointer_list_member!(Scene, nodes, Entity))
        .with_member(pointer_map_member!(Scene, lookup, Entity))
);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum PlayMode {
    #[default]
    Once,
    Loop,
    PingPong,
}

implement_reflect_enum!(PlayMode, "PlayMode", [Once, Loop, PingPong]);

#[derive(Default)]
struct Animation {
    mode: PlayMode,
    speed: f32,
}

implement_reflect_struct!(
    Animation,
    TypeDescriptor::new::<Animation>("Animation")
        .with_default_constructor::<Animation>()
        .with_member(value_member!(Animation, mode, PlayMode))
        .with_member(value_member!(Animation, speed, f32))
);

#[derive(Clone, Debug, Default, PartialEq)]
struct Settings {
    label: String,
    enabled: bool,
    tiny: u8,
    medium: i32,
    big: u64,
    signed_big: i64,
    ratio: f32,
    precise: f64,
}

implement_reflect_struct!(
    Settings,
    TypeDescriptor::new::<Settings>("Settings")
        .with_default_constructor::<Settings>()
        .with_member(value_member!(Settings, label, String))
        .with_member(value_member!(Settings, enabled, bool))
        .with_member(value_member!(Settings, tiny, u8))
        .with_member(value_member!(Settings, medium, i32))
        .with_member(value_member!(Settings, big, u64))
        .with_member(value_member!(Settings, signed_big, i64))
        .with_member(value_member!(Settings, ratio, f32))
        .with_member(value_member!(Settings, precise, f64))
);

#[derive(Clone, Default, PartialEq)]
struct Tag {
    label: String,
}

implement_reflect_struct!(
    Tag,
    TypeDescriptor::new::<Tag>("Tag")
        .with_default_constructor::<Tag>()
        .with_member(value_member!(Tag, label, String))
);

// Derives Tag without declaring members of its own.
#[derive(Clone, Default, PartialEq)]
struct NamedTag {
    tag: Tag,
}

implement_reflect_struct!(
    derived NamedTag,
    tag,
    TypeDescriptor::new::<NamedTag>("NamedTag")
        .with_default_constructor::<NamedTag>()
        .with_base(Tag::static_descriptor)
);

#[derive(Default)]
struct Labeled {
    inner: NamedTag,
}

implement_reflect_struct!(
    Labeled,
    TypeDescriptor::new::<Labeled>("Labeled")
        .with_default_constructor::<Labeled>()
        .with_member(value_member!(Labeled, inner, NamedTag))
);

#[derive(Default)]
struct Pool {
    warmed: bool,
    capacity: u32,
}

implement_reflect_struct!(
    Pool,
    TypeDescriptor::new::<Pool>("Pool")
        .with_default_constructor::<Pool>()
        .with_pre_load(|instance| {
            if let Some(pool) = instance.downcast_mut::<Pool>() {
                pool.warmed = true;
            }
        })
        .with_member(value_member!(Pool, capacity, u32))
);

#[derive(Default)]
struct Counter {
    value: i32,
    edits: u32,
}

implement_reflect_struct!(
    Counter,
    TypeDescriptor::new::<Counter>("Counter")
        .with_default_constructor::<Counter>()
        .with_member(
            value_member!(Counter, value, i32).with_post_change(|owner| {
                if let Some(counter) = owner.downcast_mut::<Counter>() {
                    counter.edits += 1;
                }
            })
        )
        .with_member(value_member!(Counter, edits, u32).with_flags(MemberFlags::IGNORE_SERIALIZATION))
);

fn test_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    for descriptor in [
        Entity::static_descriptor(),
        Sprite::static_descriptor(),
        Widget::static_descriptor(),
        Texture::static_descriptor(),
        Material::static_descriptor(),
        Scene::static_descriptor(),
        Animation::static_descriptor(),
        Settings::static_descriptor(),
        Tag::static_descriptor(),
        NamedTag::static_descriptor(),
        Labeled::static_descriptor(),
        Pool::static_descriptor(),
        Counter::static_descriptor(),
    ] {
        registry.register(descriptor).unwrap();
    }
    registry
}

// --- tests -----------------------------------------------------------------

#[test]
fn widget_scenario_round_trips() {
    let registry = test_registry();
    let widget = Widget {
        position: Vec3::new(1.0, 2.0, 3.0),
        child: None,
    };

    let serialized = serialize(&registry, &widget).unwrap();
    assert_eq!(
        serialized,
        json!({"CLASS_TYPE": "Widget", "position": [1.0, 2.0, 3.0]})
    );

    let restored = deserialize_new(&registry, &serialized).unwrap().unwrap();
    let restored = restored.downcast_ref::<Widget>().unwrap();
    assert_eq!(restored.position, Vec3::new(1.0, 2.0, 3.0));
    assert!(restored.child.is_none());
}

#[test]
fn primitive_members_round_trip_at_extremes() {
    let registry = test_registry();
    let settings = Settings {
        label: String::new(),
        enabled: true,
        tiny: 255,
        medium: i32::MIN,
        big: u64::MAX,
        signed_big: i64::MIN,
        ratio: -0.5,
        precise: 2.5,
    };

    let serialized = serialize(&registry, &settings).unwrap();
    let restored = deserialize_new(&registry, &serialized).unwrap().unwrap();
    assert_eq!(restored.downcast_ref::<Settings>().unwrap(), &settings);
}

#[test]
fn polymorphic_round_trip_reconstructs_derived_type() {
    let registry = test_registry();
    let mut widget = Widget::default();
    widget.child = Some(Box::new(Sprite {
        entity: Entity {
            name: "player".to_owned(),
            id: 42,
        },
        tint: "red".to_owned(),
        layer: 3,
    }));

    let serialized = serialize(&registry, &widget).unwrap();
    // The discriminator carries the actual type, not the declared base.
    assert_eq!(serialized["child"][CLASS_TYPE_KEY], json!("Sprite"));

    let restored = deserialize_new(&registry, &serialized).unwrap().unwrap();
    let child = restored.downcast_ref::<Widget>().unwrap().child.as_deref();
    let sprite = child.unwrap().downcast_ref::<Sprite>().unwrap();
    assert_eq!(sprite.entity.name, "player");
    assert_eq!(sprite.entity.id, 42);
    assert_eq!(sprite.tint, "red");
    assert_eq!(sprite.layer, 3);
}

#[test]
fn inherited_members_serialize_base_first() {
    let registry = test_registry();
    let sprite = Sprite {
        entity: Entity {
            name: "npc".to_owned(),
            id: 7,
        },
        tint: "blue".to_owned(),
        layer: -1,
    };

    let serialized = serialize(&registry, &sprite).unwrap();
    let keys: Vec<&str> = serialized
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec![CLASS_TYPE_KEY, "name", "id", "tint", "layer"]);
}

#[test]
fn default_elision_is_idempotent() {
    let registry = test_registry();
    let widget = Widget::default();

    let serialized = serialize(&registry, &widget).unwrap();
    assert!(serialized.get("position").is_none());

    let restored = deserialize_new(&registry, &serialized).unwrap().unwrap();
    assert_eq!(
        restored.downcast_ref::<Widget>().unwrap().position,
        Vec3::ZERO
    );
}

#[test]
fn inherited_only_value_members_round_trip() {
    let registry = test_registry();
    let labeled = Labeled {
        inner: NamedTag {
            tag: Tag {
                label: "alpha".to_owned(),
            },
        },
    };

    // NamedTag declares no members of its own; its shape is all inherited.
    let serialized = serialize(&registry, &labeled).unwrap();
    assert_eq!(serialized["inner"][CLASS_TYPE_KEY], json!("NamedTag"));
    assert_eq!(serialized["inner"]["label"], json!("alpha"));

    let restored = deserialize_new(&registry, &serialized).unwrap().unwrap();
    assert_eq!(
        restored.downcast_ref::<Labeled>().unwrap().inner.tag.label,
        "alpha"
    );
}

#[test]
fn document_root_requires_discriminator() {
    let registry = test_registry();
    let err = deserialize_new(&registry, &json!({"position": [1.0, 2.0, 3.0]})).unwrap_err();
    assert!(matches!(err, ReflectionError::MissingDiscriminator));

    // Filling a known destination stays lenient about the discriminator.
    let mut widget = Widget::default();
    deserialize_members(&registry, &json!({"position": [7.0, 8.0, 9.0]}), &mut widget).unwrap();
    assert_eq!(widget.position, Vec3::new(7.0, 8.0, 9.0));
}

#[test]
fn root_resource_references_resolve_to_shared_handles() {
    let registry = test_registry();
    let reference = json!({"CLASS_TYPE": "Texture", "name": "grass"});

    let handle = resolve_reference(&registry, &reference).unwrap().unwrap();
    assert!(handle.ptr_eq(&resolve_texture("grass").unwrap()));

    // An unresolved name is a loading gap, not a parse error.
    let missing = json!({"CLASS_TYPE": "Texture", "name": "lava"});
    assert!(resolve_reference(&registry, &missing).unwrap().is_none());

    // Resource documents denote shared instances and never construct.
    assert!(deserialize_new(&registry, &reference).unwrap().is_none());
}

#[test]
fn resource_members_serialize_as_weak_name_reference() {
    let registry = test_registry();
    let material = Material {
        name: "terrain".to_owned(),
        albedo: resolve_texture("grass"),
        detail: None,
    };

    let serialized = serialize(&registry, &material).unwrap();
    // Only the discriminator and the identifying name, never full contents.
    assert_eq!(
        serialized["albedo"],
        json!({"CLASS_TYPE": "Texture", "name": "grass"})
    );

    let restored = deserialize_new(&registry, &serialized).unwrap().unwrap();
    let restored = restored.downcast_ref::<Material>().unwrap();
    let handle = restored.albedo.as_ref().unwrap();
    assert!(handle.ptr_eq(&resolve_texture("grass").unwrap()));
    assert_eq!(handle.get_as::<Texture>().unwrap().width, 64);
}

#[test]
fn copy_shares_resources_and_duplicates_owned_pointers() {
    let src = Material {
        name: "terrain".to_owned(),
        albedo: resolve_texture("grass"),
        detail: Some(Box::new(Widget {
            position: Vec3::new(9.0, 8.0, 7.0),
            child: None,
        })),
    };

    let mut dst = Material::default();
    copy_instance(&mut dst, &src).unwrap();

    assert_eq!(dst.name, "terrain");
    // Resource member: identity-shared.
    assert!(dst.albedo.as_ref().unwrap().ptr_eq(src.albedo.as_ref().unwrap()));
    // Owned pointer member: distinct instance, equal value.
    let src_detail = src.detail.as_deref().unwrap();
    let dst_detail = dst.detail.as_deref().unwrap();
    assert!(!std::ptr::eq(
        src_detail as *const dyn Reflect as *const (),
        dst_detail as *const dyn Reflect as *const ()
    ));
    assert_eq!(
        dst_detail.downcast_ref::<Widget>().unwrap().position,
        Vec3::new(9.0, 8.0, 7.0)
    );
}

#[test]
fn copy_preserves_derived_identity_through_base_slots() {
    let mut src = Widget::default();
    src.child = Some(Box::new(Sprite {
        entity: Entity {
            name: "boss".to_owned(),
            id: 1,
        },
        tint: "gold".to_owned(),
        layer: 10,
    }));

    let mut dst = Widget::default();
    copy_instance(&mut dst, &src).unwrap();

    let child = dst.child.as_deref().unwrap();
    let sprite = child.downcast_ref::<Sprite>().unwrap();
    assert_eq!(sprite.tint, "gold");
    assert_eq!(sprite.entity.name, "boss");
}

#[test]
fn pointer_collections_round_trip() {
    let registry = test_registry();
    let mut scene = Scene::default();
    scene.nodes.push(Box::new(Entity {
        name: "a".to_owned(),
        id: 1,
    }));
    scene.nodes.push(Box::new(Sprite {
        entity: Entity {
            name: "b".to_owned(),
            id: 2,
        },
        tint: "green".to_owned(),
        layer: 5,
    }));
    scene.lookup.insert(
        "hero".to_owned(),
        Box::new(Entity {
            name: "hero".to_owned(),
            id: 3,
        }),
    );

    let serialized = serialize(&registry, &scene).unwrap();
    assert_eq!(serialized["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(serialized["lookup"][0]["hero"][CLASS_TYPE_KEY], json!("Entity"));

    let restored = deserialize_new(&registry, &serialized).unwrap().unwrap();
    let restored = restored.downcast_ref::<Scene>().unwrap();
    assert_eq!(restored.nodes.len(), 2);
    assert!(restored.nodes[1].downcast_ref::<Sprite>().is_some());
    assert_eq!(
        restored.lookup["hero"].downcast_ref::<Entity>().unwrap().id,
        3
    );
}

#[test]
fn unknown_type_leaves_slot_empty_and_siblings_intact() {
    let registry = test_registry();
    let document = json!({
        "CLASS_TYPE": "Widget",
        "position": [4.0, 5.0, 6.0],
        "child": {"CLASS_TYPE": "Ghost", "x": 1}
    });

    let restored = deserialize_new(&registry, &document).unwrap().unwrap();
    let widget = restored.downcast_ref::<Widget>().unwrap();
    assert_eq!(widget.position, Vec3::new(4.0, 5.0, 6.0));
    assert!(widget.child.is_none());

    // A whole document of unknown type yields none, not a guess.
    let unknown = json!({"CLASS_TYPE": "Ghost"});
    assert!(deserialize_new(&registry, &unknown).unwrap().is_none());
}

#[test]
fn unknown_member_keys_are_dropped_not_fatal() {
    let registry = test_registry();
    let mut widget = Widget::default();
    let document = json!({
        "CLASS_TYPE": "Widget",
        "momentum": [0.0, 0.0, 1.0],
        "position": [1.0, 1.0, 1.0]
    });

    deserialize_members(&registry, &document, &mut widget).unwrap();
    assert_eq!(widget.position, Vec3::new(1.0, 1.0, 1.0));
}

#[test]
fn discriminator_mismatch_is_rejected() {
    let registry = test_registry();
    let mut widget = Widget::default();
    let document = json!({"CLASS_TYPE": "Entity", "id": 5});
    assert!(deserialize_members(&registry, &document, &mut widget).is_err());
}

#[test]
fn instance_override_suppresses_only_that_instance() {
    let mut registry = test_registry();
    let first = Widget {
        position: Vec3::new(1.0, 2.0, 3.0),
        child: None,
    };
    let second = Widget {
        position: Vec3::new(4.0, 5.0, 6.0),
        child: None,
    };

    registry.add_override(
        "Widget",
        "position",
        MemberFlags::IGNORE_SERIALIZATION,
        Some(InstanceId::of(&first)),
    );

    let serialized_first = serialize(&registry, &first).unwrap();
    let serialized_second = serialize(&registry, &second).unwrap();
    assert!(serialized_first.get("position").is_none());
    assert_eq!(serialized_second["position"], json!([4.0, 5.0, 6.0]));

    registry.clear_instance_overrides(InstanceId::of(&first));
    let serialized_first = serialize(&registry, &first).unwrap();
    assert_eq!(serialized_first["position"], json!([1.0, 2.0, 3.0]));
}

#[test]
fn type_override_applies_to_every_instance() {
    let mut registry = test_registry();
    registry.add_override("Widget", "position", MemberFlags::IGNORE_SERIALIZATION, None);

    let widget = Widget {
        position: Vec3::new(1.0, 2.0, 3.0),
        child: None,
    };
    assert!(serialize(&registry, &widget).unwrap().get("position").is_none());
    assert!(registry.is_override_set(
        "Widget",
        "position",
        MemberFlags::IGNORE_SERIALIZATION,
        None
    ));

    registry.remove_override("Widget", "position", MemberFlags::IGNORE_SERIALIZATION, None);
    assert_eq!(
        serialize(&registry, &widget).unwrap()["position"],
        json!([1.0, 2.0, 3.0])
    );
}

#[test]
fn enum_members_round_trip_and_keep_value_on_bad_string() {
    let registry = test_registry();
    let animation = Animation {
        mode: PlayMode::PingPong,
        speed: 2.0,
    };

    let serialized = serialize(&registry, &animation).unwrap();
    assert_eq!(serialized["mode"], json!("PingPong"));

    let mut restored = Animation::default();
    deserialize_members(&registry, &serialized, &mut restored).unwrap();
    assert_eq!(restored.mode, PlayMode::PingPong);

    // A stored string with no matching variant keeps the current value.
    let bad = json!({"CLASS_TYPE": "Animation", "mode": "Backwards"});
    deserialize_members(&registry, &bad, &mut restored).unwrap();
    assert_eq!(restored.mode, PlayMode::PingPong);
}

#[test]
fn pre_load_hook_runs_before_member_fill() {
    let registry = test_registry();
    let document = json!({"CLASS_TYPE": "Pool", "capacity": 8});

    let restored = deserialize_new(&registry, &document).unwrap().unwrap();
    let pool = restored.downcast_ref::<Pool>().unwrap();
    assert!(pool.warmed);
    assert_eq!(pool.capacity, 8);
}

#[test]
fn apply_json_edit_runs_mutation_callbacks() {
    let registry = test_registry();
    let mut counter = Counter::default();

    apply_json_edit(&registry, &mut counter, "value", &json!(41)).unwrap();
    apply_json_edit(&registry, &mut counter, "value", &json!(42)).unwrap();
    assert_eq!(counter.value, 42);
    assert_eq!(counter.edits, 2);

    assert!(apply_json_edit(&registry, &mut counter, "missing", &json!(0)).is_err());
}

#[test]
fn owned_value_reassignment_semantics() {
    let mut handle = OwnedValue::new(Widget::static_descriptor()).unwrap();
    assert_eq!(handle.descriptor().type_name, "Widget");

    let widget = Widget {
        position: Vec3::new(1.0, 0.0, 0.0),
        child: None,
    };
    // Same descriptor: storage is reused through an in-place copy.
    handle.assign(&widget).unwrap();
    assert_eq!(
        handle.get().downcast_ref::<Widget>().unwrap().position,
        Vec3::new(1.0, 0.0, 0.0)
    );

    // Different descriptor: release-then-reallocate from the actual type.
    let sprite = Sprite {
        entity: Entity {
            name: "swap".to_owned(),
            id: 9,
        },
        tint: "grey".to_owned(),
        layer: 0,
    };
    handle.assign(&sprite).unwrap();
    assert_eq!(handle.descriptor().type_name, "Sprite");
    assert_eq!(
        handle.get().downcast_ref::<Sprite>().unwrap().entity.id,
        9
    );

    // Resource descriptors have no constructor; owning handles reject them.
    assert!(OwnedValue::new(Texture::static_descriptor()).is_err());
}

#[test]
fn string_round_trip_through_text_documents() {
    let registry = test_registry();
    let widget = Widget {
        position: Vec3::new(0.5, 0.25, 0.125),
        child: None,
    };

    let text = kyro_data_model::json_utils::serialize_to_string(&registry, &widget).unwrap();
    let restored = deserialize_new_from_str(&registry, &text).unwrap().unwrap();
    assert_eq!(
        restored.downcast_ref::<Widget>().unwrap().position,
        Vec3::new(0.5, 0.25, 0.125)
    );
}
