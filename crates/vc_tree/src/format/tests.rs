use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use vc_serialize::descriptor::{DescriptorCell, PrimitiveKind, TypeDescriptor, TypeKind};
use vc_serialize::protocol::{Decoder, Encoder, PrimitiveRef, PrimitiveType};
use vc_serialize::protocol::{decode_structure, encode_structure};
use vc_serialize::registry::SerialRegistry;
use vc_serialize::serializer::{
    BoxSerializer, BytesSerializer, DynValue, LazySerializer, ListSerializer, MapSerializer,
    PrimitiveSerializer, SerializerCell, UnitEnumSerializer,
};
use vc_serialize::{
    RegistryError, ResolveError, Resolver, SerialError, SerialType, Serializer, SerializerRef,
};

use crate::{TreeConfig, TreeError, TreeFormat, Value};

// -----------------------------------------------------------------------------
// Fixtures

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

/// Registered at runtime, `Point` declares no default.
impl SerialType for Point {}

struct PointSerializer;

impl Serializer<Point> for PointSerializer {
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        static CELL: DescriptorCell = DescriptorCell::new();
        CELL.get_or_init(|| {
            TypeDescriptor::builder("demo::Point", TypeKind::Class)
                .element("x", i32::descriptor().clone())
                .element("y", i32::descriptor().clone())
                .build_arc()
        })
    }

    fn save(&self, encoder: &mut dyn Encoder, value: &Point) -> Result<(), SerialError> {
        encode_structure(encoder, self.descriptor(), |s| {
            s.write_primitive(0, &value.x)?;
            s.write_primitive(1, &value.y)
        })
    }

    fn load(&self, decoder: &mut dyn Decoder) -> Result<Point, SerialError> {
        decode_structure(decoder, self.descriptor(), |s| {
            let (mut x, mut y) = (None, None);
            s.for_each_index(|s, index| {
                match index {
                    0 => x = Some(s.read_primitive::<i32>(index)?),
                    1 => y = Some(s.read_primitive::<i32>(index)?),
                    _ => return Err(s.unknown_element(index)),
                }
                Ok(())
            })?;
            Ok(Point {
                x: x.ok_or_else(|| s.missing_element(0))?,
                y: y.ok_or_else(|| s.missing_element(1))?,
            })
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Color {
    Red,
    Green,
    Blue,
}

impl SerialType for Color {
    fn default_serializer(_: &Resolver<'_>) -> Result<Option<SerializerRef<Self>>, ResolveError> {
        static CELL: SerializerCell<Color> = SerializerCell::new();
        Ok(Some(CELL.get_or_init(|| {
            let descriptor = TypeDescriptor::builder("demo::Color", TypeKind::Enum)
                .variant("Red")
                .variant("Green")
                .variant("Blue")
                .build_arc();
            Arc::new(UnitEnumSerializer::new(
                descriptor,
                [Color::Red, Color::Green, Color::Blue],
            ))
        })))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Settings {
    name: String,
    volume: u8,
    tags: Vec<String>,
    limits: BTreeMap<String, u32>,
    nick: Option<String>,
    color: Color,
}

/// Serializer shaped like generated code: one child per field type.
struct SettingsSerializer {
    tags: SerializerRef<Vec<String>>,
    limits: SerializerRef<BTreeMap<String, u32>>,
    nick: SerializerRef<Option<String>>,
    color: SerializerRef<Color>,
    descriptor: DescriptorCell,
}

impl SerialType for Settings {
    fn default_serializer(
        resolver: &Resolver<'_>,
    ) -> Result<Option<SerializerRef<Self>>, ResolveError> {
        Ok(Some(Arc::new(SettingsSerializer {
            tags: resolver.resolve()?,
            limits: resolver.resolve()?,
            nick: resolver.resolve()?,
            color: resolver.resolve()?,
            descriptor: DescriptorCell::new(),
        })))
    }
}

impl Serializer<Settings> for SettingsSerializer {
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        self.descriptor.get_or_init(|| {
            TypeDescriptor::builder("demo::Settings", TypeKind::Class)
                .element("name", String::descriptor().clone())
                .element("volume", u8::descriptor().clone())
                .element("tags", self.tags.descriptor().clone())
                .element("limits", self.limits.descriptor().clone())
                .optional_element("nick", self.nick.descriptor().clone())
                .element("color", self.color.descriptor().clone())
                .build_arc()
        })
    }

    fn save(&self, encoder: &mut dyn Encoder, value: &Settings) -> Result<(), SerialError> {
        encode_structure(encoder, self.descriptor(), |s| {
            s.write_primitive(0, &value.name)?;
            s.write_primitive(1, &value.volume)?;
            s.write_element(2, &*self.tags, &value.tags)?;
            s.write_element(3, &*self.limits, &value.limits)?;
            s.write_element(4, &*self.nick, &value.nick)?;
            s.write_element(5, &*self.color, &value.color)
        })
    }

    fn load(&self, decoder: &mut dyn Decoder) -> Result<Settings, SerialError> {
        decode_structure(decoder, self.descriptor(), |s| {
            let mut name = None;
            let mut volume = None;
            let mut tags = None;
            let mut limits = None;
            let mut nick = None;
            let mut color = None;
            s.for_each_index(|s, index| {
                match index {
                    0 => name = Some(s.read_primitive::<String>(index)?),
                    1 => volume = Some(s.read_primitive::<u8>(index)?),
                    2 => tags = Some(s.read_element(index, &*self.tags)?),
                    3 => limits = Some(s.read_element(index, &*self.limits)?),
                    4 => nick = Some(s.read_element(index, &*self.nick)?),
                    5 => color = Some(s.read_element(index, &*self.color)?),
                    _ => return Err(s.unknown_element(index)),
                }
                Ok(())
            })?;
            Ok(Settings {
                name: name.ok_or_else(|| s.missing_element(0))?,
                volume: volume.ok_or_else(|| s.missing_element(1))?,
                tags: tags.ok_or_else(|| s.missing_element(2))?,
                limits: limits.ok_or_else(|| s.missing_element(3))?,
                nick: nick.flatten(),
                color: color.ok_or_else(|| s.missing_element(5))?,
            })
        })
    }

    /// Fields present in the tree replace or extend the old ones.
    fn update(&self, decoder: &mut dyn Decoder, old: Settings) -> Result<Settings, SerialError> {
        decode_structure(decoder, self.descriptor(), |s| {
            let mut value = old;
            s.for_each_index(|s, index| {
                match index {
                    0 => value.name = s.read_primitive(index)?,
                    1 => value.volume = s.read_primitive(index)?,
                    2 => {
                        let tags = core::mem::take(&mut value.tags);
                        value.tags = s.update_element(index, &*self.tags, tags)?;
                    }
                    3 => {
                        let limits = core::mem::take(&mut value.limits);
                        value.limits = s.update_element(index, &*self.limits, limits)?;
                    }
                    4 => {
                        let nick = value.nick.take();
                        value.nick = s.update_element(index, &*self.nick, nick)?;
                    }
                    5 => value.color = s.read_element(index, &*self.color)?,
                    _ => return Err(s.unknown_element(index)),
                }
                Ok(())
            })?;
            Ok(value)
        })
    }
}

fn settings() -> Settings {
    Settings {
        name: "arena".to_string(),
        volume: 80,
        tags: vec!["pvp".to_string(), "night".to_string()],
        limits: BTreeMap::from([("players".to_string(), 16), ("rounds".to_string(), 3)]),
        nick: None,
        color: Color::Green,
    }
}

/// Writes a `Point` as `"x,y"` text instead of a class.
struct PointText;

impl Serializer<Point> for PointText {
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        static CELL: DescriptorCell = DescriptorCell::new();
        CELL.get_or_init(|| Arc::new(TypeDescriptor::primitive("demo::PointText", PrimitiveKind::Str)))
    }

    fn save(&self, encoder: &mut dyn Encoder, value: &Point) -> Result<(), SerialError> {
        let text = alloc::format!("{},{}", value.x, value.y);
        encoder.encode_primitive(PrimitiveRef::Str(&text))
    }

    fn load(&self, decoder: &mut dyn Decoder) -> Result<Point, SerialError> {
        let text = PrimitiveSerializer::<String>::new().load(decoder)?;
        let parsed = text
            .split_once(',')
            .and_then(|(x, y)| Some(Point { x: x.parse().ok()?, y: y.parse().ok()? }));
        parsed.ok_or_else(|| SerialError::custom(alloc::format!("`{text}` is not a point")))
    }
}

fn point_registry() -> Arc<SerialRegistry> {
    let mut registry = SerialRegistry::new();
    registry.register::<Point>(Arc::new(PointSerializer)).unwrap();
    Arc::new(registry)
}

fn entry(key: &str, value: Value) -> (String, Value) {
    (key.to_string(), value)
}

// -----------------------------------------------------------------------------
// Round trips

#[test]
fn keyed_round_trip() {
    let format = TreeFormat::new(Arc::new(SerialRegistry::new()));
    let tree = format.encode(&settings()).unwrap();

    assert_eq!(tree.get("name"), Some(&Value::from("arena")));
    assert_eq!(tree.get("volume"), Some(&Value::UInt(80)));
    assert_eq!(tree.get("nick"), Some(&Value::Null));
    assert_eq!(tree.get("color"), Some(&Value::from("Green")));
    assert_eq!(
        tree.get("limits"),
        Some(&Value::Seq(vec![
            Value::Seq(vec![Value::from("players"), Value::UInt(16)]),
            Value::Seq(vec![Value::from("rounds"), Value::UInt(3)]),
        ]))
    );

    assert_eq!(format.decode::<Settings>(tree).unwrap(), settings());
}

#[test]
fn positional_round_trip() {
    let format = TreeFormat::new(Arc::new(SerialRegistry::new()))
        .with_config(TreeConfig::positional());
    let mut value = settings();
    value.nick = Some("ace".to_string());

    let tree = format.encode(&value).unwrap();
    let items = tree.as_seq().unwrap();
    assert_eq!(items.len(), 6);
    assert_eq!(items[4], Value::from("ace"));
    assert_eq!(items[5], Value::UInt(1));

    assert_eq!(format.decode::<Settings>(tree).unwrap(), value);
}

#[test]
fn json_and_ron_rendering() {
    let format = TreeFormat::new(Arc::new(SerialRegistry::new()));
    let tree = format.encode(&settings()).unwrap();

    let json = serde_json::to_string(&tree).unwrap();
    assert_eq!(
        json,
        r#"{"name":"arena","volume":80,"tags":["pvp","night"],"limits":[["players",16],["rounds",3]],"nick":null,"color":"Green"}"#
    );
    let from_json: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(format.decode::<Settings>(from_json).unwrap(), settings());

    let ron = ron::to_string(&tree).unwrap();
    let from_ron: Value = ron::from_str(&ron).unwrap();
    assert_eq!(format.decode::<Settings>(from_ron).unwrap(), settings());
}

#[test]
fn keyed_elements_decode_in_any_order() {
    let format = TreeFormat::new(point_registry());
    let tree = Value::Map(vec![entry("y", Value::Int(-4)), entry("x", Value::UInt(9))]);
    assert_eq!(format.decode::<Point>(tree).unwrap(), Point { x: 9, y: -4 });
}

#[test]
fn bytes_override() {
    let format = TreeFormat::new(Arc::new(SerialRegistry::new()));
    let data = vec![1_u8, 2, 255];

    let as_list = format.encode(&data).unwrap();
    assert_eq!(
        as_list,
        Value::Seq(vec![Value::UInt(1), Value::UInt(2), Value::UInt(255)])
    );

    let bytes = BytesSerializer::new();
    let as_bytes = format.encode_with(&bytes, &data).unwrap();
    assert_eq!(as_bytes, Value::Bytes(data.clone()));
    assert_eq!(format.decode_with::<Vec<u8>>(&bytes, as_bytes).unwrap(), data);

    // Text formats turn bytes into integer lists, which still decode.
    let json: Value = serde_json::from_str("[1,2,255]").unwrap();
    assert_eq!(format.decode_with::<Vec<u8>>(&bytes, json).unwrap(), data);
}

#[test]
fn composites_only_change_their_children() {
    let format = TreeFormat::new(Arc::new(SerialRegistry::new()));
    let points = vec![Point { x: 1, y: 2 }, Point { x: -3, y: 4 }];

    let as_class = ListSerializer::<Point>::new(Arc::new(PointSerializer));
    let as_text = ListSerializer::<Point>::new(Arc::new(PointText));

    let class_tree = format.encode_with(&as_class, &points).unwrap();
    let text_tree = format.encode_with(&as_text, &points).unwrap();
    assert_eq!(
        class_tree,
        Value::Seq(vec![
            Value::Map(vec![entry("x", Value::Int(1)), entry("y", Value::Int(2))]),
            Value::Map(vec![entry("x", Value::Int(-3)), entry("y", Value::Int(4))]),
        ])
    );
    assert_eq!(
        text_tree,
        Value::Seq(vec![Value::from("1,2"), Value::from("-3,4")])
    );
    assert_eq!(format.decode_with::<Vec<Point>>(&as_class, class_tree).unwrap(), points);
    assert_eq!(format.decode_with::<Vec<Point>>(&as_text, text_tree).unwrap(), points);
    assert_eq!(as_class.descriptor().kind(), as_text.descriptor().kind());

    // Map entries keep their `[key, value]` shape, only the values differ.
    let named: BTreeMap<String, Point> = BTreeMap::from([
        ("a".to_string(), points[0]),
        ("b".to_string(), points[1]),
    ]);
    let key: SerializerRef<String> = Arc::new(PrimitiveSerializer::<String>::new());
    let class_map = MapSerializer::<String, Point, BTreeMap<String, Point>>::new(
        key.clone(),
        Arc::new(PointSerializer),
    );
    let text_map =
        MapSerializer::<String, Point, BTreeMap<String, Point>>::new(key, Arc::new(PointText));

    let class_tree = format.encode_with(&class_map, &named).unwrap();
    let text_tree = format.encode_with(&text_map, &named).unwrap();
    let (Some(class_pairs), Some(text_pairs)) = (class_tree.as_seq(), text_tree.as_seq()) else {
        panic!("maps are written as sequences: {class_tree:?} {text_tree:?}");
    };
    assert_eq!(class_pairs.len(), 2);
    assert_eq!(text_pairs.len(), 2);
    for ((class_pair, text_pair), name) in class_pairs.iter().zip(text_pairs).zip(["a", "b"]) {
        let class_pair = class_pair.as_seq().unwrap();
        let text_pair = text_pair.as_seq().unwrap();
        assert_eq!(class_pair[0], Value::from(name));
        assert_eq!(text_pair[0], Value::from(name));
        assert_eq!(class_pair[1].kind_name(), "map");
        assert_eq!(text_pair[1].kind_name(), "str");
    }
    assert_eq!(format.decode_with::<BTreeMap<String, Point>>(&class_map, class_tree).unwrap(), named);
    assert_eq!(format.decode_with::<BTreeMap<String, Point>>(&text_map, text_tree).unwrap(), named);
}

// -----------------------------------------------------------------------------
// Malformed trees

#[test]
fn malformed_trees_are_rejected() {
    let format = TreeFormat::new(point_registry());

    let unknown = Value::Map(vec![
        entry("x", Value::Int(1)),
        entry("y", Value::Int(2)),
        entry("z", Value::Int(3)),
    ]);
    assert!(matches!(
        format.decode::<Point>(unknown.clone()),
        Err(TreeError::UnknownKey { ref key, .. }) if key == "z"
    ));
    let lenient = TreeFormat::new(point_registry())
        .with_config(TreeConfig::default().with_ignore_unknown_keys(true));
    assert_eq!(lenient.decode::<Point>(unknown).unwrap(), Point { x: 1, y: 2 });

    let duplicate = Value::Map(vec![entry("x", Value::Int(1)), entry("x", Value::Int(2))]);
    assert!(matches!(
        format.decode::<Point>(duplicate),
        Err(TreeError::DuplicateKey { .. })
    ));

    let missing = Value::Map(vec![entry("x", Value::Int(1))]);
    let err = format.decode::<Point>(missing).unwrap_err();
    assert!(err.is_missing_element());
    assert_eq!(err.to_string(), "element `y` of `demo::Point` is missing");

    let wide = Value::Map(vec![entry("x", Value::Int(1)), entry("y", Value::UInt(u64::MAX))]);
    assert!(matches!(
        format.decode::<Point>(wide),
        Err(TreeError::OutOfRange { .. })
    ));

    assert!(matches!(
        format.decode::<Point>(Value::Seq(vec![])),
        Err(TreeError::KindMismatch { expected: "map", found: "seq", .. })
    ));
    assert!(matches!(
        format.decode::<Color>(Value::from("Purple")),
        Err(TreeError::UnknownVariant { .. })
    ));
}

#[test]
fn positional_length_is_checked() {
    let format = TreeFormat::new(point_registry()).with_config(TreeConfig::positional());

    let short = Value::Seq(vec![Value::Int(1)]);
    assert!(matches!(
        format.decode::<Point>(short),
        Err(TreeError::UnexpectedEnd { .. })
    ));

    let long = Value::Seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert!(matches!(
        format.decode::<Point>(long),
        Err(TreeError::TrailingElements { count: 1, .. })
    ));
}

// -----------------------------------------------------------------------------
// Merge

#[test]
fn merge_without_override_fails() {
    let format = TreeFormat::new(point_registry());
    let tree = Value::Map(vec![entry("x", Value::Int(5))]);
    let err = format.merge(tree, Point { x: 0, y: 0 }).unwrap_err();
    assert!(matches!(
        err,
        TreeError::Serial(SerialError::UnsupportedMerge { ref type_name }) if type_name == "demo::Point"
    ));
}

#[test]
fn merge_with_overrides() {
    let format = TreeFormat::new(Arc::new(SerialRegistry::new()));
    let patch = Value::Map(vec![
        entry("volume", Value::UInt(20)),
        entry("tags", Value::Seq(vec![Value::from("ranked")])),
        entry(
            "limits",
            Value::Seq(vec![
                Value::Seq(vec![Value::from("players"), Value::UInt(32)]),
                Value::Seq(vec![Value::from("teams"), Value::UInt(2)]),
            ]),
        ),
        entry("nick", Value::from("ace")),
    ]);

    let merged = format.merge(patch, settings()).unwrap();
    assert_eq!(merged.name, "arena");
    assert_eq!(merged.volume, 20);
    assert_eq!(merged.tags, ["pvp", "night", "ranked"]);
    assert_eq!(merged.limits["players"], 32);
    assert_eq!(merged.limits["rounds"], 3);
    assert_eq!(merged.limits["teams"], 2);
    assert_eq!(merged.nick.as_deref(), Some("ace"));
    assert_eq!(merged.color, Color::Green);
}

// -----------------------------------------------------------------------------
// Registries

#[test]
fn point_resolves_after_registration() {
    let mut registry = SerialRegistry::new();
    let format = TreeFormat::new(Arc::new(registry.clone()));
    let err = format.encode(&Point { x: 1, y: 2 }).unwrap_err();
    assert!(matches!(
        err,
        TreeError::Serial(SerialError::Resolve(ResolveError::NotFound { type_name }))
            if type_name == core::any::type_name::<Point>()
    ));

    registry.register::<Point>(Arc::new(PointSerializer)).unwrap();
    let format = TreeFormat::new(Arc::new(registry));
    let tree = format.encode(&Point { x: 1, y: 2 }).unwrap();
    assert_eq!(
        tree,
        Value::Map(vec![entry("x", Value::Int(1)), entry("y", Value::Int(2))])
    );
    assert_eq!(
        format.serializer::<Point>().unwrap().descriptor().name(),
        "demo::Point"
    );
}

#[test]
fn base_and_child_registries() {
    struct Label(String);
    impl SerialType for Label {}

    struct LabelSerializer;
    impl Serializer<Label> for LabelSerializer {
        fn descriptor(&self) -> &Arc<TypeDescriptor> {
            static CELL: DescriptorCell = DescriptorCell::new();
            CELL.get_or_init(|| Arc::new(TypeDescriptor::primitive("demo::Label", PrimitiveKind::Str)))
        }
        fn save(&self, encoder: &mut dyn Encoder, value: &Label) -> Result<(), SerialError> {
            encoder.encode_primitive(value.0.as_primitive())
        }
        fn load(&self, decoder: &mut dyn Decoder) -> Result<Label, SerialError> {
            PrimitiveSerializer::<String>::new().load(decoder).map(Label)
        }
    }

    let mut base = SerialRegistry::new();
    base.register::<Point>(Arc::new(PointSerializer)).unwrap();
    let base = Arc::new(base);

    let mut child = SerialRegistry::with_parent(base.clone());
    child.register::<Label>(Arc::new(LabelSerializer)).unwrap();

    let base_format = TreeFormat::new(base);
    let child_format = TreeFormat::new(Arc::new(child));

    assert!(child_format.encode(&Point { x: 0, y: 0 }).is_ok());
    assert_eq!(
        child_format.encode(&Label("hi".to_string())).unwrap(),
        Value::from("hi")
    );
    assert!(matches!(
        base_format.encode(&Label("hi".to_string())),
        Err(TreeError::Serial(SerialError::Resolve(ResolveError::NotFound { .. })))
    ));
}

#[test]
fn formats_share_across_threads() {
    let format = TreeFormat::new(point_registry());
    let points: Vec<Point> = (0..8).map(|i| Point { x: i, y: -i }).collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = points
            .iter()
            .map(|point| {
                let format = &format;
                scope.spawn(move || {
                    let tree = format.encode(point).unwrap();
                    format.decode::<Point>(tree).unwrap()
                })
            })
            .collect();
        for (handle, point) in handles.into_iter().zip(&points) {
            assert_eq!(handle.join().unwrap(), *point);
        }
    });
}

// -----------------------------------------------------------------------------
// Polymorphic values

#[test]
fn polymorphic_round_trip() {
    let format = TreeFormat::new(point_registry());
    let value = DynValue::new(Point { x: 3, y: 4 });

    let tree = format.encode(&value).unwrap();
    assert_eq!(tree.get("type"), Some(&Value::from("demo::Point")));
    assert_eq!(
        tree.get("value"),
        Some(&Value::Map(vec![entry("x", Value::Int(3)), entry("y", Value::Int(4))]))
    );

    let back = format.decode::<DynValue>(tree).unwrap();
    assert_eq!(back.downcast_ref::<Point>(), Some(&Point { x: 3, y: 4 }));

    // Primitives are bound under their type names.
    let tree = format.encode(&DynValue::new(7_u16)).unwrap();
    assert_eq!(format.decode::<DynValue>(tree).unwrap().downcast::<u16>().ok(), Some(7));
}

#[test]
fn polymorphic_type_key_and_layout() {
    let format = TreeFormat::new(point_registry())
        .with_config(TreeConfig::default().with_type_key("@type"));
    let tree = format.encode(&DynValue::new(Point { x: 1, y: 1 })).unwrap();
    assert_eq!(tree.get("@type"), Some(&Value::from("demo::Point")));
    assert_eq!(tree.get("type"), None);
    assert!(format.decode::<DynValue>(tree).unwrap().is::<Point>());

    let positional = TreeFormat::new(point_registry()).with_config(TreeConfig::positional());
    let tree = positional.encode(&DynValue::new(true)).unwrap();
    assert_eq!(tree, Value::Seq(vec![Value::from("bool"), Value::Bool(true)]));
    assert_eq!(positional.decode::<DynValue>(tree).unwrap().downcast::<bool>().ok(), Some(true));
}

#[test]
fn polymorphic_failures() {
    let format = TreeFormat::new(point_registry());

    struct Unbound;
    assert!(matches!(
        format.encode(&DynValue::new(Unbound)),
        Err(TreeError::Serial(SerialError::Resolve(ResolveError::NotFound { type_name })))
            if type_name == core::any::type_name::<Unbound>()
    ));

    let unknown = Value::Map(vec![entry("type", Value::from("demo::Gone")), entry("value", Value::Null)]);
    assert!(matches!(
        format.decode::<DynValue>(unknown),
        Err(TreeError::Serial(SerialError::UnknownSerialName(ref name))) if name == "demo::Gone"
    ));

    let reversed = Value::Map(vec![
        entry("value", Value::Int(1)),
        entry("type", Value::from("i32")),
    ]);
    let err = format.decode::<DynValue>(reversed).unwrap_err();
    assert!(err.to_string().contains("`type` must precede `value`"));
    #[cfg(all(debug_assertions, feature = "debug"))]
    assert!(err.to_string().contains("(stack:\n`vc_serialize::serializer::DynValue`"));
}

#[test]
fn serial_names_identify_one_type() {
    let mut registry = SerialRegistry::new();
    registry.register::<Point>(Arc::new(PointSerializer)).unwrap();

    // `Box<Point>` reuses the descriptor of `Point`, so its default name is taken.
    let boxed: SerializerRef<Box<Point>> =
        Arc::new(BoxSerializer::<Point>::new(Arc::new(PointSerializer)));
    assert!(matches!(
        registry.register::<Box<Point>>(boxed.clone()),
        Err(RegistryError::NameTaken { ref name, .. }) if name == "demo::Point"
    ));
    registry
        .register_named::<Box<Point>>("demo::BoxedPoint", boxed)
        .unwrap();

    let format = TreeFormat::new(Arc::new(registry));
    let point = Point { x: 1, y: 2 };

    let tree = format.encode(&DynValue::new(point)).unwrap();
    assert_eq!(tree.get("type"), Some(&Value::from("demo::Point")));
    assert!(format.decode::<DynValue>(tree).unwrap().is::<Point>());

    let tree = format.encode(&DynValue::new(Box::new(point))).unwrap();
    assert_eq!(tree.get("type"), Some(&Value::from("demo::BoxedPoint")));
    let back = format.decode::<DynValue>(tree).unwrap();
    assert_eq!(back.downcast::<Box<Point>>().ok().map(|p| *p), Some(point));
}

#[test]
fn names_hidden_by_a_later_parent_are_not_written() {
    let mut base = SerialRegistry::new();
    base.register_named::<Point>("shape", Arc::new(PointSerializer))
        .unwrap();
    let base = Arc::new(base);

    // Registered before the parent is attached, so nothing rejects the name.
    let mut child = SerialRegistry::empty();
    child
        .register_named::<u32>("shape", Arc::new(PrimitiveSerializer::<u32>::new()))
        .unwrap();
    child.set_parent(Some(base)).unwrap();
    let format = TreeFormat::new(Arc::new(child));

    let err = format.encode(&DynValue::new(Point { x: 1, y: 2 })).unwrap_err();
    assert!(matches!(
        err,
        TreeError::Serial(SerialError::AmbiguousSerialName { ref name, type_name })
            if name == "shape" && type_name == core::any::type_name::<Point>()
    ));

    let tree = format.encode(&DynValue::new(5_u32)).unwrap();
    assert_eq!(format.decode::<DynValue>(tree).unwrap().downcast::<u32>().ok(), Some(5));
}

// -----------------------------------------------------------------------------
// Recursive types

#[derive(Debug, Clone, PartialEq)]
struct Node {
    value: i32,
    children: Vec<Node>,
}

struct NodeSerializer {
    children: SerializerRef<Vec<Node>>,
}

fn node_list_serializer() -> SerializerRef<Vec<Node>> {
    static CELL: SerializerCell<Vec<Node>> = SerializerCell::new();
    CELL.get_or_init(|| {
        Arc::new(ListSerializer::new(Arc::new(LazySerializer::new(node_serializer))))
    })
}

fn node_serializer() -> SerializerRef<Node> {
    static CELL: SerializerCell<Node> = SerializerCell::new();
    CELL.get_or_init(|| {
        Arc::new(NodeSerializer {
            children: node_list_serializer(),
        })
    })
}

impl SerialType for Node {
    fn default_serializer(_: &Resolver<'_>) -> Result<Option<SerializerRef<Self>>, ResolveError> {
        Ok(Some(node_serializer()))
    }
}

impl Serializer<Node> for NodeSerializer {
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        static CELL: DescriptorCell = DescriptorCell::new();
        CELL.get_or_init(|| {
            TypeDescriptor::builder("demo::Node", TypeKind::Class)
                .element("value", i32::descriptor().clone())
                .deferred_element(
                    "children",
                    || node_list_serializer().descriptor().clone(),
                    false,
                )
                .build_arc()
        })
    }

    fn save(&self, encoder: &mut dyn Encoder, value: &Node) -> Result<(), SerialError> {
        encode_structure(encoder, self.descriptor(), |s| {
            s.write_primitive(0, &value.value)?;
            s.write_element(1, &*self.children, &value.children)
        })
    }

    fn load(&self, decoder: &mut dyn Decoder) -> Result<Node, SerialError> {
        decode_structure(decoder, self.descriptor(), |s| {
            let (mut value, mut children) = (None, None);
            s.for_each_index(|s, index| {
                match index {
                    0 => value = Some(s.read_primitive::<i32>(index)?),
                    1 => children = Some(s.read_element(index, &*self.children)?),
                    _ => return Err(s.unknown_element(index)),
                }
                Ok(())
            })?;
            Ok(Node {
                value: value.ok_or_else(|| s.missing_element(0))?,
                children: children.ok_or_else(|| s.missing_element(1))?,
            })
        })
    }
}

fn leaf(value: i32) -> Node {
    Node {
        value,
        children: Vec::new(),
    }
}

#[test]
fn recursive_type_through_lazy_serializer() {
    let format = TreeFormat::new(Arc::new(SerialRegistry::empty()));
    let root = Node {
        value: 1,
        children: vec![
            Node {
                value: 2,
                children: vec![leaf(3)],
            },
            leaf(4),
        ],
    };

    let tree = format.encode(&root).unwrap();
    assert_eq!(
        tree.get("children").and_then(Value::as_seq).map(<[Value]>::len),
        Some(2)
    );
    assert_eq!(format.decode::<Node>(tree).unwrap(), root);

    let descriptor = node_serializer().descriptor().clone();
    let children = descriptor.element(1).unwrap().descriptor();
    assert_eq!(children.kind(), TypeKind::List);
    assert!(Arc::ptr_eq(&children.element(0).unwrap().descriptor(), &descriptor));
}

// -----------------------------------------------------------------------------
// Static registration

#[derive(Debug, Clone, Copy, PartialEq)]
struct Celsius(f64);

impl SerialType for Celsius {}

struct CelsiusSerializer;

impl Serializer<Celsius> for CelsiusSerializer {
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        static CELL: DescriptorCell = DescriptorCell::new();
        CELL.get_or_init(|| Arc::new(TypeDescriptor::primitive("demo::Celsius", PrimitiveKind::F64)))
    }

    fn save(&self, encoder: &mut dyn Encoder, value: &Celsius) -> Result<(), SerialError> {
        encoder.encode_primitive(PrimitiveRef::F64(value.0))
    }

    fn load(&self, decoder: &mut dyn Decoder) -> Result<Celsius, SerialError> {
        PrimitiveSerializer::<f64>::new().load(decoder).map(Celsius)
    }
}

vc_serialize::auto_register!(Celsius => Arc::new(CelsiusSerializer));

#[test]
fn auto_registered_serializers() {
    let mut registry = SerialRegistry::empty();
    if !registry.auto_register() {
        return;
    }
    assert_eq!(registry.serial_name::<Celsius>(), Some("demo::Celsius"));

    let format = TreeFormat::new(Arc::new(registry));
    let tree = format.encode(&Celsius(21.5)).unwrap();
    assert_eq!(tree, Value::Float(21.5));
    assert_eq!(format.decode::<Celsius>(tree).unwrap(), Celsius(21.5));
}
