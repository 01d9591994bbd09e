//! Shared fixture for the integration tests: a small zoo of native types
//! registered with the synthetic introspector.

#![allow(dead_code)]

use std::sync::Arc;

use hostbridge::synthetic::{
    ConstructorBuilder, FieldBuilder, MethodBuilder, SyntheticIntrospector, SyntheticObject, TypeBuilder,
};
use hostbridge::{
    Bridge, BridgeConfig, BridgeError, BridgeResult, DirectHost, MemberFlags, NativeArray, NativeEnumConstant,
    NativeValue, NumericKind, OverloadSet, TypeDescriptor, well_known,
};

/// Route bridge logs to the test output; `RUST_LOG` filters them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn int() -> TypeDescriptor {
    TypeDescriptor::numeric(NumericKind::Int)
}

pub fn long() -> TypeDescriptor {
    TypeDescriptor::numeric(NumericKind::Long)
}

pub fn list_of(element: TypeDescriptor) -> TypeDescriptor {
    TypeDescriptor::parameterized(TypeDescriptor::interface(well_known::LIST_NAME, false), vec![element])
}

pub fn map_of(key: TypeDescriptor, value: TypeDescriptor) -> TypeDescriptor {
    TypeDescriptor::parameterized(TypeDescriptor::interface(well_known::MAP_NAME, false), vec![key, value])
}

/// The registered types and a bridge over them.
pub struct Zoo {
    pub bridge: Arc<Bridge>,
    pub color: TypeDescriptor,
    pub shape: TypeDescriptor,
    pub animal: TypeDescriptor,
    pub dog: TypeDescriptor,
    pub vault: TypeDescriptor,
    pub keeper: TypeDescriptor,
    pub label: TypeDescriptor,
}

impl Zoo {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        init_tracing();
        let intro = SyntheticIntrospector::with_standard_types();
        let [color, shape, animal, dog, vault, keeper, label] = register(&intro);
        let bridge = Bridge::new(Arc::new(intro), Arc::new(DirectHost::default()), config);
        Zoo {
            bridge,
            color,
            shape,
            animal,
            dog,
            vault,
            keeper,
            label,
        }
    }

    /// A native animal of type `ty` named `name`.
    pub fn animal_named(&self, ty: &TypeDescriptor, name: &str) -> NativeValue {
        NativeValue::object(
            SyntheticObject::new(ty)
                .with_field("name", NativeValue::string(name))
                .with_field("legs", NativeValue::Int(4))
                .with_display(name),
        )
    }

    pub fn methods(&self, ty: &TypeDescriptor, name: &str, is_static: bool) -> Arc<OverloadSet> {
        let id = ty.type_id().expect("fixture types are named");
        let entry = self.bridge.lookup_members(id, None, false).expect("fixture types are known");
        entry.methods(name, is_static).expect("fixture method exists").clone()
    }
}

fn object_of<'a>(this: Option<&'a NativeValue>, member: &str) -> BridgeResult<&'a SyntheticObject> {
    this.and_then(|value| value.downcast_ref::<SyntheticObject>())
        .ok_or_else(|| BridgeError::native(member, "no receiver"))
}

/// - `demo.Color { RED, GREEN, BLUE }`
/// - `demo.Shape { double area() }`
/// - `demo.Animal`: `name`, final `legs`, an `age` bean, `speak()`,
///   `feed(int)`/`feed(long)`, static `census(int...)`, static `COUNT`
/// - `demo.Dog extends Animal`, overriding `speak()`
/// - `demo.Vault extends Animal`, closed to reflection
/// - `demo.Keeper`: static `paint(Color)`, `measure(Shape)`,
///   `describe(Object)`/`describe(String)`, `tally(Number)`/`tally(String)`
/// - `demo.Box<T> { T get() }` and `demo.Label extends Box<String>`
fn register(intro: &SyntheticIntrospector) -> [TypeDescriptor; 7] {
    let string = TypeDescriptor::string();
    let double = TypeDescriptor::numeric(NumericKind::Double);

    let color = intro.register(TypeBuilder::enumeration("demo.Color", &["RED", "GREEN", "BLUE"]));
    let shape = intro.register(
        TypeBuilder::interface("demo.Shape").method(
            MethodBuilder::new("area")
                .returns(double.clone())
                .flags(MemberFlags::ABSTRACT),
        ),
    );

    let animal_builder = TypeBuilder::class("demo.Animal");
    let animal_ty = animal_builder.descriptor();
    let animal = intro.register(
        animal_builder
            .field(FieldBuilder::new("name", string.clone()))
            .field(FieldBuilder::new("legs", int()).flags(MemberFlags::FINAL))
            .field(
                FieldBuilder::new("COUNT", int())
                    .flags(MemberFlags::STATIC)
                    .initial(NativeValue::Int(0)),
            )
            .method(MethodBuilder::new("getAge").returns(int()).invoke(|this, _| {
                Ok(object_of(this, "getAge")?.field("age").unwrap_or(NativeValue::Int(0)))
            }))
            .method(MethodBuilder::new("setAge").param(int()).invoke(|this, args| {
                object_of(this, "setAge")?.set_field("age", args[0].clone());
                Ok(NativeValue::Void)
            }))
            .method(
                MethodBuilder::new("speak")
                    .returns(string.clone())
                    .returning(NativeValue::string("...")),
            )
            .method(
                MethodBuilder::new("feed")
                    .param(int())
                    .returns(string.clone())
                    .returning(NativeValue::string("int")),
            )
            .method(
                MethodBuilder::new("feed")
                    .param(long())
                    .returns(string.clone())
                    .returning(NativeValue::string("long")),
            )
            .method(
                MethodBuilder::new("census")
                    .param(TypeDescriptor::array(int()))
                    .returns(int())
                    .flags(MemberFlags::STATIC | MemberFlags::VARARGS)
                    .invoke(|_, args| {
                        let counts = args[0]
                            .downcast_ref::<NativeArray>()
                            .ok_or_else(|| BridgeError::native("census", "expected an array"))?;
                        let total: f64 = counts.to_vec().iter().filter_map(NativeValue::as_f64).sum();
                        Ok(NativeValue::Int(total as i32))
                    }),
            )
            .constructor(ConstructorBuilder::new().param(string.clone()).invoke(move |_, args| {
                Ok(NativeValue::object(
                    SyntheticObject::new(&animal_ty)
                        .with_field("name", args[0].clone())
                        .with_field("legs", NativeValue::Int(4)),
                ))
            })),
    );

    let dog = intro.register(
        TypeBuilder::class("demo.Dog").extends(animal.clone()).method(
            MethodBuilder::new("speak")
                .returns(string.clone())
                .returning(NativeValue::string("woof")),
        ),
    );
    let vault = intro.register(TypeBuilder::class("demo.Vault").extends(animal.clone()).deny_access());

    let keeper = intro.register(
        TypeBuilder::class("demo.Keeper")
            .method(
                MethodBuilder::new("paint")
                    .param(color.clone())
                    .returns(string.clone())
                    .flags(MemberFlags::STATIC)
                    .invoke(|_, args| {
                        let constant = args[0]
                            .downcast_ref::<NativeEnumConstant>()
                            .ok_or_else(|| BridgeError::native("paint", "expected a color"))?;
                        Ok(NativeValue::String(constant.name.clone()))
                    }),
            )
            .method(
                MethodBuilder::new("measure")
                    .param(shape.clone())
                    .returns(double)
                    .flags(MemberFlags::STATIC)
                    .invoke(|_, args| {
                        let shape = args[0]
                            .as_object()
                            .ok_or_else(|| BridgeError::native("measure", "expected a shape"))?;
                        shape.get().invoke_method("area", &[])
                    }),
            )
            .method(
                MethodBuilder::new("describe")
                    .param(TypeDescriptor::object())
                    .returns(string.clone())
                    .flags(MemberFlags::STATIC)
                    .returning(NativeValue::string("object")),
            )
            .method(
                MethodBuilder::new("describe")
                    .param(string.clone())
                    .returns(string.clone())
                    .flags(MemberFlags::STATIC)
                    .returning(NativeValue::string("string")),
            )
            .method(
                MethodBuilder::new("tally")
                    .param(TypeDescriptor::plain(well_known::NUMBER_NAME))
                    .returns(string.clone())
                    .flags(MemberFlags::STATIC)
                    .returning(NativeValue::string("number")),
            )
            .method(
                MethodBuilder::new("tally")
                    .param(string.clone())
                    .returns(string.clone())
                    .flags(MemberFlags::STATIC)
                    .returning(NativeValue::string("string")),
            ),
    );

    let box_builder = TypeBuilder::class("demo.Box").type_param("T");
    let t = box_builder.var("T");
    let boxed = intro.register(box_builder.method(MethodBuilder::new("get").returns(t).returning(NativeValue::Null)));
    let label = intro.register(
        TypeBuilder::class("demo.Label").extends(TypeDescriptor::parameterized(boxed, vec![string])),
    );

    [color, shape, animal, dog, vault, keeper, label]
}
