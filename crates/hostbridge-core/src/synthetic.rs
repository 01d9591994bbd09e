//! An in-memory [`NativeTypeIntrospector`].
//!
//! Types are described with [`TypeBuilder`], [`MethodBuilder`],
//! [`FieldBuilder`] and [`ConstructorBuilder`] and registered on a
//! [`SyntheticIntrospector`]. Members are backed by closures. Fields default to
//! storage on [`SyntheticObject`] instances (or a shared cell for statics).
//!
//! [`SyntheticIntrospector::with_standard_types`] pre-registers the built-in
//! types the bridge treats specially (`Object`, `String`, `Number`,
//! `Collection`, `List`, `Set`, `Map`, ...) with members operating on the
//! native container kinds of this crate.
//!
//! # Example
//!
//! ```
//! use hostbridge_core::synthetic::{MethodBuilder, SyntheticIntrospector, TypeBuilder};
//! use hostbridge_core::{NativeTypeIntrospector, NativeValue, TypeDescriptor, TypeHash};
//!
//! let intro = SyntheticIntrospector::with_standard_types();
//! intro.register(
//!     TypeBuilder::class("demo.Greeter").method(
//!         MethodBuilder::new("greet")
//!             .returns(TypeDescriptor::string())
//!             .invoke(|_, _| Ok(NativeValue::string("hello"))),
//!     ),
//! );
//! let methods = intro.declared_methods(TypeHash::from_name("demo.Greeter")).unwrap();
//! assert_eq!(&*methods[0].name, "greet");
//! ```

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::descriptor::{NumericKind, TypeDescriptor, TypeRef, TypeVariable};
use crate::error::{BridgeError, BridgeResult, IntrospectionError};
use crate::introspect::{
    ConstructorInfo, FieldHandle, FieldInfo, MemberFlags, MethodInfo, NativeInvoker, NativeTypeInfo,
    NativeTypeIntrospector, NativeTypeKind,
};
use crate::native::{NativeClassRef, NativeEnumConstant, NativeList, NativeMap, NativeObject, NativeValue};
use crate::type_hash::{TypeHash, well_known};

// ============================================================================
// Introspector
// ============================================================================

#[derive(Clone)]
struct SyntheticType {
    info: Arc<NativeTypeInfo>,
    methods: Vec<MethodInfo>,
    fields: Vec<FieldInfo>,
    constructors: Vec<ConstructorInfo>,
    access_denied: bool,
}

/// Introspector over programmatically registered types.
#[derive(Default)]
pub struct SyntheticIntrospector {
    types: RwLock<FxHashMap<TypeHash, SyntheticType>>,
}

impl SyntheticIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    /// An introspector with the built-in types pre-registered.
    pub fn with_standard_types() -> Self {
        let intro = Self::new();
        register_standard_types(&intro);
        intro
    }

    /// Register (or replace) a type, returning its descriptor.
    pub fn register(&self, builder: TypeBuilder) -> TypeDescriptor {
        let descriptor = builder.descriptor();
        let id = builder.info.ty.id;
        let mut methods: Vec<MethodInfo> = builder.methods.into_iter().map(|m| m.build(id)).collect();
        let mut fields: Vec<FieldInfo> = builder.fields.into_iter().map(|f| f.build(id)).collect();

        if builder.info.kind == NativeTypeKind::Enum {
            add_enum_members(&builder.info, &descriptor, &mut methods, &mut fields);
        }

        let constructors = builder.constructors.into_iter().map(|c| c.build(id)).collect();
        self.types.write().insert(
            id,
            SyntheticType {
                info: Arc::new(builder.info),
                methods,
                fields,
                constructors,
                access_denied: builder.access_denied,
            },
        );
        descriptor
    }

    /// Make member reflection on `id` fail with `AccessDenied`.
    pub fn deny_access(&self, id: TypeHash) {
        if let Some(ty) = self.types.write().get_mut(&id) {
            ty.access_denied = true;
        }
    }

    fn with_type<T>(
        &self,
        id: TypeHash,
        read: impl FnOnce(&SyntheticType) -> T,
    ) -> Result<T, IntrospectionError> {
        let types = self.types.read();
        let ty = types.get(&id).ok_or_else(|| IntrospectionError::UnknownType {
            type_name: id.to_string(),
        })?;
        if ty.access_denied {
            return Err(IntrospectionError::AccessDenied {
                type_name: ty.info.ty.name.to_string(),
            });
        }
        Ok(read(ty))
    }
}

impl NativeTypeIntrospector for SyntheticIntrospector {
    fn type_info(&self, id: TypeHash) -> Option<Arc<NativeTypeInfo>> {
        self.types.read().get(&id).map(|ty| ty.info.clone())
    }

    fn declared_methods(&self, id: TypeHash) -> Result<Vec<MethodInfo>, IntrospectionError> {
        self.with_type(id, |ty| ty.methods.clone())
    }

    fn declared_fields(&self, id: TypeHash) -> Result<Vec<FieldInfo>, IntrospectionError> {
        self.with_type(id, |ty| ty.fields.clone())
    }

    fn declared_constructors(&self, id: TypeHash) -> Result<Vec<ConstructorInfo>, IntrospectionError> {
        self.with_type(id, |ty| ty.constructors.clone())
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Describes one native type.
pub struct TypeBuilder {
    info: NativeTypeInfo,
    methods: Vec<MethodBuilder>,
    fields: Vec<FieldBuilder>,
    constructors: Vec<ConstructorBuilder>,
    bounds: FxHashMap<Arc<str>, TypeDescriptor>,
    access_denied: bool,
}

impl TypeBuilder {
    fn new(name: &str, kind: NativeTypeKind, functional: bool) -> Self {
        Self {
            info: NativeTypeInfo {
                ty: TypeRef::new(name),
                kind,
                flags: MemberFlags::PUBLIC,
                type_params: Vec::new(),
                superclass: None,
                interfaces: Vec::new(),
                enum_constants: Vec::new(),
                functional,
            },
            methods: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            bounds: FxHashMap::default(),
            access_denied: false,
        }
    }

    pub fn class(name: &str) -> Self {
        Self::new(name, NativeTypeKind::Class, false)
    }

    pub fn interface(name: &str) -> Self {
        Self::new(name, NativeTypeKind::Interface, false)
    }

    /// An interface with a single abstract method.
    pub fn functional_interface(name: &str) -> Self {
        Self::new(name, NativeTypeKind::Interface, true)
    }

    pub fn enumeration(name: &str, constants: &[&str]) -> Self {
        let mut builder = Self::new(name, NativeTypeKind::Enum, false);
        builder.info.flags |= MemberFlags::FINAL;
        builder.info.enum_constants = constants.iter().map(|c| Arc::from(*c)).collect();
        builder
    }

    /// Declare a type parameter bounded by `Object`.
    pub fn type_param(self, name: &str) -> Self {
        self.bounded_type_param(name, TypeDescriptor::object())
    }

    pub fn bounded_type_param(mut self, name: &str, bound: TypeDescriptor) -> Self {
        self.info.type_params.push(TypeVariable::new(self.info.ty.id, name));
        self.bounds.insert(Arc::from(name), bound);
        self
    }

    /// Descriptor of a type parameter of this type, usable in member
    /// signatures.
    pub fn var(&self, name: &str) -> TypeDescriptor {
        let bound = self.bounds.get(name).cloned().unwrap_or_else(TypeDescriptor::object);
        TypeDescriptor::variable(TypeVariable::new(self.info.ty.id, name), bound)
    }

    pub fn extends(mut self, superclass: TypeDescriptor) -> Self {
        self.info.superclass = Some(superclass);
        self
    }

    pub fn implements(mut self, interface: TypeDescriptor) -> Self {
        self.info.interfaces.push(interface);
        self
    }

    pub fn flags(mut self, flags: MemberFlags) -> Self {
        self.info.flags |= flags;
        self
    }

    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.methods.push(method);
        self
    }

    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.fields.push(field);
        self
    }

    pub fn constructor(mut self, constructor: ConstructorBuilder) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Member reflection on this type fails with `AccessDenied`.
    pub fn deny_access(mut self) -> Self {
        self.access_denied = true;
        self
    }

    pub fn id(&self) -> TypeHash {
        self.info.ty.id
    }

    pub fn descriptor(&self) -> TypeDescriptor {
        self.info.descriptor()
    }
}

/// Describes one method.
pub struct MethodBuilder {
    name: Arc<str>,
    params: Vec<TypeDescriptor>,
    return_type: TypeDescriptor,
    flags: MemberFlags,
    invoker: Option<Arc<dyn NativeInvoker>>,
    accessible: bool,
}

impl MethodBuilder {
    /// A public method returning `void`.
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            params: Vec::new(),
            return_type: TypeDescriptor::void(),
            flags: MemberFlags::PUBLIC,
            invoker: None,
            accessible: true,
        }
    }

    pub fn param(mut self, ty: TypeDescriptor) -> Self {
        self.params.push(ty);
        self
    }

    pub fn returns(mut self, ty: TypeDescriptor) -> Self {
        self.return_type = ty;
        self
    }

    pub fn flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn protected(mut self) -> Self {
        self.flags.remove(MemberFlags::PUBLIC);
        self.flags |= MemberFlags::PROTECTED;
        self
    }

    pub fn invoke<F>(mut self, body: F) -> Self
    where
        F: Fn(Option<&NativeValue>, &[NativeValue]) -> BridgeResult<NativeValue> + Send + Sync + 'static,
    {
        self.invoker = Some(Arc::new(body));
        self
    }

    /// Always return a clone of `value`.
    pub fn returning(self, value: NativeValue) -> Self {
        self.invoke(move |_, _| Ok(value.clone()))
    }

    /// The host cannot provide an invocation handle for this method.
    pub fn inaccessible(mut self) -> Self {
        self.accessible = false;
        self
    }

    fn build(self, declaring: TypeHash) -> MethodInfo {
        let invoker = match (self.accessible, self.invoker) {
            (false, _) => None,
            (true, Some(invoker)) => Some(invoker),
            // abstract methods dispatch on the receiver
            (true, None) if self.flags.contains(MemberFlags::ABSTRACT) => {
                Some(Arc::new(VirtualDispatch { name: self.name.clone() }) as Arc<dyn NativeInvoker>)
            }
            (true, None) => {
                let name = self.name.clone();
                Some(Arc::new(move |_: Option<&NativeValue>, _: &[NativeValue]| {
                    Err(BridgeError::native(name.to_string(), "no implementation"))
                }) as Arc<dyn NativeInvoker>)
            }
        };
        MethodInfo {
            name: self.name,
            declaring,
            params: self.params,
            return_type: self.return_type,
            flags: self.flags,
            invoker,
        }
    }
}

/// Calls `invoke_method` on the receiver.
struct VirtualDispatch {
    name: Arc<str>,
}

impl NativeInvoker for VirtualDispatch {
    fn invoke(&self, this: Option<&NativeValue>, args: &[NativeValue]) -> BridgeResult<NativeValue> {
        match this.and_then(NativeValue::as_object) {
            Some(receiver) => receiver.get().invoke_method(&self.name, args),
            None => Err(BridgeError::native(self.name.to_string(), "abstract method called without receiver")),
        }
    }
}

/// Describes one field.
pub struct FieldBuilder {
    name: Arc<str>,
    field_type: TypeDescriptor,
    flags: MemberFlags,
    handle: Option<Arc<dyn FieldHandle>>,
    initial: Option<NativeValue>,
    accessible: bool,
}

impl FieldBuilder {
    /// A public instance field stored on [`SyntheticObject`] receivers.
    pub fn new(name: &str, field_type: TypeDescriptor) -> Self {
        Self {
            name: Arc::from(name),
            field_type,
            flags: MemberFlags::PUBLIC,
            handle: None,
            initial: None,
            accessible: true,
        }
    }

    pub fn flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn protected(mut self) -> Self {
        self.flags.remove(MemberFlags::PUBLIC);
        self.flags |= MemberFlags::PROTECTED;
        self
    }

    /// Initial value of a static field.
    pub fn initial(mut self, value: NativeValue) -> Self {
        self.initial = Some(value);
        self
    }

    pub fn handle(mut self, handle: Arc<dyn FieldHandle>) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn inaccessible(mut self) -> Self {
        self.accessible = false;
        self
    }

    fn build(self, declaring: TypeHash) -> FieldInfo {
        let default = self
            .initial
            .clone()
            .unwrap_or_else(|| NativeValue::default_for(&self.field_type));
        let handle = match (self.accessible, self.handle) {
            (false, _) => None,
            (true, Some(handle)) => Some(handle),
            (true, None) if self.flags.is_static() => {
                Some(Arc::new(StaticCell(RwLock::new(default))) as Arc<dyn FieldHandle>)
            }
            (true, None) => Some(Arc::new(StoredField {
                name: self.name.clone(),
                default,
            }) as Arc<dyn FieldHandle>),
        };
        FieldInfo {
            name: self.name,
            declaring,
            field_type: self.field_type,
            flags: self.flags,
            handle,
        }
    }
}

struct StaticCell(RwLock<NativeValue>);

impl FieldHandle for StaticCell {
    fn get(&self, _this: Option<&NativeValue>) -> BridgeResult<NativeValue> {
        Ok(self.0.read().clone())
    }

    fn set(&self, _this: Option<&NativeValue>, value: NativeValue) -> BridgeResult<()> {
        *self.0.write() = value;
        Ok(())
    }
}

struct StoredField {
    name: Arc<str>,
    default: NativeValue,
}

impl StoredField {
    fn receiver<'a>(&self, this: Option<&'a NativeValue>) -> BridgeResult<&'a SyntheticObject> {
        this.and_then(|v| v.downcast_ref::<SyntheticObject>())
            .ok_or_else(|| BridgeError::native(self.name.to_string(), "receiver has no field storage"))
    }
}

impl FieldHandle for StoredField {
    fn get(&self, this: Option<&NativeValue>) -> BridgeResult<NativeValue> {
        let receiver = self.receiver(this)?;
        Ok(receiver.field(&self.name).unwrap_or_else(|| self.default.clone()))
    }

    fn set(&self, this: Option<&NativeValue>, value: NativeValue) -> BridgeResult<()> {
        self.receiver(this)?.set_field(&self.name, value);
        Ok(())
    }
}

/// Describes one constructor.
pub struct ConstructorBuilder {
    params: Vec<TypeDescriptor>,
    flags: MemberFlags,
    invoker: Option<Arc<dyn NativeInvoker>>,
}

impl ConstructorBuilder {
    pub fn new() -> Self {
        Self {
            params: Vec::new(),
            flags: MemberFlags::PUBLIC,
            invoker: None,
        }
    }

    pub fn param(mut self, ty: TypeDescriptor) -> Self {
        self.params.push(ty);
        self
    }

    pub fn flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn invoke<F>(mut self, body: F) -> Self
    where
        F: Fn(Option<&NativeValue>, &[NativeValue]) -> BridgeResult<NativeValue> + Send + Sync + 'static,
    {
        self.invoker = Some(Arc::new(body));
        self
    }

    fn build(self, declaring: TypeHash) -> ConstructorInfo {
        ConstructorInfo {
            declaring,
            params: self.params,
            flags: self.flags,
            invoker: self.invoker,
        }
    }
}

impl Default for ConstructorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Synthetic Objects
// ============================================================================

/// A native object with named field storage.
#[derive(Debug)]
pub struct SyntheticObject {
    ty: TypeRef,
    display: Option<String>,
    fields: RwLock<FxHashMap<Arc<str>, NativeValue>>,
}

impl SyntheticObject {
    pub fn new(ty: &TypeDescriptor) -> Self {
        let ty = ty
            .as_plain_type()
            .type_ref()
            .cloned()
            .unwrap_or_else(|| TypeRef::new(&ty.signature()));
        Self {
            ty,
            display: None,
            fields: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn with_field(self, name: &str, value: NativeValue) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn with_display(mut self, text: &str) -> Self {
        self.display = Some(text.to_string());
        self
    }

    pub fn field(&self, name: &str) -> Option<NativeValue> {
        self.fields.read().get(name).cloned()
    }

    pub fn set_field(&self, name: &str, value: NativeValue) {
        self.fields.write().insert(Arc::from(name), value);
    }
}

impl NativeObject for SyntheticObject {
    fn runtime_type(&self) -> TypeHash {
        self.ty.id
    }

    fn display_string(&self) -> String {
        self.display.clone().unwrap_or_else(|| self.ty.name.to_string())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Built-in Types
// ============================================================================

fn native_err(member: &str, message: &str) -> BridgeError {
    BridgeError::native(member, message)
}

fn receiver<'a>(this: Option<&'a NativeValue>, member: &str) -> BridgeResult<&'a NativeValue> {
    this.ok_or_else(|| native_err(member, "missing receiver"))
}

fn list_receiver<'a>(this: Option<&'a NativeValue>, member: &str) -> BridgeResult<&'a NativeList> {
    this.and_then(|v| v.downcast_ref::<NativeList>())
        .ok_or_else(|| native_err(member, "receiver is not a collection"))
}

fn map_receiver<'a>(this: Option<&'a NativeValue>, member: &str) -> BridgeResult<&'a NativeMap> {
    this.and_then(|v| v.downcast_ref::<NativeMap>())
        .ok_or_else(|| native_err(member, "receiver is not a map"))
}

fn arg<'a>(args: &'a [NativeValue], i: usize, member: &str) -> BridgeResult<&'a NativeValue> {
    args.get(i).ok_or_else(|| native_err(member, "missing argument"))
}

fn index_arg(args: &[NativeValue], member: &str) -> BridgeResult<usize> {
    match arg(args, 0, member)? {
        NativeValue::Int(i) if *i >= 0 => Ok(*i as usize),
        _ => Err(native_err(member, "index must be a non-negative int")),
    }
}

fn utf16_len(text: &str) -> i32 {
    text.encode_utf16().count() as i32
}

fn register_standard_types(intro: &SyntheticIntrospector) {
    let int = TypeDescriptor::numeric(NumericKind::Int);
    let boolean = TypeDescriptor::boolean();
    let object = TypeDescriptor::object();
    let string = TypeDescriptor::string();

    intro.register(
        TypeBuilder::class(well_known::OBJECT_NAME)
            .method(
                MethodBuilder::new("toString")
                    .returns(string.clone())
                    .invoke(|this, _| Ok(NativeValue::string(&receiver(this, "toString")?.display_string()))),
            )
            .method(
                MethodBuilder::new("equals")
                    .param(object.clone())
                    .returns(boolean.clone())
                    .invoke(|this, args| Ok(NativeValue::Boolean(receiver(this, "equals")? == arg(args, 0, "equals")?))),
            )
            .constructor(ConstructorBuilder::new().invoke(|_, _| {
                Ok(NativeValue::object(SyntheticObject::new(&TypeDescriptor::object())))
            })),
    );

    let char_sequence = intro.register(
        TypeBuilder::interface(well_known::CHAR_SEQUENCE_NAME)
            .method(MethodBuilder::new("length").returns(int.clone()).flags(MemberFlags::ABSTRACT)),
    );

    intro.register(
        TypeBuilder::class(well_known::STRING_NAME)
            .flags(MemberFlags::FINAL)
            .implements(char_sequence)
            .method(MethodBuilder::new("length").returns(int.clone()).invoke(|this, _| {
                match receiver(this, "length")? {
                    NativeValue::String(s) => Ok(NativeValue::Int(utf16_len(s))),
                    _ => Err(native_err("length", "receiver is not a string")),
                }
            }))
            .method(
                MethodBuilder::new("isEmpty")
                    .returns(boolean.clone())
                    .invoke(|this, _| Ok(NativeValue::Boolean(receiver(this, "isEmpty")?.display_string().is_empty()))),
            ),
    );

    intro.register(
        TypeBuilder::class(well_known::NUMBER_NAME)
            .flags(MemberFlags::ABSTRACT)
            .method(
                MethodBuilder::new("doubleValue")
                    .returns(TypeDescriptor::numeric(NumericKind::Double))
                    .invoke(|this, _| {
                        receiver(this, "doubleValue")?
                            .as_f64()
                            .map(NativeValue::from)
                            .ok_or_else(|| native_err("doubleValue", "receiver is not a number"))
                    }),
            )
            .method(
                MethodBuilder::new("intValue")
                    .returns(int.clone())
                    .invoke(|this, _| {
                        receiver(this, "intValue")?
                            .as_f64()
                            .map(|v| NativeValue::Int(v as i32))
                            .ok_or_else(|| native_err("intValue", "receiver is not a number"))
                    }),
            ),
    );

    intro.register(
        TypeBuilder::class(well_known::CLASS_NAME)
            .flags(MemberFlags::FINAL)
            .method(MethodBuilder::new("getName").returns(string.clone()).invoke(|this, _| {
                this.and_then(|v| v.downcast_ref::<NativeClassRef>())
                    .map(|class| NativeValue::string(&class.ty.signature()))
                    .ok_or_else(|| native_err("getName", "receiver is not a class"))
            })),
    );

    let collection = TypeBuilder::interface(well_known::COLLECTION_NAME).type_param("E");
    let collection_e = collection.var("E");
    let collection = intro.register(
        collection
            .method(MethodBuilder::new("size").returns(int.clone()).invoke(|this, _| {
                Ok(NativeValue::Int(list_receiver(this, "size")?.len() as i32))
            }))
            .method(MethodBuilder::new("isEmpty").returns(boolean.clone()).invoke(|this, _| {
                Ok(NativeValue::Boolean(list_receiver(this, "isEmpty")?.is_empty()))
            }))
            .method(
                MethodBuilder::new("contains")
                    .param(object.clone())
                    .returns(boolean.clone())
                    .invoke(|this, args| {
                        Ok(NativeValue::Boolean(
                            list_receiver(this, "contains")?.contains(arg(args, 0, "contains")?),
                        ))
                    }),
            )
            .method(
                MethodBuilder::new("add")
                    .param(collection_e)
                    .returns(boolean.clone())
                    .invoke(|this, args| {
                        Ok(NativeValue::Boolean(
                            list_receiver(this, "add")?.add(arg(args, 0, "add")?.clone()),
                        ))
                    }),
            ),
    );

    let list = TypeBuilder::interface(well_known::LIST_NAME).type_param("E");
    let list_e = list.var("E");
    intro.register(
        list.implements(TypeDescriptor::parameterized(collection.clone(), vec![list_e.clone()]))
            .method(
                MethodBuilder::new("get")
                    .param(int.clone())
                    .returns(list_e.clone())
                    .invoke(|this, args| {
                        let list = list_receiver(this, "get")?;
                        let index = index_arg(args, "get")?;
                        list.get(index).ok_or(BridgeError::IndexOutOfBounds {
                            index,
                            length: list.len(),
                        })
                    }),
            )
            .method(
                MethodBuilder::new("set")
                    .param(int.clone())
                    .param(list_e.clone())
                    .returns(list_e)
                    .invoke(|this, args| {
                        let list = list_receiver(this, "set")?;
                        list.set_at(index_arg(args, "set")?, arg(args, 1, "set")?.clone())
                    }),
            ),
    );

    let set = TypeBuilder::interface(well_known::SET_NAME).type_param("E");
    let set_e = set.var("E");
    intro.register(set.implements(TypeDescriptor::parameterized(collection, vec![set_e])));

    let map = TypeBuilder::interface(well_known::MAP_NAME).type_param("K").type_param("V");
    let map_k = map.var("K");
    let map_v = map.var("V");
    intro.register(
        map.method(MethodBuilder::new("size").returns(int.clone()).invoke(|this, _| {
            Ok(NativeValue::Int(map_receiver(this, "size")?.len() as i32))
        }))
        .method(
            MethodBuilder::new("get")
                .param(object.clone())
                .returns(map_v.clone())
                .invoke(|this, args| {
                    Ok(map_receiver(this, "get")?
                        .get(arg(args, 0, "get")?)
                        .unwrap_or(NativeValue::Null))
                }),
        )
        .method(
            MethodBuilder::new("put")
                .param(map_k)
                .param(map_v.clone())
                .returns(map_v)
                .invoke(|this, args| {
                    let key = arg(args, 0, "put")?.clone();
                    let value = arg(args, 1, "put")?.clone();
                    Ok(map_receiver(this, "put")?.insert(key, value).unwrap_or(NativeValue::Null))
                }),
        )
        .method(
            MethodBuilder::new("containsKey")
                .param(object)
                .returns(boolean)
                .invoke(|this, args| {
                    Ok(NativeValue::Boolean(
                        map_receiver(this, "containsKey")?.contains_key(arg(args, 0, "containsKey")?),
                    ))
                }),
        ),
    );
}

/// Enum constants become static final fields; `name()` and `ordinal()` are
/// instance methods.
fn add_enum_members(
    info: &NativeTypeInfo,
    descriptor: &TypeDescriptor,
    methods: &mut Vec<MethodInfo>,
    fields: &mut Vec<FieldInfo>,
) {
    for (ordinal, name) in info.enum_constants.iter().enumerate() {
        let constant = NativeValue::object(NativeEnumConstant {
            enum_type: info.ty.clone(),
            ordinal,
            name: name.clone(),
        });
        fields.push(
            FieldBuilder::new(name, descriptor.clone())
                .flags(MemberFlags::STATIC | MemberFlags::FINAL)
                .initial(constant)
                .build(info.ty.id),
        );
    }

    fn constant<'a>(this: Option<&'a NativeValue>, member: &str) -> BridgeResult<&'a NativeEnumConstant> {
        this.and_then(|v| v.downcast_ref::<NativeEnumConstant>())
            .ok_or_else(|| native_err(member, "receiver is not an enum constant"))
    }

    methods.push(
        MethodBuilder::new("name")
            .returns(TypeDescriptor::string())
            .invoke(|this, _| Ok(NativeValue::String(constant(this, "name")?.name.clone())))
            .build(info.ty.id),
    );
    methods.push(
        MethodBuilder::new("ordinal")
            .returns(TypeDescriptor::numeric(NumericKind::Int))
            .invoke(|this, _| Ok(NativeValue::Int(constant(this, "ordinal")?.ordinal as i32)))
            .build(info.ty.id),
    );
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_is_reported() {
        let intro = SyntheticIntrospector::new();
        let err = intro.declared_methods(TypeHash::from_name("demo.Missing")).unwrap_err();
        assert!(matches!(err, IntrospectionError::UnknownType { .. }));
        assert!(intro.type_info(TypeHash::from_name("demo.Missing")).is_none());
    }

    #[test]
    fn access_denied_types_still_have_info() {
        let intro = SyntheticIntrospector::new();
        let ty = intro.register(TypeBuilder::class("demo.Secret").deny_access());
        let id = ty.type_id().unwrap();
        assert!(intro.type_info(id).is_some());
        assert_eq!(
            intro.declared_fields(id).unwrap_err(),
            IntrospectionError::AccessDenied {
                type_name: "demo.Secret".into()
            }
        );
    }

    #[test]
    fn stored_fields_live_on_the_receiver() {
        let intro = SyntheticIntrospector::new();
        let ty = intro.register(
            TypeBuilder::class("demo.Point").field(FieldBuilder::new("x", TypeDescriptor::numeric(NumericKind::Int))),
        );
        let fields = intro.declared_fields(ty.type_id().unwrap()).unwrap();
        let handle = fields[0].handle.clone().unwrap();

        let point = NativeValue::object(SyntheticObject::new(&ty));
        assert_eq!(handle.get(Some(&point)).unwrap(), NativeValue::Int(0));
        handle.set(Some(&point), NativeValue::Int(4)).unwrap();
        assert_eq!(handle.get(Some(&point)).unwrap(), NativeValue::Int(4));
        assert!(handle.get(None).is_err());
    }

    #[test]
    fn abstract_methods_dispatch_virtually() {
        let intro = SyntheticIntrospector::new();
        let ty = intro.register(
            TypeBuilder::interface("demo.Runnable").method(MethodBuilder::new("run").flags(MemberFlags::ABSTRACT)),
        );
        let methods = intro.declared_methods(ty.type_id().unwrap()).unwrap();
        let invoker = methods[0].invoker.clone().unwrap();
        let err = invoker.invoke(Some(&NativeValue::Int(1)), &[]).unwrap_err();
        assert!(matches!(err, BridgeError::NativeException { .. }));
    }

    #[test]
    fn inaccessible_members_have_no_handle() {
        let intro = SyntheticIntrospector::new();
        let ty = intro.register(
            TypeBuilder::class("demo.Locked")
                .method(MethodBuilder::new("open").inaccessible())
                .field(FieldBuilder::new("key", TypeDescriptor::string()).inaccessible()),
        );
        let id = ty.type_id().unwrap();
        assert!(intro.declared_methods(id).unwrap()[0].invoker.is_none());
        assert!(intro.declared_fields(id).unwrap()[0].handle.is_none());
    }

    #[test]
    fn enum_constants_become_static_fields() {
        let intro = SyntheticIntrospector::new();
        let ty = intro.register(TypeBuilder::enumeration("demo.Color", &["RED", "GREEN"]));
        assert!(ty.is_enum());
        let fields = intro.declared_fields(ty.type_id().unwrap()).unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields[1].flags.contains(MemberFlags::STATIC | MemberFlags::FINAL));
        let green = fields[1].handle.as_ref().unwrap().get(None).unwrap();
        let constant = green.downcast_ref::<NativeEnumConstant>().unwrap();
        assert_eq!((constant.ordinal, &*constant.name), (1, "GREEN"));
    }

    #[test]
    fn standard_list_members_operate_on_native_lists() {
        let intro = SyntheticIntrospector::with_standard_types();
        let methods = intro.declared_methods(well_known::LIST).unwrap();
        let get = methods.iter().find(|m| &*m.name == "get").unwrap();
        let list = NativeValue::object(NativeList::list(
            TypeDescriptor::string(),
            vec![NativeValue::string("a"), NativeValue::string("b")],
        ));
        let value = get.invoker.as_ref().unwrap().invoke(Some(&list), &[NativeValue::Int(1)]).unwrap();
        assert_eq!(value, NativeValue::string("b"));
        let info = intro.type_info(well_known::LIST).unwrap();
        assert_eq!(info.direct_supertypes(), vec![well_known::COLLECTION]);
    }
}
