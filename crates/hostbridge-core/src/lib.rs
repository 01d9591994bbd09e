//! Core types for the host-interop bridge.
//!
//! This crate holds everything the registry and the bridge share:
//!
//! - [`TypeHash`] and the [`well_known`] native type ids
//! - [`TypeDescriptor`], the interned structural description of a native or
//!   script type, and [`ConsolidationMapping`]
//! - [`NativeValue`] and the native container kinds ([`NativeArray`],
//!   [`NativeList`], [`NativeMap`])
//! - [`ScriptValue`] and the traits script engines implement
//!   ([`ScriptObject`], [`ScriptCallable`], [`ScriptHost`])
//! - [`NativeTypeIntrospector`], the host reflection seam, plus the in-memory
//!   [`synthetic`] implementation
//! - [`BridgeError`] and [`IntrospectionError`]

pub mod descriptor;
pub mod error;
pub mod introspect;
pub mod native;
pub mod script;
pub mod synthetic;
pub mod type_hash;

pub use descriptor::{
    ConsolidationMapping, DescriptorKind, NumericKind, PrimitiveKind, TypeDescriptor, TypeRef, TypeVariable,
};
pub use error::{BridgeError, BridgeResult, IntrospectionError};
pub use introspect::{
    ConstructorInfo, FieldHandle, FieldInfo, MemberFlags, MethodInfo, NativeInvoker, NativeTypeInfo,
    NativeTypeIntrospector, NativeTypeKind, direct_supertypes, is_assignable, is_subtype, supertype_closure,
};
pub use native::{
    CollectionKind, NativeArray, NativeClassRef, NativeEnumConstant, NativeList, NativeMap, NativeObject, NativeRef,
    NativeValue,
};
pub use script::{
    ArrayValueProvider, ClosureFunction, DirectHost, DynamicKind, HintKind, NativeHandleKind, PlainObject,
    PropertyKey, ScriptArray, ScriptCallable, ScriptHandle, ScriptHost, ScriptObject, ScriptValue, WrapPolicy,
    number_to_string, string_to_number,
};
pub use type_hash::{TypeHash, hash_constants, well_known};
