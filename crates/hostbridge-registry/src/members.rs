//! Discovered members of a native type.
//!
//! A [`MemberEntry`] is built once per (concrete type, include-non-public)
//! pair and never mutated afterwards. It holds separate static and instance
//! tables of [`MemberDescriptor`]s plus the constructor overload set.
//!
//! Reads and writes that cross into the script world go through the
//! [`ValueMarshal`] seam, which the bridge implements with its conversion
//! engine and overload resolver.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use hostbridge_core::{
    BridgeError, BridgeResult, ConsolidationMapping, ConstructorInfo, FieldHandle, FieldInfo, MemberFlags,
    MethodInfo, NativeInvoker, NativeValue, ScriptValue, TypeDescriptor, TypeHash,
};

use crate::memo::OverloadMemo;

// ============================================================================
// Value Marshal Seam
// ============================================================================

/// Conversion and invocation services the registry needs from the bridge.
pub trait ValueMarshal {
    /// Native to script, by the member's declared static type.
    fn to_script(&self, value: NativeValue, static_type: &TypeDescriptor) -> BridgeResult<ScriptValue>;

    /// Script to native, by the member's declared type.
    fn to_native(&self, value: &ScriptValue, target: &TypeDescriptor) -> BridgeResult<NativeValue>;

    /// The script-visible callable for an overload set, bound to `this`.
    fn method_value(&self, set: &Arc<OverloadSet>, this: Option<&NativeValue>) -> ScriptValue;

    /// Resolve and invoke an overload set with script arguments.
    fn invoke_overloads(
        &self,
        set: &OverloadSet,
        this: Option<&NativeValue>,
        args: &[ScriptValue],
    ) -> BridgeResult<ScriptValue>;
}

// ============================================================================
// Callables
// ============================================================================

/// A method or constructor with consolidated signature.
pub struct NativeCallable {
    pub name: Arc<str>,
    pub declaring: TypeHash,
    pub params: Vec<TypeDescriptor>,
    pub return_type: TypeDescriptor,
    pub flags: MemberFlags,
    invoker: Arc<dyn NativeInvoker>,
}

impl NativeCallable {
    /// Build from a declared method. `None` when the host provided no
    /// invocation handle.
    pub fn from_method(method: &MethodInfo, mapping: &ConsolidationMapping) -> Option<Self> {
        let invoker = method.invoker.clone()?;
        Some(Self {
            name: method.name.clone(),
            declaring: method.declaring,
            params: method.params.iter().map(|p| resolve(p, mapping)).collect(),
            return_type: resolve(&method.return_type, mapping),
            flags: method.flags,
            invoker,
        })
    }

    /// Build from a declared constructor, named after its type.
    pub fn from_constructor(
        type_name: &Arc<str>,
        constructor: &ConstructorInfo,
        mapping: &ConsolidationMapping,
    ) -> Option<Self> {
        let invoker = constructor.invoker.clone()?;
        Some(Self {
            name: type_name.clone(),
            declaring: constructor.declaring,
            params: constructor.params.iter().map(|p| resolve(p, mapping)).collect(),
            return_type: TypeDescriptor::plain(type_name),
            flags: constructor.flags | MemberFlags::STATIC,
            invoker,
        })
    }

    pub fn is_static(&self) -> bool {
        self.flags.is_static()
    }

    pub fn is_variadic(&self) -> bool {
        self.flags.contains(MemberFlags::VARARGS) && self.params.last().is_some_and(TypeDescriptor::is_array)
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MemberFlags::ABSTRACT)
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Call the native member with already-converted arguments.
    pub fn invoke(&self, this: Option<&NativeValue>, args: &[NativeValue]) -> BridgeResult<NativeValue> {
        self.invoker.invoke(this, args)
    }

    /// `name(int, host.String)`, for diagnostics.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(TypeDescriptor::signature).collect();
        format!("{}({})", self.name, params.join(", "))
    }

    /// Identity used to de-duplicate declarations across the hierarchy.
    pub fn erased_key(name: &str, params: &[TypeDescriptor]) -> TypeHash {
        let erased: Vec<TypeHash> = params
            .iter()
            .map(|p| p.as_plain_type().type_id().unwrap_or(TypeHash::EMPTY))
            .collect();
        TypeHash::from_signature(name, &erased)
    }
}

impl fmt::Debug for NativeCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeCallable({})", self.signature())
    }
}

/// Consolidate, then erase whatever the concrete type left unbound.
fn resolve(declared: &TypeDescriptor, mapping: &ConsolidationMapping) -> TypeDescriptor {
    let resolved = declared.consolidate(mapping).resolve_unbound();
    assert!(!resolved.has_variables(), "type variable survived consolidation: {}", declared);
    resolved
}

/// All same-named methods (or all constructors) of a type.
#[derive(Debug)]
pub struct OverloadSet {
    pub name: Arc<str>,
    pub candidates: Vec<Arc<NativeCallable>>,
    memo: OverloadMemo,
}

impl OverloadSet {
    pub fn new(name: Arc<str>, candidates: Vec<Arc<NativeCallable>>) -> Self {
        let memo = OverloadMemo::new(candidates.len());
        Self { name, candidates, memo }
    }

    pub fn memo(&self) -> &OverloadMemo {
        &self.memo
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn signatures(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.signature()).collect()
    }
}

// ============================================================================
// Fields and Properties
// ============================================================================

/// A native field.
pub struct FieldAccessor {
    pub name: Arc<str>,
    pub declaring: TypeHash,
    pub field_type: TypeDescriptor,
    pub flags: MemberFlags,
    handle: Arc<dyn FieldHandle>,
    /// Same-named methods hidden behind the field.
    pub methods: Option<Arc<OverloadSet>>,
}

impl FieldAccessor {
    pub fn from_field(field: &FieldInfo, mapping: &ConsolidationMapping) -> Option<Self> {
        let handle = field.handle.clone()?;
        Some(Self {
            name: field.name.clone(),
            declaring: field.declaring,
            field_type: resolve(&field.field_type, mapping),
            flags: field.flags,
            handle,
            methods: None,
        })
    }

    pub fn is_static(&self) -> bool {
        self.flags.is_static()
    }

    pub fn is_final(&self) -> bool {
        self.flags.contains(MemberFlags::FINAL)
    }

    pub fn read(&self, this: Option<&NativeValue>) -> BridgeResult<NativeValue> {
        self.handle.get(this)
    }

    pub fn write(&self, this: Option<&NativeValue>, value: NativeValue) -> BridgeResult<()> {
        self.handle.set(this, value)
    }
}

impl fmt::Debug for FieldAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("flags", &self.flags)
            .field("methods", &self.methods.as_ref().map(|m| m.len()))
            .finish()
    }
}

/// A property synthesized from `getX`/`isX`/`setX` methods.
#[derive(Debug)]
pub struct BeanProperty {
    pub name: Arc<str>,
    pub getter: Option<Arc<NativeCallable>>,
    pub setter: Option<Arc<NativeCallable>>,
    /// Several setters, none matching the getter's type; resolved at write
    /// time.
    pub setters: Option<Arc<OverloadSet>>,
}

impl BeanProperty {
    pub fn is_read_only(&self) -> bool {
        self.setter.is_none() && self.setters.is_none()
    }
}

/// One named member.
#[derive(Debug, Clone)]
pub enum MemberDescriptor {
    Methods(Arc<OverloadSet>),
    Field(Arc<FieldAccessor>),
    Bean(Arc<BeanProperty>),
}

impl MemberDescriptor {
    /// The overload set reachable under this name, if any.
    pub fn methods(&self) -> Option<&Arc<OverloadSet>> {
        match self {
            MemberDescriptor::Methods(set) => Some(set),
            MemberDescriptor::Field(field) => field.methods.as_ref(),
            MemberDescriptor::Bean(_) => None,
        }
    }
}

// ============================================================================
// Member Tables
// ============================================================================

/// Name-keyed members in discovery order.
#[derive(Debug, Default)]
pub struct MemberTable {
    members: FxHashMap<Arc<str>, MemberDescriptor>,
    order: Vec<Arc<str>>,
}

impl MemberTable {
    pub fn get(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Insert or replace, keeping the first insertion's position.
    pub fn insert(&mut self, name: Arc<str>, member: MemberDescriptor) {
        if self.members.insert(name.clone(), member).is_none() {
            self.order.push(name);
        }
    }

    pub fn names(&self) -> &[Arc<str>] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &MemberDescriptor)> {
        self.order.iter().filter_map(|name| self.members.get(name).map(|m| (name, m)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// The cached member view of one native type.
#[derive(Debug)]
pub struct MemberEntry {
    pub type_id: TypeHash,
    pub type_name: Arc<str>,
    pub instance: MemberTable,
    pub statics: MemberTable,
    pub constructors: Option<Arc<OverloadSet>>,
}

impl MemberEntry {
    pub fn table(&self, is_static: bool) -> &MemberTable {
        if is_static { &self.statics } else { &self.instance }
    }

    /// Instance lookups fall back to static members.
    pub fn member(&self, name: &str, is_static: bool) -> Option<&MemberDescriptor> {
        let found = self.table(is_static).get(name);
        if is_static {
            found
        } else {
            found.or_else(|| self.statics.get(name))
        }
    }

    pub fn has(&self, name: &str, is_static: bool) -> bool {
        self.member(name, is_static).is_some()
    }

    /// Member names in discovery order.
    pub fn ids(&self, is_static: bool) -> Vec<Arc<str>> {
        self.table(is_static).names().to_vec()
    }

    /// The overload set named `name`, including methods shadowed by a field.
    pub fn methods(&self, name: &str, is_static: bool) -> Option<&Arc<OverloadSet>> {
        self.member(name, is_static).and_then(MemberDescriptor::methods)
    }

    /// Read a member: method names yield a callable, fields and bean
    /// getters perform the native read.
    pub fn get(
        &self,
        marshal: &dyn ValueMarshal,
        this: Option<&NativeValue>,
        name: &str,
        is_static: bool,
    ) -> BridgeResult<ScriptValue> {
        match self.member(name, is_static) {
            None => Err(self.not_found(name)),
            Some(MemberDescriptor::Methods(set)) => Ok(marshal.method_value(set, this)),
            Some(MemberDescriptor::Field(field)) => {
                let value = field.read(this)?;
                marshal.to_script(value, &field.field_type)
            }
            Some(MemberDescriptor::Bean(bean)) => match &bean.getter {
                Some(getter) => {
                    let value = getter.invoke(this, &[])?;
                    marshal.to_script(value, &getter.return_type)
                }
                None => Ok(ScriptValue::Undefined),
            },
        }
    }

    /// Write a member. Final fields, getter-only properties and method
    /// names are immutable.
    pub fn put(
        &self,
        marshal: &dyn ValueMarshal,
        this: Option<&NativeValue>,
        name: &str,
        value: &ScriptValue,
        is_static: bool,
    ) -> BridgeResult<()> {
        match self.member(name, is_static) {
            None => Err(self.not_found(name)),
            Some(MemberDescriptor::Methods(_)) => Err(self.immutable(name)),
            Some(MemberDescriptor::Field(field)) => {
                if field.is_final() {
                    return Err(self.immutable(name));
                }
                let converted = marshal.to_native(value, &field.field_type)?;
                field.write(this, converted)
            }
            Some(MemberDescriptor::Bean(bean)) => {
                if let Some(setter) = &bean.setter {
                    let converted = marshal.to_native(value, &setter.params[0])?;
                    setter.invoke(this, &[converted]).map(drop)
                } else if let Some(setters) = &bean.setters {
                    marshal.invoke_overloads(setters, this, std::slice::from_ref(value)).map(drop)
                } else {
                    Err(self.immutable(name))
                }
            }
        }
    }

    fn not_found(&self, name: &str) -> BridgeError {
        BridgeError::MemberNotFound {
            type_name: self.type_name.to_string(),
            name: name.to_string(),
        }
    }

    fn immutable(&self, name: &str) -> BridgeError {
        BridgeError::ImmutableMemberWrite {
            type_name: self.type_name.to_string(),
            name: name.to_string(),
        }
    }
}
