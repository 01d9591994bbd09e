//! Native-side values.
//!
//! [`NativeValue`] is what the bridge hands to, and receives from, native
//! invokers. Primitive values are carried inline; everything else is a
//! [`NativeRef`], a shared handle to a [`NativeObject`] whose equality is
//! identity.
//!
//! The bridge itself needs to build a few kinds of native objects when it
//! converts script values (arrays, lists, sets, maps, enum constants and class
//! handles). Those live here so every crate of the workspace agrees on them.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::descriptor::{NumericKind, PrimitiveKind, TypeDescriptor, TypeRef};
use crate::error::{BridgeError, BridgeResult};
use crate::type_hash::{TypeHash, well_known};

// ============================================================================
// Native Objects
// ============================================================================

/// A native object reachable from script code.
pub trait NativeObject: Any + Send + Sync + fmt::Debug {
    /// The object's run-time class.
    fn runtime_type(&self) -> TypeHash;

    /// The exact run-time type used as an overload memo key.
    ///
    /// Defaults to [`runtime_type`](Self::runtime_type). Containers fold their
    /// element types in, since conversion weights depend on them.
    fn exact_type_key(&self) -> TypeHash {
        self.runtime_type()
    }

    /// Native string form (`toString`).
    fn display_string(&self) -> String;

    /// Invoke a method by name on objects that dispatch dynamically.
    fn invoke_method(&self, name: &str, _args: &[NativeValue]) -> BridgeResult<NativeValue> {
        Err(BridgeError::NotCallable {
            value: format!("{}.{}", self.display_string(), name),
        })
    }

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a native object. Equality and hashing are by identity.
#[derive(Clone)]
pub struct NativeRef(Arc<dyn NativeObject>);

impl NativeRef {
    pub fn new<T: NativeObject>(object: T) -> Self {
        NativeRef(Arc::new(object))
    }

    pub fn from_arc(object: Arc<dyn NativeObject>) -> Self {
        NativeRef(object)
    }

    #[inline]
    pub fn get(&self) -> &dyn NativeObject {
        &*self.0
    }

    pub fn arc(&self) -> &Arc<dyn NativeObject> {
        &self.0
    }

    pub fn downcast_ref<T: NativeObject>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Address of the referenced object, used as an identity key.
    #[inline]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    #[inline]
    pub fn ptr_eq(a: &NativeRef, b: &NativeRef) -> bool {
        a.addr() == b.addr()
    }
}

impl PartialEq for NativeRef {
    fn eq(&self, other: &Self) -> bool {
        NativeRef::ptr_eq(self, other)
    }
}

impl Eq for NativeRef {}

impl Hash for NativeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for NativeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

// ============================================================================
// Native Values
// ============================================================================

/// A value on the native side of the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeValue {
    /// Result of a `void` call.
    Void,
    Null,
    Boolean(bool),
    /// A UTF-16 code unit.
    Char(u16),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    String(Arc<str>),
    Object(NativeRef),
}

impl NativeValue {
    pub fn string(value: &str) -> Self {
        NativeValue::String(Arc::from(value))
    }

    pub fn object<T: NativeObject>(object: T) -> Self {
        NativeValue::Object(NativeRef::new(object))
    }

    /// The default element of a freshly allocated array of `ty`.
    pub fn default_for(ty: &TypeDescriptor) -> Self {
        match ty.primitive_kind() {
            Some(PrimitiveKind::Boolean) => NativeValue::Boolean(false),
            Some(PrimitiveKind::Numeric(kind)) => NativeValue::zero(kind),
            Some(PrimitiveKind::Void) | None => NativeValue::Null,
        }
    }

    fn zero(kind: NumericKind) -> Self {
        match kind {
            NumericKind::Double => NativeValue::Double(OrderedFloat(0.0)),
            NumericKind::Float => NativeValue::Float(OrderedFloat(0.0)),
            NumericKind::Long => NativeValue::Long(0),
            NumericKind::Int => NativeValue::Int(0),
            NumericKind::Short => NativeValue::Short(0),
            NumericKind::Char => NativeValue::Char(0),
            NumericKind::Byte => NativeValue::Byte(0),
        }
    }

    /// Null or void.
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null | NativeValue::Void)
    }

    /// The run-time class, `None` for null and void.
    pub fn runtime_type(&self) -> Option<TypeHash> {
        match self {
            NativeValue::Void | NativeValue::Null => None,
            NativeValue::Boolean(_) => Some(well_known::BOOLEAN),
            NativeValue::Char(_) => Some(well_known::CHAR),
            NativeValue::Byte(_) => Some(well_known::BYTE),
            NativeValue::Short(_) => Some(well_known::SHORT),
            NativeValue::Int(_) => Some(well_known::INT),
            NativeValue::Long(_) => Some(well_known::LONG),
            NativeValue::Float(_) => Some(well_known::FLOAT),
            NativeValue::Double(_) => Some(well_known::DOUBLE),
            NativeValue::String(_) => Some(well_known::STRING),
            NativeValue::Object(object) => Some(object.get().runtime_type()),
        }
    }

    /// The exact run-time type used in overload memo keys.
    pub fn exact_type_key(&self) -> Option<TypeHash> {
        match self {
            NativeValue::Object(object) => Some(object.get().exact_type_key()),
            other => other.runtime_type(),
        }
    }

    /// The type whose members a wrapper of this value exposes.
    ///
    /// Inline primitives expose the members of their boxed form.
    pub fn member_type(&self) -> Option<TypeHash> {
        match self {
            NativeValue::Void | NativeValue::Null => None,
            NativeValue::Boolean(_) | NativeValue::Char(_) => Some(well_known::OBJECT),
            NativeValue::String(_) => Some(well_known::STRING),
            NativeValue::Object(object) => Some(object.get().runtime_type()),
            _ => Some(well_known::NUMBER),
        }
    }

    /// The numeric kind of an inline number or char.
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            NativeValue::Char(_) => Some(NumericKind::Char),
            NativeValue::Byte(_) => Some(NumericKind::Byte),
            NativeValue::Short(_) => Some(NumericKind::Short),
            NativeValue::Int(_) => Some(NumericKind::Int),
            NativeValue::Long(_) => Some(NumericKind::Long),
            NativeValue::Float(_) => Some(NumericKind::Float),
            NativeValue::Double(_) => Some(NumericKind::Double),
            _ => None,
        }
    }

    /// Numeric value of an inline number or char.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NativeValue::Char(c) => Some(*c as f64),
            NativeValue::Byte(v) => Some(*v as f64),
            NativeValue::Short(v) => Some(*v as f64),
            NativeValue::Int(v) => Some(*v as f64),
            NativeValue::Long(v) => Some(*v as f64),
            NativeValue::Float(v) => Some(v.0 as f64),
            NativeValue::Double(v) => Some(v.0),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&NativeRef> {
        match self {
            NativeValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn downcast_ref<T: NativeObject>(&self) -> Option<&T> {
        self.as_object().and_then(NativeRef::downcast_ref::<T>)
    }

    /// Native string form.
    pub fn display_string(&self) -> String {
        match self {
            NativeValue::Void => "void".to_string(),
            NativeValue::Null => "null".to_string(),
            NativeValue::Boolean(b) => b.to_string(),
            NativeValue::Char(c) => String::from_utf16_lossy(&[*c]),
            NativeValue::Byte(v) => v.to_string(),
            NativeValue::Short(v) => v.to_string(),
            NativeValue::Int(v) => v.to_string(),
            NativeValue::Long(v) => v.to_string(),
            NativeValue::Float(v) => v.to_string(),
            NativeValue::Double(v) => v.to_string(),
            NativeValue::String(s) => s.to_string(),
            NativeValue::Object(object) => object.get().display_string(),
        }
    }
}

impl From<bool> for NativeValue {
    fn from(value: bool) -> Self {
        NativeValue::Boolean(value)
    }
}

impl From<i8> for NativeValue {
    fn from(value: i8) -> Self {
        NativeValue::Byte(value)
    }
}

impl From<i16> for NativeValue {
    fn from(value: i16) -> Self {
        NativeValue::Short(value)
    }
}

impl From<i32> for NativeValue {
    fn from(value: i32) -> Self {
        NativeValue::Int(value)
    }
}

impl From<i64> for NativeValue {
    fn from(value: i64) -> Self {
        NativeValue::Long(value)
    }
}

impl From<f32> for NativeValue {
    fn from(value: f32) -> Self {
        NativeValue::Float(OrderedFloat(value))
    }
}

impl From<f64> for NativeValue {
    fn from(value: f64) -> Self {
        NativeValue::Double(OrderedFloat(value))
    }
}

impl From<&str> for NativeValue {
    fn from(value: &str) -> Self {
        NativeValue::string(value)
    }
}

impl From<NativeRef> for NativeValue {
    fn from(value: NativeRef) -> Self {
        NativeValue::Object(value)
    }
}

fn join_display(values: &[NativeValue]) -> String {
    let parts: Vec<String> = values.iter().map(NativeValue::display_string).collect();
    format!("[{}]", parts.join(", "))
}

// ============================================================================
// Arrays
// ============================================================================

/// A fixed-length native array.
#[derive(Debug)]
pub struct NativeArray {
    component: TypeDescriptor,
    elements: RwLock<Vec<NativeValue>>,
}

impl NativeArray {
    pub fn new(component: TypeDescriptor, elements: Vec<NativeValue>) -> Self {
        Self {
            component,
            elements: RwLock::new(elements),
        }
    }

    pub fn with_length(component: TypeDescriptor, length: usize) -> Self {
        let fill = NativeValue::default_for(&component);
        Self::new(component, vec![fill; length])
    }

    pub fn component_type(&self) -> &TypeDescriptor {
        &self.component
    }

    pub fn len(&self) -> usize {
        self.elements.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<NativeValue> {
        self.elements.read().get(index).cloned()
    }

    /// Store into an existing slot; arrays never grow.
    pub fn set(&self, index: usize, value: NativeValue) -> BridgeResult<()> {
        let mut elements = self.elements.write();
        let length = elements.len();
        match elements.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(BridgeError::IndexOutOfBounds { index, length }),
        }
    }

    pub fn to_vec(&self) -> Vec<NativeValue> {
        self.elements.read().clone()
    }
}

impl NativeObject for NativeArray {
    fn runtime_type(&self) -> TypeHash {
        TypeHash::from_array(self.component.type_id().unwrap_or(well_known::OBJECT))
    }

    fn display_string(&self) -> String {
        join_display(&self.elements.read())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Lists and Sets
// ============================================================================

/// Which collection interface a [`NativeList`] implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    List,
    Set,
}

impl CollectionKind {
    pub fn type_id(self) -> TypeHash {
        match self {
            CollectionKind::List => well_known::LIST,
            CollectionKind::Set => well_known::SET,
        }
    }
}

/// An ordered native list, or an insertion-ordered set.
#[derive(Debug)]
pub struct NativeList {
    kind: CollectionKind,
    element_type: TypeDescriptor,
    elements: RwLock<Vec<NativeValue>>,
}

impl NativeList {
    pub fn new(kind: CollectionKind, element_type: TypeDescriptor, elements: Vec<NativeValue>) -> Self {
        let list = Self {
            kind,
            element_type,
            elements: RwLock::new(Vec::with_capacity(elements.len())),
        };
        for element in elements {
            list.add(element);
        }
        list
    }

    pub fn list(element_type: TypeDescriptor, elements: Vec<NativeValue>) -> Self {
        Self::new(CollectionKind::List, element_type, elements)
    }

    pub fn set(element_type: TypeDescriptor, elements: Vec<NativeValue>) -> Self {
        Self::new(CollectionKind::Set, element_type, elements)
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn element_type(&self) -> &TypeDescriptor {
        &self.element_type
    }

    pub fn len(&self) -> usize {
        self.elements.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<NativeValue> {
        self.elements.read().get(index).cloned()
    }

    pub fn contains(&self, value: &NativeValue) -> bool {
        self.elements.read().contains(value)
    }

    /// Append; sets ignore values already present. Returns true if added.
    pub fn add(&self, value: NativeValue) -> bool {
        let mut elements = self.elements.write();
        if self.kind == CollectionKind::Set && elements.contains(&value) {
            return false;
        }
        elements.push(value);
        true
    }

    /// Replace an existing element of a list, returning the previous value.
    pub fn set_at(&self, index: usize, value: NativeValue) -> BridgeResult<NativeValue> {
        let mut elements = self.elements.write();
        let length = elements.len();
        match elements.get_mut(index) {
            Some(slot) if self.kind == CollectionKind::List => Ok(std::mem::replace(slot, value)),
            Some(_) => Err(BridgeError::ImmutableMemberWrite {
                type_name: well_known::SET_NAME.to_string(),
                name: index.to_string(),
            }),
            None => Err(BridgeError::IndexOutOfBounds { index, length }),
        }
    }

    pub fn to_vec(&self) -> Vec<NativeValue> {
        self.elements.read().clone()
    }
}

impl NativeObject for NativeList {
    fn runtime_type(&self) -> TypeHash {
        self.kind.type_id()
    }

    fn exact_type_key(&self) -> TypeHash {
        let element = self.element_type.type_id().unwrap_or(well_known::OBJECT);
        TypeHash::from_parameterized(self.kind.type_id(), &[element])
    }

    fn display_string(&self) -> String {
        join_display(&self.elements.read())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Maps
// ============================================================================

#[derive(Debug, Default)]
struct MapStorage {
    order: Vec<NativeValue>,
    values: FxHashMap<NativeValue, NativeValue>,
}

/// An insertion-ordered native map.
#[derive(Debug)]
pub struct NativeMap {
    key_type: TypeDescriptor,
    value_type: TypeDescriptor,
    storage: RwLock<MapStorage>,
}

impl NativeMap {
    pub fn new(key_type: TypeDescriptor, value_type: TypeDescriptor) -> Self {
        Self {
            key_type,
            value_type,
            storage: RwLock::new(MapStorage::default()),
        }
    }

    pub fn key_type(&self) -> &TypeDescriptor {
        &self.key_type
    }

    pub fn value_type(&self) -> &TypeDescriptor {
        &self.value_type
    }

    pub fn len(&self) -> usize {
        self.storage.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &NativeValue) -> Option<NativeValue> {
        self.storage.read().values.get(key).cloned()
    }

    pub fn contains_key(&self, key: &NativeValue) -> bool {
        self.storage.read().values.contains_key(key)
    }

    /// Insert or replace, returning the previous value.
    pub fn insert(&self, key: NativeValue, value: NativeValue) -> Option<NativeValue> {
        let mut storage = self.storage.write();
        let previous = storage.values.insert(key.clone(), value);
        if previous.is_none() {
            storage.order.push(key);
        }
        previous
    }

    pub fn remove(&self, key: &NativeValue) -> Option<NativeValue> {
        let mut storage = self.storage.write();
        let previous = storage.values.remove(key);
        if previous.is_some() {
            storage.order.retain(|k| k != key);
        }
        previous
    }

    pub fn keys(&self) -> Vec<NativeValue> {
        self.storage.read().order.clone()
    }

    pub fn entries(&self) -> Vec<(NativeValue, NativeValue)> {
        let storage = self.storage.read();
        storage
            .order
            .iter()
            .filter_map(|k| storage.values.get(k).map(|v| (k.clone(), v.clone())))
            .collect()
    }
}

impl NativeObject for NativeMap {
    fn runtime_type(&self) -> TypeHash {
        well_known::MAP
    }

    fn exact_type_key(&self) -> TypeHash {
        let key = self.key_type.type_id().unwrap_or(well_known::OBJECT);
        let value = self.value_type.type_id().unwrap_or(well_known::OBJECT);
        TypeHash::from_parameterized(well_known::MAP, &[key, value])
    }

    fn display_string(&self) -> String {
        let parts: Vec<String> = self
            .entries()
            .iter()
            .map(|(k, v)| format!("{}={}", k.display_string(), v.display_string()))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Enum Constants and Class Handles
// ============================================================================

/// A constant of a native enum type.
#[derive(Debug, Clone)]
pub struct NativeEnumConstant {
    pub enum_type: TypeRef,
    pub ordinal: usize,
    pub name: Arc<str>,
}

impl NativeObject for NativeEnumConstant {
    fn runtime_type(&self) -> TypeHash {
        self.enum_type.id
    }

    fn display_string(&self) -> String {
        self.name.to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A handle to a native class itself (as opposed to an instance).
#[derive(Debug, Clone)]
pub struct NativeClassRef {
    pub ty: TypeDescriptor,
}

impl NativeObject for NativeClassRef {
    fn runtime_type(&self) -> TypeHash {
        well_known::CLASS
    }

    fn display_string(&self) -> String {
        format!("class {}", self.ty)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn int() -> TypeDescriptor {
        TypeDescriptor::numeric(NumericKind::Int)
    }

    #[test]
    fn native_ref_equality_is_identity() {
        let a = NativeRef::new(NativeArray::with_length(int(), 1));
        let b = NativeRef::new(NativeArray::with_length(int(), 1));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn runtime_types() {
        assert_eq!(NativeValue::Int(1).runtime_type(), Some(well_known::INT));
        assert_eq!(NativeValue::Null.runtime_type(), None);
        assert_eq!(NativeValue::string("a").runtime_type(), Some(well_known::STRING));
        let array = NativeValue::object(NativeArray::with_length(int(), 0));
        assert_eq!(array.runtime_type(), Some(TypeHash::from_array(well_known::INT)));
    }

    #[test]
    fn member_type_boxes_primitives() {
        assert_eq!(NativeValue::Int(1).member_type(), Some(well_known::NUMBER));
        assert_eq!(NativeValue::Boolean(true).member_type(), Some(well_known::OBJECT));
        assert_eq!(NativeValue::string("s").member_type(), Some(well_known::STRING));
        assert_eq!(NativeValue::Null.member_type(), None);
    }

    #[test]
    fn default_elements() {
        assert_eq!(NativeValue::default_for(&int()), NativeValue::Int(0));
        assert_eq!(NativeValue::default_for(&TypeDescriptor::boolean()), NativeValue::Boolean(false));
        assert_eq!(NativeValue::default_for(&TypeDescriptor::string()), NativeValue::Null);
    }

    #[test]
    fn array_never_grows() {
        let array = NativeArray::with_length(int(), 2);
        array.set(1, NativeValue::Int(7)).unwrap();
        assert_eq!(array.get(1), Some(NativeValue::Int(7)));
        assert_eq!(
            array.set(2, NativeValue::Int(1)),
            Err(BridgeError::IndexOutOfBounds { index: 2, length: 2 })
        );
        assert_eq!(array.len(), 2);
    }

    #[test]
    fn set_ignores_duplicates() {
        let set = NativeList::set(
            int(),
            vec![NativeValue::Int(1), NativeValue::Int(2), NativeValue::Int(1)],
        );
        assert_eq!(set.len(), 2);
        assert!(!set.add(NativeValue::Int(2)));
        assert!(set.contains(&NativeValue::Int(1)));
    }

    #[test]
    fn list_set_at_bounds() {
        let list = NativeList::list(int(), vec![NativeValue::Int(1)]);
        assert_eq!(list.set_at(0, NativeValue::Int(5)), Ok(NativeValue::Int(1)));
        assert!(matches!(
            list.set_at(1, NativeValue::Int(5)),
            Err(BridgeError::IndexOutOfBounds { index: 1, length: 1 })
        ));
    }

    #[test]
    fn list_memo_key_includes_element_type() {
        let strings = NativeList::list(TypeDescriptor::string(), vec![]);
        let ints = NativeList::list(int(), vec![]);
        assert_eq!(strings.runtime_type(), ints.runtime_type());
        assert_ne!(strings.exact_type_key(), ints.exact_type_key());
    }

    #[test]
    fn map_keeps_insertion_order() {
        let map = NativeMap::new(TypeDescriptor::string(), int());
        map.insert("b".into(), NativeValue::Int(2));
        map.insert("a".into(), NativeValue::Int(1));
        assert_eq!(map.insert("b".into(), NativeValue::Int(3)), Some(NativeValue::Int(2)));
        assert_eq!(map.keys(), vec![NativeValue::from("b"), NativeValue::from("a")]);
        assert_eq!(map.display_string(), "{b=3, a=1}");
        assert_eq!(map.remove(&"b".into()), Some(NativeValue::Int(3)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn display_strings() {
        assert_eq!(NativeValue::Char(b'x' as u16).display_string(), "x");
        assert_eq!(NativeValue::from(2.5f64).display_string(), "2.5");
        let list = NativeValue::object(NativeList::list(int(), vec![NativeValue::Int(1), NativeValue::Int(2)]));
        assert_eq!(list.display_string(), "[1, 2]");
    }
}
