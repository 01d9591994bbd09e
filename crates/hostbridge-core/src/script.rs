//! Script-side values and the contracts the execution engine implements.
//!
//! The bridge does not own the script object model. It only needs the
//! capabilities described here: property access on script objects, calling
//! script callables, reading script arrays through [`ArrayValueProvider`], and
//! the engine's process-wide [`WrapPolicy`].
//!
//! [`PlainObject`], [`ScriptArray`] and [`ClosureFunction`] are minimal
//! implementations of those capabilities for embedders that have no object
//! model of their own, and for tests.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{BridgeError, BridgeResult};
use crate::native::{NativeObject, NativeValue};
use crate::type_hash::{TypeHash, well_known};

// ============================================================================
// Keys and Hints
// ============================================================================

/// A property key. Index keys are kept separate from name keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Name(Arc<str>),
    Index(usize),
}

impl PropertyKey {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            PropertyKey::Name(name) => Some(name),
            PropertyKey::Index(_) => None,
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        PropertyKey::Name(Arc::from(name))
    }
}

impl From<usize> for PropertyKey {
    fn from(index: usize) -> Self {
        PropertyKey::Index(index)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Name(name) => write!(f, "{}", name),
            PropertyKey::Index(index) => write!(f, "{}", index),
        }
    }
}

/// The preferred primitive type of a `default_value` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HintKind {
    #[default]
    Default,
    String,
    Number,
    Boolean,
}

/// Which native thing a script object wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeHandleKind {
    Class,
    Object,
    Array,
}

/// The dynamic kind of a script value, as seen by the conversion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicKind {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    NativeClass,
    NativeObject,
    NativeArray,
    ScriptObject,
    ScriptArray,
    ScriptCallable,
}

// ============================================================================
// Script Object Contracts
// ============================================================================

/// A script object: anything with properties.
pub trait ScriptObject: Send + Sync {
    fn class_name(&self) -> &str;

    fn has(&self, key: &PropertyKey) -> bool;

    /// `Ok(None)` when the property does not exist.
    fn get(&self, key: &PropertyKey) -> BridgeResult<Option<ScriptValue>>;

    fn put(&self, key: &PropertyKey, value: ScriptValue) -> BridgeResult<()>;

    /// Returns true if the property was removed.
    fn delete(&self, key: &PropertyKey) -> bool;

    fn own_keys(&self) -> Vec<PropertyKey>;

    fn default_value(&self, hint: HintKind) -> BridgeResult<ScriptValue>;

    /// Set by wrappers of native classes, instances and arrays.
    fn native_kind(&self) -> Option<NativeHandleKind> {
        None
    }

    /// The wrapped native value of a native wrapper.
    fn unwrap_native(&self) -> Option<NativeValue> {
        None
    }

    /// Array-like access, for script arrays.
    fn as_array_like(&self) -> Option<&dyn ArrayValueProvider> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// A callable script value.
pub trait ScriptCallable: Send + Sync {
    fn name(&self) -> &str;

    fn call(&self, this: &ScriptValue, args: &[ScriptValue]) -> BridgeResult<ScriptValue>;

    fn as_any(&self) -> &dyn Any;
}

/// Read access to an array-like script value.
pub trait ArrayValueProvider {
    fn length(&self) -> usize;

    /// Element `index`; `Undefined` past the end.
    fn value_at(&self, index: usize) -> ScriptValue;

    /// Describes the source in conversion error messages.
    fn error_source(&self) -> String;
}

// ============================================================================
// Script Values
// ============================================================================

/// A value on the script side of the bridge.
#[derive(Clone)]
pub enum ScriptValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(Arc<str>),
    Object(Arc<dyn ScriptObject>),
    Callable(Arc<dyn ScriptCallable>),
}

impl ScriptValue {
    pub fn string(value: &str) -> Self {
        ScriptValue::String(Arc::from(value))
    }

    pub fn object<T: ScriptObject + 'static>(object: T) -> Self {
        ScriptValue::Object(Arc::new(object))
    }

    pub fn callable<T: ScriptCallable + 'static>(callable: T) -> Self {
        ScriptValue::Callable(Arc::new(callable))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, ScriptValue::Undefined | ScriptValue::Null)
    }

    pub fn as_object(&self) -> Option<&Arc<dyn ScriptObject>> {
        match self {
            ScriptValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The wrapped native value, for native wrappers.
    pub fn unwrap_native(&self) -> Option<NativeValue> {
        self.as_object().and_then(|object| object.unwrap_native())
    }

    pub fn dynamic_kind(&self) -> DynamicKind {
        match self {
            ScriptValue::Undefined => DynamicKind::Undefined,
            ScriptValue::Null => DynamicKind::Null,
            ScriptValue::Boolean(_) => DynamicKind::Boolean,
            ScriptValue::Number(_) => DynamicKind::Number,
            ScriptValue::String(_) => DynamicKind::String,
            ScriptValue::Callable(_) => DynamicKind::ScriptCallable,
            ScriptValue::Object(object) => match object.native_kind() {
                Some(NativeHandleKind::Class) => DynamicKind::NativeClass,
                Some(NativeHandleKind::Object) => DynamicKind::NativeObject,
                Some(NativeHandleKind::Array) => DynamicKind::NativeArray,
                None if object.as_array_like().is_some() => DynamicKind::ScriptArray,
                None => DynamicKind::ScriptObject,
            },
        }
    }

    /// The run-time class used as an overload memo key: native wrappers are
    /// unwrapped, script-side kinds map to reserved synthetic ids, null has
    /// no class.
    pub fn runtime_class(&self) -> Option<TypeHash> {
        match self {
            ScriptValue::Null => None,
            ScriptValue::Undefined => Some(well_known::SCRIPT_UNDEFINED),
            ScriptValue::Boolean(_) => Some(well_known::BOOLEAN),
            ScriptValue::Number(_) => Some(well_known::DOUBLE),
            ScriptValue::String(_) => Some(well_known::STRING),
            ScriptValue::Callable(_) => Some(well_known::SCRIPT_FUNCTION),
            ScriptValue::Object(object) => match object.unwrap_native() {
                Some(NativeValue::Object(native)) => Some(native.get().exact_type_key()),
                // a wrapped primitive converts differently from a bare one
                Some(boxed) => boxed
                    .runtime_type()
                    .map(|ty| TypeHash::from_parameterized(well_known::SCRIPT_BOXED, &[ty])),
                None if object.as_array_like().is_some() => Some(well_known::SCRIPT_ARRAY),
                None => Some(well_known::SCRIPT_OBJECT),
            },
        }
    }

    /// Identity of a script object or callable.
    pub fn identity(&self) -> Option<usize> {
        match self {
            ScriptValue::Object(object) => Some(Arc::as_ptr(object) as *const () as usize),
            ScriptValue::Callable(callable) => Some(Arc::as_ptr(callable) as *const () as usize),
            _ => None,
        }
    }

    /// Script `ToNumber`.
    pub fn to_number(&self) -> f64 {
        match self {
            ScriptValue::Undefined => f64::NAN,
            ScriptValue::Null => 0.0,
            ScriptValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            ScriptValue::Number(n) => *n,
            ScriptValue::String(s) => string_to_number(s),
            ScriptValue::Callable(_) => f64::NAN,
            ScriptValue::Object(object) => match object.default_value(HintKind::Number) {
                Ok(ScriptValue::Object(_)) | Err(_) => f64::NAN,
                Ok(primitive) => primitive.to_number(),
            },
        }
    }

    /// Script `ToString`.
    pub fn to_display_string(&self) -> String {
        match self {
            ScriptValue::Undefined => "undefined".to_string(),
            ScriptValue::Null => "null".to_string(),
            ScriptValue::Boolean(b) => b.to_string(),
            ScriptValue::Number(n) => number_to_string(*n),
            ScriptValue::String(s) => s.to_string(),
            ScriptValue::Callable(callable) => format!("function {}() {{ [native code] }}", callable.name()),
            ScriptValue::Object(object) => match object.default_value(HintKind::String) {
                Ok(ScriptValue::Object(_)) | Err(_) => format!("[object {}]", object.class_name()),
                Ok(primitive) => primitive.to_display_string(),
            },
        }
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            ScriptValue::String(s) => format!("{:?}", s),
            ScriptValue::Object(object) => match object.unwrap_native() {
                Some(native) => format!("native {}", native.display_string()),
                None => format!("[object {}]", object.class_name()),
            },
            other => other.to_display_string(),
        }
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Undefined => write!(f, "Undefined"),
            ScriptValue::Null => write!(f, "Null"),
            ScriptValue::Boolean(b) => write!(f, "Boolean({})", b),
            ScriptValue::Number(n) => write!(f, "Number({})", n),
            ScriptValue::String(s) => write!(f, "String({:?})", s),
            ScriptValue::Object(object) => write!(f, "Object({})", object.class_name()),
            ScriptValue::Callable(callable) => write!(f, "Callable({})", callable.name()),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        ScriptValue::Boolean(value)
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        ScriptValue::Number(value)
    }
}

impl From<i32> for ScriptValue {
    fn from(value: i32) -> Self {
        ScriptValue::Number(value as f64)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::string(value)
    }
}

/// Script number formatting: integral values print without a fraction.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == n.trunc() && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Script string-to-number conversion; `NaN` for non-numeric text.
pub fn string_to_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if digits == "Infinity" {
        return sign * f64::INFINITY;
    }
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        return match u64::from_str_radix(hex, 16) {
            Ok(v) if !trimmed.starts_with(['-', '+']) => v as f64,
            _ => f64::NAN,
        };
    }
    let numeric = digits
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeric {
        return f64::NAN;
    }
    digits.parse::<f64>().map(|v| sign * v).unwrap_or(f64::NAN)
}

// ============================================================================
// Script Host
// ============================================================================

/// Whether native primitives (booleans, numbers, strings) returned from
/// native code with a non-primitive static type are wrapped as native
/// objects instead of being handed to scripts as bare values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WrapPolicy {
    pub wrap_primitives: bool,
}

/// The execution engine, as seen by the bridge.
pub trait ScriptHost: Send + Sync {
    fn invoke_callable(
        &self,
        callable: &Arc<dyn ScriptCallable>,
        this: &ScriptValue,
        args: &[ScriptValue],
    ) -> BridgeResult<ScriptValue> {
        callable.call(this, args)
    }

    /// Read on every wrap; never cached by the bridge.
    fn wrap_policy(&self) -> WrapPolicy {
        WrapPolicy::default()
    }
}

/// A host that calls callables directly with a fixed wrap policy.
#[derive(Debug, Default)]
pub struct DirectHost {
    policy: WrapPolicy,
}

impl DirectHost {
    pub fn new(policy: WrapPolicy) -> Self {
        Self { policy }
    }
}

impl ScriptHost for DirectHost {
    fn wrap_policy(&self) -> WrapPolicy {
        self.policy
    }
}

// ============================================================================
// Script Handles
// ============================================================================

/// A script value passed through the native world without conversion.
#[derive(Clone)]
pub struct ScriptHandle {
    pub value: ScriptValue,
}

impl fmt::Debug for ScriptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptHandle").field("value", &self.value).finish()
    }
}

impl NativeObject for ScriptHandle {
    fn runtime_type(&self) -> TypeHash {
        well_known::SCRIPT_HANDLE
    }

    fn display_string(&self) -> String {
        self.value.to_display_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Minimal Script Objects
// ============================================================================

/// A generic script object with insertion-ordered named properties.
#[derive(Default)]
pub struct PlainObject {
    properties: RwLock<Vec<(Arc<str>, ScriptValue)>>,
}

impl PlainObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style property initialization.
    pub fn with(self, name: &str, value: impl Into<ScriptValue>) -> Self {
        self.properties.write().push((Arc::from(name), value.into()));
        self
    }

    pub fn with_value(self, name: &str, value: ScriptValue) -> Self {
        self.properties.write().push((Arc::from(name), value));
        self
    }
}

impl ScriptObject for PlainObject {
    fn class_name(&self) -> &str {
        "Object"
    }

    fn has(&self, key: &PropertyKey) -> bool {
        let name = key.to_string();
        self.properties.read().iter().any(|(k, _)| **k == *name)
    }

    fn get(&self, key: &PropertyKey) -> BridgeResult<Option<ScriptValue>> {
        let name = key.to_string();
        Ok(self
            .properties
            .read()
            .iter()
            .find(|(k, _)| **k == *name)
            .map(|(_, v)| v.clone()))
    }

    fn put(&self, key: &PropertyKey, value: ScriptValue) -> BridgeResult<()> {
        let name = key.to_string();
        let mut properties = self.properties.write();
        match properties.iter_mut().find(|(k, _)| **k == *name) {
            Some((_, slot)) => *slot = value,
            None => properties.push((Arc::from(name.as_str()), value)),
        }
        Ok(())
    }

    fn delete(&self, key: &PropertyKey) -> bool {
        let name = key.to_string();
        let mut properties = self.properties.write();
        let before = properties.len();
        properties.retain(|(k, _)| **k != *name);
        properties.len() != before
    }

    fn own_keys(&self) -> Vec<PropertyKey> {
        self.properties
            .read()
            .iter()
            .map(|(k, _)| PropertyKey::Name(k.clone()))
            .collect()
    }

    fn default_value(&self, hint: HintKind) -> BridgeResult<ScriptValue> {
        Ok(match hint {
            HintKind::Boolean => ScriptValue::Boolean(true),
            _ => ScriptValue::string("[object Object]"),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A growable script array.
#[derive(Default)]
pub struct ScriptArray {
    elements: RwLock<Vec<ScriptValue>>,
}

impl ScriptArray {
    pub fn new(elements: Vec<ScriptValue>) -> Self {
        Self {
            elements: RwLock::new(elements),
        }
    }

    pub fn to_vec(&self) -> Vec<ScriptValue> {
        self.elements.read().clone()
    }
}

impl ArrayValueProvider for ScriptArray {
    fn length(&self) -> usize {
        self.elements.read().len()
    }

    fn value_at(&self, index: usize) -> ScriptValue {
        self.elements
            .read()
            .get(index)
            .cloned()
            .unwrap_or(ScriptValue::Undefined)
    }

    fn error_source(&self) -> String {
        format!("script array of length {}", self.length())
    }
}

impl ScriptObject for ScriptArray {
    fn class_name(&self) -> &str {
        "Array"
    }

    fn has(&self, key: &PropertyKey) -> bool {
        match key {
            PropertyKey::Index(i) => *i < self.length(),
            PropertyKey::Name(name) => &**name == "length",
        }
    }

    fn get(&self, key: &PropertyKey) -> BridgeResult<Option<ScriptValue>> {
        Ok(match key {
            PropertyKey::Index(i) => self.elements.read().get(*i).cloned(),
            PropertyKey::Name(name) if &**name == "length" => Some(ScriptValue::Number(self.length() as f64)),
            PropertyKey::Name(_) => None,
        })
    }

    fn put(&self, key: &PropertyKey, value: ScriptValue) -> BridgeResult<()> {
        match key {
            PropertyKey::Index(i) => {
                let mut elements = self.elements.write();
                if *i >= elements.len() {
                    elements.resize(*i + 1, ScriptValue::Undefined);
                }
                elements[*i] = value;
                Ok(())
            }
            PropertyKey::Name(name) => Err(BridgeError::MemberNotFound {
                type_name: "Array".to_string(),
                name: name.to_string(),
            }),
        }
    }

    fn delete(&self, key: &PropertyKey) -> bool {
        match key {
            PropertyKey::Index(i) => match self.elements.write().get_mut(*i) {
                Some(slot) => {
                    *slot = ScriptValue::Undefined;
                    true
                }
                None => false,
            },
            PropertyKey::Name(_) => false,
        }
    }

    fn own_keys(&self) -> Vec<PropertyKey> {
        (0..self.length()).map(PropertyKey::Index).collect()
    }

    fn default_value(&self, _hint: HintKind) -> BridgeResult<ScriptValue> {
        let parts: Vec<String> = self
            .elements
            .read()
            .iter()
            .map(|v| if v.is_nullish() { String::new() } else { v.to_display_string() })
            .collect();
        Ok(ScriptValue::String(Arc::from(parts.join(","))))
    }

    fn as_array_like(&self) -> Option<&dyn ArrayValueProvider> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

type ClosureBody = dyn Fn(&ScriptValue, &[ScriptValue]) -> BridgeResult<ScriptValue> + Send + Sync;

/// A script callable backed by a Rust closure.
pub struct ClosureFunction {
    name: Arc<str>,
    body: Box<ClosureBody>,
}

impl ClosureFunction {
    pub fn new<F>(name: &str, body: F) -> Self
    where
        F: Fn(&ScriptValue, &[ScriptValue]) -> BridgeResult<ScriptValue> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            body: Box::new(body),
        }
    }
}

impl ScriptCallable for ClosureFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, this: &ScriptValue, args: &[ScriptValue]) -> BridgeResult<ScriptValue> {
        (self.body)(this, args)
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

    #[test]
    fn dynamic_kinds() {
        assert_eq!(ScriptValue::Undefined.dynamic_kind(), DynamicKind::Undefined);
        assert_eq!(ScriptValue::from(1.5).dynamic_kind(), DynamicKind::Number);
        assert_eq!(ScriptValue::object(PlainObject::new()).dynamic_kind(), DynamicKind::ScriptObject);
        assert_eq!(ScriptValue::object(ScriptArray::default()).dynamic_kind(), DynamicKind::ScriptArray);
        let f = ClosureFunction::new("f", |_, _| Ok(ScriptValue::Undefined));
        assert_eq!(ScriptValue::callable(f).dynamic_kind(), DynamicKind::ScriptCallable);
    }

    #[test]
    fn runtime_classes() {
        assert_eq!(ScriptValue::Null.runtime_class(), None);
        assert_eq!(ScriptValue::Undefined.runtime_class(), Some(well_known::SCRIPT_UNDEFINED));
        assert_eq!(ScriptValue::from(3).runtime_class(), Some(well_known::DOUBLE));
        assert_eq!(ScriptValue::from("x").runtime_class(), Some(well_known::STRING));
        assert_eq!(
            ScriptValue::object(ScriptArray::default()).runtime_class(),
            Some(well_known::SCRIPT_ARRAY)
        );
        assert_eq!(
            ScriptValue::object(PlainObject::new()).runtime_class(),
            Some(well_known::SCRIPT_OBJECT)
        );
    }

    #[test]
    fn number_formatting() {
        assert_eq!(number_to_string(3.0), "3");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(2.5), "2.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn string_parsing() {
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert_eq!(string_to_number("-1.5e2"), -150.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1F"), 31.0);
        assert_eq!(string_to_number("Infinity"), f64::INFINITY);
        assert!(string_to_number("12abc").is_nan());
        assert!(string_to_number("inf").is_nan());
    }

    #[test]
    fn to_number_and_string() {
        assert!(ScriptValue::Undefined.to_number().is_nan());
        assert_eq!(ScriptValue::Null.to_number(), 0.0);
        assert_eq!(ScriptValue::Boolean(true).to_number(), 1.0);
        assert_eq!(ScriptValue::from("7").to_number(), 7.0);
        assert!(ScriptValue::object(PlainObject::new()).to_number().is_nan());

        let arr = ScriptArray::new(vec![1.into(), "a".into(), ScriptValue::Null]);
        assert_eq!(ScriptValue::object(arr).to_display_string(), "1,a,");
    }

    #[test]
    fn plain_object_properties() {
        let obj = PlainObject::new().with("x", 1).with("y", "two");
        assert!(obj.has(&"x".into()));
        obj.put(&"x".into(), 5.into()).unwrap();
        assert_eq!(obj.get(&"x".into()).unwrap().and_then(|v| v.as_number()), Some(5.0));
        assert!(obj.delete(&"y".into()));
        assert_eq!(obj.own_keys(), vec![PropertyKey::from("x")]);
        assert_eq!(obj.get(&"missing".into()).unwrap().map(|_| ()), None);
    }

    #[test]
    fn script_array_provider() {
        let arr = ScriptArray::new(vec![1.into(), 2.into()]);
        assert_eq!(arr.length(), 2);
        assert_eq!(arr.value_at(1).as_number(), Some(2.0));
        assert!(matches!(arr.value_at(5), ScriptValue::Undefined));
        arr.put(&PropertyKey::Index(3), 9.into()).unwrap();
        assert_eq!(arr.length(), 4);
    }

    #[test]
    fn identity_is_per_allocation() {
        let obj = ScriptValue::object(PlainObject::new());
        let same = obj.clone();
        let other = ScriptValue::object(PlainObject::new());
        assert_eq!(obj.identity(), same.identity());
        assert_ne!(obj.identity(), other.identity());
        assert_eq!(ScriptValue::from(1).identity(), None);
    }
}
