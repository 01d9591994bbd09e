use std::any::Any;
use std::fmt;
use std::sync::Arc;

use hostbridge_core::{
    BridgeError, BridgeResult, HintKind, NativeArray, NativeHandleKind, NativeValue, PropertyKey, ScriptObject,
    ScriptValue, TypeDescriptor,
};

use crate::bridge::Bridge;

const LENGTH: &str = "length";

/// A native array seen from script code: indexed elements and a read-only
/// `length`.
pub struct ArrayWrapper {
    bridge: Arc<Bridge>,
    value: NativeValue,
    component: TypeDescriptor,
}

impl ArrayWrapper {
    pub(crate) fn new(bridge: Arc<Bridge>, value: NativeValue, component: TypeDescriptor) -> Self {
        Self {
            bridge,
            value,
            component,
        }
    }

    pub fn component_type(&self) -> &TypeDescriptor {
        &self.component
    }

    fn array(&self) -> &NativeArray {
        self.value
            .downcast_ref::<NativeArray>()
            .unwrap_or_else(|| unreachable!("array wrapper around a non-array"))
    }

    fn array_type(&self) -> String {
        TypeDescriptor::array(self.component.clone()).signature()
    }
}

impl ScriptObject for ArrayWrapper {
    fn class_name(&self) -> &str {
        "NativeArray"
    }

    fn has(&self, key: &PropertyKey) -> bool {
        match key {
            PropertyKey::Index(index) => *index < self.array().len(),
            PropertyKey::Name(name) => &**name == LENGTH,
        }
    }

    fn get(&self, key: &PropertyKey) -> BridgeResult<Option<ScriptValue>> {
        match key {
            PropertyKey::Index(index) => Ok(self
                .array()
                .get(*index)
                .map(|element| self.bridge.wrap(element, &self.component))),
            PropertyKey::Name(name) if &**name == LENGTH => Ok(Some(ScriptValue::Number(self.array().len() as f64))),
            PropertyKey::Name(_) => Ok(None),
        }
    }

    fn put(&self, key: &PropertyKey, value: ScriptValue) -> BridgeResult<()> {
        match key {
            PropertyKey::Index(index) => {
                let converted = self.bridge.coerce(&value, &self.component)?;
                self.array().set(*index, converted)
            }
            PropertyKey::Name(name) if &**name == LENGTH => Err(BridgeError::ImmutableMemberWrite {
                type_name: self.array_type(),
                name: LENGTH.to_string(),
            }),
            PropertyKey::Name(name) => Err(BridgeError::MemberNotFound {
                type_name: self.array_type(),
                name: name.to_string(),
            }),
        }
    }

    fn delete(&self, _key: &PropertyKey) -> bool {
        false
    }

    fn own_keys(&self) -> Vec<PropertyKey> {
        (0..self.array().len()).map(PropertyKey::Index).collect()
    }

    fn default_value(&self, _hint: HintKind) -> BridgeResult<ScriptValue> {
        Ok(ScriptValue::string(&self.value.display_string()))
    }

    fn native_kind(&self) -> Option<NativeHandleKind> {
        Some(NativeHandleKind::Array)
    }

    fn unwrap_native(&self) -> Option<NativeValue> {
        Some(self.value.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for ArrayWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayWrapper")
            .field("component", &self.component)
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use hostbridge_core::NumericKind;

    use super::*;
    use crate::testing::standard_bridge;

    fn int_array(bridge: &Bridge, values: &[i32]) -> (ScriptValue, NativeValue) {
        let int = TypeDescriptor::numeric(NumericKind::Int);
        let native = NativeValue::object(NativeArray::new(
            int.clone(),
            values.iter().map(|v| NativeValue::Int(*v)).collect(),
        ));
        (bridge.wrap(native.clone(), &TypeDescriptor::array(int)), native)
    }

    #[test]
    fn elements_and_length() {
        let bridge = standard_bridge();
        let (wrapped, _) = int_array(&bridge, &[4, 5, 6]);
        let array = wrapped.as_object().unwrap();
        assert!(array.has(&PropertyKey::Index(2)));
        assert!(!array.has(&PropertyKey::Index(3)));
        assert!(array.has(&"length".into()));
        assert_eq!(array.get(&"length".into()).unwrap().unwrap().as_number(), Some(3.0));
        assert_eq!(array.get(&PropertyKey::Index(1)).unwrap().unwrap().as_number(), Some(5.0));
        assert!(array.get(&PropertyKey::Index(3)).unwrap().is_none());
        assert!(array.get(&"size".into()).unwrap().is_none());
        assert_eq!(array.own_keys(), vec![PropertyKey::Index(0), PropertyKey::Index(1), PropertyKey::Index(2)]);
    }

    #[test]
    fn writes_convert_to_the_component_type() {
        let bridge = standard_bridge();
        let (wrapped, native) = int_array(&bridge, &[4, 5, 6]);
        let array = wrapped.as_object().unwrap();
        array.put(&PropertyKey::Index(0), "9".into()).unwrap();
        let stored = native.downcast_ref::<NativeArray>().unwrap().to_vec();
        assert_eq!(stored, vec![NativeValue::Int(9), NativeValue::Int(5), NativeValue::Int(6)]);
        assert!(array.put(&PropertyKey::Index(1), "x".into()).unwrap_err().is_conversion());
    }

    #[test]
    fn arrays_never_grow() {
        let bridge = standard_bridge();
        let (wrapped, _) = int_array(&bridge, &[4]);
        let array = wrapped.as_object().unwrap();
        let err = array.put(&PropertyKey::Index(1), 1.into()).unwrap_err();
        assert_eq!(err, BridgeError::IndexOutOfBounds { index: 1, length: 1 });
        let err = array.put(&"length".into(), 5.into()).unwrap_err();
        assert!(matches!(err, BridgeError::ImmutableMemberWrite { ref type_name, .. } if type_name == "int[]"));
        assert!(array.put(&"push".into(), 5.into()).unwrap_err().is_member_not_found());
        assert!(!array.delete(&PropertyKey::Index(0)));
    }

    #[test]
    fn empty_arrays() {
        let bridge = standard_bridge();
        let (wrapped, _) = int_array(&bridge, &[]);
        let array = wrapped.as_object().unwrap();
        assert!(array.own_keys().is_empty());
        assert!(!array.has(&PropertyKey::Index(0)));
        assert_eq!(array.get(&"length".into()).unwrap().unwrap().as_number(), Some(0.0));
    }

    #[test]
    fn string_elements_stay_strings() {
        let bridge = standard_bridge();
        let string = TypeDescriptor::string();
        let native = NativeValue::object(NativeArray::new(string.clone(), vec![NativeValue::string("a")]));
        let wrapped = bridge.wrap(native, &TypeDescriptor::array(string));
        let first = wrapped.as_object().unwrap().get(&PropertyKey::Index(0)).unwrap().unwrap();
        assert_eq!(first.as_str(), Some("a"));
    }
}
