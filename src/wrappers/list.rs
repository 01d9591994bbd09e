use std::any::Any;
use std::fmt;
use std::sync::Arc;

use hostbridge_core::{
    BridgeError, BridgeResult, HintKind, NativeHandleKind, NativeList, NativeValue, PropertyKey, ScriptObject,
    ScriptValue, TypeDescriptor,
};

use crate::bridge::Bridge;
use crate::wrappers::InstanceWrapper;

const LENGTH: &str = "length";

/// A native list or set seen from script code.
///
/// Index keys read and write elements, writing at `length` appends, and
/// `length` reports the size. Every other name is a member of the
/// collection type.
pub struct ListWrapper {
    instance: InstanceWrapper,
}

impl ListWrapper {
    pub(crate) fn new(bridge: Arc<Bridge>, value: NativeValue, static_type: TypeDescriptor) -> Self {
        Self {
            instance: InstanceWrapper::new(bridge, value, static_type),
        }
    }

    pub fn instance(&self) -> &InstanceWrapper {
        &self.instance
    }

    fn list(&self) -> &NativeList {
        self.instance
            .value()
            .downcast_ref::<NativeList>()
            .unwrap_or_else(|| unreachable!("list wrapper around a non-list"))
    }

    fn store(&self, index: usize, value: ScriptValue) -> BridgeResult<()> {
        let list = self.list();
        let length = list.len();
        if index > length {
            return Err(BridgeError::IndexOutOfBounds { index, length });
        }
        let converted = self.instance.bridge().coerce(&value, list.element_type())?;
        if index == length {
            list.add(converted);
            Ok(())
        } else {
            list.set_at(index, converted).map(drop)
        }
    }
}

impl ScriptObject for ListWrapper {
    fn class_name(&self) -> &str {
        "NativeList"
    }

    fn has(&self, key: &PropertyKey) -> bool {
        match key {
            PropertyKey::Index(index) => *index < self.list().len(),
            PropertyKey::Name(name) => &**name == LENGTH || self.instance.has_member(name),
        }
    }

    fn get(&self, key: &PropertyKey) -> BridgeResult<Option<ScriptValue>> {
        let list = self.list();
        match key {
            PropertyKey::Index(index) => Ok(list
                .get(*index)
                .map(|element| self.instance.bridge().wrap(element, list.element_type()))),
            PropertyKey::Name(name) if &**name == LENGTH => Ok(Some(ScriptValue::Number(list.len() as f64))),
            PropertyKey::Name(name) => self.instance.get_member(name),
        }
    }

    fn put(&self, key: &PropertyKey, value: ScriptValue) -> BridgeResult<()> {
        match key {
            PropertyKey::Index(index) => self.store(*index, value),
            PropertyKey::Name(name) if &**name == LENGTH => Err(BridgeError::ImmutableMemberWrite {
                type_name: self.instance.static_type().signature(),
                name: LENGTH.to_string(),
            }),
            PropertyKey::Name(name) => self.instance.put_member(name, value),
        }
    }

    fn delete(&self, _key: &PropertyKey) -> bool {
        false
    }

    fn own_keys(&self) -> Vec<PropertyKey> {
        let mut keys: Vec<PropertyKey> = (0..self.list().len()).map(PropertyKey::Index).collect();
        keys.extend(self.instance.member_keys());
        keys
    }

    fn default_value(&self, hint: HintKind) -> BridgeResult<ScriptValue> {
        self.instance.default_for(hint)
    }

    fn native_kind(&self) -> Option<NativeHandleKind> {
        Some(NativeHandleKind::Object)
    }

    fn unwrap_native(&self) -> Option<NativeValue> {
        Some(self.instance.value().clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for ListWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListWrapper").field(&self.instance).finish()
    }
}
