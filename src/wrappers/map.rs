use std::any::Any;
use std::fmt;
use std::sync::Arc;

use hostbridge_core::{
    BridgeResult, HintKind, NativeHandleKind, NativeMap, NativeValue, PropertyKey, ScriptObject, ScriptValue,
    TypeDescriptor,
};

use crate::bridge::Bridge;
use crate::wrappers::InstanceWrapper;

/// A native map seen from script code.
///
/// Keys present in the map shadow members of the map type. Writing a key
/// the map lacks goes to a same-named member if there is one, else inserts.
pub struct MapWrapper {
    instance: InstanceWrapper,
}

impl MapWrapper {
    pub(crate) fn new(bridge: Arc<Bridge>, value: NativeValue, static_type: TypeDescriptor) -> Self {
        Self {
            instance: InstanceWrapper::new(bridge, value, static_type),
        }
    }

    pub fn instance(&self) -> &InstanceWrapper {
        &self.instance
    }

    fn map(&self) -> &NativeMap {
        self.instance
            .value()
            .downcast_ref::<NativeMap>()
            .unwrap_or_else(|| unreachable!("map wrapper around a non-map"))
    }

    /// The property key as a native map key.
    fn map_key(&self, key: &PropertyKey) -> BridgeResult<NativeValue> {
        let script_key = match key {
            PropertyKey::Name(name) => ScriptValue::String(name.clone()),
            PropertyKey::Index(index) => ScriptValue::Number(*index as f64),
        };
        self.instance.bridge().coerce(&script_key, self.map().key_type())
    }

    fn present_key(&self, key: &PropertyKey) -> Option<NativeValue> {
        self.map_key(key).ok().filter(|native| self.map().contains_key(native))
    }
}

impl ScriptObject for MapWrapper {
    fn class_name(&self) -> &str {
        "NativeMap"
    }

    fn has(&self, key: &PropertyKey) -> bool {
        self.present_key(key).is_some() || key.as_name().is_some_and(|name| self.instance.has_member(name))
    }

    fn get(&self, key: &PropertyKey) -> BridgeResult<Option<ScriptValue>> {
        let map = self.map();
        if let Some(native) = self.present_key(key)
            && let Some(value) = map.get(&native)
        {
            return Ok(Some(self.instance.bridge().wrap(value, map.value_type())));
        }
        match key.as_name() {
            Some(name) => self.instance.get_member(name),
            None => Ok(None),
        }
    }

    fn put(&self, key: &PropertyKey, value: ScriptValue) -> BridgeResult<()> {
        let map = self.map();
        let native_key = self.map_key(key);
        let present = native_key.as_ref().is_ok_and(|native| map.contains_key(native));
        if !present
            && let Some(name) = key.as_name()
            && self.instance.has_member(name)
        {
            return self.instance.put_member(name, value);
        }

        let native_key = native_key?;
        let converted = self.instance.bridge().coerce(&value, map.value_type())?;
        map.insert(native_key, converted);
        Ok(())
    }

    fn delete(&self, key: &PropertyKey) -> bool {
        self.map_key(key)
            .is_ok_and(|native| self.map().remove(&native).is_some())
    }

    fn own_keys(&self) -> Vec<PropertyKey> {
        let mut keys: Vec<PropertyKey> = self
            .map()
            .keys()
            .iter()
            .map(|key| PropertyKey::Name(Arc::from(key.display_string())))
            .collect();
        for member in self.instance.member_keys() {
            if !keys.contains(&member) {
                keys.push(member);
            }
        }
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

impl fmt::Debug for MapWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MapWrapper").field(&self.instance).finish()
    }
}
