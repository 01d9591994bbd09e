use std::any::Any;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use hostbridge_core::{
    BridgeError, BridgeResult, HintKind, IntrospectionError, NativeHandleKind, NativeValue, PropertyKey, ScriptObject, ScriptValue,
    TypeDescriptor,
};
use hostbridge_registry::MemberEntry;

use crate::bridge::Bridge;
use crate::overload;

/// A native class seen from script code: its static members, plus
/// [`construct`](Self::construct).
pub struct ClassWrapper {
    bridge: Arc<Bridge>,
    value: NativeValue,
    ty: TypeDescriptor,
    members: OnceCell<Arc<MemberEntry>>,
}

impl ClassWrapper {
    pub(crate) fn new(bridge: Arc<Bridge>, value: NativeValue, ty: TypeDescriptor) -> Self {
        Self {
            bridge,
            value,
            ty,
            members: OnceCell::new(),
        }
    }

    /// The class this wrapper stands for.
    pub fn class_type(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn members(&self) -> BridgeResult<&Arc<MemberEntry>> {
        self.members.get_or_try_init(|| {
            let id = self.ty.type_id().ok_or_else(|| {
                BridgeError::from(IntrospectionError::UnknownType {
                    type_name: self.ty.signature(),
                })
            })?;
            self.bridge.lookup_members(id, None, false)
        })
    }

    /// Resolve a constructor against `args` and return the new instance.
    pub fn construct(&self, args: &[ScriptValue]) -> BridgeResult<ScriptValue> {
        overload::construct(&self.bridge, self.members()?, args)
    }
}

impl ScriptObject for ClassWrapper {
    fn class_name(&self) -> &str {
        "NativeClass"
    }

    fn has(&self, key: &PropertyKey) -> bool {
        key.as_name()
            .is_some_and(|name| self.members().is_ok_and(|entry| entry.has(name, true)))
    }

    fn get(&self, key: &PropertyKey) -> BridgeResult<Option<ScriptValue>> {
        let Some(name) = key.as_name() else {
            return Ok(None);
        };
        let entry = self.members()?;
        if !entry.has(name, true) {
            return Ok(None);
        }
        entry.get(self.bridge.as_ref(), None, name, true).map(Some)
    }

    fn put(&self, key: &PropertyKey, value: ScriptValue) -> BridgeResult<()> {
        let entry = self.members()?;
        entry.put(self.bridge.as_ref(), None, &key.to_string(), &value, true)
    }

    fn delete(&self, _key: &PropertyKey) -> bool {
        false
    }

    fn own_keys(&self) -> Vec<PropertyKey> {
        match self.members() {
            Ok(entry) => entry.ids(true).into_iter().map(PropertyKey::Name).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn default_value(&self, _hint: HintKind) -> BridgeResult<ScriptValue> {
        Ok(ScriptValue::string(&self.value.display_string()))
    }

    fn native_kind(&self) -> Option<NativeHandleKind> {
        Some(NativeHandleKind::Class)
    }

    fn unwrap_native(&self) -> Option<NativeValue> {
        Some(self.value.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for ClassWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassWrapper").field("ty", &self.ty).finish()
    }
}
