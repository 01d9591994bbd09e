use std::any::Any;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use hostbridge_core::{
    BridgeError, BridgeResult, HintKind, NativeHandleKind, NativeValue, PropertyKey, ScriptObject, ScriptValue,
    TypeDescriptor,
};
use hostbridge_registry::MemberEntry;

use crate::bridge::Bridge;

/// A native instance seen from script code.
///
/// Properties are the instance members of the value's run-time type, with
/// static members visible as a fallback. Index keys never match.
pub struct InstanceWrapper {
    bridge: Arc<Bridge>,
    value: NativeValue,
    static_type: TypeDescriptor,
    members: OnceCell<Arc<MemberEntry>>,
}

impl InstanceWrapper {
    pub(crate) fn new(bridge: Arc<Bridge>, value: NativeValue, static_type: TypeDescriptor) -> Self {
        Self {
            bridge,
            value,
            static_type,
            members: OnceCell::new(),
        }
    }

    pub fn value(&self) -> &NativeValue {
        &self.value
    }

    /// The declared type this value was obtained through.
    pub fn static_type(&self) -> &TypeDescriptor {
        &self.static_type
    }

    pub(crate) fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    /// The member entry of the run-time type, looked up once.
    pub fn members(&self) -> BridgeResult<&Arc<MemberEntry>> {
        self.members.get_or_try_init(|| {
            let concrete = self.value.member_type().ok_or_else(|| BridgeError::NotCallable {
                value: self.value.display_string(),
            })?;
            self.bridge.lookup_members(concrete, self.static_type.type_id(), false)
        })
    }

    pub(crate) fn has_member(&self, name: &str) -> bool {
        self.members().is_ok_and(|entry| entry.has(name, false))
    }

    pub(crate) fn get_member(&self, name: &str) -> BridgeResult<Option<ScriptValue>> {
        let entry = self.members()?;
        if !entry.has(name, false) {
            return Ok(None);
        }
        entry.get(self.bridge.as_ref(), Some(&self.value), name, false).map(Some)
    }

    pub(crate) fn put_member(&self, name: &str, value: ScriptValue) -> BridgeResult<()> {
        self.members()?
            .put(self.bridge.as_ref(), Some(&self.value), name, &value, false)
    }

    pub(crate) fn member_keys(&self) -> Vec<PropertyKey> {
        match self.members() {
            Ok(entry) => entry.ids(false).into_iter().map(PropertyKey::Name).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub(crate) fn default_for(&self, hint: HintKind) -> BridgeResult<ScriptValue> {
        let entry = self.members().ok().map(Arc::as_ref);
        super::default_value(&self.bridge, &self.value, entry, hint)
    }

    fn index_error(&self, index: usize) -> BridgeError {
        BridgeError::MemberNotFound {
            type_name: self.static_type.signature(),
            name: index.to_string(),
        }
    }
}

impl ScriptObject for InstanceWrapper {
    fn class_name(&self) -> &str {
        "NativeObject"
    }

    fn has(&self, key: &PropertyKey) -> bool {
        key.as_name().is_some_and(|name| self.has_member(name))
    }

    fn get(&self, key: &PropertyKey) -> BridgeResult<Option<ScriptValue>> {
        match key {
            PropertyKey::Name(name) => self.get_member(name),
            PropertyKey::Index(_) => Ok(None),
        }
    }

    fn put(&self, key: &PropertyKey, value: ScriptValue) -> BridgeResult<()> {
        match key {
            PropertyKey::Name(name) => self.put_member(name, value),
            PropertyKey::Index(index) => Err(self.index_error(*index)),
        }
    }

    fn delete(&self, _key: &PropertyKey) -> bool {
        false
    }

    fn own_keys(&self) -> Vec<PropertyKey> {
        self.member_keys()
    }

    fn default_value(&self, hint: HintKind) -> BridgeResult<ScriptValue> {
        self.default_for(hint)
    }

    fn native_kind(&self) -> Option<NativeHandleKind> {
        Some(NativeHandleKind::Object)
    }

    fn unwrap_native(&self) -> Option<NativeValue> {
        Some(self.value.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for InstanceWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceWrapper")
            .field("value", &self.value)
            .field("static_type", &self.static_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use hostbridge_core::synthetic::{FieldBuilder, MethodBuilder, SyntheticIntrospector, SyntheticObject, TypeBuilder};
    use hostbridge_core::{MemberFlags, NumericKind, ScriptCallable};

    use super::*;
    use crate::testing::bridge;

    fn int() -> TypeDescriptor {
        TypeDescriptor::numeric(NumericKind::Int)
    }

    /// `demo.Point` with fields `x`, final `id`, a `getLabel`/`setLabel`
    /// bean pair, `norm()` and a static `origin()`.
    fn point() -> (Arc<Bridge>, ScriptValue, NativeValue) {
        let intro = SyntheticIntrospector::with_standard_types();
        let ty = intro.register(
            TypeBuilder::class("demo.Point")
                .field(FieldBuilder::new("x", int()))
                .field(FieldBuilder::new("id", int()).flags(MemberFlags::FINAL))
                .method(MethodBuilder::new("getLabel").returns(TypeDescriptor::string()).invoke(|this, _| {
                    let object = this.and_then(|v| v.downcast_ref::<SyntheticObject>());
                    Ok(object.and_then(|o| o.field("label")).unwrap_or(NativeValue::Null))
                }))
                .method(MethodBuilder::new("setLabel").param(TypeDescriptor::string()).invoke(|this, args| {
                    if let Some(object) = this.and_then(|v| v.downcast_ref::<SyntheticObject>()) {
                        object.set_field("label", args[0].clone());
                    }
                    Ok(NativeValue::Void)
                }))
                .method(
                    MethodBuilder::new("norm")
                        .returns(TypeDescriptor::numeric(NumericKind::Double))
                        .returning(NativeValue::from(5.0)),
                )
                .method(
                    MethodBuilder::new("origin")
                        .returns(TypeDescriptor::string())
                        .flags(MemberFlags::STATIC)
                        .returning(NativeValue::string("0,0")),
                ),
        );
        let bridge = bridge(intro);
        let native = NativeValue::object(
            SyntheticObject::new(&ty)
                .with_field("x", NativeValue::Int(3))
                .with_field("id", NativeValue::Int(9))
                .with_display("Point(3)"),
        );
        let wrapped = bridge.wrap(native.clone(), &ty);
        (bridge, wrapped, native)
    }

    fn object(value: &ScriptValue) -> &Arc<dyn ScriptObject> {
        value.as_object().unwrap()
    }

    #[test]
    fn fields_read_and_write() {
        let (_bridge, wrapped, native) = point();
        let point = object(&wrapped);
        assert!(point.has(&"x".into()));
        assert_eq!(point.get(&"x".into()).unwrap().unwrap().as_number(), Some(3.0));
        point.put(&"x".into(), "7".into()).unwrap();
        let stored = native.downcast_ref::<SyntheticObject>().unwrap().field("x");
        assert_eq!(stored, Some(NativeValue::Int(7)));
    }

    #[test]
    fn final_fields_reject_writes() {
        let (_bridge, wrapped, native) = point();
        let err = object(&wrapped).put(&"id".into(), 1.into()).unwrap_err();
        assert!(matches!(err, BridgeError::ImmutableMemberWrite { ref name, .. } if name == "id"));
        let stored = native.downcast_ref::<SyntheticObject>().unwrap().field("id");
        assert_eq!(stored, Some(NativeValue::Int(9)));
    }

    #[test]
    fn bean_properties_call_accessors() {
        let (_bridge, wrapped, _) = point();
        let point = object(&wrapped);
        assert!(point.get(&"label".into()).unwrap().unwrap().is_nullish());
        point.put(&"label".into(), "home".into()).unwrap();
        assert_eq!(point.get(&"label".into()).unwrap().unwrap().as_str(), Some("home"));
    }

    #[test]
    fn methods_are_bound_callables() {
        let (_bridge, wrapped, _) = point();
        let norm = object(&wrapped).get(&"norm".into()).unwrap().unwrap();
        let ScriptValue::Callable(norm) = norm else {
            panic!("norm should be callable");
        };
        assert_eq!(norm.name(), "norm");
        assert_eq!(norm.call(&ScriptValue::Undefined, &[]).unwrap().as_number(), Some(5.0));
        let origin = object(&wrapped).get(&"origin".into()).unwrap().unwrap();
        assert!(matches!(origin, ScriptValue::Callable(_)));
    }

    #[test]
    fn missing_members_and_index_keys() {
        let (_bridge, wrapped, _) = point();
        let point = object(&wrapped);
        assert!(point.get(&"nope".into()).unwrap().is_none());
        assert!(point.get(&PropertyKey::Index(0)).unwrap().is_none());
        assert!(point.put(&"nope".into(), 1.into()).unwrap_err().is_member_not_found());
        assert!(point.put(&PropertyKey::Index(0), 1.into()).is_err());
        assert!(!point.delete(&"x".into()));
        assert!(point.has(&"x".into()));
    }

    #[test]
    fn keys_and_default_value() {
        let (_bridge, wrapped, _) = point();
        let point = object(&wrapped);
        let keys = point.own_keys();
        for name in ["x", "id", "norm", "label", "toString"] {
            assert!(keys.contains(&PropertyKey::from(name)), "{name} missing from {keys:?}");
        }
        assert_eq!(point.default_value(HintKind::String).unwrap().as_str(), Some("Point(3)"));
        assert_eq!(wrapped.to_display_string(), "Point(3)");
    }

    #[test]
    fn members_are_looked_up_once() {
        let (bridge, wrapped, _) = point();
        let wrapper = object(&wrapped).as_any().downcast_ref::<InstanceWrapper>().unwrap();
        let first = wrapper.members().unwrap().clone();
        assert!(Arc::ptr_eq(&first, wrapper.members().unwrap()));
        assert_eq!(bridge.registry().cached_len(), 1);
    }
}
