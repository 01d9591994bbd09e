//! Script-visible proxies of native values.
//!
//! [`wrap`] is the native-to-script direction of the bridge:
//!
//! | native value | script value |
//! |---|---|
//! | `void` | `undefined` |
//! | `null` | `null` |
//! | boolean, number, string | bare value, or an [`InstanceWrapper`] when the host's wrap policy asks for it and the static type is not primitive |
//! | array | [`ArrayWrapper`] |
//! | list, set | [`ListWrapper`] |
//! | map | [`MapWrapper`] |
//! | class handle | [`ClassWrapper`] |
//! | interface adapter, script handle | the original script value |
//! | anything else | [`InstanceWrapper`] |
//!
//! Wrappers resolve their member entry lazily on first property access.

use hostbridge_core::{
    BridgeResult, HintKind, NativeArray, NativeClassRef, NativeList, NativeMap, NativeRef, NativeValue,
    ScriptHandle, ScriptValue, TypeDescriptor,
};
use hostbridge_registry::MemberEntry;

use crate::bridge::Bridge;
use crate::conversion::InterfaceAdapter;

mod array;
mod class;
mod instance;
mod list;
mod map;
mod method;

pub use array::ArrayWrapper;
pub use class::ClassWrapper;
pub use instance::InstanceWrapper;
pub use list::ListWrapper;
pub use map::MapWrapper;
pub use method::MethodFunction;

/// Native to script, by the static type the value was obtained through.
#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn wrap(bridge: &Bridge, value: NativeValue, static_type: &TypeDescriptor) -> ScriptValue {
    match value {
        NativeValue::Void => ScriptValue::Undefined,
        NativeValue::Null => ScriptValue::Null,
        NativeValue::Object(object) => wrap_object(bridge, object, static_type),
        primitive => {
            if static_type.is_primitive() || !bridge.host().wrap_policy().wrap_primitives {
                bare_primitive(&primitive, static_type)
            } else {
                ScriptValue::object(InstanceWrapper::new(bridge.handle(), primitive, static_type.clone()))
            }
        }
    }
}

/// A freshly constructed instance of `concrete`; never unwrapped to a bare
/// primitive.
pub(crate) fn wrap_new_instance(bridge: &Bridge, value: NativeValue, concrete: &TypeDescriptor) -> ScriptValue {
    match value {
        NativeValue::Object(object) => wrap_object(bridge, object, concrete),
        NativeValue::Void | NativeValue::Null => ScriptValue::Null,
        primitive => ScriptValue::object(InstanceWrapper::new(bridge.handle(), primitive, concrete.clone())),
    }
}

/// Booleans, numbers and strings as script primitives. A `char` becomes its
/// code point when the static type is primitive, else a one-character string.
pub(crate) fn bare_primitive(value: &NativeValue, static_type: &TypeDescriptor) -> ScriptValue {
    match value {
        NativeValue::Boolean(b) => ScriptValue::Boolean(*b),
        NativeValue::String(text) => ScriptValue::String(text.clone()),
        NativeValue::Char(c) if !static_type.is_primitive() => ScriptValue::string(&String::from_utf16_lossy(&[*c])),
        other => match other.as_f64() {
            Some(n) => ScriptValue::Number(n),
            None => ScriptValue::Null,
        },
    }
}

fn wrap_object(bridge: &Bridge, object: NativeRef, static_type: &TypeDescriptor) -> ScriptValue {
    if let Some(handle) = object.downcast_ref::<ScriptHandle>() {
        return handle.value.clone();
    }
    if let Some(adapter) = object.downcast_ref::<InterfaceAdapter>() {
        return adapter.target().clone();
    }

    let handle = bridge.handle();
    let value = NativeValue::Object(object.clone());
    if let Some(array) = object.downcast_ref::<NativeArray>() {
        let component = array.component_type().clone();
        ScriptValue::object(ArrayWrapper::new(handle, value, component))
    } else if object.downcast_ref::<NativeList>().is_some() {
        ScriptValue::object(ListWrapper::new(handle, value, static_type.clone()))
    } else if object.downcast_ref::<NativeMap>().is_some() {
        ScriptValue::object(MapWrapper::new(handle, value, static_type.clone()))
    } else if let Some(class) = object.downcast_ref::<NativeClassRef>() {
        let ty = class.ty.clone();
        ScriptValue::object(ClassWrapper::new(handle, value, ty))
    } else {
        ScriptValue::object(InstanceWrapper::new(handle, value, static_type.clone()))
    }
}

/// `default_value` shared by the wrappers: the no-arg accessor matching the
/// hint if the type has one, else the native string form.
pub(crate) fn default_value(
    bridge: &Bridge,
    value: &NativeValue,
    entry: Option<&MemberEntry>,
    hint: HintKind,
) -> BridgeResult<ScriptValue> {
    let accessor = match hint {
        HintKind::Boolean => Some("booleanValue"),
        HintKind::Number => Some("doubleValue"),
        HintKind::Default | HintKind::String => None,
    };
    if let (Some(name), Some(entry)) = (accessor, entry)
        && let Some(set) = entry.methods(name, false)
        && set.candidates.iter().any(|candidate| candidate.arity() == 0)
    {
        return bridge.invoke(set, Some(value), &[]);
    }
    Ok(ScriptValue::string(&value.display_string()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hostbridge_core::synthetic::{SyntheticIntrospector, SyntheticObject, TypeBuilder};
    use hostbridge_core::{DirectHost, DynamicKind, NumericKind, PlainObject, WrapPolicy};

    use super::*;
    use crate::config::BridgeConfig;
    use crate::testing::standard_bridge;

    fn wrapping_bridge() -> Arc<Bridge> {
        Bridge::new(
            Arc::new(SyntheticIntrospector::with_standard_types()),
            Arc::new(DirectHost::new(WrapPolicy { wrap_primitives: true })),
            BridgeConfig::default(),
        )
    }

    #[test]
    fn void_and_null() {
        let bridge = standard_bridge();
        assert!(matches!(bridge.wrap(NativeValue::Void, &TypeDescriptor::void()), ScriptValue::Undefined));
        assert!(matches!(bridge.wrap(NativeValue::Null, &TypeDescriptor::object()), ScriptValue::Null));
    }

    #[test]
    fn primitives_are_bare_by_default() {
        let bridge = standard_bridge();
        let object = TypeDescriptor::object();
        assert_eq!(bridge.wrap(NativeValue::Int(3), &object).as_number(), Some(3.0));
        assert_eq!(bridge.wrap(NativeValue::string("s"), &object).as_str(), Some("s"));
        assert!(matches!(bridge.wrap(NativeValue::Boolean(true), &object), ScriptValue::Boolean(true)));
    }

    #[test]
    fn chars_depend_on_the_static_type() {
        let bridge = standard_bridge();
        let c = NativeValue::Char(b'a' as u16);
        let char_type = TypeDescriptor::numeric(NumericKind::Char);
        assert_eq!(bridge.wrap(c.clone(), &char_type).as_number(), Some(97.0));
        assert_eq!(bridge.wrap(c, &TypeDescriptor::object()).as_str(), Some("a"));
    }

    #[test]
    fn wrap_policy_boxes_primitives_behind_reference_types() {
        let bridge = wrapping_bridge();
        let boxed = bridge.wrap(NativeValue::Int(3), &TypeDescriptor::object());
        assert_eq!(boxed.dynamic_kind(), DynamicKind::NativeObject);
        assert_eq!(boxed.unwrap_native(), Some(NativeValue::Int(3)));
        // a primitive static type always stays bare
        let int = TypeDescriptor::numeric(NumericKind::Int);
        assert_eq!(bridge.wrap(NativeValue::Int(3), &int).as_number(), Some(3.0));
    }

    #[test]
    fn boxed_numbers_use_their_accessors() {
        let bridge = wrapping_bridge();
        let boxed = bridge.wrap(NativeValue::Int(3), &TypeDescriptor::object());
        let object = boxed.as_object().unwrap();
        assert_eq!(object.default_value(HintKind::Number).unwrap().as_number(), Some(3.0));
        assert_eq!(object.default_value(HintKind::String).unwrap().as_str(), Some("3"));
        assert_eq!(boxed.to_number(), 3.0);
    }

    #[test]
    fn handles_unwrap_to_the_script_value() {
        let bridge = standard_bridge();
        let object = ScriptValue::object(PlainObject::new());
        let handle = NativeValue::object(ScriptHandle { value: object.clone() });
        assert_eq!(bridge.wrap(handle, &TypeDescriptor::object()).identity(), object.identity());
    }

    #[test]
    fn dispatch_by_native_kind() {
        let intro = SyntheticIntrospector::with_standard_types();
        let point = intro.register(TypeBuilder::class("demo.Point"));
        let bridge = crate::testing::bridge(intro);
        let object = TypeDescriptor::object();
        let kinds = [
            (NativeValue::object(SyntheticObject::new(&point)), DynamicKind::NativeObject),
            (TypeDescriptor::string().new_array(2), DynamicKind::NativeArray),
            (NativeValue::object(NativeClassRef { ty: point.clone() }), DynamicKind::NativeClass),
            (
                NativeValue::object(NativeList::list(object.clone(), vec![])),
                DynamicKind::NativeObject,
            ),
            (
                NativeValue::object(NativeMap::new(object.clone(), object.clone())),
                DynamicKind::NativeObject,
            ),
        ];
        for (value, kind) in kinds {
            let wrapped = bridge.wrap(value.clone(), &object);
            assert_eq!(wrapped.dynamic_kind(), kind, "{:?}", value);
            assert_eq!(wrapped.unwrap_native(), Some(value));
        }
    }

    #[test]
    fn new_instances_are_always_wrapped() {
        let bridge = standard_bridge();
        let string = TypeDescriptor::string();
        let wrapped = bridge.wrap_new_instance(NativeValue::string("s"), string.type_id().unwrap());
        assert_eq!(wrapped.dynamic_kind(), DynamicKind::NativeObject);
        let length = wrapped.as_object().unwrap().get(&"length".into()).unwrap().unwrap();
        let ScriptValue::Callable(length) = length else {
            panic!("length should be a method");
        };
        assert_eq!(length.call(&wrapped, &[]).unwrap().as_number(), Some(1.0));
    }
}
