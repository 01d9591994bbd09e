//! Native containers built from script values.
//!
//! Arrays, lists and sets are filled from an array-like script value
//! element by element; maps from the own properties of a generic script
//! object. A wrapped native list whose element type differs from the
//! target's is copied with each element re-converted.

use std::sync::Arc;

use hostbridge_core::{
    ArrayValueProvider, BridgeError, BridgeResult, CollectionKind, NativeArray, NativeList, NativeMap, NativeValue,
    PropertyKey, ScriptValue, TypeDescriptor, TypeHash, well_known,
};

use crate::bridge::Bridge;
use crate::conversion::{convert, mismatch};

/// A native array of `component` from a script array-like.
pub(crate) fn array_from(bridge: &Bridge, value: &ScriptValue, component: &TypeDescriptor) -> BridgeResult<NativeValue> {
    let elements = elements_of(bridge, value, component, &TypeDescriptor::array(component.clone()))?;
    Ok(NativeValue::object(NativeArray::new(component.clone(), elements)))
}

/// A native list or set from a script array-like. `Collection` targets get a
/// list.
pub(crate) fn collection_from(
    bridge: &Bridge,
    value: &ScriptValue,
    raw: TypeHash,
    element: &TypeDescriptor,
) -> BridgeResult<NativeValue> {
    let target = TypeDescriptor::plain(if raw == well_known::SET {
        well_known::SET_NAME
    } else {
        well_known::LIST_NAME
    });
    let elements = elements_of(bridge, value, element, &target)?;
    Ok(NativeValue::object(NativeList::new(
        collection_kind(raw, CollectionKind::List),
        element.clone(),
        elements,
    )))
}

/// Copy a wrapped native list, converting every element to `element`.
pub(crate) fn retype_list(
    bridge: &Bridge,
    list: &NativeList,
    raw: TypeHash,
    element: &TypeDescriptor,
) -> BridgeResult<NativeValue> {
    let source_type = list.element_type();
    let elements = list
        .to_vec()
        .into_iter()
        .map(|item| bridge.coerce(&bridge.wrap(item, source_type), element))
        .collect::<BridgeResult<Vec<_>>>()?;
    Ok(NativeValue::object(NativeList::new(
        collection_kind(raw, list.kind()),
        element.clone(),
        elements,
    )))
}

/// A native map from the own properties of a generic script object.
pub(crate) fn map_from(
    bridge: &Bridge,
    value: &ScriptValue,
    key_type: &TypeDescriptor,
    value_type: &TypeDescriptor,
) -> BridgeResult<NativeValue> {
    let object = value
        .as_object()
        .ok_or_else(|| mismatch(value, &TypeDescriptor::plain(well_known::MAP_NAME)))?;
    let map = NativeMap::new(key_type.clone(), value_type.clone());
    for key in object.own_keys() {
        let script_key = match &key {
            PropertyKey::Name(name) => ScriptValue::String(name.clone()),
            PropertyKey::Index(index) => ScriptValue::Number(*index as f64),
        };
        let item = object.get(&key)?.unwrap_or(ScriptValue::Undefined);
        map.insert(convert(bridge, &script_key, key_type)?, convert(bridge, &item, value_type)?);
    }
    Ok(NativeValue::object(map))
}

/// A string-keyed native map holding the declared fields of an object shape.
pub(crate) fn shape_from(
    bridge: &Bridge,
    value: &ScriptValue,
    fields: &[(Arc<str>, TypeDescriptor)],
) -> BridgeResult<NativeValue> {
    let object = value
        .as_object()
        .ok_or_else(|| mismatch(value, &TypeDescriptor::object_shape(fields.to_vec())))?;
    let map = NativeMap::new(TypeDescriptor::string(), TypeDescriptor::object());
    for (name, field_type) in fields {
        let item = object
            .get(&PropertyKey::Name(name.clone()))?
            .unwrap_or(ScriptValue::Undefined);
        map.insert(NativeValue::String(name.clone()), convert(bridge, &item, field_type)?);
    }
    Ok(NativeValue::object(map))
}

fn collection_kind(raw: TypeHash, fallback: CollectionKind) -> CollectionKind {
    match raw {
        raw if raw == well_known::LIST => CollectionKind::List,
        raw if raw == well_known::SET => CollectionKind::Set,
        _ => fallback,
    }
}

fn elements_of(
    bridge: &Bridge,
    value: &ScriptValue,
    element: &TypeDescriptor,
    target: &TypeDescriptor,
) -> BridgeResult<Vec<NativeValue>> {
    let provider = value
        .as_object()
        .and_then(|object| object.as_array_like())
        .ok_or_else(|| mismatch(value, target))?;
    (0..provider.length())
        .map(|index| {
            let item = provider.value_at(index);
            convert(bridge, &item, element).map_err(|err| element_error(err, index, provider))
        })
        .collect()
}

/// Point a failed element conversion at its position in the source.
fn element_error(err: BridgeError, index: usize, provider: &dyn ArrayValueProvider) -> BridgeError {
    match err {
        BridgeError::Conversion { value, target } => BridgeError::Conversion {
            value: format!("{} at index {} of {}", value, index, provider.error_source()),
            target,
        },
        other => other,
    }
}
