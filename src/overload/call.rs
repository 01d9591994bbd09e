//! Calling a resolved overload: argument conversion, variadic packing and
//! result wrapping.

use std::sync::Arc;

use hostbridge_core::{BridgeError, BridgeResult, DynamicKind, NativeArray, NativeValue, ScriptValue, TypeDescriptor};
use hostbridge_registry::{MemberEntry, NativeCallable, OverloadSet};
use tracing::trace;

use crate::bridge::Bridge;
use crate::overload::{Resolution, passes_array, resolve};

/// Pick the candidate of `set` that `args` resolve to.
///
/// # Returns
///
/// * `Err(NoApplicableOverload)` - no candidate takes the arguments
/// * `Err(AmbiguousOverload)` - several candidates tie; lists only those
pub(crate) fn select<'s>(
    bridge: &Bridge,
    set: &'s OverloadSet,
    args: &[ScriptValue],
) -> BridgeResult<&'s Arc<NativeCallable>> {
    match resolve(bridge, set, args) {
        Resolution::Resolved(index) => Ok(&set.candidates[index]),
        Resolution::Ambiguous(indices) => Err(BridgeError::AmbiguousOverload {
            name: set.name.to_string(),
            args: describe_args(bridge, args),
            candidates: indices.iter().map(|&i| set.candidates[i].signature()).collect(),
        }),
        Resolution::NoMatch => Err(BridgeError::NoApplicableOverload {
            name: set.name.to_string(),
            args: describe_args(bridge, args),
        }),
    }
}

/// Resolve and call a method overload set.
///
/// Instance candidates need a receiver; static candidates ignore it.
pub(crate) fn invoke(
    bridge: &Bridge,
    set: &OverloadSet,
    this: Option<&NativeValue>,
    args: &[ScriptValue],
) -> BridgeResult<ScriptValue> {
    let candidate = select(bridge, set, args)?;
    let receiver = if candidate.is_static() {
        None
    } else {
        Some(this.filter(|value| !value.is_null()).ok_or_else(|| BridgeError::NotCallable {
            value: format!("{} without a receiver", candidate.signature()),
        })?)
    };
    let native_args = convert_args(bridge, candidate, args)?;
    trace!(target: "hostbridge.overload", signature = %candidate.signature(), "invoke");
    let result = candidate.invoke(receiver, &native_args)?;
    Ok(bridge.wrap(result, &candidate.return_type))
}

/// Resolve a constructor of `entry` and wrap the new instance.
pub(crate) fn construct(bridge: &Bridge, entry: &MemberEntry, args: &[ScriptValue]) -> BridgeResult<ScriptValue> {
    let constructors = entry.constructors.as_ref().ok_or_else(|| BridgeError::NotConstructible {
        type_name: entry.type_name.to_string(),
    })?;
    let candidate = select(bridge, constructors, args)?;
    let native_args = convert_args(bridge, candidate, args)?;
    let instance = candidate.invoke(None, &native_args)?;
    Ok(bridge.wrap_new_instance(instance, entry.type_id))
}

/// Convert `args` to the parameter types of `candidate`.
///
/// Trailing arguments of a variadic candidate are packed into a native array
/// of the component type, unless the last argument already is the array.
pub(crate) fn convert_args(
    bridge: &Bridge,
    candidate: &NativeCallable,
    args: &[ScriptValue],
) -> BridgeResult<Vec<NativeValue>> {
    let params = &candidate.params;
    if !candidate.is_variadic() {
        return args
            .iter()
            .zip(params)
            .map(|(arg, param)| bridge.coerce(arg, param))
            .collect();
    }

    let fixed = params.len() - 1;
    let mut converted = args[..fixed]
        .iter()
        .zip(params)
        .map(|(arg, param)| bridge.coerce(arg, param))
        .collect::<BridgeResult<Vec<_>>>()?;
    let last = &params[fixed];
    if args.len() == params.len() && passes_array(&args[fixed]) {
        converted.push(bridge.coerce(&args[fixed], last)?);
        return Ok(converted);
    }
    let component = last.component_type().cloned().unwrap_or_else(TypeDescriptor::object);
    let packed = args[fixed..]
        .iter()
        .map(|arg| bridge.coerce(arg, &component))
        .collect::<BridgeResult<Vec<_>>>()?;
    converted.push(NativeValue::object(NativeArray::new(component, packed)));
    Ok(converted)
}

/// `(number, host.String, null)`-style argument list for diagnostics.
fn describe_args(bridge: &Bridge, args: &[ScriptValue]) -> String {
    let kinds: Vec<String> = args.iter().map(|arg| describe_arg(bridge, arg)).collect();
    kinds.join(", ")
}

fn describe_arg(bridge: &Bridge, arg: &ScriptValue) -> String {
    match arg.dynamic_kind() {
        DynamicKind::Undefined => "undefined".to_string(),
        DynamicKind::Null => "null".to_string(),
        DynamicKind::Boolean => "boolean".to_string(),
        DynamicKind::Number => "number".to_string(),
        DynamicKind::String => "string".to_string(),
        DynamicKind::ScriptCallable => "function".to_string(),
        DynamicKind::NativeClass | DynamicKind::NativeObject | DynamicKind::NativeArray => {
            match arg.unwrap_native() {
                Some(NativeValue::Object(object)) => match object.downcast_ref::<NativeArray>() {
                    Some(array) => TypeDescriptor::array(array.component_type().clone()).signature(),
                    None => bridge.type_name(object.get().runtime_type()),
                },
                Some(other) => other
                    .runtime_type()
                    .map(|id| bridge.type_name(id))
                    .unwrap_or_else(|| "null".to_string()),
                None => "native".to_string(),
            }
        }
        DynamicKind::ScriptObject | DynamicKind::ScriptArray => arg
            .as_object()
            .map(|object| object.class_name().to_string())
            .unwrap_or_else(|| "object".to_string()),
    }
}
