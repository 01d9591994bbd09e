//! Enum constants from names and ordinals.

use std::sync::Arc;

use hostbridge_core::{
    BridgeError, BridgeResult, MemberFlags, NativeEnumConstant, NativeValue, TypeRef, number_to_string,
    string_to_number,
};
use hostbridge_registry::MemberDescriptor;

use crate::bridge::Bridge;

/// The constant named `name`, ignoring case; integer text is taken as an
/// ordinal.
pub(crate) fn by_name(bridge: &Bridge, ty: &TypeRef, name: &str) -> BridgeResult<NativeValue> {
    let constants = constants(bridge, ty);
    if let Some(ordinal) = constants.iter().position(|c| c.eq_ignore_ascii_case(name)) {
        return constant(bridge, ty, &constants, ordinal);
    }
    let n = string_to_number(name);
    if n.is_finite() && n.fract() == 0.0 && !name.trim().is_empty() {
        return by_ordinal(bridge, ty, n);
    }
    Err(illegal(ty, &constants, format!("{:?}", name)))
}

/// The constant with ordinal `n`.
pub(crate) fn by_ordinal(bridge: &Bridge, ty: &TypeRef, n: f64) -> BridgeResult<NativeValue> {
    let constants = constants(bridge, ty);
    if n.fract() == 0.0 && n >= 0.0 && n < constants.len() as f64 {
        return constant(bridge, ty, &constants, n as usize);
    }
    Err(illegal(ty, &constants, number_to_string(n)))
}

fn constants(bridge: &Bridge, ty: &TypeRef) -> Vec<Arc<str>> {
    bridge
        .introspector()
        .type_info(ty.id)
        .map(|info| info.enum_constants.clone())
        .unwrap_or_default()
}

/// The host's own constant object (its static final field) when reachable,
/// so constants keep their identity.
fn constant(bridge: &Bridge, ty: &TypeRef, constants: &[Arc<str>], ordinal: usize) -> BridgeResult<NativeValue> {
    let name = &constants[ordinal];
    if let Ok(entry) = bridge.lookup_members(ty.id, None, false)
        && let Some(MemberDescriptor::Field(field)) = entry.statics.get(name)
        && field.flags.contains(MemberFlags::FINAL)
    {
        return field.read(None);
    }
    Ok(NativeValue::object(NativeEnumConstant {
        enum_type: ty.clone(),
        ordinal,
        name: name.clone(),
    }))
}

fn illegal(ty: &TypeRef, constants: &[Arc<str>], value: String) -> BridgeError {
    BridgeError::IllegalEnumValue {
        enum_name: ty.name.to_string(),
        value,
        valid: constants
            .iter()
            .enumerate()
            .map(|(ordinal, name)| format!("{}({})", name, ordinal))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use hostbridge_core::synthetic::{SyntheticIntrospector, TypeBuilder};
    use hostbridge_core::{ScriptValue, TypeDescriptor};

    use super::*;
    use crate::testing::bridge;

    fn color() -> (Arc<Bridge>, TypeDescriptor) {
        let intro = SyntheticIntrospector::with_standard_types();
        let color = intro.register(TypeBuilder::enumeration("demo.Color", &["RED", "GREEN", "BLUE"]));
        (bridge(intro), color)
    }

    fn ordinal_of(value: &NativeValue) -> usize {
        value.downcast_ref::<NativeEnumConstant>().unwrap().ordinal
    }

    #[test]
    fn by_ordinal_number() {
        let (bridge, color) = color();
        let green = bridge.coerce(&ScriptValue::from(1), &color).unwrap();
        assert_eq!(ordinal_of(&green), 1);
    }

    #[test]
    fn by_name_ignoring_case() {
        let (bridge, color) = color();
        let blue = bridge.coerce(&"blue".into(), &color).unwrap();
        assert_eq!(ordinal_of(&blue), 2);
    }

    #[test]
    fn integer_text_is_an_ordinal() {
        let (bridge, color) = color();
        assert_eq!(ordinal_of(&bridge.coerce(&"0".into(), &color).unwrap()), 0);
        assert_eq!(ordinal_of(&bridge.coerce(&"1".into(), &color).unwrap()), 1);
        assert!(matches!(
            bridge.coerce(&"7".into(), &color),
            Err(BridgeError::IllegalEnumValue { value, .. }) if value == "7"
        ));
        assert!(bridge.coerce(&"1.5".into(), &color).is_err());
        assert!(bridge.coerce(&"".into(), &color).is_err());
    }

    #[test]
    fn constants_keep_identity() {
        let (bridge, color) = color();
        let a = bridge.coerce(&"RED".into(), &color).unwrap();
        let b = bridge.coerce(&ScriptValue::from(0), &color).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn illegal_values_list_valid_constants() {
        let (bridge, color) = color();
        let err = bridge.coerce(&ScriptValue::from(3), &color).unwrap_err();
        match err {
            BridgeError::IllegalEnumValue { enum_name, value, valid } => {
                assert_eq!(enum_name, "demo.Color");
                assert_eq!(value, "3");
                assert_eq!(valid, vec!["RED(0)", "GREEN(1)", "BLUE(2)"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(bridge.coerce(&"purple".into(), &color).is_err());
        assert!(bridge.coerce(&ScriptValue::from(1.5), &color).is_err());
    }
}
