//! Script-to-native conversion.
//!
//! [`conversion_weight`] ranks how well a script value fits a native target
//! type and [`convert`] performs the conversion. Weights depend only on the
//! value's dynamic kind and run-time class, never on its content, so an
//! overload remembered for one vector of argument classes stays valid for
//! every call with the same classes. Content checks (ranges, NaN, enum names,
//! literal types) happen in [`convert`].
//!
//! ## Rank order
//!
//! 1. [`Rank::NONTRIVIAL`]: a wrapped native value that already is an
//!    instance of the target and passes through untouched
//! 2. [`Rank::EXACT`]: identity or a literal-type match
//! 3. ranked `2..=CEILING`: representation-changing conversions, narrower
//!    numeric types ranking worse
//! 4. [`Rank::NONE`]: not convertible
//!
//! Two `NONTRIVIAL` matches at one position are ordered by specificity during
//! overload resolution, so `f(Dog)` beats `f(Animal)` for a wrapped dog.

use std::fmt;
use std::sync::Arc;

use hostbridge_core::{
    BridgeError, BridgeResult, DescriptorKind, DynamicKind, NativeArray, NativeList, NativeMap, NativeTypeKind,
    NativeValue, NumericKind, PrimitiveKind, ScriptHandle, ScriptValue, TypeDescriptor, TypeHash, TypeRef,
    is_assignable, is_subtype, number_to_string, well_known,
};

use crate::bridge::Bridge;

mod adapter;
mod containers;
mod enums;
mod primitive;

pub use adapter::{AdapterCache, InterfaceAdapter};

// ============================================================================
// Rank
// ============================================================================

/// How well a script value fits a native type; lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(u8);

impl Rank {
    /// The argument already is an instance of the target; never loses to a
    /// representation-changing conversion.
    pub const NONTRIVIAL: Rank = Rank(0);
    pub const EXACT: Rank = Rank(1);
    /// The worst ranked conversion.
    pub const CEILING: Rank = Rank(11);
    pub const NONE: Rank = Rank(99);

    /// A ranked conversion in `2..=CEILING`.
    pub(crate) fn ranked(value: u8) -> Rank {
        debug_assert!((2..=Self::CEILING.0).contains(&value), "rank {} out of range", value);
        Rank(value)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self == Rank::NONE
    }

    pub fn is_exact(self) -> bool {
        self == Rank::EXACT
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Rank::EXACT => write!(f, "exact"),
            Rank::NONTRIVIAL => write!(f, "nontrivial"),
            Rank::NONE => write!(f, "none"),
            Rank(value) => write!(f, "{}", value),
        }
    }
}

// ============================================================================
// Targets
// ============================================================================

/// A target descriptor as the conversion engine sees it.
#[derive(Debug, Clone)]
pub(crate) enum Target {
    /// No conversion requested.
    Any,
    Void,
    Boolean,
    Numeric(NumericKind),
    String,
    CharSequence,
    /// The boxed `Number` type.
    Number,
    Class,
    Object,
    Enum(TypeRef),
    /// Array of the component type.
    Array(TypeDescriptor),
    /// `List`, `Set` or `Collection`; the element type is `None` when raw.
    Collection {
        raw: TypeHash,
        element: TypeDescriptor,
    },
    Map {
        key: TypeDescriptor,
        value: TypeDescriptor,
    },
    Interface(TypeDescriptor),
    /// Any other native class.
    Named(TypeHash),
    StringConstant(Arc<str>),
    NumberConstant(f64),
    BooleanConstant(bool),
    Union(Vec<TypeDescriptor>),
    ObjectShape(Vec<(Arc<str>, TypeDescriptor)>),
    FunctionShape,
}

impl Target {
    pub(crate) fn classify(bridge: &Bridge, target: &TypeDescriptor) -> Target {
        match target.kind() {
            DescriptorKind::None => Target::Any,
            DescriptorKind::Variable { var, .. } => {
                unreachable!("type variable {} reached conversion", var.name)
            }
            DescriptorKind::Array(component) => Target::Array(component.clone()),
            DescriptorKind::Enum(ty) => Target::Enum(ty.clone()),
            DescriptorKind::StringConstant(text) => Target::StringConstant(text.clone()),
            DescriptorKind::NumberConstant(n) => Target::NumberConstant(n.0),
            DescriptorKind::BooleanConstant(b) => Target::BooleanConstant(*b),
            DescriptorKind::Union(members) => Target::Union(members.clone()),
            DescriptorKind::ObjectShape(fields) => Target::ObjectShape(fields.clone()),
            DescriptorKind::FunctionShape { .. } => Target::FunctionShape,
            DescriptorKind::Plain(_) | DescriptorKind::Interface { .. } | DescriptorKind::Parameterized { .. } => {
                Self::classify_named(bridge, target)
            }
        }
    }

    fn classify_named(bridge: &Bridge, target: &TypeDescriptor) -> Target {
        let Some(id) = target.type_id() else {
            return Target::Object;
        };
        if let Some(kind) = PrimitiveKind::from_type_id(id) {
            return match kind {
                PrimitiveKind::Void => Target::Void,
                PrimitiveKind::Boolean => Target::Boolean,
                PrimitiveKind::Numeric(kind) => Target::Numeric(kind),
            };
        }
        match id {
            id if id == well_known::OBJECT => Target::Object,
            id if id == well_known::STRING => Target::String,
            id if id == well_known::CHAR_SEQUENCE => Target::CharSequence,
            id if id == well_known::NUMBER => Target::Number,
            id if id == well_known::CLASS => Target::Class,
            id if id == well_known::LIST || id == well_known::SET || id == well_known::COLLECTION => {
                Target::Collection {
                    raw: id,
                    element: target.param(0),
                }
            }
            id if id == well_known::MAP => Target::Map {
                key: target.param(0),
                value: target.param(1),
            },
            _ if target.is_interface() => Target::Interface(target.as_plain_type()),
            _ => match bridge.introspector().type_info(id) {
                Some(info) if info.kind == NativeTypeKind::Enum => Target::Enum(info.ty.clone()),
                Some(info) if info.is_interface() => Target::Interface(info.descriptor()),
                _ => Target::Named(id),
            },
        }
    }

    fn is_primitive(&self) -> bool {
        matches!(self, Target::Void | Target::Boolean | Target::Numeric(_))
    }

    fn accepts_null(&self) -> bool {
        !self.is_primitive()
            && !matches!(
                self,
                Target::StringConstant(_) | Target::NumberConstant(_) | Target::BooleanConstant(_)
            )
    }
}

// ============================================================================
// Weights
// ============================================================================

/// Rank the conversion of `value` to `target`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn conversion_weight(bridge: &Bridge, value: &ScriptValue, target: &TypeDescriptor) -> Rank {
    weigh(bridge, value, &Target::classify(bridge, target))
}

pub(crate) fn weigh(bridge: &Bridge, value: &ScriptValue, target: &Target) -> Rank {
    match target {
        Target::Any => return Rank::EXACT,
        Target::Union(members) => {
            return members
                .iter()
                .map(|member| conversion_weight(bridge, value, member))
                .min()
                .unwrap_or(Rank::NONE);
        }
        _ => {}
    }

    match value.dynamic_kind() {
        DynamicKind::Undefined => match target {
            Target::String | Target::Object => Rank::EXACT,
            _ => Rank::NONE,
        },
        DynamicKind::Null => {
            if target.accepts_null() {
                Rank::EXACT
            } else {
                Rank::NONE
            }
        }
        DynamicKind::Boolean => match target {
            Target::Boolean | Target::BooleanConstant(_) => Rank::EXACT,
            Target::Object => Rank::ranked(3),
            Target::String => Rank::ranked(4),
            _ => Rank::NONE,
        },
        DynamicKind::Number => weigh_number(target),
        DynamicKind::String => weigh_string(target),
        DynamicKind::NativeClass => match target {
            Target::Class => Rank::EXACT,
            Target::Object => Rank::ranked(3),
            Target::String => Rank::ranked(4),
            _ => Rank::NONE,
        },
        DynamicKind::NativeObject => weigh_native(bridge, value, target, false),
        DynamicKind::NativeArray => weigh_native(bridge, value, target, true),
        kind @ (DynamicKind::ScriptObject | DynamicKind::ScriptArray | DynamicKind::ScriptCallable) => {
            weigh_script(bridge, kind, target)
        }
    }
}

fn weigh_number(target: &Target) -> Rank {
    match target {
        Target::Numeric(NumericKind::Double) | Target::NumberConstant(_) => Rank::EXACT,
        Target::Numeric(kind) => Rank::ranked(1 + kind.size_rank()),
        Target::Number => Rank::ranked(2),
        Target::Enum(_) => Rank::ranked(3),
        Target::String => Rank::ranked(9),
        Target::Object => Rank::ranked(10),
        _ => Rank::NONE,
    }
}

fn weigh_string(target: &Target) -> Rank {
    match target {
        Target::String | Target::StringConstant(_) => Rank::EXACT,
        Target::CharSequence | Target::Object | Target::Enum(_) => Rank::ranked(2),
        Target::Numeric(NumericKind::Char) => Rank::ranked(3),
        Target::Numeric(_) => Rank::ranked(4),
        _ => Rank::NONE,
    }
}

fn weigh_native(bridge: &Bridge, value: &ScriptValue, target: &Target, is_array: bool) -> Rank {
    let Some(native) = value.unwrap_native() else {
        return Rank::NONE;
    };
    if is_instance_of(bridge, &native, target) {
        return Rank::NONTRIVIAL;
    }
    match target {
        Target::String => Rank::ranked(2),
        Target::Numeric(kind) if !is_array => Rank::ranked(2 + kind.size_rank()),
        Target::Collection { raw, .. } => match native.downcast_ref::<NativeList>() {
            Some(list) if is_subtype(bridge.introspector().as_ref(), list.kind().type_id(), *raw) => {
                Rank::ranked(3)
            }
            _ => Rank::NONE,
        },
        _ => Rank::NONE,
    }
}

fn weigh_script(bridge: &Bridge, kind: DynamicKind, target: &Target) -> Rank {
    match (kind, target) {
        (DynamicKind::ScriptArray, Target::Array(_) | Target::Collection { .. }) => Rank::ranked(2),
        (DynamicKind::ScriptObject, Target::Map { .. } | Target::ObjectShape(_)) => Rank::ranked(2),
        (DynamicKind::ScriptCallable, Target::FunctionShape) => Rank::EXACT,
        (DynamicKind::ScriptCallable, Target::Interface(interface)) if adapter::adaptable(bridge, interface, true) => {
            Rank::EXACT
        }
        (DynamicKind::ScriptObject, Target::Interface(interface)) if adapter::adaptable(bridge, interface, false) => {
            Rank::EXACT
        }
        (_, Target::Object) => Rank::ranked(3),
        (_, Target::String | Target::Number) => Rank::ranked(4),
        (_, Target::Numeric(kind)) => Rank::ranked(4 + kind.size_rank()),
        _ => Rank::NONE,
    }
}

/// Returns true if the native value already is an instance of `target`.
///
/// Primitives are never instances of primitive targets; inline numbers are
/// instances of the boxed `Number` type. Lists, sets and maps also need
/// matching element types unless the target leaves them open.
pub(crate) fn is_instance_of(bridge: &Bridge, native: &NativeValue, target: &Target) -> bool {
    let Some(source) = native.member_type() else {
        return false;
    };
    let introspector = bridge.introspector().as_ref();
    match target {
        Target::Any | Target::Object => true,
        Target::String => source == well_known::STRING,
        Target::CharSequence => is_subtype(introspector, source, well_known::CHAR_SEQUENCE),
        Target::Number => is_subtype(introspector, source, well_known::NUMBER),
        Target::Class => source == well_known::CLASS,
        Target::Enum(ty) => source == ty.id,
        Target::Named(id) => is_subtype(introspector, source, *id),
        Target::Interface(interface) => interface
            .type_id()
            .is_some_and(|id| is_subtype(introspector, source, id)),
        Target::Array(component) => native.downcast_ref::<NativeArray>().is_some_and(|array| {
            is_assignable(
                introspector,
                &TypeDescriptor::array(component.clone()),
                &TypeDescriptor::array(array.component_type().clone()),
            )
        }),
        Target::Collection { raw, element } => {
            is_subtype(introspector, source, *raw)
                && native
                    .downcast_ref::<NativeList>()
                    .is_none_or(|list| element_matches(element, list.element_type()))
        }
        Target::Map { key, value } => {
            is_subtype(introspector, source, well_known::MAP)
                && native.downcast_ref::<NativeMap>().is_none_or(|map| {
                    element_matches(key, map.key_type()) && element_matches(value, map.value_type())
                })
        }
        _ => false,
    }
}

/// An open or `Object` slot accepts any element type.
fn element_matches(wanted: &TypeDescriptor, actual: &TypeDescriptor) -> bool {
    match wanted.type_id() {
        None => true,
        Some(id) if id == well_known::OBJECT => true,
        Some(id) => actual.type_id() == Some(id),
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Convert `value` to `target`.
///
/// Fails wherever [`conversion_weight`] is [`Rank::NONE`], and for values the
/// target cannot represent. Numbers are never clamped.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn convert(bridge: &Bridge, value: &ScriptValue, target: &TypeDescriptor) -> BridgeResult<NativeValue> {
    let classified = Target::classify(bridge, target);
    let rank = weigh(bridge, value, &classified);
    let fail = || mismatch(value, target);
    if rank.is_none() {
        return Err(fail());
    }

    match &classified {
        Target::Any => return Ok(unconverted(value)),
        Target::Union(members) => {
            let best = members
                .iter()
                .min_by_key(|member| conversion_weight(bridge, value, member))
                .ok_or_else(fail)?;
            return convert(bridge, value, best);
        }
        _ => {}
    }

    match value {
        ScriptValue::Undefined => Ok(NativeValue::string("undefined")),
        ScriptValue::Null => Ok(NativeValue::Null),
        ScriptValue::Boolean(b) => match &classified {
            Target::String => Ok(NativeValue::string(if *b { "true" } else { "false" })),
            Target::BooleanConstant(expected) if expected != b => Err(fail()),
            _ => Ok(NativeValue::Boolean(*b)),
        },
        ScriptValue::Number(n) => match &classified {
            Target::Numeric(kind) => primitive::narrow(*n, *kind).ok_or_else(fail),
            Target::Enum(ty) => enums::by_ordinal(bridge, ty, *n),
            Target::String => Ok(NativeValue::string(&number_to_string(*n))),
            Target::NumberConstant(expected) if *expected != *n => Err(fail()),
            _ => Ok(NativeValue::from(*n)),
        },
        ScriptValue::String(text) => match &classified {
            Target::Numeric(NumericKind::Char) => primitive::char_from_string(text).ok_or_else(fail),
            Target::Numeric(kind) => primitive::parse(text, *kind).ok_or_else(fail),
            Target::Enum(ty) => enums::by_name(bridge, ty, text),
            Target::StringConstant(expected) if expected != text => Err(fail()),
            _ => Ok(NativeValue::String(text.clone())),
        },
        ScriptValue::Object(_) | ScriptValue::Callable(_) => match value.unwrap_native() {
            Some(native) => convert_native(bridge, value, native, &classified, rank).ok_or_else(fail)?,
            None => convert_script(bridge, value, &classified).ok_or_else(fail)?,
        },
    }
}

/// `None` when the target cannot take the wrapped native value.
fn convert_native(
    bridge: &Bridge,
    value: &ScriptValue,
    native: NativeValue,
    target: &Target,
    rank: Rank,
) -> Option<BridgeResult<NativeValue>> {
    if rank == Rank::NONTRIVIAL {
        return Some(Ok(native));
    }
    match target {
        Target::Class | Target::Object => Some(Ok(native)),
        Target::String => Some(Ok(NativeValue::string(&native.display_string()))),
        Target::Numeric(kind) => {
            let n = native.as_f64().unwrap_or_else(|| value.to_number());
            primitive::narrow(n, *kind).map(Ok)
        }
        Target::Collection { raw, element } => native
            .downcast_ref::<NativeList>()
            .map(|list| containers::retype_list(bridge, list, *raw, element)),
        _ => None,
    }
}

/// `None` when the target cannot take the script object.
fn convert_script(bridge: &Bridge, value: &ScriptValue, target: &Target) -> Option<BridgeResult<NativeValue>> {
    match target {
        Target::Array(component) => Some(containers::array_from(bridge, value, component)),
        Target::Collection { raw, element } => Some(containers::collection_from(bridge, value, *raw, element)),
        Target::Map { key, value: value_type } => Some(containers::map_from(bridge, value, key, value_type)),
        Target::ObjectShape(fields) => Some(containers::shape_from(bridge, value, fields)),
        Target::Interface(interface) => Some(adapter::adapt(bridge, value, interface)),
        Target::FunctionShape | Target::Object => Some(Ok(NativeValue::object(ScriptHandle { value: value.clone() }))),
        Target::String => Some(Ok(NativeValue::string(&value.to_display_string()))),
        Target::Number => Some(Ok(NativeValue::from(value.to_number()))),
        Target::Numeric(kind) => primitive::narrow(value.to_number(), *kind).map(Ok),
        _ => None,
    }
}

/// The natural native form of a value passed without conversion.
fn unconverted(value: &ScriptValue) -> NativeValue {
    match value {
        ScriptValue::Undefined | ScriptValue::Null => NativeValue::Null,
        ScriptValue::Boolean(b) => NativeValue::Boolean(*b),
        ScriptValue::Number(n) => NativeValue::from(*n),
        ScriptValue::String(text) => NativeValue::String(text.clone()),
        other => other
            .unwrap_native()
            .unwrap_or_else(|| NativeValue::object(ScriptHandle { value: other.clone() })),
    }
}

pub(crate) fn mismatch(value: &ScriptValue, target: &TypeDescriptor) -> BridgeError {
    BridgeError::conversion(value.describe(), target.signature())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{bridge, standard_bridge};
    use hostbridge_core::synthetic::{SyntheticIntrospector, TypeBuilder};
    use hostbridge_core::{ClosureFunction, NativeClassRef, NativeRef, PlainObject, ScriptArray};

    fn weight(value: impl Into<ScriptValue>, target: &TypeDescriptor) -> Rank {
        standard_bridge().conversion_weight(&value.into(), target)
    }

    fn numeric(kind: NumericKind) -> TypeDescriptor {
        TypeDescriptor::numeric(kind)
    }

    // ========================================================================
    // Weight Tests
    // ========================================================================

    #[test]
    fn rank_order() {
        assert!(Rank::NONTRIVIAL < Rank::EXACT);
        assert!(Rank::EXACT < Rank::ranked(2));
        assert!(Rank::CEILING < Rank::NONE);
        assert_eq!(Rank::EXACT.to_string(), "exact");
        assert_eq!(Rank::ranked(5).to_string(), "5");
    }

    #[test]
    fn numbers_prefer_wider_types() {
        let ranks: Vec<Rank> = NumericKind::ALL.iter().map(|kind| weight(3.0, &numeric(*kind))).collect();
        assert_eq!(ranks[0], Rank::EXACT);
        assert!(ranks.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(weight(3.0, &TypeDescriptor::boolean()), Rank::NONE);
    }

    #[test]
    fn weights_ignore_content() {
        let byte = numeric(NumericKind::Byte);
        assert_eq!(weight(1.0, &byte), weight(300.0, &byte));
        assert_eq!(weight(1.0, &byte), weight(f64::NAN, &byte));
        let int = numeric(NumericKind::Int);
        assert_eq!(weight("12", &int), weight("twelve", &int));
    }

    #[test]
    fn string_weights() {
        assert_eq!(weight("s", &TypeDescriptor::string()), Rank::EXACT);
        assert_eq!(weight("s", &TypeDescriptor::object()), Rank::ranked(2));
        assert_eq!(weight("s", &TypeDescriptor::plain(well_known::CHAR_SEQUENCE_NAME)), Rank::ranked(2));
        assert_eq!(weight("s", &numeric(NumericKind::Char)), Rank::ranked(3));
        assert_eq!(weight("s", &numeric(NumericKind::Long)), Rank::ranked(4));
        assert_eq!(weight("s", &TypeDescriptor::boolean()), Rank::NONE);
    }

    #[test]
    fn null_and_undefined() {
        assert_eq!(weight(ScriptValue::Null, &TypeDescriptor::string()), Rank::EXACT);
        assert_eq!(weight(ScriptValue::Null, &numeric(NumericKind::Int)), Rank::NONE);
        assert_eq!(weight(ScriptValue::Undefined, &TypeDescriptor::object()), Rank::EXACT);
        assert_eq!(weight(ScriptValue::Undefined, &numeric(NumericKind::Int)), Rank::NONE);
    }

    #[test]
    fn none_target_accepts_anything() {
        assert_eq!(weight(ScriptValue::Undefined, &TypeDescriptor::none()), Rank::EXACT);
        let object = ScriptValue::object(PlainObject::new().with("a", 1));
        assert_eq!(weight(object, &TypeDescriptor::none()), Rank::EXACT);
    }

    #[test]
    fn literal_targets() {
        let bridge = standard_bridge();
        let yes = TypeDescriptor::string_constant("yes");
        assert_eq!(bridge.conversion_weight(&"no".into(), &yes), Rank::EXACT);
        assert!(bridge.coerce(&"no".into(), &yes).is_err());
        assert_eq!(bridge.coerce(&"yes".into(), &yes), Ok(NativeValue::string("yes")));

        let union = TypeDescriptor::union(vec![TypeDescriptor::boolean(), numeric(NumericKind::Int)]);
        assert_eq!(bridge.conversion_weight(&2.0.into(), &union), Rank::ranked(5));
        assert_eq!(bridge.coerce(&2.0.into(), &union), Ok(NativeValue::Int(2)));
    }

    #[test]
    fn script_object_weights() {
        let list = TypeDescriptor::interface(well_known::LIST_NAME, false);
        let array = ScriptValue::object(ScriptArray::default());
        assert_eq!(weight(array.clone(), &list), Rank::ranked(2));
        assert_eq!(weight(array, &TypeDescriptor::array(numeric(NumericKind::Int))), Rank::ranked(2));

        let map = TypeDescriptor::interface(well_known::MAP_NAME, false);
        assert_eq!(weight(ScriptValue::object(PlainObject::new()), &map), Rank::ranked(2));
        assert_eq!(weight(ScriptValue::object(PlainObject::new()), &TypeDescriptor::object()), Rank::ranked(3));
        assert_eq!(weight(ScriptValue::object(PlainObject::new()), &numeric(NumericKind::Int)), Rank::ranked(8));
        assert_eq!(
            weight(ScriptValue::object(PlainObject::new()), &TypeDescriptor::plain(well_known::NUMBER_NAME)),
            weight(ScriptValue::object(PlainObject::new()), &TypeDescriptor::string()),
        );
    }

    #[test]
    fn wrapped_native_instance_is_nontrivial() {
        let bridge = standard_bridge();
        let list = NativeValue::object(NativeList::list(TypeDescriptor::string(), vec![]));
        let wrapped = bridge.wrap(list, &TypeDescriptor::object());
        let list_of_string = TypeDescriptor::parameterized(
            TypeDescriptor::interface(well_known::LIST_NAME, false),
            vec![TypeDescriptor::string()],
        );
        assert_eq!(bridge.conversion_weight(&wrapped, &list_of_string), Rank::NONTRIVIAL);
        assert_eq!(bridge.conversion_weight(&wrapped, &TypeDescriptor::object()), Rank::NONTRIVIAL);
        assert_eq!(bridge.conversion_weight(&wrapped, &TypeDescriptor::string()), Rank::ranked(2));

        let list_of_int = TypeDescriptor::parameterized(
            TypeDescriptor::interface(well_known::LIST_NAME, false),
            vec![numeric(NumericKind::Int)],
        );
        assert_eq!(bridge.conversion_weight(&wrapped, &list_of_int), Rank::ranked(3));
    }

    #[test]
    fn class_handles() {
        let bridge = standard_bridge();
        let class = bridge.wrap(
            NativeValue::object(NativeClassRef {
                ty: TypeDescriptor::string(),
            }),
            &TypeDescriptor::plain(well_known::CLASS_NAME),
        );
        assert_eq!(
            bridge.conversion_weight(&class, &TypeDescriptor::plain(well_known::CLASS_NAME)),
            Rank::EXACT
        );
        assert_eq!(bridge.conversion_weight(&class, &TypeDescriptor::object()), Rank::ranked(3));
        assert_eq!(bridge.conversion_weight(&class, &numeric(NumericKind::Int)), Rank::NONE);
    }

    // ========================================================================
    // Conversion Tests
    // ========================================================================

    #[test]
    fn convert_fails_exactly_where_weight_is_none() {
        let bridge = standard_bridge();
        let values: Vec<ScriptValue> = vec![
            ScriptValue::Undefined,
            ScriptValue::Null,
            true.into(),
            1.5.into(),
            "x".into(),
            ScriptValue::object(PlainObject::new()),
        ];
        let targets = vec![
            TypeDescriptor::boolean(),
            numeric(NumericKind::Double),
            TypeDescriptor::string(),
            TypeDescriptor::object(),
            TypeDescriptor::plain(well_known::CLASS_NAME),
        ];
        for value in &values {
            for target in &targets {
                if bridge.conversion_weight(value, target).is_none() {
                    assert!(bridge.coerce(value, target).is_err(), "{:?} -> {}", value, target);
                }
            }
        }
    }

    #[test]
    fn numbers_never_clamp() {
        let bridge = standard_bridge();
        assert!(bridge.coerce(&300.0.into(), &numeric(NumericKind::Byte)).is_err());
        assert!(bridge.coerce(&f64::NAN.into(), &numeric(NumericKind::Int)).is_err());
        assert!(bridge.coerce(&f64::INFINITY.into(), &numeric(NumericKind::Long)).is_err());
        assert!(bridge.coerce(&(-1.0).into(), &numeric(NumericKind::Char)).is_err());
        assert_eq!(bridge.coerce(&127.9.into(), &numeric(NumericKind::Byte)), Ok(NativeValue::Byte(127)));
        assert_eq!(bridge.coerce(&(-2.7).into(), &numeric(NumericKind::Int)), Ok(NativeValue::Int(-2)));
    }

    #[test]
    fn strings_to_numbers() {
        let bridge = standard_bridge();
        assert_eq!(bridge.coerce(&"42".into(), &numeric(NumericKind::Int)), Ok(NativeValue::Int(42)));
        assert!(bridge.coerce(&"forty".into(), &numeric(NumericKind::Double)).is_err());
        assert_eq!(
            bridge.coerce(&"x".into(), &numeric(NumericKind::Char)),
            Ok(NativeValue::Char(b'x' as u16))
        );
    }

    #[test]
    fn to_string_conversions() {
        let bridge = standard_bridge();
        let string = TypeDescriptor::string();
        assert_eq!(bridge.coerce(&3.0.into(), &string), Ok(NativeValue::string("3")));
        assert_eq!(bridge.coerce(&true.into(), &string), Ok(NativeValue::string("true")));
        assert_eq!(
            bridge.coerce(&ScriptValue::Undefined, &string),
            Ok(NativeValue::string("undefined"))
        );
        assert_eq!(bridge.coerce(&ScriptValue::Null, &string), Ok(NativeValue::Null));
    }

    #[test]
    fn script_values_pass_through_object_targets() {
        let bridge = standard_bridge();
        let object = ScriptValue::object(PlainObject::new());
        let native = bridge.coerce(&object, &TypeDescriptor::object()).unwrap();
        let handle = native.downcast_ref::<ScriptHandle>().unwrap();
        assert_eq!(handle.value.identity(), object.identity());
        assert_eq!(bridge.wrap(native, &TypeDescriptor::object()).identity(), object.identity());
    }

    #[test]
    fn wrapped_native_unwraps() {
        let bridge = standard_bridge();
        let list = NativeRef::new(NativeList::list(TypeDescriptor::string(), vec![]));
        let wrapped = bridge.wrap(NativeValue::Object(list.clone()), &TypeDescriptor::object());
        assert_eq!(
            bridge.coerce(&wrapped, &TypeDescriptor::object()),
            Ok(NativeValue::Object(list))
        );
    }

    #[test]
    fn object_shape_target() {
        let bridge = standard_bridge();
        let shape = TypeDescriptor::object_shape(vec![
            (Arc::from("x"), numeric(NumericKind::Int)),
            (Arc::from("label"), TypeDescriptor::string()),
        ]);
        let object = ScriptValue::object(PlainObject::new().with("x", 4).with("label", "four"));
        let native = bridge.coerce(&object, &shape).unwrap();
        let map = native.downcast_ref::<NativeMap>().unwrap();
        assert_eq!(map.get(&NativeValue::from("x")), Some(NativeValue::Int(4)));
        assert_eq!(map.get(&NativeValue::from("label")), Some(NativeValue::from("four")));
    }

    #[test]
    fn function_shape_target() {
        let bridge = standard_bridge();
        let shape = TypeDescriptor::function_shape(vec![], TypeDescriptor::void());
        let f = ScriptValue::callable(ClosureFunction::new("f", |_, _| Ok(ScriptValue::Undefined)));
        assert_eq!(bridge.conversion_weight(&f, &shape), Rank::EXACT);
        assert!(bridge.coerce(&f, &shape).unwrap().downcast_ref::<ScriptHandle>().is_some());
    }

    #[test]
    fn named_class_targets_need_instances() {
        let intro = SyntheticIntrospector::with_standard_types();
        let point = intro.register(TypeBuilder::class("demo.Point"));
        let bridge = bridge(intro);
        assert_eq!(bridge.conversion_weight(&1.0.into(), &point), Rank::NONE);
        assert_eq!(bridge.conversion_weight(&ScriptValue::Null, &point), Rank::EXACT);
        assert_eq!(bridge.coerce(&ScriptValue::Null, &point), Ok(NativeValue::Null));
    }

    #[test]
    #[should_panic(expected = "type variable")]
    fn variables_never_reach_conversion() {
        let var = hostbridge_core::TypeVariable::new(TypeHash::from_name("demo.Box"), "T");
        let target = TypeDescriptor::variable(var, TypeDescriptor::object());
        let _ = standard_bridge().conversion_weight(&1.0.into(), &target);
    }
}
