//! Pairwise candidate comparison and the best-set fold.

use bitflags::bitflags;

use hostbridge_core::{ScriptValue, is_assignable, is_subtype};
use hostbridge_registry::OverloadSet;

use crate::bridge::Bridge;
use crate::conversion::Rank;
use crate::overload::{Resolution, Weighed, weigh};

bitflags! {
    /// Which of two candidates fits the arguments better.
    ///
    /// Per-position results are or-ed together, so a pair that wins some
    /// positions each way ends up `AMBIGUOUS`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct Preference: u8 {
        const FIRST = 1;
        const SECOND = 2;
        const AMBIGUOUS = Self::FIRST.bits() | Self::SECOND.bits();
    }
}

impl Preference {
    pub(crate) const EQUAL: Preference = Preference::empty();
}

/// Compare two weighed candidates position by position.
///
/// The lower rank wins a position. Equal `NONTRIVIAL` ranks prefer the more
/// specific parameter type; any other tie is ambiguous. Positions where both
/// parameter types are the same are skipped.
pub(crate) fn prefer_signature(bridge: &Bridge, first: &Weighed<'_>, second: &Weighed<'_>) -> Preference {
    let introspector = bridge.introspector().as_ref();
    let mut preference = Preference::EQUAL;
    let positions = first.params.iter().zip(&second.params).zip(first.ranks.iter().zip(&second.ranks));
    for ((t1, t2), (r1, r2)) in positions {
        if t1 == t2 {
            continue;
        }
        let here = if r1 < r2 {
            Preference::FIRST
        } else if r2 < r1 {
            Preference::SECOND
        } else if *r1 == Rank::NONTRIVIAL {
            if is_assignable(introspector, t1, t2) {
                Preference::SECOND
            } else if is_assignable(introspector, t2, t1) {
                Preference::FIRST
            } else {
                Preference::AMBIGUOUS
            }
        } else {
            Preference::AMBIGUOUS
        };
        preference |= here;
        if preference == Preference::AMBIGUOUS {
            break;
        }
    }
    preference
}

/// Full resolution of `set` against `args`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn best_of(bridge: &Bridge, set: &OverloadSet, args: &[ScriptValue]) -> Resolution {
    let introspector = bridge.introspector().as_ref();
    let mut best: Vec<Weighed<'_>> = Vec::new();

    'candidates: for (index, candidate) in set.candidates.iter().enumerate() {
        let Some(weighed) = weigh(bridge, index, candidate, args) else {
            continue;
        };
        let mut better = 0;
        let mut worse = 0;
        for slot in 0..best.len() {
            let incumbent = &best[slot];
            let preference = prefer_signature(bridge, &weighed, incumbent);
            if preference == Preference::AMBIGUOUS {
                break;
            } else if preference == Preference::FIRST {
                better += 1;
            } else if preference == Preference::SECOND {
                worse += 1;
            } else {
                // the same static member seen again through a subtype
                if incumbent.candidate.is_static()
                    && is_subtype(introspector, weighed.candidate.declaring, incumbent.candidate.declaring)
                {
                    best[slot] = weighed;
                }
                continue 'candidates;
            }
        }

        if !best.is_empty() && better == best.len() {
            best.clear();
            best.push(weighed);
        } else if !best.is_empty() && worse == best.len() {
            continue;
        } else {
            best.push(weighed);
        }
    }

    match best.as_slice() {
        [] => Resolution::NoMatch,
        [only] => Resolution::Resolved(only.index),
        tied => Resolution::Ambiguous(tied.iter().map(|w| w.index).collect()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hostbridge_core::synthetic::{MethodBuilder, SyntheticIntrospector, SyntheticObject, TypeBuilder};
    use hostbridge_core::{
        BridgeResult, ConsolidationMapping, MemberFlags, MethodInfo, NativeValue, NumericKind, TypeDescriptor, TypeHash,
    };
    use hostbridge_registry::NativeCallable;

    use super::*;
    use crate::testing::bridge;

    fn callable(name: &str, declaring: &str, params: Vec<TypeDescriptor>, flags: MemberFlags) -> Arc<NativeCallable> {
        let info = MethodInfo {
            name: Arc::from(name),
            declaring: TypeHash::from_name(declaring),
            params,
            return_type: TypeDescriptor::void(),
            flags: MemberFlags::PUBLIC | flags,
            invoker: Some(Arc::new(
                |_: Option<&NativeValue>, _: &[NativeValue]| -> BridgeResult<NativeValue> { Ok(NativeValue::Void) },
            )),
        };
        Arc::new(NativeCallable::from_method(&info, &ConsolidationMapping::new()).unwrap())
    }

    /// `demo.Shape` and `demo.Named` interfaces, `demo.Base implements Named`,
    /// `demo.Circle extends Base implements Shape`.
    fn shapes() -> (SyntheticIntrospector, [TypeDescriptor; 4]) {
        let intro = SyntheticIntrospector::with_standard_types();
        let shape = intro.register(TypeBuilder::interface("demo.Shape"));
        let named = intro.register(TypeBuilder::interface("demo.Named"));
        let base = intro.register(TypeBuilder::class("demo.Base").implements(named.clone()));
        let circle = intro.register(TypeBuilder::class("demo.Circle").extends(base.clone()).implements(shape.clone()));
        (intro, [shape, named, base, circle])
    }

    fn circle_value(bridge: &Bridge, circle: &TypeDescriptor) -> ScriptValue {
        bridge.wrap(NativeValue::object(SyntheticObject::new(circle)), circle)
    }

    #[test]
    fn nontrivial_ties_prefer_the_more_specific_type() {
        let (intro, [_, named, base, circle]) = shapes();
        let bridge = bridge(intro);
        let set = OverloadSet::new(
            Arc::from("draw"),
            vec![
                callable("draw", "demo.Canvas", vec![named], MemberFlags::empty()),
                callable("draw", "demo.Canvas", vec![base], MemberFlags::empty()),
            ],
        );
        assert_eq!(best_of(&bridge, &set, &[circle_value(&bridge, &circle)]), Resolution::Resolved(1));
    }

    #[test]
    fn instance_match_beats_stringification() {
        let (intro, [_, _, _, circle]) = shapes();
        let bridge = bridge(intro);
        let set = OverloadSet::new(
            Arc::from("draw"),
            vec![
                callable("draw", "demo.Canvas", vec![TypeDescriptor::string()], MemberFlags::empty()),
                callable("draw", "demo.Canvas", vec![circle.clone()], MemberFlags::empty()),
            ],
        );
        assert_eq!(best_of(&bridge, &set, &[circle_value(&bridge, &circle)]), Resolution::Resolved(1));

        let double = TypeDescriptor::numeric(NumericKind::Double);
        let set = OverloadSet::new(
            Arc::from("scale"),
            vec![
                callable("scale", "demo.Canvas", vec![double], MemberFlags::empty()),
                callable("scale", "demo.Canvas", vec![TypeDescriptor::object()], MemberFlags::empty()),
            ],
        );
        assert_eq!(best_of(&bridge, &set, &[circle_value(&bridge, &circle)]), Resolution::Resolved(1));
    }

    #[test]
    fn unrelated_interfaces_are_ambiguous() {
        let (intro, [shape, named, _, circle]) = shapes();
        let bridge = bridge(intro);
        let set = OverloadSet::new(
            Arc::from("draw"),
            vec![
                callable("draw", "demo.Canvas", vec![shape], MemberFlags::empty()),
                callable("draw", "demo.Canvas", vec![named], MemberFlags::empty()),
            ],
        );
        assert_eq!(
            best_of(&bridge, &set, &[circle_value(&bridge, &circle)]),
            Resolution::Ambiguous(vec![0, 1])
        );
    }

    #[test]
    fn redundant_statics_resolve_to_the_subtype() {
        let (intro, _) = shapes();
        let bridge = bridge(intro);
        let int = TypeDescriptor::numeric(NumericKind::Int);
        let set = OverloadSet::new(
            Arc::from("make"),
            vec![
                callable("make", "demo.Base", vec![int.clone()], MemberFlags::STATIC),
                callable("make", "demo.Circle", vec![int], MemberFlags::STATIC),
            ],
        );
        assert_eq!(best_of(&bridge, &set, &[1.into()]), Resolution::Resolved(1));
    }

    #[test]
    fn equal_instance_members_keep_the_first() {
        let (intro, _) = shapes();
        let bridge = bridge(intro);
        let int = TypeDescriptor::numeric(NumericKind::Int);
        let set = OverloadSet::new(
            Arc::from("size"),
            vec![
                callable("size", "demo.Base", vec![int.clone()], MemberFlags::empty()),
                callable("size", "demo.Circle", vec![int], MemberFlags::empty()),
            ],
        );
        assert_eq!(best_of(&bridge, &set, &[1.into()]), Resolution::Resolved(0));
    }

    #[test]
    fn preference_flags() {
        assert_eq!(Preference::FIRST | Preference::SECOND, Preference::AMBIGUOUS);
        assert!(Preference::EQUAL.is_empty());
    }

    #[test]
    fn a_better_candidate_replaces_every_tied_one() {
        let intro = SyntheticIntrospector::with_standard_types();
        intro.register(
            TypeBuilder::class("demo.Scale")
                .method(MethodBuilder::new("by").param(TypeDescriptor::numeric(NumericKind::Int)))
                .method(MethodBuilder::new("by").param(TypeDescriptor::numeric(NumericKind::Long)))
                .method(MethodBuilder::new("by").param(TypeDescriptor::string())),
        );
        let bridge = bridge(intro);
        let entry = bridge.lookup_members(TypeHash::from_name("demo.Scale"), None, false).unwrap();
        let by = entry.methods("by", false).unwrap();
        // int and long tie on a numeric string; String beats both
        assert_eq!(best_of(&bridge, by, &["7".into()]), Resolution::Resolved(2));
    }
}
