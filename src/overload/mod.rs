//! Overload resolution.
//!
//! Picks the best candidate of an [`OverloadSet`] for a vector of script
//! arguments.
//!
//! ## Algorithm
//!
//! 1. Expand each candidate's parameters to the argument count (variadic
//!    trailing arguments weigh against the repeated component type) and weigh
//!    every argument; candidates with an impossible conversion drop out
//! 2. Compare the survivors pairwise, position by position
//!    ([`ranking::prefer_signature`])
//! 3. Fold the comparisons into a set of best candidates; one is resolved,
//!    several are ambiguous
//!
//! Successful resolutions are remembered in the set's memo, keyed by the
//! run-time class of each argument. Weights only depend on those classes, so
//! a memo hit returns exactly what a full resolution would.

use hostbridge_core::{DynamicKind, ScriptValue, TypeDescriptor};
use hostbridge_registry::{NativeCallable, OverloadSet};
use tracing::trace;

use crate::bridge::Bridge;
use crate::conversion::Rank;

mod call;
mod ranking;

pub(crate) use call::{construct, invoke};

/// Outcome of resolving an overload set against arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Index of the chosen candidate.
    Resolved(usize),
    /// Indices of the tied best candidates.
    Ambiguous(Vec<usize>),
    NoMatch,
}

impl Resolution {
    pub fn index(&self) -> Option<usize> {
        match self {
            Resolution::Resolved(index) => Some(*index),
            _ => None,
        }
    }
}

/// Resolve `set` against `args`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn resolve(bridge: &Bridge, set: &OverloadSet, args: &[ScriptValue]) -> Resolution {
    if let [only] = set.candidates.as_slice() {
        return match weigh(bridge, 0, only, args) {
            Some(_) => Resolution::Resolved(0),
            None => Resolution::NoMatch,
        };
    }

    let key: Option<Vec<_>> = bridge
        .config()
        .overload_memo
        .then(|| args.iter().map(ScriptValue::runtime_class).collect());
    if let Some(key) = &key
        && let Some(index) = set.memo().lookup(key)
    {
        trace!(target: "hostbridge.overload", name = %set.name, index, "memo hit");
        return Resolution::Resolved(index);
    }

    let resolution = ranking::best_of(bridge, set, args);
    if let (Some(key), Resolution::Resolved(index)) = (&key, &resolution) {
        set.memo().record(key, *index);
    }
    resolution
}

/// A candidate with its expanded parameters and per-argument ranks.
pub(crate) struct Weighed<'a> {
    pub index: usize,
    pub candidate: &'a NativeCallable,
    pub params: Vec<TypeDescriptor>,
    pub ranks: Vec<Rank>,
}

/// Weigh `args` against one candidate; `None` when it cannot take them.
pub(crate) fn weigh<'a>(
    bridge: &Bridge,
    index: usize,
    candidate: &'a NativeCallable,
    args: &[ScriptValue],
) -> Option<Weighed<'a>> {
    let params = expanded_params(candidate, args)?;
    let ranks: Vec<Rank> = args
        .iter()
        .zip(&params)
        .map(|(arg, param)| bridge.conversion_weight(arg, param))
        .collect();
    if ranks.iter().any(|rank| rank.is_none()) {
        return None;
    }
    Some(Weighed {
        index,
        candidate,
        params,
        ranks,
    })
}

/// One parameter type per argument, or `None` on an arity mismatch.
///
/// A variadic candidate called with exactly its parameter count, whose last
/// argument is null or array-like, takes that argument as the array itself.
pub(crate) fn expanded_params(candidate: &NativeCallable, args: &[ScriptValue]) -> Option<Vec<TypeDescriptor>> {
    let params = &candidate.params;
    if !candidate.is_variadic() {
        return (args.len() == params.len()).then(|| params.clone());
    }
    let fixed = params.len() - 1;
    if args.len() < fixed {
        return None;
    }
    if args.len() == params.len() && passes_array(&args[fixed]) {
        return Some(params.clone());
    }
    let component = params[fixed].component_type()?;
    let mut expanded = params[..fixed].to_vec();
    expanded.extend(std::iter::repeat_n(component.clone(), args.len() - fixed));
    Some(expanded)
}

pub(crate) fn passes_array(arg: &ScriptValue) -> bool {
    matches!(
        arg.dynamic_kind(),
        DynamicKind::Null | DynamicKind::NativeArray | DynamicKind::ScriptArray
    )
}

// ============================================================================
// Tests
// ============================================================================
