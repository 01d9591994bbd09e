//! Interface adapters.
//!
//! A script callable or generic script object converted to a native interface
//! becomes an [`InterfaceAdapter`]: a native object that answers
//! [`NativeObject::invoke_method`] by calling back into script code. Abstract
//! interface methods dispatch virtually on their receiver, so invoking them
//! through the member registry reaches the adapter as well.
//!
//! ## Dispatch
//!
//! 1. A callable adapts interfaces whose abstract methods all share one name;
//!    every call goes to the callable
//! 2. A generic object adapts any interface with abstract methods; each call
//!    goes to the same-named property of the object
//!
//! Arguments are wrapped by the method's parameter types and the script
//! result is converted back by its return type.
//!
//! Adapters are cached per (script object identity, interface) while they are
//! alive, so converting one object to one interface twice yields the same
//! native object. A dropped adapter removes its own cache entry.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::{FxBuildHasher, FxHashSet};
use tracing::{debug, warn};

use hostbridge_core::{
    BridgeError, BridgeResult, NativeObject, NativeRef, NativeValue, PropertyKey, ScriptCallable, ScriptValue,
    TypeDescriptor, TypeHash,
};
use hostbridge_registry::MemberEntry;

use crate::bridge::Bridge;
use crate::conversion::mismatch;

// ============================================================================
// Adapter
// ============================================================================

/// A native interface implemented by a script value.
pub struct InterfaceAdapter {
    target: ScriptValue,
    interface: TypeDescriptor,
    entry: Arc<MemberEntry>,
    bridge: Arc<Bridge>,
    /// Set when the adapter is published in the bridge's [`AdapterCache`].
    cache_key: Option<(usize, TypeHash)>,
}

impl InterfaceAdapter {
    /// The adapted script value.
    pub fn target(&self) -> &ScriptValue {
        &self.target
    }

    pub fn interface(&self) -> &TypeDescriptor {
        &self.interface
    }

    /// The script function answering calls to `name`; `None` when a generic
    /// object has no such property.
    fn function(&self, name: &str) -> BridgeResult<Option<Arc<dyn ScriptCallable>>> {
        match &self.target {
            ScriptValue::Callable(callable) => Ok(Some(callable.clone())),
            ScriptValue::Object(object) => match object.get(&PropertyKey::from(name))? {
                Some(ScriptValue::Callable(callable)) => Ok(Some(callable)),
                None | Some(ScriptValue::Undefined) => Ok(None),
                Some(other) => Err(BridgeError::NotCallable {
                    value: format!("{}.{} ({})", self.target.describe(), name, other.describe()),
                }),
            },
            other => Err(BridgeError::NotCallable { value: other.describe() }),
        }
    }
}

impl NativeObject for InterfaceAdapter {
    fn runtime_type(&self) -> TypeHash {
        self.entry.type_id
    }

    fn display_string(&self) -> String {
        self.target.to_display_string()
    }

    fn invoke_method(&self, name: &str, args: &[NativeValue]) -> BridgeResult<NativeValue> {
        let method = self
            .entry
            .methods(name, false)
            .and_then(|set| set.candidates.iter().find(|c| c.arity() == args.len()))
            .ok_or_else(|| BridgeError::MemberNotFound {
                type_name: self.entry.type_name.to_string(),
                name: name.to_string(),
            })?;

        let Some(function) = self.function(name)? else {
            warn!(
                target: "hostbridge.convert",
                interface = %self.interface,
                method = name,
                "adapted object does not define the method"
            );
            if method.return_type.is_void() {
                return Ok(NativeValue::Void);
            }
            return Ok(NativeValue::default_for(&method.return_type));
        };

        let script_args: Vec<ScriptValue> = args
            .iter()
            .zip(&method.params)
            .map(|(arg, ty)| self.bridge.wrap(arg.clone(), ty))
            .collect();
        let result = self.bridge.host().invoke_callable(&function, &self.target, &script_args)?;
        if method.return_type.is_void() {
            return Ok(NativeValue::Void);
        }
        self.bridge.coerce(&result, &method.return_type)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for InterfaceAdapter {
    fn drop(&mut self) {
        if let Some(key) = self.cache_key {
            self.bridge.adapters().forget(key);
        }
    }
}

impl fmt::Debug for InterfaceAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceAdapter")
            .field("interface", &self.interface)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Returns true if a callable (or generic object) can implement `interface`.
pub(crate) fn adaptable(bridge: &Bridge, interface: &TypeDescriptor, callable: bool) -> bool {
    let Some(id) = interface.type_id() else {
        return false;
    };
    let Ok(entry) = bridge.lookup_members(id, None, false) else {
        return false;
    };
    let names = abstract_method_names(&entry);
    if callable { names.len() == 1 } else { !names.is_empty() }
}

fn abstract_method_names(entry: &MemberEntry) -> FxHashSet<Arc<str>> {
    entry
        .instance
        .iter()
        .filter_map(|(name, member)| member.methods().map(|set| (name, set)))
        .filter(|(_, set)| set.candidates.iter().any(|c| c.is_abstract()))
        .map(|(name, _)| name.clone())
        .collect()
}

/// Adapt a script callable or object to `interface`.
pub(crate) fn adapt(bridge: &Bridge, value: &ScriptValue, interface: &TypeDescriptor) -> BridgeResult<NativeValue> {
    let id = interface.type_id().ok_or_else(|| mismatch(value, interface))?;
    let cache_key = value
        .identity()
        .filter(|_| bridge.config().adapter_cache)
        .map(|identity| (identity, id));
    let make = || -> BridgeResult<Arc<InterfaceAdapter>> {
        let entry = bridge.lookup_members(id, None, false)?;
        debug!(target: "hostbridge.convert", interface = %interface, "created interface adapter");
        Ok(Arc::new(InterfaceAdapter {
            target: value.clone(),
            interface: interface.clone(),
            entry,
            bridge: bridge.handle(),
            cache_key,
        }))
    };
    let adapter = match cache_key {
        Some(key) => bridge.adapters().get_or_insert(key, make)?,
        None => make()?,
    };
    Ok(NativeValue::Object(NativeRef::from_arc(adapter)))
}

// ============================================================================
// Adapter Cache
// ============================================================================

/// Live adapters by (script object identity, interface).
///
/// Entries hold weak references; an adapter keeps its script object alive, so
/// a live entry's identity cannot be reused by another object. Adapters remove
/// their entry when dropped, so the cache only holds live adapters.
#[derive(Default)]
pub struct AdapterCache {
    adapters: DashMap<(usize, TypeHash), Weak<InterfaceAdapter>, FxBuildHasher>,
}

impl AdapterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live adapter for `key`, or the one `make` builds. Racing first
    /// creations all receive the adapter that was published first.
    pub(crate) fn get_or_insert(
        &self,
        key: (usize, TypeHash),
        make: impl FnOnce() -> BridgeResult<Arc<InterfaceAdapter>>,
    ) -> BridgeResult<Arc<InterfaceAdapter>> {
        let live = self.adapters.get(&key).and_then(|weak| weak.upgrade());
        if let Some(adapter) = live {
            return Ok(adapter);
        }

        let adapter = make()?;
        // A losing adapter must outlive the shard guard: its drop removes
        // entries from this map.
        let winner = match self.adapters.entry(key) {
            Entry::Occupied(mut slot) => slot.get().upgrade().unwrap_or_else(|| {
                slot.insert(Arc::downgrade(&adapter));
                adapter.clone()
            }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::downgrade(&adapter));
                adapter.clone()
            }
        };
        drop(adapter);
        Ok(winner)
    }

    /// Remove the entry for `key` unless a live adapter has taken it over.
    fn forget(&self, key: (usize, TypeHash)) {
        self.adapters.remove_if(&key, |_, adapter| adapter.strong_count() == 0);
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl fmt::Debug for AdapterCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterCache").field("len", &self.len()).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
