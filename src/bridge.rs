//! The bridge facade.
//!
//! A [`Bridge`] owns the member registry, the adapter cache and the host
//! handle, and is the single entry point script engines call: wrapping native
//! values, coercing script values, member lookup and overload calls. It is
//! shared behind an [`Arc`]; wrappers and adapters keep a strong handle to it.

use std::fmt;
use std::sync::{Arc, Weak};

use hostbridge_core::{
    BridgeResult, NativeTypeIntrospector, NativeValue, PrimitiveKind, ScriptHost, ScriptValue, TypeDescriptor,
    TypeHash,
};
use hostbridge_registry::{MemberEntry, MemberRegistry, OverloadSet, ValueMarshal};

use crate::config::BridgeConfig;
use crate::conversion::{self, AdapterCache, Rank};
use crate::overload::{self, Resolution};
use crate::wrappers::{self, MethodFunction};

/// Script/native interop over one introspector and one script host.
pub struct Bridge {
    me: Weak<Bridge>,
    registry: MemberRegistry,
    host: Arc<dyn ScriptHost>,
    config: BridgeConfig,
    adapters: AdapterCache,
}

impl Bridge {
    /// Create a bridge.
    ///
    /// # Arguments
    ///
    /// * `introspector` - Reflection over the native types
    /// * `host` - The script engine, for callable dispatch and the wrap policy
    /// * `config` - Cache and visibility switches
    pub fn new(
        introspector: Arc<dyn NativeTypeIntrospector>,
        host: Arc<dyn ScriptHost>,
        config: BridgeConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            registry: MemberRegistry::new(introspector),
            host,
            config,
            adapters: AdapterCache::new(),
        })
    }

    pub fn introspector(&self) -> &Arc<dyn NativeTypeIntrospector> {
        self.registry.introspector()
    }

    pub fn registry(&self) -> &MemberRegistry {
        &self.registry
    }

    pub fn host(&self) -> &Arc<dyn ScriptHost> {
        &self.host
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn adapters(&self) -> &AdapterCache {
        &self.adapters
    }

    /// A strong handle for wrappers and adapters created by this bridge.
    pub(crate) fn handle(&self) -> Arc<Bridge> {
        // `self` is only reachable through the Arc built in `new`
        self.me.upgrade().unwrap_or_else(|| unreachable!("bridge used after drop"))
    }

    /// Printable name of a native type id.
    pub fn type_name(&self, id: TypeHash) -> String {
        if let Some(primitive) = PrimitiveKind::from_type_id(id) {
            return primitive.name().to_string();
        }
        match self.introspector().type_info(id) {
            Some(info) => info.ty.name.to_string(),
            None => id.to_string(),
        }
    }

    // ========================================================================
    // Native to script
    // ========================================================================

    /// Wrap a native value obtained through `static_type` for script code.
    pub fn wrap(&self, value: NativeValue, static_type: &TypeDescriptor) -> ScriptValue {
        wrappers::wrap(self, value, static_type)
    }

    /// Wrap a freshly constructed instance of `concrete`.
    pub fn wrap_new_instance(&self, value: NativeValue, concrete: TypeHash) -> ScriptValue {
        let ty = match self.introspector().type_info(concrete) {
            Some(info) => info.descriptor(),
            None => TypeDescriptor::none(),
        };
        wrappers::wrap_new_instance(self, value, &ty)
    }

    // ========================================================================
    // Script to native
    // ========================================================================

    /// Convert a script value to `target`.
    pub fn coerce(&self, value: &ScriptValue, target: &TypeDescriptor) -> BridgeResult<NativeValue> {
        conversion::convert(self, value, target)
    }

    /// How well `value` converts to `target`.
    pub fn conversion_weight(&self, value: &ScriptValue, target: &TypeDescriptor) -> Rank {
        conversion::conversion_weight(self, value, target)
    }

    /// True if `value` wraps a native instance of `target`.
    pub fn is_instance(&self, value: &ScriptValue, target: &TypeDescriptor) -> bool {
        self.conversion_weight(value, target) == Rank::NONTRIVIAL
    }

    /// True if values of `source` are usable where `target` is expected.
    pub fn is_assignable(&self, target: &TypeDescriptor, source: &TypeDescriptor) -> bool {
        hostbridge_core::is_assignable(self.introspector().as_ref(), target, source)
    }

    // ========================================================================
    // Members and calls
    // ========================================================================

    /// Members of `concrete`, with protected members when asked for or when
    /// the configuration includes them by default.
    pub fn lookup_members(
        &self,
        concrete: TypeHash,
        static_hint: Option<TypeHash>,
        include_protected: bool,
    ) -> BridgeResult<Arc<MemberEntry>> {
        self.registry
            .lookup(concrete, static_hint, include_protected || self.config.include_non_public)
    }

    pub fn resolve_overload(&self, set: &OverloadSet, args: &[ScriptValue]) -> Resolution {
        overload::resolve(self, set, args)
    }

    /// Resolve `set` against `args` and call the winner on `this`.
    pub fn invoke(
        &self,
        set: &OverloadSet,
        this: Option<&NativeValue>,
        args: &[ScriptValue],
    ) -> BridgeResult<ScriptValue> {
        overload::invoke(self, set, this, args)
    }

    /// Construct an instance of `concrete` from script arguments.
    pub fn construct(&self, concrete: TypeHash, args: &[ScriptValue]) -> BridgeResult<ScriptValue> {
        let entry = self.lookup_members(concrete, None, false)?;
        overload::construct(self, &entry, args)
    }
}

impl ValueMarshal for Bridge {
    fn to_script(&self, value: NativeValue, static_type: &TypeDescriptor) -> BridgeResult<ScriptValue> {
        Ok(self.wrap(value, static_type))
    }

    fn to_native(&self, value: &ScriptValue, target: &TypeDescriptor) -> BridgeResult<NativeValue> {
        self.coerce(value, target)
    }

    fn method_value(&self, set: &Arc<OverloadSet>, this: Option<&NativeValue>) -> ScriptValue {
        ScriptValue::callable(MethodFunction::new(self.handle(), set.clone(), this.cloned()))
    }

    fn invoke_overloads(
        &self,
        set: &OverloadSet,
        this: Option<&NativeValue>,
        args: &[ScriptValue],
    ) -> BridgeResult<ScriptValue> {
        self.invoke(set, this, args)
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("cached_entries", &self.registry.cached_len())
            .field("adapters", &self.adapters)
            .finish()
    }
}
