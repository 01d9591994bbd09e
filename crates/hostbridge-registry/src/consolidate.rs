//! Generic-type consolidation.
//!
//! A member declared on a generic supertype mentions the supertype's type
//! variables (`E` in `Collection<E>.add(E)`). When the member is discovered on
//! a concrete type, those variables are replaced by whatever the concrete
//! type's supertype chain binds them to. The [`Consolidator`] computes that
//! binding once per concrete type:
//!
//! 1. get the supertype's (already consolidated) mapping
//! 2. bind the supertype's declared type parameters to the arguments of this
//!    type's generic supertype reference
//! 3. push the supertype mapping's values through those bindings
//! 4. merge, own bindings winning
//!
//! The superclass is folded first; generic interface references follow and
//! only add variables the superclass chain left unbound.

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashSet};

use hostbridge_core::{
    ConsolidationMapping, DescriptorKind, NativeTypeIntrospector, TypeDescriptor, TypeHash, well_known,
};

/// Process-wide cache of consolidation mappings.
pub struct Consolidator {
    introspector: Arc<dyn NativeTypeIntrospector>,
    cache: DashMap<TypeHash, Arc<ConsolidationMapping>, FxBuildHasher>,
}

impl Consolidator {
    pub fn new(introspector: Arc<dyn NativeTypeIntrospector>) -> Self {
        Self {
            introspector,
            cache: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// The consolidation mapping of `concrete`.
    ///
    /// Empty for primitive-like types, the root `Object` type and types the
    /// introspector does not know.
    pub fn mapping(&self, concrete: TypeHash) -> Arc<ConsolidationMapping> {
        self.mapping_guarded(concrete, &mut FxHashSet::default())
    }

    /// Drop the cached mapping of `concrete`.
    pub fn evict(&self, concrete: TypeHash) {
        self.cache.remove(&concrete);
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn mapping_guarded(&self, concrete: TypeHash, visiting: &mut FxHashSet<TypeHash>) -> Arc<ConsolidationMapping> {
        if let Some(cached) = self.cache.get(&concrete) {
            return cached.clone();
        }
        // a cyclic hierarchy contributes nothing past the cycle
        if !visiting.insert(concrete) {
            return Arc::new(ConsolidationMapping::new());
        }
        let computed = Arc::new(self.compute(concrete, visiting));
        visiting.remove(&concrete);
        self.cache.entry(concrete).or_insert(computed).clone()
    }

    fn compute(&self, concrete: TypeHash, visiting: &mut FxHashSet<TypeHash>) -> ConsolidationMapping {
        let mut merged = ConsolidationMapping::new();
        if concrete == well_known::OBJECT || well_known::is_primitive_like(concrete) {
            return merged;
        }
        let Some(info) = self.introspector.type_info(concrete) else {
            return merged;
        };

        let supertypes = info.superclass.iter().chain(info.interfaces.iter());
        for (position, supertype) in supertypes.enumerate() {
            let Some(super_id) = supertype.type_id() else {
                continue;
            };
            let parent = self.mapping_guarded(super_id, visiting);
            let own = self.own_bindings(supertype);

            let mut folded = ConsolidationMapping::new();
            for (var, ty) in parent.iter() {
                folded.insert(var.clone(), ty.consolidate(&own));
            }
            for (var, ty) in own.iter() {
                folded.insert(var.clone(), ty.clone());
            }

            let from_superclass = position == 0 && info.superclass.is_some();
            for (var, ty) in folded.iter() {
                if from_superclass || merged.get(var).is_none() {
                    merged.insert(var.clone(), ty.clone());
                }
            }
        }
        merged
    }

    /// Bindings of a generic supertype reference: the supertype's declared
    /// type parameters zipped with the reference's arguments.
    fn own_bindings(&self, supertype: &TypeDescriptor) -> ConsolidationMapping {
        let mut own = ConsolidationMapping::new();
        let DescriptorKind::Parameterized { raw, params } = supertype.kind() else {
            return own;
        };
        let Some(info) = raw.type_id().and_then(|id| self.introspector.type_info(id)) else {
            return own;
        };
        for (var, arg) in info.type_params.iter().zip(params) {
            own.insert(var.clone(), arg.clone());
        }
        own
    }
}

// ============================================================================
// Tests
// ============================================================================
