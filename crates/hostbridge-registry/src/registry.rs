//! MemberRegistry - the per-type member cache.
//!
//! Entries are keyed by (concrete type, include-non-public) and built on first
//! use. Building runs outside any lock; publishing is insert-if-absent, so
//! concurrent first lookups may both discover but every caller ends up with
//! the same published entry.
//!
//! # Access-denied fallback
//!
//! When the host refuses to reflect on the concrete type, discovery retries
//! against the declared static type if that is an interface, then walks up
//! the superclass chain (interfaces fall back to `Object`). Whatever succeeds
//! is cached under the original key.

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use tracing::debug;

use hostbridge_core::{
    BridgeResult, ConsolidationMapping, IntrospectionError, NativeTypeIntrospector, TypeDescriptor, TypeHash,
    well_known,
};

use crate::consolidate::Consolidator;
use crate::discovery::discover;
use crate::members::MemberEntry;

/// Process-wide cache of discovered members.
pub struct MemberRegistry {
    introspector: Arc<dyn NativeTypeIntrospector>,
    consolidator: Consolidator,
    entries: DashMap<(TypeHash, bool), Arc<MemberEntry>, FxBuildHasher>,
}

impl MemberRegistry {
    pub fn new(introspector: Arc<dyn NativeTypeIntrospector>) -> Self {
        Self {
            consolidator: Consolidator::new(introspector.clone()),
            introspector,
            entries: DashMap::with_hasher(FxBuildHasher),
        }
    }

    pub fn introspector(&self) -> &Arc<dyn NativeTypeIntrospector> {
        &self.introspector
    }

    pub fn consolidator(&self) -> &Consolidator {
        &self.consolidator
    }

    /// Members of `concrete`.
    ///
    /// `static_type` is the declared type the value was obtained through; it
    /// only matters for the access-denied fallback.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn lookup(
        &self,
        concrete: TypeHash,
        static_type: Option<TypeHash>,
        include_non_public: bool,
    ) -> BridgeResult<Arc<MemberEntry>> {
        let key = (concrete, include_non_public);
        if let Some(entry) = self.entries.get(&key) {
            return Ok(entry.clone());
        }

        let mapping = self.consolidator.mapping(concrete);
        let entry = match discover(&*self.introspector, concrete, &mapping, include_non_public) {
            Ok(entry) => entry,
            Err(IntrospectionError::AccessDenied { type_name }) => {
                self.fallback(concrete, static_type, &mapping, include_non_public, type_name)?
            }
            Err(err) => return Err(err.into()),
        };
        Ok(self.entries.entry(key).or_insert_with(|| Arc::new(entry)).clone())
    }

    /// Drop every cached entry and mapping of `concrete`.
    pub fn evict(&self, concrete: TypeHash) {
        self.entries.remove(&(concrete, false));
        self.entries.remove(&(concrete, true));
        self.consolidator.evict(concrete);
    }

    pub fn cached_len(&self) -> usize {
        self.entries.len()
    }

    fn fallback(
        &self,
        concrete: TypeHash,
        static_type: Option<TypeHash>,
        mapping: &ConsolidationMapping,
        include_non_public: bool,
        denied: String,
    ) -> BridgeResult<MemberEntry> {
        let mut interface = static_type.filter(|id| {
            self.introspector
                .type_info(*id)
                .is_some_and(|info| info.is_interface())
        });
        let mut current = concrete;
        loop {
            let next = match interface.take() {
                Some(id) => Some(id),
                None => self.superclass(current),
            };
            let Some(next) = next else {
                return Err(IntrospectionError::AccessDenied { type_name: denied }.into());
            };
            match discover(&*self.introspector, next, mapping, include_non_public) {
                Ok(entry) => {
                    debug!(
                        target: "hostbridge.registry",
                        denied = %denied,
                        using = %entry.type_name,
                        "member discovery fell back to a supertype"
                    );
                    return Ok(entry);
                }
                Err(IntrospectionError::AccessDenied { .. }) => current = next,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Superclass of `id`; interfaces and classes without a superclass fall
    /// back to `Object`.
    fn superclass(&self, id: TypeHash) -> Option<TypeHash> {
        if id == well_known::OBJECT {
            return None;
        }
        let superclass = self
            .introspector
            .type_info(id)
            .and_then(|info| info.superclass.as_ref().and_then(TypeDescriptor::type_id));
        Some(superclass.unwrap_or(well_known::OBJECT))
    }
}

// ============================================================================
// Tests
// ============================================================================
