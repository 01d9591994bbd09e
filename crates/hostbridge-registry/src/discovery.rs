//! Member discovery.
//!
//! Walks the supertype closure of a type breadth-first, starting at the type
//! itself, and collects visible methods, fields and constructors into a
//! [`MemberEntry`]. A method declared with the same name and erased
//! parameter types on several types of the closure is kept once, in the form
//! first encountered.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

use hostbridge_core::{
    ConsolidationMapping, IntrospectionError, NativeTypeIntrospector, NativeTypeKind, TypeHash, is_subtype,
    supertype_closure,
};

use crate::bean;
use crate::members::{FieldAccessor, MemberDescriptor, MemberEntry, MemberTable, NativeCallable, OverloadSet};

/// Same-named callables in first-seen name order.
#[derive(Default)]
struct MethodGroups {
    order: Vec<Arc<str>>,
    groups: FxHashMap<Arc<str>, Vec<Arc<NativeCallable>>>,
}

impl MethodGroups {
    fn push(&mut self, callable: NativeCallable) {
        let name = callable.name.clone();
        let group = self.groups.entry(name.clone()).or_default();
        if group.is_empty() {
            self.order.push(name);
        }
        group.push(Arc::new(callable));
    }
}

/// Fields by name in first-seen order.
#[derive(Default)]
struct FieldSlots {
    order: Vec<Arc<str>>,
    fields: FxHashMap<Arc<str>, FieldAccessor>,
}

/// Supertypes the introspector does not describe contribute nothing; the
/// discovered type itself must be known.
fn declared<T>(
    result: Result<Vec<T>, IntrospectionError>,
    ty: TypeHash,
    root: TypeHash,
) -> Result<Vec<T>, IntrospectionError> {
    match result {
        Err(IntrospectionError::UnknownType { .. }) if ty != root => Ok(Vec::new()),
        other => other,
    }
}

/// Discover the members of `members_of`, consolidating signatures with
/// `mapping`.
pub fn discover(
    introspector: &dyn NativeTypeIntrospector,
    members_of: TypeHash,
    mapping: &ConsolidationMapping,
    include_non_public: bool,
) -> Result<MemberEntry, IntrospectionError> {
    let info = introspector
        .type_info(members_of)
        .ok_or_else(|| IntrospectionError::UnknownType {
            type_name: members_of.to_string(),
        })?;
    let closure = supertype_closure(introspector, members_of);

    let mut seen = FxHashSet::default();
    let mut instance_methods = MethodGroups::default();
    let mut static_methods = MethodGroups::default();
    for &ty in &closure {
        for method in declared(introspector.declared_methods(ty), ty, members_of)? {
            if !method.flags.is_visible(include_non_public) {
                continue;
            }
            if !seen.insert(NativeCallable::erased_key(&method.name, &method.params)) {
                continue;
            }
            let Some(callable) = NativeCallable::from_method(&method, mapping) else {
                warn!(
                    target: "hostbridge.registry",
                    type_name = %info.ty.name,
                    member = %method.name,
                    "skipping inaccessible method"
                );
                continue;
            };
            if callable.is_static() {
                static_methods.push(callable);
            } else {
                instance_methods.push(callable);
            }
        }
    }

    let mut instance_fields = FieldSlots::default();
    let mut static_fields = FieldSlots::default();
    for &ty in &closure {
        for field in declared(introspector.declared_fields(ty), ty, members_of)? {
            if !field.flags.is_visible(include_non_public) {
                continue;
            }
            let Some(accessor) = FieldAccessor::from_field(&field, mapping) else {
                warn!(
                    target: "hostbridge.registry",
                    type_name = %info.ty.name,
                    member = %field.name,
                    "skipping inaccessible field"
                );
                continue;
            };
            let slots = if accessor.is_static() {
                &mut static_fields
            } else {
                &mut instance_fields
            };
            // shadowing: the later field is declared on a subtype
            let shadows = slots.fields.get(&accessor.name).map(|existing| {
                existing.declaring != accessor.declaring
                    && is_subtype(introspector, accessor.declaring, existing.declaring)
            });
            match shadows {
                None => {
                    slots.order.push(accessor.name.clone());
                    slots.fields.insert(accessor.name.clone(), accessor);
                }
                Some(true) => {
                    slots.fields.insert(accessor.name.clone(), accessor);
                }
                Some(false) => {}
            }
        }
    }

    let constructors = if info.is_abstract() || info.kind == NativeTypeKind::Enum {
        None
    } else {
        let mut candidates = Vec::new();
        for constructor in introspector.declared_constructors(members_of)? {
            if !constructor.flags.is_visible(include_non_public) {
                continue;
            }
            match NativeCallable::from_constructor(&info.ty.name, &constructor, mapping) {
                Some(callable) => candidates.push(Arc::new(callable)),
                None => warn!(
                    target: "hostbridge.registry",
                    type_name = %info.ty.name,
                    "skipping inaccessible constructor"
                ),
            }
        }
        (!candidates.is_empty()).then(|| Arc::new(OverloadSet::new(info.ty.name.clone(), candidates)))
    };

    Ok(MemberEntry {
        type_id: members_of,
        type_name: info.ty.name.clone(),
        instance: build_table(instance_methods, instance_fields),
        statics: build_table(static_methods, static_fields),
        constructors,
    })
}

/// Methods first, then fields (a field takes over a same-named method's
/// slot and keeps its overloads), then bean properties.
fn build_table(mut methods: MethodGroups, mut fields: FieldSlots) -> MemberTable {
    let mut table = MemberTable::default();
    for name in methods.order {
        if let Some(candidates) = methods.groups.remove(&name) {
            let set = OverloadSet::new(name.clone(), candidates);
            table.insert(name, MemberDescriptor::Methods(Arc::new(set)));
        }
    }
    for name in fields.order {
        let Some(mut field) = fields.fields.remove(&name) else {
            continue;
        };
        if let Some(MemberDescriptor::Methods(set)) = table.get(&name) {
            field.methods = Some(set.clone());
        }
        table.insert(name, MemberDescriptor::Field(Arc::new(field)));
    }
    bean::synthesize(&mut table);
    table
}
