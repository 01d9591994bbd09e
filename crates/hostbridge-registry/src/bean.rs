//! Bean property synthesis.
//!
//! `getX()`, `isX()` and `setX(v)` methods surface as a property `x`, unless
//! the table already has a member named `x`.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use hostbridge_core::PrimitiveKind;

use crate::members::{BeanProperty, MemberDescriptor, MemberTable, NativeCallable, OverloadSet};

/// Property name for the part of an accessor name after its prefix.
///
/// The first character is lower-cased unless the second one is upper case
/// too, so `getURL` stays `URL` and `getName` becomes `name`.
pub fn decapitalize(rest: &str) -> Option<String> {
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_uppercase() {
        return Some(rest.to_string());
    }
    match chars.next() {
        Some(second) if second.is_uppercase() => Some(rest.to_string()),
        _ => Some(first.to_lowercase().chain(rest[first.len_utf8()..].chars()).collect()),
    }
}

#[derive(Default)]
struct Accessors {
    getter: Option<Arc<NativeCallable>>,
    setters: Vec<Arc<NativeCallable>>,
    setter_name: Option<Arc<str>>,
}

/// Add bean properties for the accessor methods of `table`.
pub fn synthesize(table: &mut MemberTable) {
    let mut order: Vec<Arc<str>> = Vec::new();
    let mut found: FxHashMap<Arc<str>, Accessors> = FxHashMap::default();

    for (name, member) in table.iter() {
        let MemberDescriptor::Methods(set) = member else {
            continue;
        };
        let (prefix, rest) = if let Some(rest) = name.strip_prefix("get") {
            ("get", rest)
        } else if let Some(rest) = name.strip_prefix("is") {
            ("is", rest)
        } else if let Some(rest) = name.strip_prefix("set") {
            ("set", rest)
        } else {
            continue;
        };
        let Some(property) = decapitalize(rest) else {
            continue;
        };
        if table.contains(&property) {
            continue;
        }
        let property: Arc<str> = Arc::from(property);
        let accessors = found.entry(property.clone()).or_insert_with(|| {
            order.push(property);
            Accessors::default()
        });

        match prefix {
            "get" => {
                if let Some(getter) = set.candidates.iter().find(|c| c.arity() == 0 && !c.return_type.is_void()) {
                    accessors.getter = Some(getter.clone());
                }
            }
            "is" => {
                if accessors.getter.is_none() {
                    accessors.getter = set
                        .candidates
                        .iter()
                        .find(|c| c.arity() == 0 && c.return_type.primitive_kind() == Some(PrimitiveKind::Boolean))
                        .cloned();
                }
            }
            _ => {
                accessors.setters.extend(set.candidates.iter().filter(|c| c.arity() == 1).cloned());
                accessors.setter_name = Some(name.clone());
            }
        }
    }

    for property in order {
        let Some(accessors) = found.remove(&property) else {
            continue;
        };
        if accessors.getter.is_none() && accessors.setters.is_empty() {
            continue;
        }
        let (setter, setters) = choose_setter(&accessors);
        table.insert(
            property.clone(),
            MemberDescriptor::Bean(Arc::new(BeanProperty {
                name: property,
                getter: accessors.getter,
                setter,
                setters,
            })),
        );
    }
}

/// A single setter is used directly; among several, the one taking the
/// getter's type wins, else all of them are kept for write-time resolution.
fn choose_setter(accessors: &Accessors) -> (Option<Arc<NativeCallable>>, Option<Arc<OverloadSet>>) {
    match accessors.setters.as_slice() {
        [] => (None, None),
        [only] => (Some(only.clone()), None),
        several => {
            let matching = accessors
                .getter
                .as_ref()
                .and_then(|getter| several.iter().find(|s| s.params[0] == getter.return_type));
            match matching {
                Some(setter) => (Some(setter.clone()), None),
                None => {
                    let name = accessors.setter_name.clone().unwrap_or_else(|| Arc::from("set"));
                    (None, Some(Arc::new(OverloadSet::new(name, several.to_vec()))))
                }
            }
        }
    }
}
