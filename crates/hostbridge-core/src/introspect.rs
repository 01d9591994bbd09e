//! The host reflection seam.
//!
//! A [`NativeTypeIntrospector`] answers "what is type T" and "what does T
//! declare". It reports every declared member with its [`MemberFlags`]; the
//! member registry decides visibility. Invocation goes through
//! [`NativeInvoker`] and [`FieldHandle`] trait objects the host supplies per
//! member. A member whose handle the host cannot supply reports `None` and is
//! skipped by discovery.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use rustc_hash::FxHashSet;

use crate::descriptor::{DescriptorKind, PrimitiveKind, TypeDescriptor, TypeRef, TypeVariable};
use crate::error::{BridgeResult, IntrospectionError};
use crate::native::NativeValue;
use crate::type_hash::{TypeHash, well_known};

bitflags! {
    /// Modifiers of a native type or member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u16 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const STATIC = 1 << 3;
        const FINAL = 1 << 4;
        const ABSTRACT = 1 << 5;
        const VARARGS = 1 << 6;
        /// Explicitly excluded from script visibility.
        const HIDDEN = 1 << 7;
    }
}

impl MemberFlags {
    /// Public members, plus protected ones when `include_non_public` is set.
    /// Hidden members are never visible.
    pub fn is_visible(self, include_non_public: bool) -> bool {
        if self.contains(MemberFlags::HIDDEN) {
            return false;
        }
        self.contains(MemberFlags::PUBLIC) || (include_non_public && self.contains(MemberFlags::PROTECTED))
    }

    pub fn is_static(self) -> bool {
        self.contains(MemberFlags::STATIC)
    }
}

// ============================================================================
// Type Information
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeTypeKind {
    Class,
    Interface,
    Enum,
    Primitive,
}

/// What the host knows about one native type.
#[derive(Debug, Clone)]
pub struct NativeTypeInfo {
    pub ty: TypeRef,
    pub kind: NativeTypeKind,
    pub flags: MemberFlags,
    pub type_params: Vec<TypeVariable>,
    /// Generic superclass reference, e.g. `Parameterized(AbstractList, [E])`.
    pub superclass: Option<TypeDescriptor>,
    /// Generic interface references.
    pub interfaces: Vec<TypeDescriptor>,
    /// Constant names of an enum type, in ordinal order.
    pub enum_constants: Vec<Arc<str>>,
    /// Interface with a single abstract method.
    pub functional: bool,
}

impl NativeTypeInfo {
    pub fn id(&self) -> TypeHash {
        self.ty.id
    }

    pub fn is_interface(&self) -> bool {
        self.kind == NativeTypeKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MemberFlags::ABSTRACT) || self.is_interface()
    }

    /// The interned descriptor of this type.
    pub fn descriptor(&self) -> TypeDescriptor {
        match self.kind {
            NativeTypeKind::Enum => TypeDescriptor::enumeration(&self.ty.name),
            NativeTypeKind::Interface => TypeDescriptor::interface(&self.ty.name, self.functional),
            NativeTypeKind::Class | NativeTypeKind::Primitive => TypeDescriptor::plain(&self.ty.name),
        }
    }

    /// Erased ids of the direct supertypes, superclass first.
    pub fn direct_supertypes(&self) -> Vec<TypeHash> {
        self.superclass
            .iter()
            .chain(self.interfaces.iter())
            .filter_map(TypeDescriptor::type_id)
            .collect()
    }
}

// ============================================================================
// Invocation Handles
// ============================================================================

/// Calls a native method or constructor.
pub trait NativeInvoker: Send + Sync {
    /// `this` is `None` for static members and constructors.
    fn invoke(&self, this: Option<&NativeValue>, args: &[NativeValue]) -> BridgeResult<NativeValue>;
}

impl<F> NativeInvoker for F
where
    F: Fn(Option<&NativeValue>, &[NativeValue]) -> BridgeResult<NativeValue> + Send + Sync,
{
    fn invoke(&self, this: Option<&NativeValue>, args: &[NativeValue]) -> BridgeResult<NativeValue> {
        self(this, args)
    }
}

/// Reads and writes a native field.
pub trait FieldHandle: Send + Sync {
    fn get(&self, this: Option<&NativeValue>) -> BridgeResult<NativeValue>;

    fn set(&self, this: Option<&NativeValue>, value: NativeValue) -> BridgeResult<()>;
}

/// A declared method.
#[derive(Clone)]
pub struct MethodInfo {
    pub name: Arc<str>,
    pub declaring: TypeHash,
    pub params: Vec<TypeDescriptor>,
    pub return_type: TypeDescriptor,
    pub flags: MemberFlags,
    /// `None` when the host cannot provide an invocation handle.
    pub invoker: Option<Arc<dyn NativeInvoker>>,
}

/// A declared field.
#[derive(Clone)]
pub struct FieldInfo {
    pub name: Arc<str>,
    pub declaring: TypeHash,
    pub field_type: TypeDescriptor,
    pub flags: MemberFlags,
    pub handle: Option<Arc<dyn FieldHandle>>,
}

/// A declared constructor.
#[derive(Clone)]
pub struct ConstructorInfo {
    pub declaring: TypeHash,
    pub params: Vec<TypeDescriptor>,
    pub flags: MemberFlags,
    pub invoker: Option<Arc<dyn NativeInvoker>>,
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("params", &self.params)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Introspector
// ============================================================================

/// Host reflection.
pub trait NativeTypeIntrospector: Send + Sync {
    fn type_info(&self, id: TypeHash) -> Option<Arc<NativeTypeInfo>>;

    fn declared_methods(&self, id: TypeHash) -> Result<Vec<MethodInfo>, IntrospectionError>;

    fn declared_fields(&self, id: TypeHash) -> Result<Vec<FieldInfo>, IntrospectionError>;

    fn declared_constructors(&self, id: TypeHash) -> Result<Vec<ConstructorInfo>, IntrospectionError>;
}

/// Erased direct supertypes of `id`, falling back to the built-in hierarchy
/// for types the introspector does not describe.
pub fn direct_supertypes(introspector: &dyn NativeTypeIntrospector, id: TypeHash) -> Vec<TypeHash> {
    match introspector.type_info(id) {
        Some(info) => info.direct_supertypes(),
        None => well_known::builtin_supertypes(id).to_vec(),
    }
}

/// Breadth-first closure of `root` and its supertypes, `root` first.
///
/// The root `Object` type comes last when the hierarchy does not name it.
pub fn supertype_closure(introspector: &dyn NativeTypeIntrospector, root: TypeHash) -> Vec<TypeHash> {
    let mut order = Vec::new();
    let mut seen = FxHashSet::default();
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        order.push(id);
        queue.extend(direct_supertypes(introspector, id));
    }
    if PrimitiveKind::from_type_id(root).is_none() && seen.insert(well_known::OBJECT) {
        order.push(well_known::OBJECT);
    }
    order
}

/// Returns true if a value of type `sub` is assignable to type `sup`.
pub fn is_subtype(introspector: &dyn NativeTypeIntrospector, sub: TypeHash, sup: TypeHash) -> bool {
    if sub == sup {
        return true;
    }
    if PrimitiveKind::from_type_id(sub).is_some() || PrimitiveKind::from_type_id(sup).is_some() {
        return false;
    }
    if sup == well_known::OBJECT {
        return true;
    }
    let mut seen = FxHashSet::default();
    let mut queue = VecDeque::from([sub]);
    while let Some(id) = queue.pop_front() {
        if id == sup {
            return true;
        }
        if seen.insert(id) {
            queue.extend(direct_supertypes(introspector, id));
        }
    }
    false
}

/// Descriptor assignability: `target` is assignable from `source`.
///
/// Arrays are covariant in reference components and invariant in primitive
/// ones; parameterized types are compared by erasure.
pub fn is_assignable(
    introspector: &dyn NativeTypeIntrospector,
    target: &TypeDescriptor,
    source: &TypeDescriptor,
) -> bool {
    if target == source {
        return true;
    }
    let target = target.as_plain_type();
    let source = source.as_plain_type();
    match (target.kind(), source.kind()) {
        (DescriptorKind::Array(tc), DescriptorKind::Array(sc)) => {
            if tc.is_primitive() || sc.is_primitive() {
                tc == sc
            } else {
                is_assignable(introspector, tc, sc)
            }
        }
        (_, DescriptorKind::Array(_)) => target.type_id() == Some(well_known::OBJECT),
        (DescriptorKind::Array(_), _) => false,
        _ => match (source.type_id(), target.type_id()) {
            (Some(sub), Some(sup)) => is_subtype(introspector, sub, sup),
            _ => false,
        },
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{SyntheticIntrospector, TypeBuilder};

    fn hierarchy() -> SyntheticIntrospector {
        let intro = SyntheticIntrospector::with_standard_types();
        let shape = intro.register(TypeBuilder::interface("demo.Shape"));
        let named = intro.register(TypeBuilder::interface("demo.Named"));
        let base = intro.register(TypeBuilder::class("demo.Base").implements(named));
        intro.register(TypeBuilder::class("demo.Circle").extends(base).implements(shape));
        intro
    }

    #[test]
    fn visibility() {
        assert!(MemberFlags::PUBLIC.is_visible(false));
        assert!(!MemberFlags::PROTECTED.is_visible(false));
        assert!(MemberFlags::PROTECTED.is_visible(true));
        assert!(!MemberFlags::PRIVATE.is_visible(true));
        assert!(!(MemberFlags::PUBLIC | MemberFlags::HIDDEN).is_visible(true));
    }

    #[test]
    fn closure_is_breadth_first() {
        let intro = hierarchy();
        let closure = supertype_closure(&intro, TypeHash::from_name("demo.Circle"));
        assert_eq!(
            closure,
            vec![
                TypeHash::from_name("demo.Circle"),
                TypeHash::from_name("demo.Base"),
                TypeHash::from_name("demo.Shape"),
                TypeHash::from_name("demo.Named"),
                well_known::OBJECT,
            ]
        );
    }

    #[test]
    fn subtyping() {
        let intro = hierarchy();
        let circle = TypeHash::from_name("demo.Circle");
        assert!(is_subtype(&intro, circle, TypeHash::from_name("demo.Named")));
        assert!(is_subtype(&intro, circle, well_known::OBJECT));
        assert!(!is_subtype(&intro, TypeHash::from_name("demo.Base"), circle));
        assert!(!is_subtype(&intro, well_known::INT, well_known::OBJECT));
        assert!(is_subtype(&intro, well_known::LIST, well_known::COLLECTION));
    }

    #[test]
    fn array_assignability() {
        let intro = hierarchy();
        let circles = TypeDescriptor::array(TypeDescriptor::plain("demo.Circle"));
        let shapes = TypeDescriptor::array(TypeDescriptor::interface("demo.Shape", false));
        let ints = TypeDescriptor::array(TypeDescriptor::plain("int"));
        let longs = TypeDescriptor::array(TypeDescriptor::plain("long"));
        assert!(is_assignable(&intro, &shapes, &circles));
        assert!(!is_assignable(&intro, &circles, &shapes));
        assert!(!is_assignable(&intro, &longs, &ints));
        assert!(is_assignable(&intro, &TypeDescriptor::object(), &ints));
    }
}
